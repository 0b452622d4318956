// Colored terminal output for subject lists and report details.
//
// This module handles all terminal-specific formatting: colors and
// tables. The main.rs command handlers delegate here.

use colored::Colorize;

use crate::reports::models::{NormalizedReport, ReportStatus, ReportedSubjectSummary, SubjectStatus};
use crate::sync::pagination::PageState;

/// Display the reported-subject list with its page footer.
pub fn display_subject_list(subjects: &[ReportedSubjectSummary], page: &PageState) {
    if subjects.is_empty() {
        println!("No reported users on this page.");
        display_page_footer(page);
        return;
    }

    println!(
        "\n{}",
        format!("=== Reported Users ({} on this page) ===", subjects.len()).bold()
    );
    println!();

    // Header
    println!(
        "  {:<24} {:<24} {:>7}  {:<20}  {:<8}  {:<20}",
        "ID".dimmed(),
        "Username".dimmed(),
        "Reports".dimmed(),
        "Last report".dimmed(),
        "Status".dimmed(),
        "Latest reporter".dimmed(),
    );
    println!("  {}", "-".repeat(110).dimmed());

    for subject in subjects {
        println!(
            "  {:<24} {:<24} {:>7}  {:<20}  {:<8}  {:<20}",
            super::truncate_chars(&subject.id, 21),
            super::truncate_chars(&subject.username, 21),
            subject.report_count,
            subject.last_report_date.format("%Y-%m-%d %H:%M").to_string(),
            colorize_subject_status(subject.status),
            subject.reporter_username.as_deref().unwrap_or("-"),
        );
    }

    println!();
    let blocked = subjects
        .iter()
        .filter(|s| s.status == SubjectStatus::Blocked)
        .count();
    if blocked > 0 {
        println!("  {} {} blocked users", "!".red().bold(), blocked);
    }
    display_page_footer(page);
}

/// Display every report filed against one subject.
pub fn display_subject_reports(subject_id: &str, reports: &[NormalizedReport]) {
    println!(
        "\n{}",
        format!("=== Reports against {} ({}) ===", subject_id, reports.len()).bold()
    );

    if reports.is_empty() {
        println!("  No reports found.");
        return;
    }

    for report in reports {
        println!();
        println!(
            "  {} [{}] {}",
            report.id.bold(),
            colorize_report_status(report.status),
            report.report_date.format("%Y-%m-%d %H:%M")
        );
        println!(
            "    Reporter: {}",
            report.reporter_username.as_deref().unwrap_or(&report.reporter_id)
        );
        if let Some(event) = report.event_name.as_deref().or(report.event_id.as_deref()) {
            println!("    Event: {event}");
        }
        println!("    Reason: {}", super::truncate_chars(&report.reason, 120));
        if let Some(description) = &report.description {
            println!("    {}", super::truncate_chars(description, 140).dimmed());
        }
        if let Some(notes) = &report.admin_notes {
            println!("    Admin notes: {}", notes.italic());
        }
    }
    println!();
}

fn display_page_footer(page: &PageState) {
    println!(
        "  {}",
        format!(
            "Page {}/{} ({} reports, {} per page)",
            page.page,
            page.total_pages.max(1),
            page.total,
            page.limit
        )
        .dimmed()
    );
}

fn colorize_subject_status(status: SubjectStatus) -> colored::ColoredString {
    match status {
        SubjectStatus::Active => status.as_str().green(),
        SubjectStatus::Blocked => status.as_str().red().bold(),
    }
}

fn colorize_report_status(status: ReportStatus) -> colored::ColoredString {
    match status {
        ReportStatus::Pending => status.as_str().yellow(),
        ReportStatus::Reviewed => status.as_str().green(),
    }
}

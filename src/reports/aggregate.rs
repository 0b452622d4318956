// Report aggregation: one summary row per reported subject.
//
// Summaries are rebuilt from scratch on every change to the report set.
// Output order follows the first appearance of each subject in the input,
// so the same input always yields the same list.

use std::collections::{HashMap, HashSet};

use super::models::{NormalizedReport, ReportedSubjectSummary, SubjectStatus};
use super::normalize::{placeholder_username, username_from_human};

/// Group reports by `reported_id` into subject summaries.
///
/// A later report replaces the latest-report fields only when its date is
/// strictly greater; on equal dates the first-seen report is kept.
pub fn aggregate(reports: &[NormalizedReport]) -> Vec<ReportedSubjectSummary> {
    let mut summaries: Vec<ReportedSubjectSummary> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for report in reports {
        match index.get(report.reported_id.as_str()) {
            Some(&i) => {
                let summary = &mut summaries[i];
                summary.report_count += 1;
                if report.report_date > summary.last_report_date {
                    summary.last_report_date = report.report_date;
                    summary.latest_report_id = report.id.clone();
                    summary.reporter_id = Some(report.reporter_id.clone());
                    summary.reporter_username = report.reporter_username.clone();
                }
            }
            None => {
                index.insert(report.reported_id.as_str(), summaries.len());
                summaries.push(ReportedSubjectSummary {
                    id: report.reported_id.clone(),
                    username: subject_username(report),
                    report_count: 1,
                    last_report_date: report.report_date,
                    status: SubjectStatus::Active,
                    latest_report_id: report.id.clone(),
                    reporter_id: Some(report.reporter_id.clone()),
                    reporter_username: report.reporter_username.clone(),
                });
            }
        }
    }

    summaries
}

/// Mark every summary whose subject was blocked locally.
///
/// Blocking is never derived from reports, so the blocked set is kept
/// beside the report collection and laid over each rebuilt summary list.
pub fn apply_blocks(
    mut summaries: Vec<ReportedSubjectSummary>,
    blocked: &HashSet<String>,
) -> Vec<ReportedSubjectSummary> {
    for summary in &mut summaries {
        if blocked.contains(&summary.id) {
            summary.status = SubjectStatus::Blocked;
        }
    }
    summaries
}

/// Display name for the reported side of a report. Never empty.
fn subject_username(report: &NormalizedReport) -> String {
    report
        .reported_username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .or_else(|| report.reported_name.as_deref().and_then(username_from_human))
        .unwrap_or_else(|| placeholder_username(&report.reported_id))
}

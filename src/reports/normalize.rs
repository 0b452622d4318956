// Record normalization: any raw report record into one canonical shape.
//
// Normalization never fails. Missing identity degrades to empty strings,
// missing dates to the Unix epoch (so they never win a latest-report
// comparison), and missing usernames to a synthesized placeholder.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use super::models::{NormalizedReport, ReportStatus};
use super::raw::{FieldSet, RawReportRecord, SubjectFields};

/// Prefix for synthesized usernames when a subject has no usable name.
pub const PLACEHOLDER_USERNAME_PREFIX: &str = "Kullanıcı-";

/// How many characters of the subject id go into a placeholder username.
const PLACEHOLDER_ID_CHARS: usize = 5;

/// Normalize an untyped JSON record.
pub fn normalize(value: &Value) -> NormalizedReport {
    normalize_record(RawReportRecord::classify(value))
}

/// Normalize a batch of untyped records, preserving order.
pub fn normalize_all(values: &[Value]) -> Vec<NormalizedReport> {
    values.iter().map(normalize).collect()
}

/// Normalize an already classified record.
pub fn normalize_record(raw: RawReportRecord) -> NormalizedReport {
    let fields = match raw {
        RawReportRecord::Current { fields, legacy } => fields.or(legacy),
        RawReportRecord::Legacy(fields) => fields,
        RawReportRecord::Unrecognized(fields) => fields,
    };
    build_report(fields)
}

fn build_report(fields: FieldSet) -> NormalizedReport {
    let status = match (&fields.status, fields.reviewed) {
        (Some(status), _) => ReportStatus::parse(status),
        (None, Some(true)) => ReportStatus::Reviewed,
        (None, Some(false) | None) => ReportStatus::Pending,
    };

    let report_date = match fields.report_date.as_deref() {
        Some(raw) => parse_report_date(raw).unwrap_or_else(|| {
            debug!(raw = raw, "Unparseable report date, using epoch");
            DateTime::<Utc>::UNIX_EPOCH
        }),
        None => DateTime::<Utc>::UNIX_EPOCH,
    };

    let reporter_id = fields.reporter.id.clone().unwrap_or_default();
    let reported_id = fields.reported.id.clone().unwrap_or_default();
    let reporter_username = resolve_username(&fields.reporter, &reporter_id);
    let reported_username = resolve_username(&fields.reported, &reported_id);

    NormalizedReport {
        id: fields.id.unwrap_or_default(),
        reporter_name: fields.reporter.display_name.or(fields.reporter.legacy_name),
        reporter_username: Some(reporter_username),
        reporter_id,
        reported_name: fields.reported.display_name.or(fields.reported.legacy_name),
        reported_username: Some(reported_username),
        reported_id,
        event_id: fields.event_id,
        event_name: fields.event_name,
        reason: fields.reason.unwrap_or_default(),
        description: fields.description,
        report_date,
        status,
        admin_notes: fields.admin_notes,
    }
}

/// Resolve a display username for one side of a report.
///
/// Priority: explicit username, legacy `*Name` field, a username derived
/// from a human name or email, and finally a placeholder built from the id.
pub fn resolve_username(subject: &SubjectFields, subject_id: &str) -> String {
    if let Some(username) = &subject.username {
        return username.clone();
    }
    if let Some(name) = &subject.legacy_name {
        return name.clone();
    }
    subject
        .display_name
        .as_deref()
        .and_then(username_from_human)
        .or_else(|| subject.email.as_deref().and_then(username_from_human))
        .unwrap_or_else(|| placeholder_username(subject_id))
}

/// Derive a username from a human name or an email address.
///
/// `"jane@example.com"` gives `"jane"`, `"Jane Doe"` gives `"Jane"`, and a
/// single word is returned trimmed.
pub fn username_from_human(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let candidate = if let Some((local, _domain)) = trimmed.split_once('@') {
        local.trim()
    } else {
        trimmed.split_whitespace().next().unwrap_or("")
    };
    (!candidate.is_empty()).then(|| candidate.to_string())
}

/// `"Kullanıcı-"` followed by the first five characters of the id.
pub fn placeholder_username(subject_id: &str) -> String {
    let head: String = subject_id.chars().take(PLACEHOLDER_ID_CHARS).collect();
    format!("{PLACEHOLDER_USERNAME_PREFIX}{head}")
}

/// Parse the date formats the report endpoints have been seen to emit.
///
/// Accepts RFC 3339, naive ISO date-times (taken as UTC), bare dates
/// (midnight UTC), and millisecond Unix timestamps.
pub fn parse_report_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
}

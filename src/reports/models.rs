// Report models: the canonical shapes that flow through the dashboard.
//
// Raw records from the network are normalized into `NormalizedReport`
// before anything else touches them. Subject summaries are derived from
// the normalized set and are never edited field by field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review state of a single report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
}

impl ReportStatus {
    /// Parse a wire status string. Unknown values fall back to `Pending`.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "reviewed" | "resolved" => ReportStatus::Reviewed,
            _ => ReportStatus::Pending,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Moderation state of a reported subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    #[default]
    Active,
    Blocked,
}

impl SubjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectStatus::Active => "active",
            SubjectStatus::Blocked => "blocked",
        }
    }
}

impl std::fmt::Display for SubjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A report in canonical form, whatever schema it arrived in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedReport {
    pub id: String,
    pub reporter_id: String,
    pub reporter_name: Option<String>,
    pub reporter_username: Option<String>,
    pub reported_id: String,
    pub reported_name: Option<String>,
    pub reported_username: Option<String>,
    pub event_id: Option<String>,
    pub event_name: Option<String>,
    pub reason: String,
    pub description: Option<String>,
    pub report_date: DateTime<Utc>,
    pub status: ReportStatus,
    pub admin_notes: Option<String>,
}

/// One row per reported subject, derived from the current report set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedSubjectSummary {
    /// The reported subject's id.
    pub id: String,
    /// Resolved display name. Never empty.
    pub username: String,
    pub report_count: u32,
    pub last_report_date: DateTime<Utc>,
    pub status: SubjectStatus,
    pub latest_report_id: String,
    pub reporter_id: Option<String>,
    pub reporter_username: Option<String>,
}

/// Filters carried on every report list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilters {
    pub status: Option<ReportStatus>,
    pub search: Option<String>,
}

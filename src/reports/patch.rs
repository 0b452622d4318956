// Report updates: client-side validation and the notes/status rule.
//
// An admin note means the report has been looked at; clearing the note
// puts it back in the queue. The rule is applied before the request is
// sent so the server and the local copy always agree.

use serde::Serialize;
use thiserror::Error;

use super::models::{NormalizedReport, ReportStatus};

/// Rejections raised before anything is sent over the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("report id must not be empty")]
    EmptyReportId,
    #[error("subject id must not be empty")]
    EmptySubjectId,
    #[error("update must set admin_notes or status")]
    EmptyPatch,
}

/// Partial update accepted by the report update endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ReportStatus>,
}

impl ReportPatch {
    pub fn notes(notes: impl Into<String>) -> Self {
        Self {
            admin_notes: Some(notes.into()),
            status: None,
        }
    }

    pub fn status(status: ReportStatus) -> Self {
        Self {
            admin_notes: None,
            status: Some(status),
        }
    }

    /// Validate the patch and apply the notes/status coupling.
    ///
    /// Non-empty notes force `reviewed`; an emptied note forces `pending`.
    /// A patch that only sets `status` is passed through.
    pub fn prepare(mut self) -> Result<Self, ValidationError> {
        if self.admin_notes.is_none() && self.status.is_none() {
            return Err(ValidationError::EmptyPatch);
        }
        if let Some(notes) = self.admin_notes.as_mut() {
            *notes = notes.trim().to_string();
            self.status = Some(if notes.is_empty() {
                ReportStatus::Pending
            } else {
                ReportStatus::Reviewed
            });
        }
        Ok(self)
    }

    /// Apply a prepared patch to a local copy of the report.
    pub fn apply_to(&self, report: &NormalizedReport) -> NormalizedReport {
        let mut updated = report.clone();
        if let Some(notes) = &self.admin_notes {
            let notes = notes.trim();
            updated.admin_notes = (!notes.is_empty()).then(|| notes.to_string());
        }
        if let Some(status) = self.status {
            updated.status = status;
        }
        updated
    }
}

/// Reject an empty id before dispatching a request.
pub fn require_id(id: &str, error: ValidationError) -> Result<&str, ValidationError> {
    let id = id.trim();
    if id.is_empty() {
        Err(error)
    } else {
        Ok(id)
    }
}

// Timeout fallback policies.
//
// When a fetch outlives its timeout, the lifecycle controller asks the
// injected policy what the domain should show instead. Production shows a
// retryable error, development shows canned data so screens stay usable
// against a slow or absent backend, and tests can opt out entirely.

use std::collections::HashMap;

use serde_json::{json, Value};

use super::lifecycle::Domain;

/// What to do with a domain whose current fetch timed out.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackAction {
    /// Commit this response body as if the server had returned it.
    Placeholder(Value),
    /// Record this message as the domain's error and stop loading.
    Error(String),
    /// Only stop loading.
    Nothing,
}

/// Strategy consulted when a fetch times out.
pub trait FallbackPolicy: Send + Sync {
    fn on_timeout(&self, domain: Domain) -> FallbackAction;
}

/// Surface a retryable error. Used outside development.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorFallback;

impl FallbackPolicy for ErrorFallback {
    fn on_timeout(&self, domain: Domain) -> FallbackAction {
        FallbackAction::Error(timeout_message(domain))
    }
}

/// Does nothing beyond clearing the loading flag.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFallback;

impl FallbackPolicy for NoopFallback {
    fn on_timeout(&self, _domain: Domain) -> FallbackAction {
        FallbackAction::Nothing
    }
}

/// Serve fixed response bodies per domain; domains without one get the
/// error fallback.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderFallback {
    datasets: HashMap<Domain, Value>,
}

impl PlaceholderFallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(mut self, domain: Domain, body: Value) -> Self {
        self.datasets.insert(domain, body);
        self
    }

    /// The development policy: sample reports in both wire layouts.
    pub fn development() -> Self {
        Self::new().with_dataset(Domain::REPORTS, sample_reports())
    }
}

impl FallbackPolicy for PlaceholderFallback {
    fn on_timeout(&self, domain: Domain) -> FallbackAction {
        match self.datasets.get(&domain) {
            Some(body) => FallbackAction::Placeholder(body.clone()),
            None => FallbackAction::Error(timeout_message(domain)),
        }
    }
}

fn timeout_message(domain: Domain) -> String {
    format!("Request for {domain} timed out. Please try again.")
}

/// Canned report list used by the development fallback.
pub fn sample_reports() -> Value {
    json!({
        "data": [
            {
                "id": "sample-1",
                "reporter_id": "u-1001",
                "reporter_username": "koray",
                "reported_id": "u-2001",
                "reported_username": "hizli_kosucu",
                "event_id": "ev-10",
                "event_name": "Sabah Koşusu",
                "report_date": "2024-03-01T09:30:00Z",
                "report_reason": "Uygunsuz davranış",
                "admin_notes": null,
                "status": "pending"
            },
            {
                "id": "sample-2",
                "reporterId": "u-1002",
                "reporterName": "elif",
                "reportedId": "u-2001",
                "reportedName": "hizli_kosucu",
                "reportDate": "2024-03-04T18:00:00Z",
                "reason": "Spam",
                "adminMessage": "Uyarı gönderildi",
                "reviewed": true
            },
            {
                "id": "sample-3",
                "reporter_id": "u-1003",
                "reporter_name": "Mert Yılmaz",
                "reported_id": "u-2002",
                "reported_name": "deniz@example.com",
                "report_date": "2024-02-20T12:15:00Z",
                "report_reason": "Sahte etkinlik",
                "status": "pending"
            }
        ],
        "total": 3,
        "page": 1,
        "limit": 10
    })
}

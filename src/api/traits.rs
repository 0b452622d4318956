// ReportsApi trait: the swap-ready REST boundary.
//
// The store only ever sees this trait, so tests drive it with in-process
// fakes and the binary plugs in the HTTP client. List endpoints return the
// raw JSON body: the envelope shape varies between backend versions and is
// unpacked by `reports::envelope`, not here.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

use crate::reports::models::ReportFilters;
use crate::reports::patch::ReportPatch;

/// One page of the report list, with the active filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: ReportFilters,
}

impl ReportQuery {
    /// Query-string pairs for the list endpoint.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        if let Some(status) = self.filters.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.filters.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                params.push(("search", search.to_string()));
            }
        }
        params
    }
}

#[async_trait]
pub trait ReportsApi: Send + Sync {
    /// Fetch one page of reports. Returns the raw response body.
    async fn list_reports(&self, query: &ReportQuery) -> Result<Value>;

    /// Fetch every report filed against one subject. Returns the raw body.
    async fn list_subject_reports(&self, subject_id: &str) -> Result<Value>;

    /// Send a prepared partial update for a report.
    async fn update_report(&self, report_id: &str, patch: &ReportPatch) -> Result<()>;

    async fn delete_report(&self, report_id: &str) -> Result<()>;

    /// Block a reported subject platform-wide.
    async fn block_subject(&self, subject_id: &str, reason: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::models::ReportStatus;

    #[test]
    fn test_params_include_filters() {
        let query = ReportQuery {
            page: 3,
            limit: 10,
            filters: ReportFilters {
                status: Some(ReportStatus::Pending),
                search: Some(" jane ".to_string()),
            },
        };
        assert_eq!(
            query.to_params(),
            vec![
                ("page", "3".to_string()),
                ("limit", "10".to_string()),
                ("status", "pending".to_string()),
                ("search", "jane".to_string()),
            ]
        );
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let query = ReportQuery {
            page: 1,
            limit: 10,
            filters: ReportFilters {
                status: None,
                search: Some("   ".to_string()),
            },
        };
        assert_eq!(query.to_params().len(), 2);
    }
}

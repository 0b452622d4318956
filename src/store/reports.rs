// Reports store: the reported-subject list and the selected subject's
// reports, kept in sync with the admin API.
//
// Two domains live here: `reports` (the paginated list) and
// `subjectReports` (detail of the selected subject). Each fetch goes
// through the lifecycle controller, so only the latest request of a
// domain can commit. Collections are `Arc<Vec<_>>` swapped wholesale on
// commit; a snapshot taken before a commit keeps seeing the old data.
//
// No lock is held across a network call: state is read and the fetch is
// registered under the lock, the request runs unlocked, and the result
// is checked against the controller under the lock again.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{ActionError, DomainFlags, FetchOutcome};
use crate::api::traits::{ReportQuery, ReportsApi};
use crate::config::Config;
use crate::reports::aggregate::{aggregate, apply_blocks};
use crate::reports::envelope::extract_page;
use crate::reports::models::{NormalizedReport, ReportFilters, ReportedSubjectSummary};
use crate::reports::normalize::normalize_all;
use crate::reports::patch::{require_id, ReportPatch, ValidationError};
use crate::sync::fallback::{FallbackAction, FallbackPolicy};
use crate::sync::lifecycle::{Completion, Domain, RequestId, RequestLifecycleController};
use crate::sync::pagination::{PageState, PaginationCursor, PaginationMeta, DEFAULT_PAGE_LIMIT};

/// Default time a fetch may take before the fallback policy kicks in.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Tuning for a store instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    pub fetch_timeout: Duration,
    pub page_limit: u32,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl StoreOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            fetch_timeout: config.fetch_timeout,
            page_limit: config.page_limit,
        }
    }
}

/// Reports of the currently selected subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectDetail {
    pub subject_id: String,
    pub reports: Arc<Vec<NormalizedReport>>,
    pub flags: DomainFlags,
}

/// Point-in-time view of the store for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportsSnapshot {
    pub reports: Arc<Vec<NormalizedReport>>,
    pub subjects: Arc<Vec<ReportedSubjectSummary>>,
    pub page: PageState,
    pub filters: ReportFilters,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<SubjectDetail>,
}

/// How a list fetch treats one already in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchMode {
    /// Same parameters: collapse into the in-flight fetch.
    SingleFlight,
    /// New parameters: replace the in-flight fetch.
    Supersede,
}

struct Inner {
    active: bool,
    controller: RequestLifecycleController,
    cursor: PaginationCursor,
    filters: ReportFilters,
    reports: Arc<Vec<NormalizedReport>>,
    subjects: Arc<Vec<ReportedSubjectSummary>>,
    blocked: HashSet<String>,
    list: DomainFlags,
    selected: Option<SubjectDetail>,
}

impl Inner {
    fn new(policy: Arc<dyn FallbackPolicy>, page_limit: u32) -> Self {
        Self {
            active: false,
            controller: RequestLifecycleController::new(policy),
            cursor: PaginationCursor::new(page_limit),
            filters: ReportFilters::default(),
            reports: Arc::new(Vec::new()),
            subjects: Arc::new(Vec::new()),
            blocked: HashSet::new(),
            list: DomainFlags::default(),
            selected: None,
        }
    }

    fn reset(&mut self) {
        self.controller.dispose();
        self.cursor.reset();
        self.filters = ReportFilters::default();
        self.reports = Arc::new(Vec::new());
        self.subjects = Arc::new(Vec::new());
        self.blocked.clear();
        self.list = DomainFlags::default();
        self.selected = None;
    }

    fn report_query(&self) -> ReportQuery {
        let page = self.cursor.query(Domain::REPORTS);
        ReportQuery {
            page: page.page,
            limit: page.limit,
            filters: self.filters.clone(),
        }
    }

    fn flags_mut(&mut self, domain: Domain) -> Option<&mut DomainFlags> {
        if domain == Domain::SUBJECT_REPORTS {
            self.selected.as_mut().map(|detail| &mut detail.flags)
        } else {
            Some(&mut self.list)
        }
    }

    /// Unpack, normalize and aggregate a list body, then swap it in.
    fn commit_list(&mut self, body: &Value) {
        let page = extract_page(body);
        let reports = normalize_all(&page.records);

        let mut meta = page.meta;
        if meta.total.is_none() {
            meta.total = Some(reports.len() as u64);
        }
        let page_state = self.cursor.apply_server_pagination(Domain::REPORTS, meta);

        self.replace_reports(reports);
        self.list.succeed();
        info!(
            reports = self.reports.len(),
            subjects = self.subjects.len(),
            page = page_state.page,
            total_pages = page_state.total_pages,
            "Report list committed"
        );
    }

    fn commit_detail(&mut self, body: &Value) {
        let reports = normalize_all(&extract_page(body).records);
        if let Some(detail) = self.selected.as_mut() {
            debug!(subject_id = %detail.subject_id, reports = reports.len(), "Subject reports committed");
            detail.reports = Arc::new(reports);
            detail.flags.succeed();
        }
    }

    fn commit(&mut self, domain: Domain, body: &Value) {
        if domain == Domain::SUBJECT_REPORTS {
            self.commit_detail(body);
        } else {
            self.commit_list(body);
        }
    }

    /// Swap in a new report set and rebuild the summaries from it.
    fn replace_reports(&mut self, reports: Vec<NormalizedReport>) {
        self.subjects = Arc::new(apply_blocks(aggregate(&reports), &self.blocked));
        self.reports = Arc::new(reports);
    }

    fn apply_timeout(&mut self, domain: Domain, id: RequestId) {
        let Some(action) = self.controller.fire_timeout(id, domain) else {
            return;
        };
        warn!(domain = %domain, request_id = %id, "Fetch timed out, applying fallback");
        match action {
            FallbackAction::Placeholder(body) => self.commit(domain, &body),
            FallbackAction::Error(message) => {
                if let Some(flags) = self.flags_mut(domain) {
                    flags.fail(message);
                }
            }
            FallbackAction::Nothing => {
                if let Some(flags) = self.flags_mut(domain) {
                    flags.stop();
                }
            }
        }
    }

    fn snapshot(&self) -> ReportsSnapshot {
        ReportsSnapshot {
            reports: Arc::clone(&self.reports),
            subjects: Arc::clone(&self.subjects),
            page: self.cursor.state(Domain::REPORTS),
            filters: self.filters.clone(),
            loading: self.list.loading,
            error: self.list.error.clone(),
            selected: self.selected.clone(),
        }
    }
}

/// State container for the report moderation screens.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ReportsStore {
    inner: Arc<RwLock<Inner>>,
    api: Arc<dyn ReportsApi>,
    fetch_timeout: Duration,
}

impl ReportsStore {
    /// Build a store. It does nothing until [`ReportsStore::init`] is called.
    pub fn new(
        api: Arc<dyn ReportsApi>,
        policy: Arc<dyn FallbackPolicy>,
        options: StoreOptions,
    ) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner::new(policy, options.page_limit))),
            api,
            fetch_timeout: options.fetch_timeout,
        }
    }

    /// Activate the store with empty state. Calling it again is a no-op.
    pub async fn init(&self) {
        let mut inner = self.inner.write().await;
        if !inner.active {
            inner.reset();
            inner.active = true;
            debug!("Reports store initialized");
        }
    }

    /// Cancel timers, drop all state and deactivate. Fetches still in
    /// flight complete as stale.
    pub async fn dispose(&self) {
        let mut inner = self.inner.write().await;
        inner.reset();
        inner.active = false;
        debug!("Reports store disposed");
    }

    pub async fn snapshot(&self) -> ReportsSnapshot {
        self.inner.read().await.snapshot()
    }

    /// Show `page` of the subject list with `limit` rows, fetching when
    /// needed, and return the resulting subjects and page state.
    pub async fn get_reported_subjects(
        &self,
        page: u32,
        limit: u32,
    ) -> (Arc<Vec<ReportedSubjectSummary>>, PageState, FetchOutcome) {
        let mode = {
            let mut inner = self.inner.write().await;
            let limit_changed = inner.cursor.set_limit(Domain::REPORTS, limit).is_some();
            let page_changed = inner.cursor.set_page(Domain::REPORTS, page).is_some();
            if limit_changed || page_changed {
                FetchMode::Supersede
            } else {
                FetchMode::SingleFlight
            }
        };

        let outcome = self.fetch_list(mode).await;
        let inner = self.inner.read().await;
        (
            Arc::clone(&inner.subjects),
            inner.cursor.state(Domain::REPORTS),
            outcome,
        )
    }

    /// Refetch the current page. Collapses into a fetch already in flight.
    pub async fn refresh(&self) -> FetchOutcome {
        self.fetch_list(FetchMode::SingleFlight).await
    }

    /// Move to `page` and fetch it. No fetch when it is already current.
    pub async fn set_page(&self, page: u32) -> FetchOutcome {
        let changed = {
            let mut inner = self.inner.write().await;
            if !inner.active {
                return FetchOutcome::Inactive;
            }
            inner.cursor.set_page(Domain::REPORTS, page).is_some()
        };
        if !changed {
            return FetchOutcome::Unchanged;
        }
        self.fetch_list(FetchMode::Supersede).await
    }

    /// Replace the list filters, go back to the first page and fetch.
    pub async fn set_filters(&self, filters: ReportFilters) -> FetchOutcome {
        {
            let mut inner = self.inner.write().await;
            if !inner.active {
                return FetchOutcome::Inactive;
            }
            if inner.filters == filters {
                return FetchOutcome::Unchanged;
            }
            inner.filters = filters;
            inner.cursor.set_page(Domain::REPORTS, 1);
        }
        self.fetch_list(FetchMode::Supersede).await
    }

    async fn fetch_list(&self, mode: FetchMode) -> FetchOutcome {
        let (id, query) = {
            let mut inner = self.inner.write().await;
            if !inner.active {
                return FetchOutcome::Inactive;
            }
            let id = match mode {
                FetchMode::SingleFlight => match inner.controller.begin_fetch(Domain::REPORTS) {
                    Ok(id) => id,
                    Err(_) => return FetchOutcome::Rejected,
                },
                FetchMode::Supersede => inner.controller.supersede(Domain::REPORTS),
            };
            inner.list.start();
            self.arm_timeout(&mut inner, Domain::REPORTS, id);
            (id, inner.report_query())
        };

        debug!(request_id = %id, page = query.page, limit = query.limit, "Fetching report list");
        let result = self.api.list_reports(&query).await;
        self.finish(Domain::REPORTS, id, result).await
    }

    /// Select a subject and fetch its reports. Selecting the subject whose
    /// reports are already loading does not send a second request.
    pub async fn select_subject(&self, subject_id: &str) -> Result<FetchOutcome, ActionError> {
        let subject_id = require_id(subject_id, ValidationError::EmptySubjectId)?.to_string();

        let id = {
            let mut inner = self.inner.write().await;
            if !inner.active {
                return Err(ActionError::Inactive);
            }
            let same_subject = inner
                .selected
                .as_ref()
                .is_some_and(|detail| detail.subject_id == subject_id);

            let id = if same_subject {
                match inner.controller.begin_fetch(Domain::SUBJECT_REPORTS) {
                    Ok(id) => id,
                    Err(_) => return Ok(FetchOutcome::Rejected),
                }
            } else {
                inner.selected = Some(SubjectDetail {
                    subject_id: subject_id.clone(),
                    reports: Arc::new(Vec::new()),
                    flags: DomainFlags::default(),
                });
                inner.controller.supersede(Domain::SUBJECT_REPORTS)
            };
            if let Some(flags) = inner.flags_mut(Domain::SUBJECT_REPORTS) {
                flags.start();
            }
            self.arm_timeout(&mut inner, Domain::SUBJECT_REPORTS, id);
            id
        };

        debug!(request_id = %id, subject_id = %subject_id, "Fetching subject reports");
        let result = self.api.list_subject_reports(&subject_id).await;
        Ok(self.finish(Domain::SUBJECT_REPORTS, id, result).await)
    }

    /// Drop the selection. A detail fetch still in flight becomes stale.
    pub async fn clear_selection(&self) {
        let mut inner = self.inner.write().await;
        inner.controller.invalidate(Domain::SUBJECT_REPORTS);
        inner.selected = None;
    }

    /// Commit or drop a finished fetch, depending on whether it is still
    /// the domain's latest.
    async fn finish(
        &self,
        domain: Domain,
        id: RequestId,
        result: anyhow::Result<Value>,
    ) -> FetchOutcome {
        let mut inner = self.inner.write().await;
        if inner.controller.complete_fetch(id, domain) == Completion::Stale {
            return FetchOutcome::Stale;
        }

        match result {
            Ok(body) => {
                inner.commit(domain, &body);
                FetchOutcome::Committed
            }
            Err(e) => {
                warn!(domain = %domain, request_id = %id, error = %e, "Fetch failed");
                let message = e.to_string();
                if let Some(flags) = inner.flags_mut(domain) {
                    flags.fail(message.clone());
                }
                FetchOutcome::Failed(message)
            }
        }
    }

    /// Spawn the timer for a fetch and hand its abort handle to the
    /// controller, which cancels it when the fetch ends first.
    fn arm_timeout(&self, inner: &mut Inner, domain: Domain, id: RequestId) {
        let state = Arc::clone(&self.inner);
        let timeout = self.fetch_timeout;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            state.write().await.apply_timeout(domain, id);
        });
        inner
            .controller
            .attach_timeout(domain, id, handle.abort_handle());
    }

    /// Update a report's notes and/or status.
    ///
    /// Non-empty notes mark the report reviewed and cleared notes mark it
    /// pending; the rule is applied before sending.
    pub async fn update_report(&self, report_id: &str, patch: ReportPatch) -> Result<(), ActionError> {
        let report_id = require_id(report_id, ValidationError::EmptyReportId)?.to_string();
        let patch = patch.prepare()?;
        self.ensure_active().await?;

        if let Err(e) = self.api.update_report(&report_id, &patch).await {
            return Err(self.action_failed("update", e).await);
        }

        let mut inner = self.inner.write().await;
        if inner.reports.iter().any(|r| r.id == report_id) {
            let updated: Vec<NormalizedReport> = inner
                .reports
                .iter()
                .map(|r| if r.id == report_id { patch.apply_to(r) } else { r.clone() })
                .collect();
            inner.replace_reports(updated);
        }
        if let Some(detail) = inner.selected.as_mut() {
            if detail.reports.iter().any(|r| r.id == report_id) {
                let updated: Vec<NormalizedReport> = detail
                    .reports
                    .iter()
                    .map(|r| if r.id == report_id { patch.apply_to(r) } else { r.clone() })
                    .collect();
                detail.reports = Arc::new(updated);
            }
        }
        info!(report_id = %report_id, status = ?patch.status, "Report updated");
        Ok(())
    }

    /// Delete a report. A subject whose only report this was disappears
    /// from the summary list.
    pub async fn remove_report(&self, report_id: &str) -> Result<(), ActionError> {
        let report_id = require_id(report_id, ValidationError::EmptyReportId)?.to_string();
        self.ensure_active().await?;

        if let Err(e) = self.api.delete_report(&report_id).await {
            return Err(self.action_failed("delete", e).await);
        }

        let mut inner = self.inner.write().await;
        if inner.reports.iter().any(|r| r.id == report_id) {
            let remaining: Vec<NormalizedReport> = inner
                .reports
                .iter()
                .filter(|r| r.id != report_id)
                .cloned()
                .collect();
            inner.replace_reports(remaining);

            let state = inner.cursor.state(Domain::REPORTS);
            inner.cursor.apply_server_pagination(
                Domain::REPORTS,
                PaginationMeta {
                    total: Some(state.total.saturating_sub(1)),
                    ..PaginationMeta::default()
                },
            );
        }
        if let Some(detail) = inner.selected.as_mut() {
            if detail.reports.iter().any(|r| r.id == report_id) {
                let remaining: Vec<NormalizedReport> = detail
                    .reports
                    .iter()
                    .filter(|r| r.id != report_id)
                    .cloned()
                    .collect();
                detail.reports = Arc::new(remaining);
            }
        }
        info!(report_id = %report_id, "Report removed");
        Ok(())
    }

    /// Block a subject. On success its summary turns `blocked` locally;
    /// the block is kept across later list refreshes.
    pub async fn block_subject(&self, subject_id: &str, reason: &str) -> Result<(), ActionError> {
        let subject_id = require_id(subject_id, ValidationError::EmptySubjectId)?.to_string();
        self.ensure_active().await?;

        if let Err(e) = self.api.block_subject(&subject_id, reason.trim()).await {
            return Err(self.action_failed("block", e).await);
        }

        let mut inner = self.inner.write().await;
        inner.blocked.insert(subject_id.clone());
        let subjects = apply_blocks(inner.subjects.as_ref().clone(), &inner.blocked);
        inner.subjects = Arc::new(subjects);
        info!(subject_id = %subject_id, "Subject blocked");
        Ok(())
    }

    async fn ensure_active(&self) -> Result<(), ActionError> {
        if self.inner.read().await.active {
            Ok(())
        } else {
            Err(ActionError::Inactive)
        }
    }

    /// Record a failed action as the list's error and convert it.
    async fn action_failed(&self, action: &str, e: anyhow::Error) -> ActionError {
        warn!(action = action, error = %e, "Report action failed");
        let message = e.to_string();
        self.inner.write().await.list.error = Some(message.clone());
        ActionError::Network(message)
    }
}

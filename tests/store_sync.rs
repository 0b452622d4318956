// Store tests: request lifecycle, pagination and report actions driven
// through `ReportsStore` against an in-process fake API.
//
// Responses can be scripted as immediately ready or gated behind a
// oneshot channel, so tests decide the order in which fetches complete.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::oneshot;

use arena_admin::api::traits::{ReportQuery, ReportsApi};
use arena_admin::reports::models::{ReportFilters, ReportStatus, SubjectStatus};
use arena_admin::reports::patch::{ReportPatch, ValidationError};
use arena_admin::store::{ActionError, FetchOutcome, ReportsStore, StoreOptions};
use arena_admin::sync::fallback::{ErrorFallback, FallbackPolicy, NoopFallback, PlaceholderFallback};

// ============================================================
// Fake API
// ============================================================

enum Scripted {
    Ready(std::result::Result<Value, String>),
    Gated(oneshot::Receiver<Value>),
}

#[derive(Default)]
struct FakeApi {
    list_queries: Mutex<Vec<ReportQuery>>,
    list_script: Mutex<VecDeque<Scripted>>,
    subject_calls: Mutex<Vec<String>>,
    subject_script: Mutex<VecDeque<Scripted>>,
    updates: Mutex<Vec<(String, ReportPatch)>>,
    deletes: Mutex<Vec<String>>,
    blocks: Mutex<Vec<(String, String)>>,
    fail_actions: AtomicBool,
}

impl FakeApi {
    fn push_list(&self, body: Value) {
        self.list_script
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(Ok(body)));
    }

    fn push_list_error(&self, message: &str) {
        self.list_script
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(Err(message.to_string())));
    }

    fn push_list_gated(&self) -> oneshot::Sender<Value> {
        let (tx, rx) = oneshot::channel();
        self.list_script
            .lock()
            .unwrap()
            .push_back(Scripted::Gated(rx));
        tx
    }

    fn push_subject(&self, body: Value) {
        self.subject_script
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(Ok(body)));
    }

    fn list_queries(&self) -> Vec<ReportQuery> {
        self.list_queries.lock().unwrap().clone()
    }

    async fn play(script: Option<Scripted>) -> Result<Value> {
        match script {
            Some(Scripted::Ready(result)) => {
                // Behave like a real network call: suspend at least once.
                tokio::task::yield_now().await;
                result.map_err(|message| anyhow::anyhow!(message))
            }
            Some(Scripted::Gated(rx)) => rx.await.map_err(|_| anyhow::anyhow!("gate dropped")),
            None => {
                tokio::task::yield_now().await;
                Ok(json!({ "data": [] }))
            }
        }
    }

    fn action_result(&self) -> Result<()> {
        if self.fail_actions.load(Ordering::SeqCst) {
            anyhow::bail!("server unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl ReportsApi for FakeApi {
    async fn list_reports(&self, query: &ReportQuery) -> Result<Value> {
        self.list_queries.lock().unwrap().push(query.clone());
        let script = self.list_script.lock().unwrap().pop_front();
        Self::play(script).await
    }

    async fn list_subject_reports(&self, subject_id: &str) -> Result<Value> {
        self.subject_calls.lock().unwrap().push(subject_id.to_string());
        let script = self.subject_script.lock().unwrap().pop_front();
        Self::play(script).await
    }

    async fn update_report(&self, report_id: &str, patch: &ReportPatch) -> Result<()> {
        self.action_result()?;
        self.updates
            .lock()
            .unwrap()
            .push((report_id.to_string(), patch.clone()));
        Ok(())
    }

    async fn delete_report(&self, report_id: &str) -> Result<()> {
        self.action_result()?;
        self.deletes.lock().unwrap().push(report_id.to_string());
        Ok(())
    }

    async fn block_subject(&self, subject_id: &str, reason: &str) -> Result<()> {
        self.action_result()?;
        self.blocks
            .lock()
            .unwrap()
            .push((subject_id.to_string(), reason.to_string()));
        Ok(())
    }
}

// ============================================================
// Helpers
// ============================================================

async fn store_with(api: &Arc<FakeApi>, policy: Arc<dyn FallbackPolicy>) -> ReportsStore {
    let store = ReportsStore::new(api.clone(), policy, StoreOptions::default());
    store.init().await;
    store
}

async fn store(api: &Arc<FakeApi>) -> ReportsStore {
    store_with(api, Arc::new(ErrorFallback)).await
}

/// Let spawned tasks run until the fake has seen `n` list calls.
async fn wait_for_list_calls(api: &FakeApi, n: usize) {
    for _ in 0..1000 {
        if api.list_queries().len() >= n {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("expected {n} list calls, saw {}", api.list_queries().len());
}

fn report(id: &str, reported: &str, reporter: &str, date: &str) -> Value {
    json!({
        "id": id,
        "reporter_id": reporter,
        "reporter_username": format!("{reporter}-user"),
        "reported_id": reported,
        "reported_username": format!("{reported}-user"),
        "report_date": date,
        "report_reason": "spam",
        "status": "pending"
    })
}

fn page_body(records: Vec<Value>, total: u64) -> Value {
    json!({ "data": records, "total": total, "limit": 10 })
}

// ============================================================
// Lifecycle
// ============================================================

#[tokio::test]
async fn store_does_nothing_before_init() {
    let api = Arc::new(FakeApi::default());
    let store = ReportsStore::new(api.clone(), Arc::new(NoopFallback), StoreOptions::default());
    assert_eq!(store.refresh().await, FetchOutcome::Inactive);
    assert!(api.list_queries().is_empty());
}

#[tokio::test]
async fn refresh_commits_normalized_and_aggregated_data() {
    let api = Arc::new(FakeApi::default());
    api.push_list(page_body(
        vec![
            report("r1", "A", "x", "2024-01-01T00:00:00Z"),
            report("r2", "B", "x", "2024-01-02T00:00:00Z"),
            report("r3", "A", "y", "2024-03-01T00:00:00Z"),
        ],
        3,
    ));
    let store = store(&api).await;

    assert_eq!(store.refresh().await, FetchOutcome::Committed);

    let snapshot = store.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.reports.len(), 3);
    assert_eq!(snapshot.subjects.len(), 2);
    assert_eq!(snapshot.subjects[0].id, "A");
    assert_eq!(snapshot.subjects[0].report_count, 2);
    assert_eq!(snapshot.subjects[0].latest_report_id, "r3");
}

#[tokio::test]
async fn only_latest_fetch_commits() {
    let api = Arc::new(FakeApi::default());
    let gate1 = api.push_list_gated();
    let gate2 = api.push_list_gated();
    let store = store(&api).await;

    let r1 = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    wait_for_list_calls(&api, 1).await;

    let r2 = tokio::spawn({
        let store = store.clone();
        async move { store.set_page(2).await }
    });
    wait_for_list_calls(&api, 2).await;

    let before = store.snapshot().await;
    gate1
        .send(page_body(vec![report("old", "A", "x", "2024-01-01")], 1))
        .unwrap();
    assert_eq!(r1.await.unwrap(), FetchOutcome::Stale);
    assert_eq!(store.snapshot().await, before);

    gate2
        .send(page_body(vec![report("new", "B", "x", "2024-01-01")], 11))
        .unwrap();
    assert_eq!(r2.await.unwrap(), FetchOutcome::Committed);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.reports.len(), 1);
    assert_eq!(snapshot.reports[0].id, "new");
    assert_eq!(snapshot.page.page, 2);
    assert_eq!(snapshot.page.total_pages, 2);
}

#[tokio::test]
async fn duplicate_refresh_sends_one_request() {
    let api = Arc::new(FakeApi::default());
    api.push_list(page_body(vec![report("r1", "A", "x", "2024-01-01")], 1));
    let store = store(&api).await;

    let (first, second) = tokio::join!(store.refresh(), store.refresh());

    assert_eq!(first, FetchOutcome::Committed);
    assert_eq!(second, FetchOutcome::Rejected);
    assert_eq!(api.list_queries().len(), 1);
}

#[tokio::test]
async fn failed_fetch_sets_domain_error() {
    let api = Arc::new(FakeApi::default());
    api.push_list_error("connection refused");
    let store = store(&api).await;

    assert_eq!(
        store.refresh().await,
        FetchOutcome::Failed("connection refused".to_string())
    );
    let snapshot = store.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error.as_deref(), Some("connection refused"));

    // Manual retry clears the error.
    api.push_list(page_body(vec![], 0));
    assert_eq!(store.refresh().await, FetchOutcome::Committed);
    assert_eq!(store.snapshot().await.error, None);
}

#[tokio::test(start_paused = true)]
async fn timeout_applies_error_fallback_and_ignores_late_response() {
    let api = Arc::new(FakeApi::default());
    let gate = api.push_list_gated();
    let store = store(&api).await;

    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    tokio::time::sleep(Duration::from_secs(11)).await;

    let snapshot = store.snapshot().await;
    assert!(!snapshot.loading);
    assert!(snapshot.error.unwrap().contains("timed out"));

    gate.send(page_body(vec![report("late", "A", "x", "2024-01-01")], 1))
        .unwrap();
    assert_eq!(fetch.await.unwrap(), FetchOutcome::Stale);
    assert!(store.snapshot().await.reports.is_empty());
}

#[tokio::test(start_paused = true)]
async fn timeout_with_placeholder_policy_shows_sample_data() {
    let api = Arc::new(FakeApi::default());
    let _gate = api.push_list_gated();
    let store = store_with(&api, Arc::new(PlaceholderFallback::development())).await;

    let _fetch = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    tokio::time::sleep(Duration::from_secs(11)).await;

    let snapshot = store.snapshot().await;
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.reports.len(), 3);
    assert_eq!(snapshot.subjects.len(), 2);

    let repeat = &snapshot.subjects[0];
    assert_eq!(repeat.id, "u-2001");
    assert_eq!(repeat.report_count, 2);
    assert_eq!(repeat.latest_report_id, "sample-2");
    assert_eq!(repeat.reporter_username.as_deref(), Some("elif"));
    assert_eq!(snapshot.subjects[1].username, "deniz");
}

#[tokio::test(start_paused = true)]
async fn completed_fetch_cancels_its_timer() {
    let api = Arc::new(FakeApi::default());
    api.push_list(page_body(vec![report("r1", "A", "x", "2024-01-01")], 1));
    let store = store(&api).await;

    assert_eq!(store.refresh().await, FetchOutcome::Committed);
    tokio::time::sleep(Duration::from_secs(30)).await;

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.error, None);
    assert_eq!(snapshot.reports.len(), 1);
}

#[tokio::test]
async fn dispose_makes_in_flight_fetch_stale() {
    let api = Arc::new(FakeApi::default());
    let gate = api.push_list_gated();
    let store = store(&api).await;

    let fetch = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    wait_for_list_calls(&api, 1).await;

    store.dispose().await;
    gate.send(page_body(vec![report("r1", "A", "x", "2024-01-01")], 1))
        .unwrap();
    assert_eq!(fetch.await.unwrap(), FetchOutcome::Stale);
    assert!(store.snapshot().await.reports.is_empty());
    assert_eq!(store.refresh().await, FetchOutcome::Inactive);
}

// ============================================================
// Pagination
// ============================================================

#[tokio::test]
async fn set_page_fetches_exactly_once() {
    let api = Arc::new(FakeApi::default());
    api.push_list(page_body(vec![report("r1", "A", "x", "2024-01-01")], 45));
    let store = store(&api).await;

    assert_eq!(store.set_page(3).await, FetchOutcome::Committed);
    assert_eq!(store.set_page(3).await, FetchOutcome::Unchanged);

    let queries = api.list_queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].page, 3);
    assert_eq!(queries[0].limit, 10);

    let page = store.snapshot().await.page;
    assert_eq!(page.page, 3);
    assert_eq!(page.total, 45);
    assert_eq!(page.total_pages, 5);
}

#[tokio::test]
async fn get_reported_subjects_returns_page_state() {
    let api = Arc::new(FakeApi::default());
    api.push_list(json!({
        "data": {
            "data": [report("r1", "A", "x", "2024-01-01")],
            "total": 21, "page": 2, "limit": 20, "pages": 2
        }
    }));
    let store = store(&api).await;

    let (subjects, page, outcome) = store.get_reported_subjects(2, 20).await;

    assert_eq!(outcome, FetchOutcome::Committed);
    assert_eq!(subjects.len(), 1);
    assert_eq!(page.page, 2);
    assert_eq!(page.limit, 20);
    assert_eq!(page.total_pages, 2);
    assert_eq!(api.list_queries()[0].page, 2);
    assert_eq!(api.list_queries()[0].limit, 20);
}

#[tokio::test]
async fn filters_are_sent_and_reset_page() {
    let api = Arc::new(FakeApi::default());
    let store = store(&api).await;
    store.set_page(4).await;

    let filters = ReportFilters {
        status: Some(ReportStatus::Pending),
        search: Some("jane".to_string()),
    };
    assert_eq!(store.set_filters(filters.clone()).await, FetchOutcome::Committed);
    assert_eq!(store.set_filters(filters.clone()).await, FetchOutcome::Unchanged);

    let queries = api.list_queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].page, 1);
    assert_eq!(queries[1].filters, filters);
}

// ============================================================
// Actions
// ============================================================

#[tokio::test]
async fn admin_notes_drive_report_status() {
    let api = Arc::new(FakeApi::default());
    api.push_list(page_body(vec![report("r1", "A", "x", "2024-01-01")], 1));
    let store = store(&api).await;
    store.refresh().await;

    store
        .update_report("r1", ReportPatch::notes("checked"))
        .await
        .unwrap();
    let stored = store.snapshot().await.reports[0].clone();
    assert_eq!(stored.status, ReportStatus::Reviewed);
    assert_eq!(stored.admin_notes.as_deref(), Some("checked"));

    store.update_report("r1", ReportPatch::notes("")).await.unwrap();
    let stored = store.snapshot().await.reports[0].clone();
    assert_eq!(stored.status, ReportStatus::Pending);
    assert_eq!(stored.admin_notes, None);

    let updates = api.updates.lock().unwrap().clone();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].1.status, Some(ReportStatus::Reviewed));
    assert_eq!(updates[1].1.status, Some(ReportStatus::Pending));
}

#[tokio::test]
async fn empty_report_id_is_rejected_before_dispatch() {
    let api = Arc::new(FakeApi::default());
    let store = store(&api).await;

    let err = store
        .update_report("  ", ReportPatch::notes("x"))
        .await
        .unwrap_err();
    assert_eq!(err, ActionError::Validation(ValidationError::EmptyReportId));

    let err = store.remove_report("").await.unwrap_err();
    assert_eq!(err, ActionError::Validation(ValidationError::EmptyReportId));

    assert!(api.updates.lock().unwrap().is_empty());
    assert!(api.deletes.lock().unwrap().is_empty());
}

#[tokio::test]
async fn failed_action_surfaces_error() {
    let api = Arc::new(FakeApi::default());
    api.push_list(page_body(vec![report("r1", "A", "x", "2024-01-01")], 1));
    let store = store(&api).await;
    store.refresh().await;
    api.fail_actions.store(true, Ordering::SeqCst);

    let err = store
        .update_report("r1", ReportPatch::notes("checked"))
        .await
        .unwrap_err();
    assert!(matches!(err, ActionError::Network(_)));

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.error.as_deref(), Some("server unavailable"));
    assert_eq!(snapshot.reports[0].status, ReportStatus::Pending);
}

#[tokio::test]
async fn removing_only_report_removes_subject() {
    let api = Arc::new(FakeApi::default());
    api.push_list(page_body(
        vec![
            report("r1", "A", "x", "2024-01-01"),
            report("r2", "B", "x", "2024-01-02"),
            report("r3", "B", "y", "2024-01-03"),
        ],
        3,
    ));
    let store = store(&api).await;
    store.refresh().await;
    let before = store.snapshot().await;

    store.remove_report("r1").await.unwrap();
    store.remove_report("r3").await.unwrap();

    let after = store.snapshot().await;
    assert_eq!(after.subjects.len(), 1);
    assert_eq!(after.subjects[0].id, "B");
    assert_eq!(after.subjects[0].report_count, 1);
    assert_eq!(after.subjects[0].latest_report_id, "r2");
    assert_eq!(after.page.total, 1);

    // The earlier snapshot still sees the collections it was taken with.
    assert_eq!(before.subjects.len(), 2);
    assert_eq!(before.reports.len(), 3);
}

#[tokio::test]
async fn block_survives_refresh() {
    let api = Arc::new(FakeApi::default());
    let body = page_body(
        vec![
            report("r1", "A", "x", "2024-01-01"),
            report("r2", "B", "x", "2024-01-02"),
        ],
        2,
    );
    api.push_list(body.clone());
    api.push_list(body);
    let store = store(&api).await;
    store.refresh().await;

    store.block_subject("B", " harassment ").await.unwrap();
    assert_eq!(api.list_queries().len(), 1);
    assert_eq!(
        api.blocks.lock().unwrap()[0],
        ("B".to_string(), "harassment".to_string())
    );

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.subjects[0].status, SubjectStatus::Active);
    assert_eq!(snapshot.subjects[1].status, SubjectStatus::Blocked);

    store.refresh().await;
    assert_eq!(
        store.snapshot().await.subjects[1].status,
        SubjectStatus::Blocked
    );
}

#[tokio::test]
async fn select_subject_loads_detail() {
    let api = Arc::new(FakeApi::default());
    api.push_subject(json!([
        report("r1", "A", "x", "2024-01-01"),
        { "reporterId": "y", "reportedId": "A", "reason": "abuse", "reviewed": true }
    ]));
    let store = store(&api).await;

    assert_eq!(
        store.select_subject("A").await.unwrap(),
        FetchOutcome::Committed
    );

    let detail = store.snapshot().await.selected.unwrap();
    assert_eq!(detail.subject_id, "A");
    assert_eq!(detail.reports.len(), 2);
    assert_eq!(detail.reports[1].status, ReportStatus::Reviewed);
    assert!(!detail.flags.loading);

    assert_eq!(
        store.select_subject(" ").await.unwrap_err(),
        ActionError::Validation(ValidationError::EmptySubjectId)
    );

    store.clear_selection().await;
    assert!(store.snapshot().await.selected.is_none());
}

#[tokio::test]
async fn detail_and_list_domains_are_independent() {
    let api = Arc::new(FakeApi::default());
    let gate = api.push_list_gated();
    api.push_subject(json!({ "data": [report("d1", "Z", "x", "2024-01-01")] }));
    let store = store(&api).await;

    let list = tokio::spawn({
        let store = store.clone();
        async move { store.refresh().await }
    });
    wait_for_list_calls(&api, 1).await;

    assert_eq!(
        store.select_subject("Z").await.unwrap(),
        FetchOutcome::Committed
    );
    assert!(store.snapshot().await.loading);

    gate.send(page_body(vec![report("r1", "A", "x", "2024-01-01")], 1))
        .unwrap();
    assert_eq!(list.await.unwrap(), FetchOutcome::Committed);

    let snapshot = store.snapshot().await;
    assert_eq!(snapshot.reports.len(), 1);
    assert_eq!(snapshot.selected.unwrap().reports[0].id, "d1");
}

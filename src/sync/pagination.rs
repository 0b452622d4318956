// Pagination cursor: page/limit/total bookkeeping per data domain.
//
// The cursor only decides *whether* a page change needs a fetch and what
// page/limit to ask for. Issuing the fetch is the store's job.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use super::lifecycle::Domain;

/// Page size used when neither config nor server supplies one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Pagination metadata as found in a response. Every field is optional
/// because servers omit different parts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationMeta {
    pub total: Option<u64>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub total_pages: Option<u32>,
}

impl PaginationMeta {
    /// Fill every missing field from `fallback`.
    pub fn or(self, fallback: PaginationMeta) -> PaginationMeta {
        PaginationMeta {
            total: self.total.or(fallback.total),
            page: self.page.or(fallback.page),
            limit: self.limit.or(fallback.limit),
            total_pages: self.total_pages.or(fallback.total_pages),
        }
    }
}

/// Current pagination of one domain. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageState {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl PageState {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit,
            total: 0,
            total_pages: 0,
        }
    }
}

/// The page to request next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

/// `ceil(total / limit)`. A zero limit means "everything on one page".
pub fn total_pages(total: u64, limit: u32) -> u32 {
    if limit == 0 {
        return u32::from(total > 0);
    }
    u32::try_from(total.div_ceil(u64::from(limit))).unwrap_or(u32::MAX)
}

/// Page state for every domain that paginates.
#[derive(Debug, Clone)]
pub struct PaginationCursor {
    default_limit: u32,
    states: HashMap<Domain, PageState>,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_LIMIT)
    }
}

impl PaginationCursor {
    pub fn new(default_limit: u32) -> Self {
        Self {
            default_limit: default_limit.max(1),
            states: HashMap::new(),
        }
    }

    /// Current state of a domain (a fresh first page if never touched).
    pub fn state(&self, domain: Domain) -> PageState {
        self.states
            .get(&domain)
            .copied()
            .unwrap_or_else(|| PageState::new(self.default_limit))
    }

    /// The query for the domain's current page.
    pub fn query(&self, domain: Domain) -> PageQuery {
        let state = self.state(domain);
        PageQuery {
            page: state.page,
            limit: state.limit,
        }
    }

    /// Move to `page`. Returns the query to fetch, or `None` when the page
    /// is already current and no fetch is needed.
    pub fn set_page(&mut self, domain: Domain, page: u32) -> Option<PageQuery> {
        let page = page.max(1);
        let default_limit = self.default_limit;
        let state = self
            .states
            .entry(domain)
            .or_insert_with(|| PageState::new(default_limit));

        if state.page == page {
            debug!(domain = %domain, page, "Page unchanged, skipping fetch");
            return None;
        }

        state.page = page;
        Some(PageQuery {
            page,
            limit: state.limit,
        })
    }

    /// Change the page size. Returns to the first page when the size
    /// actually changes; `None` means nothing changed.
    pub fn set_limit(&mut self, domain: Domain, limit: u32) -> Option<PageQuery> {
        let limit = limit.max(1);
        let default_limit = self.default_limit;
        let state = self
            .states
            .entry(domain)
            .or_insert_with(|| PageState::new(default_limit));

        if state.limit == limit {
            return None;
        }

        state.limit = limit;
        state.page = 1;
        state.total_pages = total_pages(state.total, limit);
        Some(PageQuery { page: 1, limit })
    }

    /// Take the server's view of total/limit/page count, computing the page
    /// count when the server leaves it out.
    pub fn apply_server_pagination(&mut self, domain: Domain, meta: PaginationMeta) -> PageState {
        let default_limit = self.default_limit;
        let state = self
            .states
            .entry(domain)
            .or_insert_with(|| PageState::new(default_limit));

        if let Some(total) = meta.total {
            state.total = total;
        }
        if let Some(limit) = meta.limit.filter(|limit| *limit > 0) {
            state.limit = limit;
        }
        if let Some(page) = meta.page.filter(|page| *page > 0) {
            state.page = page;
        }
        state.total_pages = meta
            .total_pages
            .unwrap_or_else(|| total_pages(state.total, state.limit));

        *state
    }

    /// Forget every domain's state.
    pub fn reset(&mut self) {
        self.states.clear();
    }
}

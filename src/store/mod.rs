// Client-side state containers.
//
// A store is constructed explicitly with its API and fallback policy and
// has an `init` / `dispose` lifecycle, so every test (and every screen)
// gets an isolated instance instead of a shared global.

pub mod reports;

use thiserror::Error;

use crate::reports::patch::ValidationError;

pub use reports::{ReportsSnapshot, ReportsStore, StoreOptions, SubjectDetail};

/// Result of asking a store to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was current and is now the domain's state.
    Committed,
    /// A fetch for the domain was already in flight; nothing was sent.
    Rejected,
    /// The response arrived after being superseded, timed out or disposed,
    /// and was dropped.
    Stale,
    /// The request failed; the message is also the domain's error.
    Failed(String),
    /// Nothing changed, so nothing was fetched.
    Unchanged,
    /// The store has not been initialized or was disposed.
    Inactive,
}

/// Why a mutating action did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Rejected locally; nothing was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// The request failed; the message is also the domain's error.
    #[error("{0}")]
    Network(String),
    #[error("store is not initialized")]
    Inactive,
}

/// Loading flag and error of one domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainFlags {
    pub loading: bool,
    pub error: Option<String>,
}

impl DomainFlags {
    fn start(&mut self) {
        self.loading = true;
    }

    fn succeed(&mut self) {
        self.loading = false;
        self.error = None;
    }

    fn fail(&mut self, message: String) {
        self.loading = false;
        self.error = Some(message);
    }

    fn stop(&mut self) {
        self.loading = false;
    }
}

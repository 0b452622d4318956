// Request lifecycle controller: which fetch is allowed to touch state.
//
// Every fetch gets a monotonically increasing id, recorded as the
// domain's `last_issued`. A completing fetch may commit only if its id is
// still `last_issued` and the domain is still pending; anything else is
// stale and dropped. Duplicate triggers while a fetch is in flight are
// rejected (single-flight); a parameter change supersedes the in-flight
// fetch instead.
//
// The controller itself is synchronous bookkeeping. The store drives it
// from async code and owns the timer tasks, handing their abort handles
// in here so completion can cancel them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tokio::task::AbortHandle;
use tracing::debug;

use super::fallback::{FallbackAction, FallbackPolicy};

/// A logical data domain such as `reports`. Each domain has its own
/// in-flight fetch, page state and error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Domain(&'static str);

impl Domain {
    /// The paginated reported-subject list.
    pub const REPORTS: Domain = Domain("reports");
    /// The report list of the currently selected subject.
    pub const SUBJECT_REPORTS: Domain = Domain("subjectReports");

    pub const fn new(name: &'static str) -> Self {
        Domain(name)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Monotonic fetch token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a fetch ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Pending,
    Resolved,
    Stale,
    TimedOut,
}

/// Coarse state of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainPhase {
    Idle,
    Pending,
}

/// A fetch the controller has issued and not yet terminated.
pub struct FetchRequest {
    pub id: RequestId,
    pub domain: Domain,
    timeout_handle: Option<AbortHandle>,
}

impl FetchRequest {
    /// Cancel the timer (if any) and log how the fetch ended.
    fn terminate(mut self, status: FetchStatus) -> FetchStatus {
        if let Some(handle) = self.timeout_handle.take() {
            handle.abort();
        }
        debug!(
            domain = %self.domain,
            request_id = %self.id,
            status = ?status,
            "Fetch terminated"
        );
        status
    }
}

impl fmt::Debug for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchRequest")
            .field("id", &self.id)
            .field("domain", &self.domain)
            .field("has_timer", &self.timeout_handle.is_some())
            .finish()
    }
}

/// `begin_fetch` refused because the domain already has a fetch in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{domain} already has request {in_flight} in flight")]
pub struct AlreadyPending {
    pub domain: Domain,
    pub in_flight: RequestId,
}

/// Verdict for a completing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The fetch is current: commit its result.
    Commit,
    /// Superseded or timed out: drop the result without touching state.
    Stale,
}

#[derive(Default)]
struct DomainSlot {
    last_issued: Option<RequestId>,
    in_flight: Option<FetchRequest>,
    last_outcome: Option<FetchStatus>,
}

impl DomainSlot {
    /// Terminate the in-flight fetch, if any, and record how it ended.
    fn finish(&mut self, status: FetchStatus) {
        if let Some(request) = self.in_flight.take() {
            self.last_outcome = Some(request.terminate(status));
        }
    }
}

pub struct RequestLifecycleController {
    next_id: u64,
    slots: HashMap<Domain, DomainSlot>,
    policy: Arc<dyn FallbackPolicy>,
}

impl RequestLifecycleController {
    pub fn new(policy: Arc<dyn FallbackPolicy>) -> Self {
        Self {
            next_id: 0,
            slots: HashMap::new(),
            policy,
        }
    }

    /// Start a fetch unless one is already in flight for the domain.
    pub fn begin_fetch(&mut self, domain: Domain) -> Result<RequestId, AlreadyPending> {
        if let Some(in_flight) = self.in_flight(domain) {
            debug!(domain = %domain, in_flight = %in_flight, "Fetch already pending, rejecting");
            return Err(AlreadyPending { domain, in_flight });
        }
        Ok(self.issue(domain))
    }

    /// Start a fetch that replaces whatever is in flight for the domain.
    /// The replaced fetch becomes stale and its timer is cancelled.
    pub fn supersede(&mut self, domain: Domain) -> RequestId {
        self.slot_mut(domain).finish(FetchStatus::Stale);
        self.issue(domain)
    }

    fn issue(&mut self, domain: Domain) -> RequestId {
        self.next_id += 1;
        let id = RequestId(self.next_id);
        let slot = self.slot_mut(domain);
        slot.last_issued = Some(id);
        slot.in_flight = Some(FetchRequest {
            id,
            domain,
            timeout_handle: None,
        });
        debug!(domain = %domain, request_id = %id, "Fetch issued");
        id
    }

    /// Hand over the timer task for a fetch. If the fetch is no longer in
    /// flight the timer is cancelled on the spot.
    pub fn attach_timeout(&mut self, domain: Domain, id: RequestId, handle: AbortHandle) {
        match self.slot_mut(domain).in_flight.as_mut() {
            Some(request) if request.id == id => {
                if let Some(old) = request.timeout_handle.replace(handle) {
                    old.abort();
                }
            }
            _ => handle.abort(),
        }
    }

    /// Decide whether a finished fetch (success or failure) may commit.
    pub fn complete_fetch(&mut self, id: RequestId, domain: Domain) -> Completion {
        let slot = self.slot_mut(domain);
        let current = slot.last_issued == Some(id)
            && slot.in_flight.as_ref().is_some_and(|request| request.id == id);

        if !current {
            debug!(domain = %domain, request_id = %id, "Dropping stale response");
            return Completion::Stale;
        }

        slot.finish(FetchStatus::Resolved);
        Completion::Commit
    }

    /// Called by the timer task. Returns the fallback to apply, or `None`
    /// if the fetch already completed or was superseded.
    pub fn fire_timeout(&mut self, id: RequestId, domain: Domain) -> Option<FallbackAction> {
        let slot = self.slot_mut(domain);
        let current = slot.last_issued == Some(id)
            && slot.in_flight.as_ref().is_some_and(|request| request.id == id);
        if !current {
            return None;
        }

        if let Some(request) = slot.in_flight.as_mut() {
            // Called from the timer task itself, which must not abort itself.
            request.timeout_handle = None;
        }
        slot.finish(FetchStatus::TimedOut);
        Some(self.policy.on_timeout(domain))
    }

    pub fn phase(&self, domain: Domain) -> DomainPhase {
        if self.in_flight(domain).is_some() {
            DomainPhase::Pending
        } else {
            DomainPhase::Idle
        }
    }

    pub fn is_pending(&self, domain: Domain) -> bool {
        self.phase(domain) == DomainPhase::Pending
    }

    pub fn in_flight(&self, domain: Domain) -> Option<RequestId> {
        self.slots
            .get(&domain)
            .and_then(|slot| slot.in_flight.as_ref())
            .map(|request| request.id)
    }

    pub fn last_issued(&self, domain: Domain) -> Option<RequestId> {
        self.slots.get(&domain).and_then(|slot| slot.last_issued)
    }

    /// How the domain's most recent terminated fetch ended.
    pub fn last_outcome(&self, domain: Domain) -> Option<FetchStatus> {
        self.slots.get(&domain).and_then(|slot| slot.last_outcome)
    }

    /// Make every in-flight fetch of the domain stale without issuing a new
    /// one, e.g. when its data is cleared.
    pub fn invalidate(&mut self, domain: Domain) {
        if let Some(slot) = self.slots.get_mut(&domain) {
            slot.finish(FetchStatus::Stale);
        }
    }

    /// Cancel every timer and forget all domains. Outstanding fetches will
    /// complete as stale.
    pub fn dispose(&mut self) {
        for (_, slot) in self.slots.drain() {
            if let Some(request) = slot.in_flight {
                request.terminate(FetchStatus::Stale);
            }
        }
    }

    fn slot_mut(&mut self, domain: Domain) -> &mut DomainSlot {
        self.slots.entry(domain).or_default()
    }
}

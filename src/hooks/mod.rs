//! Binding layer plumbing shared by all resource hooks
//!
//! Defines the per-call query options, the settled result view returned by
//! read accessors, and the mutation state machine with caller-supplied
//! lifecycle callbacks.

mod tax_rates;

pub use tax_rates::{TaxRates, TAX_RATES_QUERY_KEYS};

use crate::Error;
use std::time::Duration;
use tokio::sync::watch;

/// Per-call configuration for read accessors
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// When false, the accessor returns an idle result without touching the
    /// cache or the network
    pub enabled: bool,

    /// Overrides the cache's configured stale time for this call
    pub stale_time: Option<Duration>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            stale_time: None,
        }
    }
}

/// Settled view of one read accessor call
///
/// Pending states exist only while the accessor's future is in flight; by the
/// time a result is returned the request has either succeeded, failed, or
/// been skipped (`enabled: false`).
#[derive(Debug)]
pub struct QueryResult<T> {
    pub data: Option<T>,
    pub error: Option<Error>,

    /// True when the data was served from the cache without a network call
    pub from_cache: bool,
}

impl<T> QueryResult<T> {
    pub(crate) fn success(data: T, from_cache: bool) -> Self {
        Self {
            data: Some(data),
            error: None,
            from_cache,
        }
    }

    pub(crate) fn failure(error: Error) -> Self {
        Self {
            data: None,
            error: Some(error),
            from_cache: false,
        }
    }

    /// Result for a call skipped via `enabled: false`
    pub(crate) fn idle() -> Self {
        Self {
            data: None,
            error: None,
            from_cache: false,
        }
    }

    pub fn is_success(&self) -> bool {
        self.data.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse into a plain `Result`, treating an idle result as an error
    pub fn into_result(self) -> crate::Result<T> {
        match (self.data, self.error) {
            (Some(data), _) => Ok(data),
            (None, Some(error)) => Err(error),
            (None, None) => Err(Error::Other("query was not enabled".to_string())),
        }
    }
}

/// Mutation lifecycle: Idle → Pending → {Success, Error}
///
/// Terminal per invocation; a new invocation resets to Pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationState {
    Idle,
    Pending,
    Success,
    Error,
}

/// Observable mutation state
///
/// Backed by a watch channel; concurrent invocations sharing a tracker each
/// drive their own transitions, and whichever settles last determines the
/// final observed state.
#[derive(Debug)]
pub struct MutationTracker {
    tx: watch::Sender<MutationState>,
}

impl MutationTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(MutationState::Idle);
        Self { tx }
    }

    pub fn state(&self) -> MutationState {
        *self.tx.borrow()
    }

    /// Watch state transitions as they happen
    pub fn subscribe(&self) -> watch::Receiver<MutationState> {
        self.tx.subscribe()
    }

    // send_replace updates the value even with no active receivers
    pub(crate) fn begin(&self) {
        self.tx.send_replace(MutationState::Pending);
    }

    pub(crate) fn succeed(&self) {
        self.tx.send_replace(MutationState::Success);
    }

    pub(crate) fn fail(&self) {
        self.tx.send_replace(MutationState::Error);
    }
}

impl Default for MutationTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Caller-supplied lifecycle callbacks for one mutation
///
/// Invoked in a fixed sequence after this layer's own invalidation side
/// effects: on_success or on_error first, on_settled last.
pub struct MutationCallbacks<T> {
    on_success: Option<Box<dyn Fn(&T) + Send + Sync>>,
    on_error: Option<Box<dyn Fn(&Error) + Send + Sync>>,
    on_settled: Option<Box<dyn Fn() + Send + Sync>>,
}

impl<T> MutationCallbacks<T> {
    pub fn new() -> Self {
        Self {
            on_success: None,
            on_error: None,
            on_settled: None,
        }
    }

    pub fn on_success(mut self, f: impl Fn(&T) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn on_settled(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_settled = Some(Box::new(f));
        self
    }

    pub(crate) fn success(&self, value: &T) {
        if let Some(f) = &self.on_success {
            f(value);
        }
    }

    pub(crate) fn error(&self, err: &Error) {
        if let Some(f) = &self.on_error {
            f(err);
        }
    }

    pub(crate) fn settled(&self) {
        if let Some(f) = &self.on_settled {
            f();
        }
    }
}

impl<T> Default for MutationCallbacks<T> {
    fn default() -> Self {
        Self::new()
    }
}

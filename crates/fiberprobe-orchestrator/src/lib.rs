//! Cancellable, fixed-delay retry orchestration around a search.
//!
//! One orchestrator instance drives one retry loop at a time: a
//! single-shot guard refuses concurrent restarts, and `reset` re-arms
//! the instance from a terminal phase ("redo search" semantics).
//! Cancellation is cooperative: the token is checked before every
//! attempt and while waiting out the delay; it never interrupts a
//! traversal already in progress.

use std::sync::Arc;

use fiberprobe_core::{RetryPolicy, SearchResult};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Lifecycle of one retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    /// An attempt reported success.
    Found,
    /// All attempts used without success; silent towards the caller.
    Exhausted,
    /// The loop was cancelled before reaching a verdict.
    Cancelled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Found | Phase::Exhausted | Phase::Cancelled)
    }
}

/// Produces one search attempt's results.
pub type SearchFn = Arc<dyn Fn() -> Vec<SearchResult> + Send + Sync>;
/// Decides whether an attempt's results are enough to stop retrying.
pub type Reducer = Arc<dyn Fn(&[SearchResult]) -> bool + Send + Sync>;

struct Inner {
    phase: Phase,
    started: bool,
    retries: u32,
    token: CancellationToken,
}

pub struct RetryOrchestrator {
    search: SearchFn,
    reduce: Reducer,
    inner: Arc<Mutex<Inner>>,
}

impl RetryOrchestrator {
    pub fn new(search: SearchFn, reduce: Reducer) -> Self {
        Self {
            search,
            reduce,
            inner: Arc::new(Mutex::new(Inner {
                phase: Phase::Idle,
                started: false,
                retries: 0,
                token: CancellationToken::new(),
            })),
        }
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Retries performed so far in the current (or last) loop.
    pub fn retries(&self) -> u32 {
        self.inner.lock().retries
    }

    /// Begins the retry loop on the current runtime.
    ///
    /// Returns the driving task, or `None` when this instance was
    /// already started; call [`reset`](Self::reset) from a terminal
    /// phase to run it again. Attempts are strictly sequential: attempt
    /// N+1 never starts before attempt N (including its callbacks) has
    /// finished.
    pub fn start(&self, policy: RetryPolicy) -> Option<JoinHandle<()>> {
        let token = {
            let mut inner = self.inner.lock();
            if inner.started {
                warn!("orchestrator already started, ignoring");
                return None;
            }
            inner.started = true;
            inner.phase = Phase::Searching;
            inner.retries = 0;
            inner.token = CancellationToken::new();
            inner.token.clone()
        };

        let search = self.search.clone();
        let reduce = self.reduce.clone();
        let state = self.inner.clone();

        Some(tokio::spawn(async move {
            let mut retries = 0u32;
            loop {
                if token.is_cancelled() {
                    finish(&state, Phase::Cancelled);
                    return;
                }

                let results = (search)();
                if (reduce)(&results) {
                    info!(retries, "search successful");
                    token.cancel();
                    finish(&state, Phase::Found);
                    return;
                }

                if retries >= policy.max_retries {
                    info!(
                        max_retries = policy.max_retries,
                        "retries exhausted without a match"
                    );
                    finish(&state, Phase::Exhausted);
                    return;
                }

                retries += 1;
                state.lock().retries = retries;
                debug!(
                    retries,
                    max_retries = policy.max_retries,
                    "match not found, retrying"
                );

                tokio::select! {
                    _ = token.cancelled() => {
                        finish(&state, Phase::Cancelled);
                        return;
                    }
                    _ = tokio::time::sleep(policy.delay) => {}
                }
            }
        }))
    }

    /// Requests cooperative cancellation. A pending delay aborts; an
    /// attempt already executing finishes first.
    pub fn cancel(&self) {
        let inner = self.inner.lock();
        debug!(phase = ?inner.phase, "cancellation requested");
        inner.token.cancel();
    }

    /// Re-arms a finished orchestrator. Refused unless the current
    /// phase is terminal.
    pub fn reset(&self) -> bool {
        let mut inner = self.inner.lock();
        if !inner.phase.is_terminal() {
            warn!(phase = ?inner.phase, "reset refused, phase not terminal");
            return false;
        }
        inner.token.cancel();
        inner.started = false;
        inner.phase = Phase::Idle;
        inner.retries = 0;
        true
    }
}

/// Terminal phases are sticky; the first verdict wins.
fn finish(state: &Arc<Mutex<Inner>>, phase: Phase) {
    let mut inner = state.lock();
    if !inner.phase.is_terminal() {
        inner.phase = phase;
    }
}

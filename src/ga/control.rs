//! Run control: cancellation, deadlines and termination reasons.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Cooperative cancellation flag shared between a caller and a running engine.
///
/// The engine checks it once per generation; a cancelled run returns its
/// best-so-far result marked partial.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Creates an unset token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// The generation limit was reached.
    GenerationLimit,
    /// No improvement for the configured number of generations.
    Stalled,
    /// The time limit passed.
    Deadline,
    /// The cancel token was set.
    Cancelled,
}

impl Termination {
    /// Whether the run was cut short from outside the search.
    pub fn is_partial(self) -> bool {
        matches!(self, Termination::Deadline | Termination::Cancelled)
    }
}

/// Deadline and cancellation checks for one run.
#[derive(Debug, Clone)]
pub(crate) struct RunControl {
    started: Instant,
    time_limit: Option<Duration>,
    cancel: Option<CancelToken>,
}

impl RunControl {
    pub(crate) fn start(time_limit_ms: Option<u64>, cancel: Option<CancelToken>) -> Self {
        Self {
            started: Instant::now(),
            time_limit: time_limit_ms.map(Duration::from_millis),
            cancel,
        }
    }

    /// External stop reason, if any.
    pub(crate) fn check(&self) -> Option<Termination> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(Termination::Cancelled);
        }
        match self.time_limit {
            Some(limit) if self.started.elapsed() >= limit => Some(Termination::Deadline),
            _ => None,
        }
    }

    pub(crate) fn elapsed_ms(&self) -> u128 {
        self.started.elapsed().as_millis()
    }
}

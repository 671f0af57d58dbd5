//! Injectable time source shared by the rolling counters and the breaker core.
//!
//! Every time-dependent component in this crate is threaded a [`Clock`] rather
//! than calling `Instant::now()` directly, so that tests can simulate bucket
//! rollover and state-machine expiry without real sleeps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A single capability: the current instant.
///
/// Implementations must be cheap to call and safe to share across threads.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real wall-clock time, backed by `std::time::Instant`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealClock;

impl Clock for RealClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests: starts at an arbitrary fixed instant and
/// only advances when told to via [`ManualClock::advance`].
///
/// `Instant` has no public constructor from an absolute timestamp, so the
/// clock anchors itself to `Instant::now()` at construction and tracks
/// elapsed nanoseconds from there.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed_nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_nanos: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Moves the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.elapsed_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }
}

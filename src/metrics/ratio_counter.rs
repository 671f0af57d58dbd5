//! Ratio between two rolling counters sharing the same window shape.

use super::rolling_counter::RollingCounter;
use crate::clock::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Tracks `a / (a + b)` over a shared rolling window. Used for the
/// network-error-vs-success ratio in [`super::rt_metrics::RTMetrics`].
pub struct RatioCounter {
    a: RollingCounter,
    b: RollingCounter,
    bucket_count: usize,
}

impl RatioCounter {
    pub fn new(bucket_count: usize, bucket_width: Duration, clock: Arc<dyn Clock>) -> Option<Self> {
        let a = RollingCounter::new(bucket_count, bucket_width, clock.clone())?;
        let b = RollingCounter::new(bucket_count, bucket_width, clock)?;
        Some(Self { a, b, bucket_count })
    }

    /// Increments the `a` side (e.g. network errors).
    pub fn inc_a(&mut self) {
        self.a.inc();
    }

    /// Increments the `b` side (e.g. successful transports).
    pub fn inc_b(&mut self) {
        self.b.inc();
    }

    /// `a / (a + b)`, or 0.0 if both sides are empty.
    pub fn ratio(&mut self) -> f64 {
        let a = self.a.count() as f64;
        let b = self.b.count() as f64;
        let total = a + b;
        if total == 0.0 {
            0.0
        } else {
            a / total
        }
    }

    /// Ready once either side has accumulated a full window of buckets.
    pub fn is_ready(&mut self) -> bool {
        self.a.counted_buckets().max(self.b.counted_buckets()) >= self.bucket_count
    }

    pub fn reset(&mut self) {
        self.a.reset();
        self.b.reset();
    }
}

//! Rolling-window integer counter over fixed-width time buckets.

use crate::clock::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A circular array of `bucket_count` integer counters, each covering
/// `bucket_width` of wall-clock time. Buckets older than `bucket_count *
/// bucket_width` contribute zero; elapsed whole buckets are zeroed lazily on
/// the next read or write.
pub struct RollingCounter {
    clock: Arc<dyn Clock>,
    bucket_width: Duration,
    buckets: Vec<u64>,
    current_index: usize,
    last_update: Instant,
    counted_buckets: usize,
}

impl RollingCounter {
    /// Creates a new counter with `bucket_count` buckets of `bucket_width`
    /// each. Fails if either is zero.
    pub fn new(bucket_count: usize, bucket_width: Duration, clock: Arc<dyn Clock>) -> Option<Self> {
        if bucket_count == 0 || bucket_width.is_zero() {
            return None;
        }
        let now = clock.now();
        Some(Self {
            clock,
            bucket_width,
            buckets: vec![0; bucket_count],
            current_index: 0,
            last_update: now,
            counted_buckets: 0,
        })
    }

    /// Advances the ring to `now`, zeroing every bucket the clock has skipped
    /// over. Must run before any read or write.
    fn advance(&mut self) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_update);
        if elapsed.is_zero() {
            return;
        }

        let n = self.buckets.len();
        let width_nanos = self.bucket_width.as_nanos().max(1);
        let elapsed_buckets = (elapsed.as_nanos() / width_nanos) as usize;

        if elapsed_buckets >= n {
            self.buckets.iter_mut().for_each(|b| *b = 0);
            self.counted_buckets = 0;
        } else {
            for step in 1..=elapsed_buckets {
                let idx = (self.current_index + step) % n;
                self.buckets[idx] = 0;
            }
            self.current_index = (self.current_index + elapsed_buckets) % n;
        }
        // Re-anchor to a whole-bucket boundary so fractional elapsed time
        // within the current bucket isn't lost on the next advance.
        self.last_update += Duration::from_nanos((elapsed_buckets as u64) * width_nanos as u64);
    }

    /// Increments the current bucket by 1.
    pub fn inc(&mut self) {
        self.advance();
        if self.buckets[self.current_index] == 0 {
            self.counted_buckets = (self.counted_buckets + 1).min(self.buckets.len());
        }
        self.buckets[self.current_index] += 1;
    }

    /// Sum of all buckets after advancing for elapsed time.
    pub fn count(&mut self) -> u64 {
        self.advance();
        self.buckets.iter().sum()
    }

    /// Number of distinct buckets that have ever received a write, capped at
    /// the bucket count. Used by [`super::ratio_counter::RatioCounter`] to
    /// decide readiness.
    pub fn counted_buckets(&mut self) -> usize {
        self.advance();
        self.counted_buckets
    }

    /// Number of buckets in the ring.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Clears all buckets immediately.
    pub fn reset(&mut self) {
        self.buckets.iter_mut().for_each(|b| *b = 0);
        self.counted_buckets = 0;
        self.last_update = self.clock.now();
        self.current_index = 0;
    }
}

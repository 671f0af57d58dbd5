//! Rolling latency histogram with quantile queries.
//!
//! Latencies are bucketed on a logarithmic scale spanning the fixed range
//! 1 microsecond to 60 seconds, giving the relative precision HDR-style
//! histograms are prized for without pulling in an external histogram crate.
//! The histogram is rolled over the same (bucket_count, bucket_width) window
//! as [`super::rolling_counter::RollingCounter`] by keeping one fine-grained
//! latency histogram per time bucket and merging them on query.

use crate::clock::Clock;
use std::sync::Arc;
use std::time::{Duration, Instant};

const MIN_NANOS: f64 = 1_000.0; // 1 microsecond
const MAX_NANOS: f64 = 60_000_000_000.0; // 60 seconds
/// Number of logarithmic buckets spanning the fixed range. Higher values
/// trade memory for quantile precision; 128 keeps relative error under ~4%.
const LATENCY_BUCKETS: usize = 128;

fn bucket_index(latency: Duration) -> usize {
    let nanos = (latency.as_nanos() as f64).clamp(MIN_NANOS, MAX_NANOS);
    let frac = (nanos.ln() - MIN_NANOS.ln()) / (MAX_NANOS.ln() - MIN_NANOS.ln());
    ((frac * (LATENCY_BUCKETS - 1) as f64).round() as usize).min(LATENCY_BUCKETS - 1)
}

fn bucket_boundary(index: usize) -> Duration {
    let frac = index as f64 / (LATENCY_BUCKETS - 1) as f64;
    let nanos = MIN_NANOS * (MAX_NANOS / MIN_NANOS).powf(frac);
    Duration::from_nanos(nanos.round() as u64)
}

/// A ring of `bucket_count` latency histograms, one per time bucket of
/// `bucket_width`, merged on query into a single quantile estimate.
pub struct RollingHistogram {
    clock: Arc<dyn Clock>,
    bucket_width: Duration,
    ring: Vec<[u64; LATENCY_BUCKETS]>,
    current_index: usize,
    last_update: Instant,
}

impl RollingHistogram {
    pub fn new(bucket_count: usize, bucket_width: Duration, clock: Arc<dyn Clock>) -> Option<Self> {
        if bucket_count == 0 || bucket_width.is_zero() {
            return None;
        }
        let now = clock.now();
        Some(Self {
            clock,
            bucket_width,
            ring: vec![[0u64; LATENCY_BUCKETS]; bucket_count],
            current_index: 0,
            last_update: now,
        })
    }

    fn advance(&mut self) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_update);
        if elapsed.is_zero() {
            return;
        }
        let n = self.ring.len();
        let width_nanos = self.bucket_width.as_nanos().max(1);
        let elapsed_buckets = (elapsed.as_nanos() / width_nanos) as usize;

        if elapsed_buckets >= n {
            self.ring.iter_mut().for_each(|b| *b = [0; LATENCY_BUCKETS]);
        } else {
            for step in 1..=elapsed_buckets {
                let idx = (self.current_index + step) % n;
                self.ring[idx] = [0; LATENCY_BUCKETS];
            }
            self.current_index = (self.current_index + elapsed_buckets) % n;
        }
        self.last_update += Duration::from_nanos((elapsed_buckets as u64) * width_nanos as u64);
    }

    /// Records one latency sample.
    pub fn insert(&mut self, latency: Duration) {
        self.advance();
        self.ring[self.current_index][bucket_index(latency)] += 1;
    }

    /// Returns the latency boundary such that `q` fraction of recorded
    /// samples are less than or equal to it. Returns `Duration::ZERO` when no
    /// samples have been recorded.
    pub fn at_quantile(&mut self, q: f64) -> Duration {
        self.advance();
        let q = q.clamp(0.0, 1.0);

        let mut merged = [0u64; LATENCY_BUCKETS];
        for bucket in &self.ring {
            for (m, b) in merged.iter_mut().zip(bucket.iter()) {
                *m += b;
            }
        }
        let total: u64 = merged.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (q * total as f64).ceil() as u64;
        let mut cumulative = 0u64;
        for (idx, count) in merged.iter().enumerate() {
            cumulative += count;
            if cumulative >= target.max(1) {
                return bucket_boundary(idx);
            }
        }
        bucket_boundary(LATENCY_BUCKETS - 1)
    }

    pub fn reset(&mut self) {
        self.ring.iter_mut().for_each(|b| *b = [0; LATENCY_BUCKETS]);
        self.last_update = self.clock.now();
        self.current_index = 0;
    }
}

//! Round-trip metrics: the statistics a trip-condition predicate reads from.

use super::histogram::RollingHistogram;
use super::ratio_counter::RatioCounter;
use super::rolling_counter::RollingCounter;
use crate::clock::Clock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Status codes treated as network-level failures by default. Matches the
/// convention of synthesizing a 502/504 for a transport-level error, per the
/// breaker's resolved open question on surfacing I/O errors to the predicate
/// language.
pub fn is_network_error_code(code: u16) -> bool {
    matches!(code, 502 | 504)
}

/// Rolling statistics over HTTP response codes, network errors, and latency,
/// shared across every caller of [`crate::breaker::Breaker`] while it sits in
/// a given operating state.
pub struct RTMetrics {
    clock: Arc<dyn Clock>,
    bucket_count: usize,
    bucket_width: Duration,
    network_errors: RatioCounter,
    by_code: HashMap<u16, RollingCounter>,
    latency: RollingHistogram,
    total: RollingCounter,
}

impl RTMetrics {
    pub fn new(bucket_count: usize, bucket_width: Duration, clock: Arc<dyn Clock>) -> Option<Self> {
        Some(Self {
            network_errors: RatioCounter::new(bucket_count, bucket_width, clock.clone())?,
            by_code: HashMap::new(),
            latency: RollingHistogram::new(bucket_count, bucket_width, clock.clone())?,
            total: RollingCounter::new(bucket_count, bucket_width, clock.clone())?,
            clock,
            bucket_count,
            bucket_width,
        })
    }

    /// Records one observed round trip: a response `code` and the transport
    /// `latency` (zero if unavailable, e.g. for a transport-level failure).
    pub fn record(&mut self, code: u16, latency: Duration) {
        if is_network_error_code(code) {
            self.network_errors.inc_a();
        } else {
            self.network_errors.inc_b();
        }

        let clock = self.clock.clone();
        let bucket_count = self.bucket_count;
        let bucket_width = self.bucket_width;
        self.by_code
            .entry(code)
            .or_insert_with(|| RollingCounter::new(bucket_count, bucket_width, clock).expect("validated dimensions"))
            .inc();

        if !latency.is_zero() {
            self.latency.insert(latency);
        }

        self.total.inc();
    }

    pub fn network_error_ratio(&mut self) -> f64 {
        self.network_errors.ratio()
    }

    /// Count of codes in `[low1, high1)` divided by count of codes in
    /// `[low2, high2)`. Zero if the denominator is zero.
    pub fn response_code_ratio(&mut self, low1: u16, high1: u16, low2: u16, high2: u16) -> f64 {
        let numerator = self.count_in_range(low1, high1);
        let denominator = self.count_in_range(low2, high2);
        if denominator == 0 {
            0.0
        } else {
            numerator as f64 / denominator as f64
        }
    }

    fn count_in_range(&mut self, low: u16, high: u16) -> u64 {
        self.by_code
            .iter_mut()
            .filter(|(code, _)| **code >= low && **code < high)
            .map(|(_, counter)| counter.count())
            .sum()
    }

    pub fn latency_at_quantile(&mut self, q: f64) -> Duration {
        self.latency.at_quantile(q)
    }

    pub fn total_count(&mut self) -> u64 {
        self.total.count()
    }

    /// Clears every counter and the latency histogram. Called on every
    /// committed transition into Tripped or Standby.
    pub fn reset(&mut self) {
        self.network_errors.reset();
        self.by_code.values_mut().for_each(|c| c.reset());
        self.latency.reset();
        self.total.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn metrics(clock: &ManualClock) -> RTMetrics {
        RTMetrics::new(8, Duration::from_millis(100), Arc::new(clock.clone())).unwrap()
    }

    #[test]
    fn record_updates_exactly_one_side_of_the_network_error_ratio() {
        let clock = ManualClock::new();
        let mut m = metrics(&clock);
        m.record(200, Duration::from_millis(5));
        m.record(502, Duration::ZERO);
        assert_eq!(m.total_count(), 2);
        assert!((m.network_error_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_latency_is_not_recorded_into_the_histogram() {
        let clock = ManualClock::new();
        let mut m = metrics(&clock);
        m.record(504, Duration::ZERO);
        assert_eq!(m.latency_at_quantile(0.5), Duration::ZERO);
    }

    #[test]
    fn response_code_ratio_counts_half_open_ranges() {
        let clock = ManualClock::new();
        let mut m = metrics(&clock);
        for _ in 0..3 {
            m.record(500, Duration::from_millis(1));
        }
        for _ in 0..7 {
            m.record(200, Duration::from_millis(1));
        }
        let ratio = m.response_code_ratio(500, 600, 0, 600);
        assert!((ratio - 0.3).abs() < 1e-9);
    }

    #[test]
    fn reset_zeroes_every_counter() {
        let clock = ManualClock::new();
        let mut m = metrics(&clock);
        m.record(502, Duration::from_millis(3));
        m.reset();
        assert_eq!(m.total_count(), 0);
        assert_eq!(m.network_error_ratio(), 0.0);
        assert_eq!(m.latency_at_quantile(0.5), Duration::ZERO);
    }

    #[test]
    fn default_network_error_codes_are_502_and_504() {
        assert!(is_network_error_code(502));
        assert!(is_network_error_code(504));
        assert!(!is_network_error_code(500));
        assert!(!is_network_error_code(200));
    }
}

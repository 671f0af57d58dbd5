//! Rolling-window metrics for the circuit breaker.
//!
//! This module contains the leaf-level statistics engine the breaker's trip
//! condition reads from: response-code and network-error counts over a
//! sliding window of fixed-width buckets, and a latency histogram supporting
//! quantile queries.
//!
//! # Module Organization
//!
//! - [`rolling_counter`] - fixed-width bucketed integer counter with lazy rollover
//! - [`ratio_counter`] - two rolling counters sharing a window, exposing `a / (a + b)`
//! - [`histogram`] - rolling latency histogram with quantile queries
//! - [`rt_metrics`] - the round-trip metrics object the predicate language evaluates against
//!
//! All counters in a given [`rt_metrics::RTMetrics`] share one [`crate::clock::Clock`]
//! so that time advancement is observed consistently across every view.

pub mod histogram;
pub mod ratio_counter;
pub mod rolling_counter;
pub mod rt_metrics;

pub use rt_metrics::RTMetrics;

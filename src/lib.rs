//! Circuit breaker middleware for an HTTP gateway: rolling-window traffic
//! metrics, a small boolean predicate language over those metrics, and a
//! Standby/Tripped/Recovering state machine that short-circuits to a
//! fallback while the upstream is unhealthy.
//!
//! # Module Organization
//!
//! - [`clock`] - injectable time source shared by every time-dependent piece
//! - [`metrics`] - rolling counters, ratio counters, latency histogram, and
//!   the combined [`metrics::RTMetrics`] view the predicate language reads
//! - [`predicate`] - the trip-condition expression grammar, parser, and evaluator
//! - [`fallback`] - the short-circuit response/redirect handlers
//! - [`hook`] - side-effect notifications fired on state transitions
//! - [`breaker`] - the state machine tying C1-C4 together into one request path
//! - [`middleware`] - the Actix Web `Transform`/`Service` integration
//! - [`config`] - loads breaker tunables from a JSON file plus env override
//! - [`logs`] - process-wide structured logging setup
//! - [`error`] - the crate's error types

pub mod breaker;
pub mod clock;
pub mod config;
pub mod error;
pub mod fallback;
pub mod hook;
pub mod logs;
pub mod metrics;
pub mod middleware;
pub mod predicate;

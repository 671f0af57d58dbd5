//! The breaker core (C5): state machine, admission policy, and the glue that
//! wires the rolling metrics, predicate language, fallback, and side-effect
//! hooks into a single request path.
//!
//! # Module Organization
//!
//! - [`config`] - tunable timings ([`BreakerConfig`])
//! - [`state`] - the three-state enum and its associated timestamps
//!
//! The breaker holds one [`std::sync::Mutex`] guarding `state`, `until`,
//! `recovery_start`, `last_check`, and `metrics` together; critical sections
//! are bounded and never span an upstream or fallback call (§5 of the
//! concurrency design). The admission RNG lives behind its own, separate
//! mutex, seeded once at construction from the clock rather than drawn from
//! the process-global thread RNG, so a fake-clock-driven test gets a
//! reproducible admission sequence.

pub mod config;
pub mod state;

pub use config::BreakerConfig;
pub use state::BreakerState;

use crate::clock::Clock;
use crate::error::BreakerError;
use crate::fallback::Fallback;
use crate::hook::{self, Hook};
use crate::metrics::RTMetrics;
use crate::predicate::{self, parse, Expr};
use actix_web::HttpResponse;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use state::StateClock;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Rolling-window dimensions for the metrics a breaker keeps internally.
/// Independent of the `checkPeriod`/`fallbackDuration` timings: this is the
/// horizon over which response codes and latency are summarized, not how
/// often the trip condition is re-evaluated.
const METRICS_BUCKET_COUNT: usize = 10;
const METRICS_BUCKET_WIDTH: Duration = Duration::from_secs(1);

/// What the request-path instrumentation observed about a forwarded call,
/// fed back into [`Breaker::record`]. A transport-level failure (connection
/// refused, timeout, DNS failure, ...) carries no real status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Status(u16),
    TransportError,
}

/// What the caller should do with the current request, decided by
/// [`Breaker::admit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Forward to the next handler and report the outcome via
    /// [`Breaker::record`].
    Forward,
    /// Serve the fallback; do not touch the next handler or record metrics.
    ShortCircuit,
}

struct Inner {
    sc: StateClock,
    metrics: RTMetrics,
    last_transition: Instant,
}

/// One circuit breaker guarding one upstream handler.
pub struct Breaker {
    name: String,
    condition: Expr,
    fallback: Fallback,
    config: BreakerConfig,
    clock: Arc<dyn Clock>,
    on_tripped: Option<Arc<dyn Hook>>,
    on_standby: Option<Arc<dyn Hook>>,
    inner: Mutex<Inner>,
    rng: Mutex<StdRng>,
}

/// Derives a seed for the per-breaker admission RNG from the clock's current
/// instant, so a [`ManualClock`](crate::clock::ManualClock)-driven test gets
/// a reproducible draw sequence instead of reaching into the process-global
/// thread RNG.
fn seed_from_instant(now: Instant) -> u64 {
    let mut hasher = DefaultHasher::new();
    now.hash(&mut hasher);
    hasher.finish()
}

impl Breaker {
    /// Parses `condition` and validates `config`; fails with [`BreakerError`]
    /// if the predicate is malformed or a configured duration is unusable.
    pub fn new(
        name: impl Into<String>,
        condition: &str,
        fallback: Fallback,
        config: BreakerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, BreakerError> {
        config.validate()?;
        let condition = parse(condition)?;
        let now = clock.now();
        let metrics = RTMetrics::new(METRICS_BUCKET_COUNT, METRICS_BUCKET_WIDTH, clock.clone())
            .ok_or_else(|| BreakerError::Config("invalid metrics window dimensions".to_string()))?;

        Ok(Self {
            name: name.into(),
            condition,
            fallback,
            config,
            clock,
            on_tripped: None,
            on_standby: None,
            inner: Mutex::new(Inner {
                sc: StateClock::standby(now),
                metrics,
                last_transition: now,
            }),
            rng: Mutex::new(StdRng::seed_from_u64(seed_from_instant(now))),
        })
    }

    pub fn with_on_tripped(mut self, hook: Arc<dyn Hook>) -> Self {
        self.on_tripped = Some(hook);
        self
    }

    pub fn with_on_standby(mut self, hook: Arc<dyn Hook>) -> Self {
        self.on_standby = Some(hook);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current operating state, for monitoring.
    pub fn state(&self) -> BreakerState {
        self.inner.lock().expect("breaker mutex poisoned").sc.state
    }

    /// Timestamp of the breaker's most recent committed transition.
    pub fn last_transition_at(&self) -> Instant {
        self.inner.lock().expect("breaker mutex poisoned").last_transition
    }

    /// Step 1 of the request path (§4.5): advances any time-driven
    /// transitions, then decides whether this request should be forwarded.
    pub fn admit(&self) -> Admission {
        let now = self.clock.now();
        let mut transitions = Vec::new();
        let admission;
        {
            let mut guard = self.inner.lock().expect("breaker mutex poisoned");
            self.advance_time_driven_transitions(&mut guard, now, &mut transitions);
            admission = self.decide_admission(&guard, now);
        }
        self.dispatch_transitions(transitions, now);
        admission
    }

    /// Step 3 of the request path: records the outcome of a forwarded call
    /// and performs the periodic trip-condition check. Only ever called for
    /// requests that [`Breaker::admit`] returned [`Admission::Forward`] for.
    pub fn record(&self, outcome: Outcome, latency: Duration) {
        let now = self.clock.now();
        let mut transitions = Vec::new();
        {
            let mut guard = self.inner.lock().expect("breaker mutex poisoned");
            let code = match outcome {
                Outcome::Status(code) => code,
                Outcome::TransportError => 504,
            };
            guard.metrics.record(code, latency);
            self.maybe_trip(&mut guard, now, &mut transitions);
        }
        self.dispatch_transitions(transitions, now);
    }

    /// Serves the configured fallback. Used for [`Admission::ShortCircuit`].
    pub fn fallback_response(&self) -> HttpResponse {
        self.fallback.respond()
    }

    fn advance_time_driven_transitions(&self, guard: &mut Inner, now: Instant, transitions: &mut Vec<(BreakerState, BreakerState)>) {
        loop {
            match guard.sc.state {
                BreakerState::Tripped => {
                    let until = guard.sc.until.expect("tripped state always carries `until`");
                    if now < until {
                        break;
                    }
                    guard.sc.state = BreakerState::Recovering;
                    guard.sc.recovery_start = Some(now);
                    guard.last_transition = now;
                    info!("breaker '{}' tripped -> recovering", self.name);
                }
                BreakerState::Recovering => {
                    let recovery_start = guard
                        .sc
                        .recovery_start
                        .expect("recovering state always carries `recovery_start`");
                    if now < recovery_start + self.config.recovery_duration() {
                        break;
                    }
                    let previous = guard.sc.state;
                    guard.sc.state = BreakerState::Standby;
                    guard.sc.until = None;
                    guard.sc.recovery_start = None;
                    guard.metrics.reset();
                    guard.last_transition = now;
                    transitions.push((previous, BreakerState::Standby));
                    info!("breaker '{}' recovering -> standby", self.name);
                }
                BreakerState::Standby => break,
            }
        }
    }

    fn maybe_trip(&self, guard: &mut Inner, now: Instant, transitions: &mut Vec<(BreakerState, BreakerState)>) {
        if !matches!(guard.sc.state, BreakerState::Standby | BreakerState::Recovering) {
            return;
        }
        if now.saturating_duration_since(guard.sc.last_check) < self.config.check_period() {
            return;
        }
        guard.sc.last_check = now;

        if predicate::evaluate(&self.condition, &mut guard.metrics) {
            let previous = guard.sc.state;
            guard.sc.state = BreakerState::Tripped;
            guard.sc.until = Some(now + self.config.fallback_duration());
            guard.sc.recovery_start = None;
            guard.metrics.reset();
            guard.last_transition = now;
            transitions.push((previous, BreakerState::Tripped));
            info!("breaker '{}' {previous} -> tripped", self.name);
        }
    }

    fn decide_admission(&self, guard: &Inner, now: Instant) -> Admission {
        match guard.sc.state {
            BreakerState::Standby => Admission::Forward,
            BreakerState::Tripped => Admission::ShortCircuit,
            BreakerState::Recovering => {
                let recovery_start = guard
                    .sc
                    .recovery_start
                    .expect("recovering state always carries `recovery_start`");
                let p = Self::ramp_probability(now, recovery_start, self.config.recovery_duration());
                let r: f64 = self.rng.lock().expect("rng mutex poisoned").gen();
                debug!("breaker '{}' admission draw r={r:.4} p={p:.4}", self.name);
                if r < p {
                    Admission::Forward
                } else {
                    Admission::ShortCircuit
                }
            }
        }
    }

    fn ramp_probability(now: Instant, recovery_start: Instant, recovery_duration: Duration) -> f64 {
        if recovery_duration.is_zero() {
            return 1.0;
        }
        let elapsed = now.saturating_duration_since(recovery_start).as_secs_f64();
        (elapsed / recovery_duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    fn dispatch_transitions(&self, transitions: Vec<(BreakerState, BreakerState)>, now: Instant) {
        for (previous, new) in transitions {
            let hook = match new {
                BreakerState::Tripped => self.on_tripped.as_ref(),
                BreakerState::Standby => self.on_standby.as_ref(),
                BreakerState::Recovering => None,
            };
            if let Some(hook) = hook {
                hook::dispatch(hook, &self.name, previous, new, now);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::fallback::{Fallback, ResponseFallback};

    fn breaker(clock: &ManualClock) -> Breaker {
        let fallback = Fallback::Response(ResponseFallback::new(400, None, "Come back later").unwrap());
        Breaker::new(
            "upstream",
            "NetworkErrorRatio() > 0.5",
            fallback,
            BreakerConfig::default(),
            Arc::new(clock.clone()),
        )
        .unwrap()
    }

    #[test]
    fn starts_in_standby_and_forwards() {
        let clock = ManualClock::new();
        let b = breaker(&clock);
        assert_eq!(b.state(), BreakerState::Standby);
        assert_eq!(b.admit(), Admission::Forward);
    }

    #[test]
    fn healthy_traffic_stays_in_standby() {
        let clock = ManualClock::new();
        let b = breaker(&clock);
        for _ in 0..10 {
            assert_eq!(b.admit(), Admission::Forward);
            b.record(Outcome::Status(200), Duration::from_millis(5));
            clock.advance(Duration::from_millis(10));
        }
        assert_eq!(b.state(), BreakerState::Standby);
    }

    /// Seeds a 60% network-error ratio, then advances past `checkPeriod` and
    /// records one more outcome so the pending periodic check actually runs
    /// (the check fires inside `record`, after this request's own metrics
    /// update — see §4.5's request-path description).
    fn seed_and_trip(b: &Breaker, clock: &ManualClock) {
        for _ in 0..60 {
            b.admit();
            b.record(Outcome::TransportError, Duration::ZERO);
        }
        for _ in 0..40 {
            b.admit();
            b.record(Outcome::Status(200), Duration::from_millis(1));
        }
        clock.advance(Duration::from_millis(101));
        b.admit();
        b.record(Outcome::Status(200), Duration::from_millis(1));
    }

    #[test]
    fn trips_when_network_error_ratio_exceeds_threshold() {
        let clock = ManualClock::new();
        let b = breaker(&clock);
        seed_and_trip(&b, &clock);
        assert_eq!(b.state(), BreakerState::Tripped);
        assert_eq!(b.admit(), Admission::ShortCircuit);
    }

    #[test]
    fn transitions_from_tripped_to_recovering_after_fallback_duration() {
        let clock = ManualClock::new();
        let b = breaker(&clock);
        seed_and_trip(&b, &clock);
        assert_eq!(b.state(), BreakerState::Tripped);

        clock.advance(Duration::from_secs(10));
        b.admit();
        assert_eq!(b.state(), BreakerState::Recovering);
    }

    #[test]
    fn recovers_to_standby_after_full_probation_without_re_trip() {
        let clock = ManualClock::new();
        let b = breaker(&clock);
        seed_and_trip(&b, &clock);
        clock.advance(Duration::from_secs(10));
        b.admit();
        assert_eq!(b.state(), BreakerState::Recovering);

        clock.advance(Duration::from_secs(11));
        for _ in 0..5 {
            if b.admit() == Admission::Forward {
                b.record(Outcome::Status(200), Duration::from_millis(1));
            }
        }
        assert_eq!(b.state(), BreakerState::Standby);
    }

    #[test]
    fn short_circuited_requests_never_reach_the_next_handler_semantics() {
        let clock = ManualClock::new();
        let b = breaker(&clock);
        seed_and_trip(&b, &clock);
        assert_eq!(b.admit(), Admission::ShortCircuit);
        let response = b.fallback_response();
        assert_eq!(response.status().as_u16(), 400);
    }

    #[test]
    fn rejects_construction_with_a_malformed_predicate() {
        let clock = ManualClock::new();
        let fallback = Fallback::Response(ResponseFallback::new(400, None, "x").unwrap());
        let err = Breaker::new("upstream", "Bogus() > 1", fallback, BreakerConfig::default(), Arc::new(clock));
        assert!(matches!(err, Err(BreakerError::Predicate(_))));
    }
}

//! The breaker's three operating states and the timestamps that govern
//! transitions between them.

use std::time::Instant;

/// The breaker's current operating regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation: every request is forwarded to the next handler.
    Standby,
    /// Short-circuit operation: every request is served by the fallback.
    Tripped,
    /// Probation: requests are admitted with a time-increasing probability.
    Recovering,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BreakerState::Standby => "standby",
            BreakerState::Tripped => "tripped",
            BreakerState::Recovering => "recovering",
        };
        f.write_str(s)
    }
}

/// Timestamps associated with the current state, per the breaker's data
/// model: `until` bounds Tripped and gates the Tripped→Recovering edge;
/// `recovery_start` anchors the Recovering probation window.
#[derive(Debug, Clone, Copy)]
pub struct StateClock {
    pub state: BreakerState,
    pub until: Option<Instant>,
    pub recovery_start: Option<Instant>,
    pub last_check: Instant,
}

impl StateClock {
    pub fn standby(now: Instant) -> Self {
        Self {
            state: BreakerState::Standby,
            until: None,
            recovery_start: None,
            last_check: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_breaker_state_clock_starts_in_standby_with_no_timestamps() {
        let now = Instant::now();
        let sc = StateClock::standby(now);
        assert_eq!(sc.state, BreakerState::Standby);
        assert!(sc.until.is_none());
        assert!(sc.recovery_start.is_none());
    }

    #[test]
    fn display_renders_lowercase_state_names() {
        assert_eq!(BreakerState::Standby.to_string(), "standby");
        assert_eq!(BreakerState::Tripped.to_string(), "tripped");
        assert_eq!(BreakerState::Recovering.to_string(), "recovering");
    }
}

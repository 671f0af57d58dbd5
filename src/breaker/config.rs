//! The breaker's tunable parameters (§4.5's configuration table), expressed
//! as a plain `Deserialize`-able struct so it can be loaded from the same
//! JSON settings convention the rest of the gateway lineage uses.

use crate::error::BreakerError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_fallback_duration_ms() -> u64 {
    10_000
}

fn default_recovery_duration_ms() -> u64 {
    10_000
}

fn default_check_period_ms() -> u64 {
    100
}

/// Tunable timings for a [`super::Breaker`]. Durations are expressed in
/// milliseconds on the wire for a readable JSON document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BreakerConfig {
    #[serde(default = "default_fallback_duration_ms")]
    pub fallback_duration_ms: u64,
    #[serde(default = "default_recovery_duration_ms")]
    pub recovery_duration_ms: u64,
    #[serde(default = "default_check_period_ms")]
    pub check_period_ms: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            fallback_duration_ms: default_fallback_duration_ms(),
            recovery_duration_ms: default_recovery_duration_ms(),
            check_period_ms: default_check_period_ms(),
        }
    }
}

impl BreakerConfig {
    pub fn fallback_duration(&self) -> Duration {
        Duration::from_millis(self.fallback_duration_ms)
    }

    pub fn recovery_duration(&self) -> Duration {
        Duration::from_millis(self.recovery_duration_ms)
    }

    /// `checkPeriod`, clamped to `fallbackDuration / 2` (this implementation's
    /// resolution of the open question on `checkPeriod > fallbackDuration`).
    pub fn check_period(&self) -> Duration {
        let configured = Duration::from_millis(self.check_period_ms);
        let ceiling = self.fallback_duration() / 2;
        configured.min(ceiling)
    }

    /// Rejects negative-equivalent (none, since these are unsigned) but
    /// catches the genuinely invalid case of a zero fallback duration, which
    /// would make the check-period clamp degenerate.
    pub fn validate(&self) -> Result<(), BreakerError> {
        if self.fallback_duration_ms == 0 {
            return Err(BreakerError::Config(
                "fallback_duration_ms must be greater than zero".to_string(),
            ));
        }
        if self.recovery_duration_ms == 0 {
            return Err(BreakerError::Config(
                "recovery_duration_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = BreakerConfig::default();
        assert_eq!(config.fallback_duration(), Duration::from_secs(10));
        assert_eq!(config.recovery_duration(), Duration::from_secs(10));
        assert_eq!(config.check_period(), Duration::from_millis(100));
    }

    #[test]
    fn check_period_is_clamped_to_half_the_fallback_duration() {
        let config = BreakerConfig {
            fallback_duration_ms: 1_000,
            recovery_duration_ms: 10_000,
            check_period_ms: 900,
        };
        assert_eq!(config.check_period(), Duration::from_millis(500));
    }

    #[test]
    fn validate_rejects_zero_durations() {
        let mut config = BreakerConfig::default();
        config.fallback_duration_ms = 0;
        assert!(config.validate().is_err());

        let mut config = BreakerConfig::default();
        config.recovery_duration_ms = 0;
        assert!(config.validate().is_err());
    }
}

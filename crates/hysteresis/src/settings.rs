//! Timing configuration for the visibility state machine.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Upper bound for every duration, in milliseconds.
pub const MAX_DURATION_MS: u64 = 60_000;

/// Invalid hysteresis timing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    /// A duration was zero.
    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    /// A duration exceeded [`MAX_DURATION_MS`].
    #[error("{field} ({value_ms}) must not exceed {max_ms}ms")]
    TooLong {
        field: &'static str,
        value_ms: u64,
        max_ms: u64,
    },

    /// Leaving suppression must take longer than entering it.
    #[error(
        "enter_stability_ms ({enter_ms}) must be smaller than exit_stability_ms ({exit_ms})"
    )]
    EnterNotBelowExit { enter_ms: u64, exit_ms: u64 },
}

/// Stability durations and the transition-ignore window, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisSettings {
    /// Continuous fullscreen evidence needed to hide.
    pub enter_stability_ms: u64,

    /// Continuous non-fullscreen evidence needed to show again.
    pub exit_stability_ms: u64,

    /// How long samples are disregarded after a workspace switch.
    pub transition_ignore_ms: u64,

    /// Show the overlay as soon as an exit run starts instead of waiting
    /// for it to commit.
    pub optimistic_show: bool,
}

impl Default for HysteresisSettings {
    fn default() -> Self {
        Self {
            enter_stability_ms: 120,
            exit_stability_ms: 700,
            transition_ignore_ms: 500,
            optimistic_show: false,
        }
    }
}

impl HysteresisSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        for (field, value) in [
            ("enter_stability_ms", self.enter_stability_ms),
            ("exit_stability_ms", self.exit_stability_ms),
            ("transition_ignore_ms", self.transition_ignore_ms),
        ] {
            if value == 0 {
                return Err(SettingsError::ZeroDuration { field });
            }
            if value > MAX_DURATION_MS {
                return Err(SettingsError::TooLong {
                    field,
                    value_ms: value,
                    max_ms: MAX_DURATION_MS,
                });
            }
        }

        if self.enter_stability_ms >= self.exit_stability_ms {
            return Err(SettingsError::EnterNotBelowExit {
                enter_ms: self.enter_stability_ms,
                exit_ms: self.exit_stability_ms,
            });
        }

        Ok(())
    }

    pub fn enter_stability(&self) -> Duration {
        Duration::from_millis(self.enter_stability_ms)
    }

    pub fn exit_stability(&self) -> Duration {
        Duration::from_millis(self.exit_stability_ms)
    }

    pub fn transition_ignore(&self) -> Duration {
        Duration::from_millis(self.transition_ignore_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid_and_asymmetric() {
        let settings = HysteresisSettings::default();
        assert!(settings.validate().is_ok());
        assert!(settings.exit_stability() > settings.enter_stability());
        assert!(!settings.optimistic_show);
    }

    #[test]
    fn test_rejects_zero_duration() {
        let settings = HysteresisSettings {
            transition_ignore_ms: 0,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::ZeroDuration {
                field: "transition_ignore_ms"
            })
        );
    }

    #[test]
    fn test_rejects_duration_above_maximum() {
        let settings = HysteresisSettings {
            transition_ignore_ms: u64::MAX,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(SettingsError::TooLong {
                field: "transition_ignore_ms",
                value_ms: u64::MAX,
                max_ms: MAX_DURATION_MS,
            })
        );

        let at_limit = HysteresisSettings {
            exit_stability_ms: MAX_DURATION_MS,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_rejects_enter_not_below_exit() {
        let equal = HysteresisSettings {
            enter_stability_ms: 500,
            exit_stability_ms: 500,
            ..Default::default()
        };
        assert!(matches!(
            equal.validate(),
            Err(SettingsError::EnterNotBelowExit { .. })
        ));

        let inverted = HysteresisSettings {
            enter_stability_ms: 900,
            exit_stability_ms: 300,
            ..Default::default()
        };
        assert_eq!(
            inverted.validate(),
            Err(SettingsError::EnterNotBelowExit {
                enter_ms: 900,
                exit_ms: 300
            })
        );
    }

    #[test]
    fn test_deserialize_partial() {
        let settings: HysteresisSettings =
            serde_json::from_str(r#"{"exit_stability_ms": 1000}"#).unwrap();
        assert_eq!(settings.exit_stability_ms, 1000);
        assert_eq!(settings.enter_stability_ms, 120);
    }
}

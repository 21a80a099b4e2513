//! Watcher configuration.
//!
//! Every field has a default, so a configuration file only needs to name
//! the values it changes:
//!
//! ```json
//! {
//!   "sampling": { "interval_ms": 250 },
//!   "hysteresis": { "exit_stability_ms": 900 }
//! }
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use backdrop_classifier::ClassifierSettings;
use backdrop_hysteresis::{HysteresisSettings, MAX_DURATION_MS};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, WatcherError};

/// Upper bound for [`BurstConfig::count`].
pub const MAX_BURST_COUNT: usize = 20;

/// Periodic sampling cadence.
///
/// Durations are in milliseconds, at most [`MAX_DURATION_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Baseline interval between samples. 150 to 300 ms works well.
    pub interval_ms: u64,

    /// Budget for one snapshot capture.
    pub capture_timeout_ms: u64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 200,
            capture_timeout_ms: 20,
        }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

/// Extra samples taken right after a workspace switch or app activation.
///
/// At most [`MAX_BURST_COUNT`] samples, spaced at most [`MAX_DURATION_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BurstConfig {
    pub count: usize,
    pub spacing_ms: u64,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            count: 3,
            spacing_ms: 150,
        }
    }
}

impl BurstConfig {
    pub fn spacing(&self) -> Duration {
        Duration::from_millis(self.spacing_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Log a diagnostic event per sample and notification.
    pub enabled: bool,
}

/// All tuning for the fullscreen watcher.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub sampling: SamplingConfig,
    pub hysteresis: HysteresisSettings,
    pub burst: BurstConfig,
    pub classifier: ClassifierSettings,
    pub diagnostics: DiagnosticsConfig,
}

impl WatcherConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, WatcherError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, WatcherError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| WatcherError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self =
            serde_json::from_str(&content).map_err(|source| WatcherError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;

        tracing::debug!(path = %path.display(), "Loaded watcher configuration");
        Ok(config)
    }

    /// Load from [`WatcherConfig::default_path`], or use the defaults when
    /// the file does not exist.
    pub fn load_or_default() -> Result<Self, WatcherError> {
        match Self::default_path() {
            Some(path) => Self::load_or_default_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`, or use the defaults when it does not exist.
    pub fn load_or_default_from(path: &Path) -> Result<Self, WatcherError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "No watcher configuration, using defaults");
            Ok(Self::default())
        }
    }

    /// `<config dir>/backdrop/watcher.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|config| config.join("backdrop").join("watcher.json"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (section, field, value, max) in [
            ("sampling", "interval_ms", self.sampling.interval_ms, MAX_DURATION_MS),
            (
                "sampling",
                "capture_timeout_ms",
                self.sampling.capture_timeout_ms,
                MAX_DURATION_MS,
            ),
            ("burst", "count", self.burst.count as u64, MAX_BURST_COUNT as u64),
            ("burst", "spacing_ms", self.burst.spacing_ms, MAX_DURATION_MS),
        ] {
            if value == 0 {
                return Err(ConfigError::Zero { section, field });
            }
            if value > max {
                return Err(ConfigError::TooLarge {
                    section,
                    field,
                    value,
                    max,
                });
            }
        }

        self.hysteresis.validate()?;
        self.classifier.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = WatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sampling.interval(), Duration::from_millis(200));
        assert_eq!(config.sampling.capture_timeout(), Duration::from_millis(20));
        assert_eq!(config.burst.count, 3);
        assert_eq!(config.burst.spacing(), Duration::from_millis(150));
        assert!(config.hysteresis.exit_stability_ms > config.hysteresis.enter_stability_ms);
        assert!(!config.diagnostics.enabled);
    }

    #[test]
    fn test_from_json_str_partial() {
        let config = WatcherConfig::from_json_str(
            r#"{"sampling": {"interval_ms": 250}, "hysteresis": {"optimistic_show": true}}"#,
        )
        .unwrap();

        assert_eq!(config.sampling.interval_ms, 250);
        assert_eq!(config.sampling.capture_timeout_ms, 20);
        assert!(config.hysteresis.optimistic_show);
        assert_eq!(config.hysteresis.exit_stability_ms, 700);
    }

    #[test]
    fn test_from_json_str_rejects_invalid_values() {
        let err = WatcherConfig::from_json_str(
            r#"{"hysteresis": {"enter_stability_ms": 800, "exit_stability_ms": 400}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WatcherError::Config(ConfigError::Hysteresis(_))
        ));

        let err = WatcherConfig::from_json_str(r#"{"burst": {"count": 0}}"#).unwrap_err();
        assert!(matches!(
            err,
            WatcherError::Config(ConfigError::Zero {
                section: "burst",
                field: "count"
            })
        ));
    }

    #[test]
    fn test_rejects_values_above_maximum() {
        let mut config = WatcherConfig::default();
        config.burst.spacing_ms = 100_000_000_000;
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooLarge {
                section: "burst",
                field: "spacing_ms",
                value: 100_000_000_000,
                max: MAX_DURATION_MS,
            })
        );

        let mut config = WatcherConfig::default();
        config.burst.count = MAX_BURST_COUNT + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::TooLarge { field: "count", .. })
        ));

        let err = WatcherConfig::from_json_str(r#"{"sampling": {"interval_ms": 3600000}}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            WatcherError::Config(ConfigError::TooLarge {
                section: "sampling",
                field: "interval_ms",
                ..
            })
        ));

        let err = WatcherConfig::from_json_str(
            r#"{"hysteresis": {"transition_ignore_ms": 18446744073709551615}}"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WatcherError::Config(ConfigError::Hysteresis(_))
        ));
    }

    #[test]
    fn test_accepts_values_at_maximum() {
        let mut config = WatcherConfig::default();
        config.sampling.interval_ms = MAX_DURATION_MS;
        config.burst.count = MAX_BURST_COUNT;
        config.burst.spacing_ms = MAX_DURATION_MS;
        config.hysteresis.transition_ignore_ms = MAX_DURATION_MS;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_str_rejects_malformed() {
        let err = WatcherConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, WatcherError::Json(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"classifier": {{"split_min_windows": 3}}}}"#).unwrap();

        let config = WatcherConfig::load(file.path()).unwrap();
        assert_eq!(config.classifier.split_min_windows, 3);
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2").unwrap();

        match WatcherConfig::load(file.path()) {
            Err(WatcherError::Parse { path, .. }) => assert_eq!(path, file.path()),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WatcherConfig::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, WatcherError::Io { .. }));
    }

    #[test]
    fn test_load_or_default_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = WatcherConfig::load_or_default_from(&dir.path().join("watcher.json")).unwrap();
        assert_eq!(config, WatcherConfig::default());
    }

    #[test]
    fn test_default_path_layout() {
        if let Some(path) = WatcherConfig::default_path() {
            assert!(path.ends_with("backdrop/watcher.json"));
        }
    }

    #[test]
    fn test_serializes_every_section() {
        let json = serde_json::to_value(WatcherConfig::default()).unwrap();
        for section in ["sampling", "hysteresis", "burst", "classifier", "diagnostics"] {
            assert!(json.get(section).is_some(), "missing {section}");
        }
    }
}

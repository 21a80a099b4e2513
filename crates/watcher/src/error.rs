//! Error types for the watcher.

use std::path::PathBuf;

use backdrop_classifier::ClassifierSettingsError;
use backdrop_hysteresis::SettingsError;
use backdrop_scheduler::SchedulerError;
use thiserror::Error;

pub type WatcherResult<T> = Result<T, WatcherError>;

/// A tuning value outside its valid range.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A sampling or burst duration was zero.
    #[error("{section}.{field} must be greater than zero")]
    Zero {
        section: &'static str,
        field: &'static str,
    },

    /// A sampling or burst value above its upper bound.
    #[error("{section}.{field} ({value}) must not exceed {max}")]
    TooLarge {
        section: &'static str,
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("hysteresis: {0}")]
    Hysteresis(#[from] SettingsError),

    #[error("classifier: {0}")]
    Classifier(#[from] ClassifierSettingsError),
}

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Inline JSON that did not parse.
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The watcher task panicked or was aborted.
    #[error("watcher task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

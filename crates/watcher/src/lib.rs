//! Fullscreen watcher for the backdrop overlay.
//!
//! Keeps a desktop overlay visible over the wallpaper and hides it while
//! another application is fullscreen.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  backdrop-classifier - Snapshot → fullscreen verdict (pure) │
//! │  backdrop-hysteresis - Verdicts → Normal/Suppressed (pure)  │
//! │  burst.rs            - Extra samples after notifications    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  backdrop-snapshot   - Window server snapshots              │
//! │  platform/macos.rs   - NSWorkspace notification observers   │
//! │  controller.rs       - Show/hide requests to the overlay    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Application Layer                          │
//! │  watcher.rs - Serialized sampling loop on one tokio task    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use backdrop_snapshot::platform::PlatformProvider;
//! use backdrop_watcher::{platform, FullscreenWatcher, WatcherConfig};
//!
//! let config = WatcherConfig::load_or_default()?;
//! let mut handle = FullscreenWatcher::new(PlatformProvider::default(), controller, config)?
//!     .spawn()?;
//! handle.hold(platform::register_workspace_observers(handle.notifier()));
//!
//! // On teardown:
//! handle.shutdown().await?;
//! ```

mod burst;
mod config;
mod controller;
mod diagnostics;
mod error;
mod notify;
mod watcher;

pub mod platform;

pub use burst::{BurstResampler, BurstSample};
pub use config::{BurstConfig, DiagnosticsConfig, SamplingConfig, WatcherConfig, MAX_BURST_COUNT};
pub use controller::{NullController, RecordingController, VisibilityController};
pub use diagnostics::{
    DiagnosticEvent, DiagnosticsSink, InMemorySink, NullSink, Reason, TracingSink,
};
pub use error::{ConfigError, WatcherError, WatcherResult};
pub use notify::{Notification, Notifier, ObserverRegistration};
pub use watcher::{FullscreenWatcher, WatcherHandle};

// Re-export the types that appear in this crate's API
pub use backdrop_classifier::{ClassifierSettings, Evidence};
pub use backdrop_hysteresis::{
    HysteresisSettings, Outcome, Phase, VisibilityCommand, MAX_DURATION_MS,
};
pub use backdrop_scheduler::{Clock, ManualClock, TokioClock};

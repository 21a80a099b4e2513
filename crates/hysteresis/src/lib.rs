//! Hysteresis for backdrop's overlay visibility.
//!
//! Raw fullscreen verdicts are noisy: apps toggle chrome during their own
//! transition animations and geometry is unreliable while a desktop switch
//! animates. [`VisibilityMachine`] turns those verdicts into a stable
//! `Normal`/`Suppressed` decision and the show/hide commands that go with
//! it.
//!
//! ```text
//!            fullscreen for >= enter_stability
//!   Normal ──────────────────────────────────▶ Suppressed
//!      ▲                                           │
//!      └───────────────────────────────────────────┘
//!            not fullscreen for >= exit_stability
//! ```

mod machine;
mod settings;

pub use machine::{
    Outcome, Phase, Sample, Step, VisibilityCommand, VisibilityMachine, VisibilityState,
};
pub use settings::{HysteresisSettings, SettingsError, MAX_DURATION_MS};

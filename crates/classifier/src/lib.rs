//! Fullscreen classification for backdrop.
//!
//! Turns a [`Snapshot`](backdrop_snapshot::Snapshot) into a single "is the
//! screen in a fullscreen presentation" verdict. The classifier is a pure
//! function of the snapshot and its [`ClassifierSettings`]:
//!
//! 1. Own windows, system layers, off-screen windows and small windows are
//!    discarded.
//! 2. Each display is tested for exact cover, near cover and split view.
//!    Tolerances scale with the display's backing scale factor.
//! 3. When geometry is inconclusive for the frontmost process, a collapsed
//!    menu bar counts as fullscreen.
//!
//! # Example
//!
//! ```ignore
//! use backdrop_classifier::{classify_detailed, ClassifierSettings};
//!
//! let verdict = classify_detailed(&snapshot, &ClassifierSettings::default());
//! println!("fullscreen: {} ({})", verdict.is_fullscreen, verdict.evidence);
//! ```

mod classify;
mod settings;

pub use classify::{classify, classify_detailed, Evidence, Verdict};
pub use settings::{ClassifierSettings, ClassifierSettingsError};

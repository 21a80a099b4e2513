//! Screen snapshots for backdrop's fullscreen detection.
//!
//! A [`Snapshot`] is the point-in-time view one classification runs on:
//! active displays and on-screen windows in physical pixels, the frontmost
//! process and the height reserved for the menu bar.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Domain Layer                             │
//! │  snapshot.rs  - Snapshot, DisplayGeometry, WindowGeometry   │
//! │  normalize.rs - Logical points to pixels, filtering (pure)  │
//! │  provider.rs  - SnapshotProvider trait, test providers      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Infrastructure Layer                        │
//! │  platform/macos.rs - CGWindowList / NSWorkspace capture     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use backdrop_snapshot::{platform::PlatformProvider, SnapshotProvider};
//!
//! let provider = PlatformProvider::default();
//! let snapshot = provider.capture()?;
//! println!("{} windows", snapshot.windows().len());
//! ```

mod error;
mod normalize;
mod provider;
mod snapshot;

pub mod platform;

pub use error::{SnapshotError, SnapshotResult};
pub use normalize::{normalize, RawDisplay, RawScene, RawWindow, Rect};
pub use provider::{NullProvider, ScriptedProvider, SnapshotProvider};
pub use snapshot::{DisplayGeometry, ProcessId, Snapshot, SnapshotBuilder, WindowGeometry};

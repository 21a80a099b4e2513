//! Platform-specific notification sources.

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "macos")]
pub use macos::register_workspace_observers;

#[cfg(not(target_os = "macos"))]
use crate::notify::{Notifier, ObserverRegistration};

/// Forward workspace notifications to `notifier`.
///
/// Not supported on this platform; the watcher relies on periodic sampling.
#[cfg(not(target_os = "macos"))]
pub fn register_workspace_observers(_notifier: Notifier) -> ObserverRegistration {
    tracing::debug!("Workspace notifications not available on this platform");
    ObserverRegistration::noop()
}

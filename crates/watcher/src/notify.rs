//! Inbound notifications and observer registrations.

use serde::Serialize;
use tokio::sync::mpsc;

/// Something happened that is likely to change fullscreen status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notification {
    /// The active virtual desktop (space) changed.
    WorkspaceChanged,
    /// The frontmost application changed.
    ApplicationActivated,
}

/// Sends notifications to a running watcher.
///
/// Cheap to clone and usable from any thread, including Objective-C
/// observer callbacks.
#[derive(Debug, Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<Notification>,
}

impl Notifier {
    /// Returns `false` once the watcher has stopped.
    pub fn notify(&self, notification: Notification) -> bool {
        self.tx.send(notification).is_ok()
    }

    pub fn workspace_changed(&self) -> bool {
        self.notify(Notification::WorkspaceChanged)
    }

    pub fn application_activated(&self) -> bool {
        self.notify(Notification::ApplicationActivated)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub(crate) fn channel() -> (Notifier, mpsc::UnboundedReceiver<Notification>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Notifier { tx }, rx)
}

/// Keeps notification observers registered until dropped.
///
/// Dropping deregisters synchronously, so no observer callback runs after
/// the drop returns.
pub struct ObserverRegistration {
    deregister: Option<Box<dyn FnOnce() + Send>>,
}

impl ObserverRegistration {
    pub fn new(deregister: impl FnOnce() + Send + 'static) -> Self {
        Self {
            deregister: Some(Box::new(deregister)),
        }
    }

    /// Registration with nothing to undo.
    pub fn noop() -> Self {
        Self { deregister: None }
    }
}

impl std::fmt::Debug for ObserverRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistration")
            .field("active", &self.deregister.is_some())
            .finish()
    }
}

impl Drop for ObserverRegistration {
    fn drop(&mut self) {
        if let Some(deregister) = self.deregister.take() {
            deregister();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_notifier_delivers_in_order() {
        let (notifier, mut rx) = channel();
        assert!(notifier.workspace_changed());
        assert!(notifier.clone().application_activated());

        assert_eq!(rx.try_recv().unwrap(), Notification::WorkspaceChanged);
        assert_eq!(rx.try_recv().unwrap(), Notification::ApplicationActivated);
    }

    #[test]
    fn test_notifier_reports_closed_receiver() {
        let (notifier, rx) = channel();
        drop(rx);
        assert!(notifier.is_closed());
        assert!(!notifier.workspace_changed());
    }

    #[test]
    fn test_registration_deregisters_once_on_drop() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let registration = ObserverRegistration::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        drop(registration);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        drop(ObserverRegistration::noop());
    }
}

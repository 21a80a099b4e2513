//! Provider traits for snapshot capture.
//!
//! These traits abstract the platform query so that classification and the
//! visibility state machine can be exercised without a real window server.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::error::SnapshotError;
use crate::snapshot::Snapshot;

/// Source of screen snapshots.
pub trait SnapshotProvider: Send + Sync {
    /// Capture the current screen state.
    ///
    /// May block on an OS query; callers that drive animation should run it
    /// off their own thread and enforce a timeout.
    fn capture(&self) -> Result<Snapshot, SnapshotError>;
}

impl<P: SnapshotProvider + ?Sized> SnapshotProvider for std::sync::Arc<P> {
    fn capture(&self) -> Result<Snapshot, SnapshotError> {
        (**self).capture()
    }
}

/// Null implementation for unsupported platforms.
///
/// Never produces a snapshot, so fullscreen detection never changes the
/// overlay's visibility.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProvider;

impl SnapshotProvider for NullProvider {
    fn capture(&self) -> Result<Snapshot, SnapshotError> {
        Err(SnapshotError::DisplayEnumerationFailed)
    }
}

/// Replays a fixed sequence of capture results.
///
/// Each capture pops the next queued result; once the queue holds a single
/// result it is repeated forever. Useful for tests and for replaying a
/// recorded session.
#[derive(Default)]
pub struct ScriptedProvider {
    results: Mutex<VecDeque<Result<Snapshot, SnapshotError>>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that always returns `snapshot`.
    pub fn repeating(snapshot: Snapshot) -> Self {
        let provider = Self::new();
        provider.push(Ok(snapshot));
        provider
    }

    /// Queue a result.
    pub fn push(&self, result: Result<Snapshot, SnapshotError>) {
        if let Ok(mut results) = self.results.lock() {
            results.push_back(result);
        }
    }

    /// Drop queued results and repeat `result` from now on.
    pub fn replace(&self, result: Result<Snapshot, SnapshotError>) {
        if let Ok(mut results) = self.results.lock() {
            results.clear();
            results.push_back(result);
        }
    }

    /// Number of queued results.
    pub fn len(&self) -> usize {
        self.results.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotProvider for ScriptedProvider {
    fn capture(&self) -> Result<Snapshot, SnapshotError> {
        let mut results = self
            .results
            .lock()
            .map_err(|_| SnapshotError::CaptureAborted("scripted provider poisoned".into()))?;

        if results.len() > 1 {
            if let Some(next) = results.pop_front() {
                return next;
            }
        }

        results
            .front()
            .cloned()
            .unwrap_or(Err(SnapshotError::WindowEnumerationFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::DisplayGeometry;

    fn snapshot(width: f64) -> Snapshot {
        Snapshot::builder()
            .display(DisplayGeometry::unscaled(width, 1080.0))
            .build()
            .unwrap()
    }

    #[test]
    fn test_null_provider_fails() {
        assert_eq!(
            NullProvider.capture(),
            Err(SnapshotError::DisplayEnumerationFailed)
        );
    }

    #[test]
    fn test_scripted_provider_replays_in_order_then_repeats() {
        let provider = ScriptedProvider::new();
        provider.push(Ok(snapshot(1920.0)));
        provider.push(Err(SnapshotError::WindowEnumerationFailed));
        provider.push(Ok(snapshot(2560.0)));

        assert_eq!(provider.capture().unwrap().displays()[0].width_px, 1920.0);
        assert_eq!(
            provider.capture(),
            Err(SnapshotError::WindowEnumerationFailed)
        );
        assert_eq!(provider.capture().unwrap().displays()[0].width_px, 2560.0);
        assert_eq!(provider.capture().unwrap().displays()[0].width_px, 2560.0);
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn test_scripted_provider_empty_fails() {
        let provider = ScriptedProvider::new();
        assert!(provider.is_empty());
        assert_eq!(
            provider.capture(),
            Err(SnapshotError::WindowEnumerationFailed)
        );
    }

    #[test]
    fn test_scripted_provider_replace() {
        let provider = ScriptedProvider::repeating(snapshot(1920.0));
        provider.push(Ok(snapshot(1280.0)));
        provider.replace(Err(SnapshotError::DisplayEnumerationFailed));

        assert_eq!(
            provider.capture(),
            Err(SnapshotError::DisplayEnumerationFailed)
        );
        assert_eq!(provider.len(), 1);
    }
}

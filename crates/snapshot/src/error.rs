//! Error types for snapshot capture.

use thiserror::Error;

/// Result type for snapshot capture.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Reasons a snapshot could not be captured.
///
/// Every variant is transient: the caller skips the sample and keeps its
/// previous decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// No active display could be enumerated.
    #[error("failed to enumerate displays")]
    DisplayEnumerationFailed,

    /// The on-screen window list could not be obtained.
    #[error("failed to enumerate on-screen windows")]
    WindowEnumerationFailed,

    /// Capture did not finish within its budget.
    #[error("snapshot capture exceeded its {budget_ms}ms budget")]
    TimedOut { budget_ms: u64 },

    /// The capture worker stopped before producing a result.
    #[error("snapshot capture aborted: {0}")]
    CaptureAborted(String),

    /// An earlier capture overran its budget and is still running.
    #[error("previous snapshot capture still running")]
    CaptureInProgress,
}

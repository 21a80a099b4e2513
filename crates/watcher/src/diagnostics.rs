//! Diagnostic events.
//!
//! Sinks only observe. A watcher behaves identically with any sink,
//! including none.

use std::sync::Mutex;

use backdrop_classifier::Evidence;
use backdrop_hysteresis::{Outcome, Phase, VisibilityCommand};
use serde::Serialize;

/// Why the watcher did something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// Baseline periodic sample.
    Periodic,
    /// Burst sample `index` of burst `generation`.
    Burst { generation: u64, index: usize },
    WorkspaceChanged,
    ApplicationActivated,
}

/// One observation of the watcher's decision process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticEvent {
    /// Wall-clock time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
    pub reason: Reason,
    /// Raw classifier verdict, absent when no sample was taken.
    pub verdict: Option<bool>,
    pub evidence: Option<Evidence>,
    /// Phase after the event was handled.
    pub phase: Phase,
    pub pending_run_age_ms: Option<u64>,
    pub outcome: Option<Outcome>,
    pub command: Option<VisibilityCommand>,
    /// Capture failure that caused the sample to be skipped.
    pub error: Option<String>,
}

impl DiagnosticEvent {
    pub fn new(reason: Reason, phase: Phase) -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            reason,
            verdict: None,
            evidence: None,
            phase,
            pending_run_age_ms: None,
            outcome: None,
            command: None,
            error: None,
        }
    }
}

pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, event: DiagnosticEvent);

    /// `false` lets the watcher skip building events.
    fn is_enabled(&self) -> bool {
        true
    }
}

impl<S: DiagnosticsSink + ?Sized> DiagnosticsSink for std::sync::Arc<S> {
    fn record(&self, event: DiagnosticEvent) {
        (**self).record(event)
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticsSink for NullSink {
    fn record(&self, _event: DiagnosticEvent) {}

    fn is_enabled(&self) -> bool {
        false
    }
}

/// Logs each event at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record(&self, event: DiagnosticEvent) {
        tracing::debug!(
            target: "backdrop_watcher::diagnostics",
            reason = ?event.reason,
            verdict = ?event.verdict,
            evidence = ?event.evidence,
            phase = %event.phase,
            pending_run_age_ms = ?event.pending_run_age_ms,
            outcome = ?event.outcome,
            command = ?event.command,
            error = ?event.error,
            "diagnostic"
        );
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct InMemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl DiagnosticsSink for InMemorySink {
    fn record(&self, event: DiagnosticEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_sink_collects() {
        let sink = InMemorySink::new();
        assert!(sink.is_empty());

        sink.record(DiagnosticEvent::new(Reason::Periodic, Phase::Normal));
        sink.record(DiagnosticEvent::new(
            Reason::WorkspaceChanged,
            Phase::Suppressed,
        ));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].reason, Reason::WorkspaceChanged);

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_null_sink_disabled() {
        assert!(!NullSink.is_enabled());
        assert!(TracingSink.is_enabled());
        assert!(InMemorySink::new().is_enabled());
    }

    #[test]
    fn test_event_serializes() {
        let mut event = DiagnosticEvent::new(
            Reason::Burst {
                generation: 2,
                index: 1,
            },
            Phase::Normal,
        );
        event.verdict = Some(true);
        event.evidence = Some(Evidence::ExactCover { display: 0 });
        event.outcome = Some(Outcome::RunStarted);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reason"]["kind"], "burst");
        assert_eq!(json["reason"]["index"], 1);
        assert_eq!(json["evidence"]["kind"], "exact_cover");
        assert_eq!(json["outcome"], "run_started");
        assert_eq!(json["phase"], "normal");
        assert!(json["error"].is_null());
    }
}

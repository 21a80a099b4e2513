//! The fullscreen watcher loop.
//!
//! One tokio task owns the scheduler, the visibility machine and every call
//! into the controller. Periodic ticks, burst timers and notifications are
//! multiplexed with `tokio::select!`, so they never run concurrently.

use std::sync::Arc;
use std::time::Duration;

use backdrop_classifier::{classify_detailed, ClassifierSettings};
use backdrop_hysteresis::{Outcome, Phase, Sample, VisibilityMachine};
use backdrop_scheduler::{Clock, Scheduler, Tick, TokioClock};
use backdrop_snapshot::{Snapshot, SnapshotError, SnapshotProvider};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::burst::{BurstResampler, BurstSample};
use crate::config::WatcherConfig;
use crate::controller::{self, VisibilityController};
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink, NullSink, Reason, TracingSink};
use crate::error::{ConfigError, WatcherError};
use crate::notify::{self, Notification, Notifier, ObserverRegistration};

/// Builder for a running fullscreen watcher.
///
/// # Example
///
/// ```ignore
/// let handle = FullscreenWatcher::new(PlatformProvider::default(), controller, config)?
///     .spawn()?;
/// let _observers = platform::register_workspace_observers(handle.notifier());
/// ```
pub struct FullscreenWatcher {
    provider: Arc<dyn SnapshotProvider>,
    controller: Arc<dyn VisibilityController>,
    config: WatcherConfig,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl FullscreenWatcher {
    /// Validates `config`. Diagnostics go to the log when
    /// `config.diagnostics.enabled` is set.
    pub fn new<P, C>(provider: P, controller: C, config: WatcherConfig) -> Result<Self, WatcherError>
    where
        P: SnapshotProvider + 'static,
        C: VisibilityController + 'static,
    {
        config.validate()?;

        let diagnostics: Arc<dyn DiagnosticsSink> = if config.diagnostics.enabled {
            Arc::new(TracingSink)
        } else {
            Arc::new(NullSink)
        };

        Ok(Self {
            provider: Arc::new(provider),
            controller: Arc::new(controller),
            config,
            clock: Arc::new(TokioClock),
            diagnostics,
        })
    }

    /// Timestamp samples with `clock` instead of tokio's clock.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Send diagnostic events to `sink`.
    pub fn with_diagnostics(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.diagnostics = Arc::new(sink);
        self
    }

    /// Start the loop on the current tokio runtime.
    pub fn spawn(self) -> Result<WatcherHandle, WatcherError> {
        let scheduler = Scheduler::new(self.config.sampling.interval())?;
        let machine = VisibilityMachine::new(self.config.hysteresis).map_err(ConfigError::from)?;
        let (notifier, notifications) = notify::channel();
        let (phase_tx, phase_rx) = watch::channel(Phase::Normal);
        let cancel = CancellationToken::new();

        let worker = WatcherLoop {
            capturer: Capturer::new(self.provider, self.config.sampling.capture_timeout()),
            controller: self.controller,
            clock: self.clock,
            diagnostics: self.diagnostics,
            classifier: self.config.classifier,
            machine,
            burst: BurstResampler::new(self.config.burst),
            scheduler,
            notifications,
            phase: phase_tx,
            cancel: cancel.clone(),
        };

        tracing::info!(
            interval_ms = self.config.sampling.interval_ms,
            enter_ms = self.config.hysteresis.enter_stability_ms,
            exit_ms = self.config.hysteresis.exit_stability_ms,
            "Fullscreen watcher started"
        );
        let task = tokio::spawn(worker.run());

        Ok(WatcherHandle {
            notifier,
            phase: phase_rx,
            cancel,
            task: Some(task),
            registrations: Vec::new(),
        })
    }
}

/// Owner of a running watcher.
///
/// Dropping the handle stops the watcher; [`WatcherHandle::shutdown`] also
/// waits for the loop to finish.
pub struct WatcherHandle {
    notifier: Notifier,
    phase: watch::Receiver<Phase>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
    registrations: Vec<ObserverRegistration>,
}

impl WatcherHandle {
    pub fn notifier(&self) -> Notifier {
        self.notifier.clone()
    }

    /// Keep `registration` alive until the watcher shuts down.
    pub fn hold(&mut self, registration: ObserverRegistration) {
        self.registrations.push(registration);
    }

    /// Last committed phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// Receiver that sees every committed phase change.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.phase.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Deregister observers, stop the loop and wait for it.
    pub async fn shutdown(mut self) -> Result<(), WatcherError> {
        self.registrations.clear();
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.registrations.clear();
        self.cancel.cancel();
    }
}

enum Event {
    Notification(Notification),
    Tick(Tick<BurstSample>),
}

struct WatcherLoop {
    capturer: Capturer,
    controller: Arc<dyn VisibilityController>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticsSink>,
    classifier: ClassifierSettings,
    machine: VisibilityMachine,
    burst: BurstResampler,
    scheduler: Scheduler<BurstSample>,
    notifications: mpsc::UnboundedReceiver<Notification>,
    phase: watch::Sender<Phase>,
    cancel: CancellationToken,
}

impl WatcherLoop {
    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                Some(notification) = self.notifications.recv() => Event::Notification(notification),
                tick = self.scheduler.next() => Event::Tick(tick),
            };

            match event {
                Event::Notification(notification) => self.on_notification(notification),
                Event::Tick(Tick::Periodic(_)) => self.sample(Reason::Periodic).await,
                Event::Tick(Tick::Timer(burst)) => {
                    if self.burst.fired(burst) {
                        self.sample(Reason::Burst {
                            generation: burst.generation,
                            index: burst.index,
                        })
                        .await;
                    }
                }
            }
        }

        tracing::info!("Fullscreen watcher stopped");
    }

    fn on_notification(&mut self, notification: Notification) {
        let reason = match notification {
            Notification::WorkspaceChanged => {
                self.machine.arm_transition_ignore(self.clock.now());
                Reason::WorkspaceChanged
            }
            Notification::ApplicationActivated => Reason::ApplicationActivated,
        };
        self.burst.arm(&mut self.scheduler);

        tracing::debug!(?notification, "Notification received");
        if self.diagnostics.is_enabled() {
            self.diagnostics
                .record(DiagnosticEvent::new(reason, self.machine.phase()));
        }
    }

    async fn sample(&mut self, reason: Reason) {
        let timestamp = self.clock.now();

        let captured = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            captured = self.capturer.capture() => captured,
        };

        let snapshot = match captured {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(error = %err, ?reason, "Snapshot capture failed, skipping sample");
                if self.diagnostics.is_enabled() {
                    let mut event = DiagnosticEvent::new(reason, self.machine.phase());
                    event.error = Some(err.to_string());
                    event.pending_run_age_ms = self.pending_run_age_ms(timestamp);
                    self.diagnostics.record(event);
                }
                return;
            }
        };

        let verdict = classify_detailed(&snapshot, &self.classifier);
        let step = self.machine.process(
            Sample::new(timestamp, verdict.is_fullscreen),
            self.controller.is_fully_hidden(),
        );

        if step.outcome == Outcome::OutOfOrder {
            tracing::warn!(?reason, "Out-of-order sample discarded");
        } else {
            tracing::debug!(
                ?reason,
                fullscreen = verdict.is_fullscreen,
                outcome = ?step.outcome,
                phase = %self.machine.phase(),
                "Sample processed"
            );
        }

        if let Some(command) = step.command {
            tracing::info!(?command, phase = %self.machine.phase(), "Visibility requested");
            controller::apply(self.controller.as_ref(), command);
        }

        self.phase.send_if_modified(|phase| {
            let changed = *phase != self.machine.phase();
            *phase = self.machine.phase();
            changed
        });

        if self.diagnostics.is_enabled() {
            let mut event = DiagnosticEvent::new(reason, self.machine.phase());
            event.verdict = Some(verdict.is_fullscreen);
            event.evidence = Some(verdict.evidence);
            event.pending_run_age_ms = self.pending_run_age_ms(timestamp);
            event.outcome = Some(step.outcome);
            event.command = step.command;
            self.diagnostics.record(event);
        }
    }

    fn pending_run_age_ms(&self, now: std::time::Instant) -> Option<u64> {
        self.machine
            .pending_run_age(now)
            .map(|age| age.as_millis() as u64)
    }
}

/// Runs the provider off the loop task under a time budget.
///
/// A capture that overruns keeps its blocking thread. Until it finishes,
/// later captures fail fast instead of starting another worker.
struct Capturer {
    provider: Arc<dyn SnapshotProvider>,
    budget: Duration,
    stalled: Option<JoinHandle<Result<Snapshot, SnapshotError>>>,
}

impl Capturer {
    fn new(provider: Arc<dyn SnapshotProvider>, budget: Duration) -> Self {
        Self {
            provider,
            budget,
            stalled: None,
        }
    }

    async fn capture(&mut self) -> Result<Snapshot, SnapshotError> {
        if self.stalled.as_ref().is_some_and(|worker| !worker.is_finished()) {
            return Err(SnapshotError::CaptureInProgress);
        }
        // A late result describes an old screen; drop it.
        self.stalled = None;

        let provider = Arc::clone(&self.provider);
        let mut worker = tokio::task::spawn_blocking(move || provider.capture());

        match tokio::time::timeout(self.budget, &mut worker).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(SnapshotError::CaptureAborted(join.to_string())),
            Err(_) => {
                self.stalled = Some(worker);
                Err(SnapshotError::TimedOut {
                    budget_ms: self.budget.as_millis() as u64,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::RecordingController;
    use backdrop_snapshot::{DisplayGeometry, ScriptedProvider, WindowGeometry};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Mutex};

    fn desktop() -> Snapshot {
        Snapshot::builder()
            .display(DisplayGeometry::unscaled(1920.0, 1080.0))
            .window(WindowGeometry::new(800.0, 600.0, 10))
            .menu_bar_reserved_height(24.0)
            .build()
            .unwrap()
    }

    struct SlowProvider;

    impl SnapshotProvider for SlowProvider {
        fn capture(&self) -> Result<Snapshot, SnapshotError> {
            std::thread::sleep(Duration::from_millis(200));
            Ok(desktop())
        }
    }

    struct PanickingProvider;

    impl SnapshotProvider for PanickingProvider {
        fn capture(&self) -> Result<Snapshot, SnapshotError> {
            panic!("window server went away");
        }
    }

    /// Blocks its first capture until released.
    struct GatedProvider {
        calls: AtomicUsize,
        gate: Mutex<mpsc::Receiver<()>>,
    }

    impl SnapshotProvider for GatedProvider {
        fn capture(&self) -> Result<Snapshot, SnapshotError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                let _ = self.gate.lock().map(|gate| gate.recv());
            }
            Ok(desktop())
        }
    }

    #[tokio::test]
    async fn test_capture_returns_provider_result() {
        let provider = Arc::new(ScriptedProvider::repeating(desktop()));
        let mut capturer = Capturer::new(provider, Duration::from_secs(1));
        let snapshot = capturer.capture().await.unwrap();
        assert_eq!(snapshot.windows().len(), 1);
    }

    #[tokio::test]
    async fn test_capture_times_out() {
        let mut capturer = Capturer::new(Arc::new(SlowProvider), Duration::from_millis(5));
        let result = capturer.capture().await;
        assert_eq!(result, Err(SnapshotError::TimedOut { budget_ms: 5 }));
    }

    #[tokio::test]
    async fn test_capture_reports_panicking_worker() {
        let mut capturer = Capturer::new(Arc::new(PanickingProvider), Duration::from_secs(1));
        let result = capturer.capture().await;
        assert!(matches!(result, Err(SnapshotError::CaptureAborted(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stalled_capture_blocks_new_workers() {
        let (release, gate) = mpsc::channel();
        let provider = Arc::new(GatedProvider {
            calls: AtomicUsize::new(0),
            gate: Mutex::new(gate),
        });
        let mut capturer = Capturer::new(provider.clone(), Duration::from_millis(20));

        assert_eq!(
            capturer.capture().await,
            Err(SnapshotError::TimedOut { budget_ms: 20 })
        );
        for _ in 0..5 {
            assert_eq!(
                capturer.capture().await,
                Err(SnapshotError::CaptureInProgress)
            );
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

        release.send(()).unwrap();
        while capturer
            .stalled
            .as_ref()
            .is_some_and(|worker| !worker.is_finished())
        {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        assert!(capturer.capture().await.is_ok());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_config() {
        let mut config = WatcherConfig::default();
        config.sampling.interval_ms = 0;
        let result = FullscreenWatcher::new(
            ScriptedProvider::repeating(desktop()),
            RecordingController::new(),
            config,
        );
        assert!(matches!(result, Err(WatcherError::Config(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_lifecycle() {
        let handle = FullscreenWatcher::new(
            ScriptedProvider::repeating(desktop()),
            RecordingController::new(),
            WatcherConfig::default(),
        )
        .unwrap()
        .spawn()
        .unwrap();

        assert!(handle.is_running());
        assert_eq!(handle.phase(), Phase::Normal);

        let notifier = handle.notifier();
        handle.shutdown().await.unwrap();
        assert!(!notifier.workspace_changed());
    }
}

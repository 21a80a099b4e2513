//! Visibility state machine.
//!
//! Pure domain logic: time only enters through sample timestamps and the
//! instant passed to [`VisibilityMachine::arm_transition_ignore`].

use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::settings::{HysteresisSettings, SettingsError};

/// One classification at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub timestamp: Instant,
    pub is_fullscreen_raw: bool,
}

impl Sample {
    pub fn new(timestamp: Instant, is_fullscreen_raw: bool) -> Self {
        Self {
            timestamp,
            is_fullscreen_raw,
        }
    }
}

/// Committed visibility phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Overlay visible.
    #[default]
    Normal,
    /// Overlay hidden behind a fullscreen app.
    Suppressed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Normal => write!(f, "normal"),
            Phase::Suppressed => write!(f, "suppressed"),
        }
    }
}

/// Request for the visibility controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityCommand {
    Show,
    Hide,
}

/// What a processed sample did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Older than the previous sample; discarded.
    OutOfOrder,
    /// Inside the transition-ignore window.
    Ignored,
    /// Agrees with the current phase; nothing pending.
    Steady,
    /// First contradicting sample; a candidate run began.
    RunStarted,
    /// Candidate run continues but is not yet long enough.
    RunPending,
    /// A sample agreeing with the phase cancelled the candidate run.
    RunReset,
    /// The candidate run lasted long enough and the phase flipped.
    Committed,
    /// Fullscreen confirmed while the overlay was still visible; hide again.
    Reasserted,
}

/// Result of [`VisibilityMachine::process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub command: Option<VisibilityCommand>,
    pub outcome: Outcome,
}

impl Step {
    fn quiet(outcome: Outcome) -> Self {
        Self {
            command: None,
            outcome,
        }
    }
}

/// Mutable decision state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VisibilityState {
    pub phase: Phase,

    /// Start of the current run of phase-contradicting samples.
    pub candidate_since: Option<Instant>,

    /// Samples before this instant do not advance runs.
    pub transition_ignore_until: Option<Instant>,
}

/// Debounced `Normal`/`Suppressed` decision over raw fullscreen samples.
///
/// Entering suppression needs `enter_stability` of continuous fullscreen
/// samples; leaving it needs the longer `exit_stability` of continuous
/// non-fullscreen samples. Both are measured from the first sample of the
/// run. The machine remembers the last command it issued and never repeats
/// it, except to correct a controller that reports the overlay visible while
/// suppressed.
#[derive(Debug, Clone)]
pub struct VisibilityMachine {
    settings: HysteresisSettings,
    state: VisibilityState,
    /// The overlay starts visible.
    last_requested: VisibilityCommand,
    last_sample_at: Option<Instant>,
}

impl VisibilityMachine {
    pub fn new(settings: HysteresisSettings) -> Result<Self, SettingsError> {
        settings.validate()?;
        Ok(Self {
            settings,
            state: VisibilityState::default(),
            last_requested: VisibilityCommand::Show,
            last_sample_at: None,
        })
    }

    pub fn settings(&self) -> &HysteresisSettings {
        &self.settings
    }

    pub fn state(&self) -> &VisibilityState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Last command issued (initially `Show`).
    pub fn last_requested(&self) -> VisibilityCommand {
        self.last_requested
    }

    /// Age of the pending candidate run at `now`.
    pub fn pending_run_age(&self, now: Instant) -> Option<Duration> {
        self.state
            .candidate_since
            .map(|since| now.saturating_duration_since(since))
    }

    /// Disregard samples for the transition-ignore window from `now`.
    ///
    /// Any pending run is dropped so that evidence gathered before the
    /// switch cannot complete a run after it.
    pub fn arm_transition_ignore(&mut self, now: Instant) {
        let until = now + self.settings.transition_ignore();
        self.state.transition_ignore_until = Some(until);
        self.state.candidate_since = None;
        tracing::debug!(
            ignore_ms = self.settings.transition_ignore_ms,
            "Transition-ignore window armed"
        );
    }

    pub fn is_ignoring(&self, now: Instant) -> bool {
        self.state
            .transition_ignore_until
            .is_some_and(|until| now < until)
    }

    /// Feed one sample.
    ///
    /// `overlay_hidden` is the controller's view of the actual visual state,
    /// when it has one.
    pub fn process(&mut self, sample: Sample, overlay_hidden: Option<bool>) -> Step {
        let now = sample.timestamp;

        if self.last_sample_at.is_some_and(|last| now < last) {
            return Step::quiet(Outcome::OutOfOrder);
        }
        self.last_sample_at = Some(now);

        if let Some(until) = self.state.transition_ignore_until {
            if now < until {
                return Step::quiet(Outcome::Ignored);
            }
            self.state.transition_ignore_until = None;
        }

        match (self.state.phase, sample.is_fullscreen_raw) {
            (Phase::Normal, false) => self.cancel_run(),
            (Phase::Normal, true) => self.advance_run(now, Phase::Suppressed),
            (Phase::Suppressed, true) => self.confirm_suppressed(overlay_hidden),
            (Phase::Suppressed, false) => self.advance_run(now, Phase::Normal),
        }
    }

    fn cancel_run(&mut self) -> Step {
        if self.state.candidate_since.take().is_some() {
            Step::quiet(Outcome::RunReset)
        } else {
            Step::quiet(Outcome::Steady)
        }
    }

    fn advance_run(&mut self, now: Instant, target: Phase) -> Step {
        let Some(since) = self.state.candidate_since else {
            self.state.candidate_since = Some(now);
            let command = if target == Phase::Normal && self.settings.optimistic_show {
                self.request(VisibilityCommand::Show)
            } else {
                None
            };
            return Step {
                command,
                outcome: Outcome::RunStarted,
            };
        };

        let threshold = match target {
            Phase::Suppressed => self.settings.enter_stability(),
            Phase::Normal => self.settings.exit_stability(),
        };
        let age = now.saturating_duration_since(since);
        if age < threshold {
            return Step::quiet(Outcome::RunPending);
        }

        self.state.phase = target;
        self.state.candidate_since = None;
        tracing::info!(phase = %target, run_ms = age.as_millis() as u64, "Visibility phase committed");

        let command = match target {
            Phase::Suppressed => self.request(VisibilityCommand::Hide),
            Phase::Normal => self.request(VisibilityCommand::Show),
        };
        Step {
            command,
            outcome: Outcome::Committed,
        }
    }

    fn confirm_suppressed(&mut self, overlay_hidden: Option<bool>) -> Step {
        let had_run = self.state.candidate_since.take().is_some();

        // Shown early by an optimistic exit that did not hold.
        if self.last_requested == VisibilityCommand::Show {
            return Step {
                command: self.request(VisibilityCommand::Hide),
                outcome: Outcome::RunReset,
            };
        }

        if overlay_hidden == Some(false) {
            tracing::debug!("Overlay visible while suppressed, hiding again");
            return Step {
                command: Some(VisibilityCommand::Hide),
                outcome: Outcome::Reasserted,
            };
        }

        Step::quiet(if had_run {
            Outcome::RunReset
        } else {
            Outcome::Steady
        })
    }

    fn request(&mut self, command: VisibilityCommand) -> Option<VisibilityCommand> {
        if self.last_requested == command {
            None
        } else {
            self.last_requested = command;
            Some(command)
        }
    }
}

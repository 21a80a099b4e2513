//! Outbound visibility commands.

use std::sync::{Arc, Mutex};

use backdrop_hysteresis::VisibilityCommand;

/// Whatever shows and hides the overlay window.
///
/// Requests are idempotent on the controller side: it must not re-animate
/// when already in the requested state.
pub trait VisibilityController: Send + Sync {
    fn request_show(&self);

    fn request_hide(&self);

    /// Whether the overlay is fully hidden right now, if the controller
    /// knows. Used to correct a stale visible overlay while suppressed.
    fn is_fully_hidden(&self) -> Option<bool> {
        None
    }
}

impl<C: VisibilityController + ?Sized> VisibilityController for Arc<C> {
    fn request_show(&self) {
        (**self).request_show()
    }

    fn request_hide(&self) {
        (**self).request_hide()
    }

    fn is_fully_hidden(&self) -> Option<bool> {
        (**self).is_fully_hidden()
    }
}

pub(crate) fn apply(controller: &dyn VisibilityController, command: VisibilityCommand) {
    match command {
        VisibilityCommand::Show => controller.request_show(),
        VisibilityCommand::Hide => controller.request_hide(),
    }
}

/// Ignores every request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullController;

impl VisibilityController for NullController {
    fn request_show(&self) {}

    fn request_hide(&self) {}
}

/// Records requests for later inspection.
///
/// Reports no visual state until [`RecordingController::set_fully_hidden`]
/// is called with `Some(_)`; from then on requests update the reported
/// state.
#[derive(Debug, Default)]
pub struct RecordingController {
    commands: Mutex<Vec<VisibilityCommand>>,
    fully_hidden: Mutex<Option<bool>>,
}

impl RecordingController {
    pub fn new() -> Self {
        Self::default()
    }

    /// All requests so far, oldest first.
    pub fn commands(&self) -> Vec<VisibilityCommand> {
        self.commands
            .lock()
            .map(|commands| commands.clone())
            .unwrap_or_default()
    }

    pub fn hide_count(&self) -> usize {
        self.count(VisibilityCommand::Hide)
    }

    pub fn show_count(&self) -> usize {
        self.count(VisibilityCommand::Show)
    }

    pub fn clear(&self) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.clear();
        }
    }

    /// Override the reported visual state, e.g. to simulate an overlay that
    /// reappeared on its own.
    pub fn set_fully_hidden(&self, hidden: Option<bool>) {
        if let Ok(mut state) = self.fully_hidden.lock() {
            *state = hidden;
        }
    }

    fn count(&self, command: VisibilityCommand) -> usize {
        self.commands
            .lock()
            .map(|commands| commands.iter().filter(|c| **c == command).count())
            .unwrap_or(0)
    }

    fn record(&self, command: VisibilityCommand) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.push(command);
        }
        if let Ok(mut state) = self.fully_hidden.lock() {
            if state.is_some() {
                *state = Some(command == VisibilityCommand::Hide);
            }
        }
    }
}

impl VisibilityController for RecordingController {
    fn request_show(&self) {
        self.record(VisibilityCommand::Show);
    }

    fn request_hide(&self) {
        self.record(VisibilityCommand::Hide);
    }

    fn is_fully_hidden(&self) -> Option<bool> {
        self.fully_hidden.lock().ok().and_then(|state| *state)
    }
}

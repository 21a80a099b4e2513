//! Normalization of raw window-server geometry into a [`Snapshot`].
//!
//! Platform queries report rectangles in logical points, in a global
//! top-left-origin coordinate space shared by all displays. The classifier
//! works in physical pixels, so every rectangle is scaled by the backing
//! scale factor of the display it sits on.

use serde::Serialize;

use crate::error::SnapshotError;
use crate::snapshot::{DisplayGeometry, ProcessId, Snapshot, WindowGeometry};

/// Rectangle in logical points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, (px, py): (f64, f64)) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }
}

/// Display as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawDisplay {
    pub bounds: Rect,
    pub scale_factor: f64,
}

/// Window as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawWindow {
    pub bounds: Rect,
    pub owner_pid: ProcessId,
    pub layer: i32,
    pub is_onscreen: bool,
}

/// Unprocessed platform observation. The first display is the primary one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawScene {
    pub displays: Vec<RawDisplay>,
    pub windows: Vec<RawWindow>,
    pub frontmost_pid: Option<ProcessId>,
    pub own_pid: Option<ProcessId>,
    /// Points between the top of the primary display and the top of its
    /// usable area (menu bar, notch). `None` when the query failed.
    pub primary_top_inset_pt: Option<f64>,
}

/// Convert a raw scene into a pixel-space snapshot.
///
/// Drops off-screen windows, windows owned by `own_pid` and desktop-level
/// windows (negative layer). Fails when the scene has no display.
pub fn normalize(scene: RawScene) -> Result<Snapshot, SnapshotError> {
    let Some(primary) = scene.displays.first().copied() else {
        return Err(SnapshotError::DisplayEnumerationFailed);
    };

    let displays = scene.displays.iter().map(|display| {
        let scale = effective_scale(display.scale_factor);
        DisplayGeometry::new(
            display.bounds.width * scale,
            display.bounds.height * scale,
            scale,
        )
    });

    let own_pid = scene.own_pid;
    let windows = scene
        .windows
        .iter()
        .filter(|window| window.is_onscreen)
        .filter(|window| Some(window.owner_pid) != own_pid)
        .filter(|window| window.layer >= 0)
        .map(|window| {
            let display = containing_display(&window.bounds, &scene.displays);
            let scale = effective_scale(
                display.map_or(primary.scale_factor, |index| scene.displays[index].scale_factor),
            );
            WindowGeometry {
                width_px: window.bounds.width * scale,
                height_px: window.bounds.height * scale,
                owner_pid: window.owner_pid,
                layer: window.layer,
                is_onscreen: true,
                display,
            }
        });

    let menu_bar_px = scene
        .primary_top_inset_pt
        .filter(|inset| inset.is_finite())
        .map(|inset| inset.max(0.0) * effective_scale(primary.scale_factor));

    Snapshot::builder()
        .displays(displays)
        .windows(windows)
        .frontmost_pid(scene.frontmost_pid)
        .own_pid(own_pid)
        .menu_bar_reserved_height(menu_bar_px)
        .build()
}

/// Index of the display containing the window's centre.
fn containing_display(bounds: &Rect, displays: &[RawDisplay]) -> Option<usize> {
    let center = bounds.center();
    displays
        .iter()
        .position(|display| display.bounds.contains(center))
}

fn effective_scale(scale: f64) -> f64 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

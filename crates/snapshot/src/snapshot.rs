//! Snapshot data structures.

use serde::Serialize;

use crate::error::SnapshotError;

/// Operating-system process identifier (`pid_t`).
pub type ProcessId = i32;

/// One active display, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplayGeometry {
    /// Width in pixels (logical width × backing scale factor).
    pub width_px: f64,

    /// Height in pixels (logical height × backing scale factor).
    pub height_px: f64,

    /// Ratio between logical points and physical pixels.
    pub scale_factor: f64,
}

impl DisplayGeometry {
    pub fn new(width_px: f64, height_px: f64, scale_factor: f64) -> Self {
        Self {
            width_px,
            height_px,
            scale_factor,
        }
    }

    /// Display with a backing scale factor of 1.
    pub fn unscaled(width_px: f64, height_px: f64) -> Self {
        Self::new(width_px, height_px, 1.0)
    }

    pub fn area(&self) -> f64 {
        self.width_px * self.height_px
    }
}

/// One on-screen window, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowGeometry {
    pub width_px: f64,
    pub height_px: f64,

    /// Process that owns the window.
    pub owner_pid: ProcessId,

    /// Window layer / z-order hint. 0 is the normal application layer.
    pub layer: i32,

    pub is_onscreen: bool,

    /// Index of the display containing the window's centre, when known.
    pub display: Option<usize>,
}

impl WindowGeometry {
    /// A normal-layer, on-screen window.
    pub fn new(width_px: f64, height_px: f64, owner_pid: ProcessId) -> Self {
        Self {
            width_px,
            height_px,
            owner_pid,
            layer: 0,
            is_onscreen: true,
            display: None,
        }
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }

    pub fn offscreen(mut self) -> Self {
        self.is_onscreen = false;
        self
    }

    pub fn on_display(mut self, index: usize) -> Self {
        self.display = Some(index);
        self
    }

    pub fn area(&self) -> f64 {
        self.width_px * self.height_px
    }
}

/// Point-in-time view of the screen used for one classification.
///
/// Ephemeral: recreated for every sample. `displays` is never empty; use
/// [`Snapshot::builder`] to construct one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    displays: Vec<DisplayGeometry>,
    windows: Vec<WindowGeometry>,
    frontmost_pid: Option<ProcessId>,
    menu_bar_reserved_height: Option<f64>,
    own_pid: Option<ProcessId>,
}

impl Snapshot {
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    /// Active displays; the first one is the primary display.
    pub fn displays(&self) -> &[DisplayGeometry] {
        &self.displays
    }

    pub fn windows(&self) -> &[WindowGeometry] {
        &self.windows
    }

    pub fn frontmost_pid(&self) -> Option<ProcessId> {
        self.frontmost_pid
    }

    /// Pixel height reserved for system chrome on the primary display.
    ///
    /// `None` when the platform could not report it.
    pub fn menu_bar_reserved_height(&self) -> Option<f64> {
        self.menu_bar_reserved_height
    }

    /// Process id of the overlay itself, when known.
    pub fn own_pid(&self) -> Option<ProcessId> {
        self.own_pid
    }
}

/// Builder for [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    displays: Vec<DisplayGeometry>,
    windows: Vec<WindowGeometry>,
    frontmost_pid: Option<ProcessId>,
    menu_bar_reserved_height: Option<f64>,
    own_pid: Option<ProcessId>,
}

impl SnapshotBuilder {
    pub fn display(mut self, display: DisplayGeometry) -> Self {
        self.displays.push(display);
        self
    }

    pub fn displays(mut self, displays: impl IntoIterator<Item = DisplayGeometry>) -> Self {
        self.displays.extend(displays);
        self
    }

    pub fn window(mut self, window: WindowGeometry) -> Self {
        self.windows.push(window);
        self
    }

    pub fn windows(mut self, windows: impl IntoIterator<Item = WindowGeometry>) -> Self {
        self.windows.extend(windows);
        self
    }

    pub fn frontmost_pid(mut self, pid: Option<ProcessId>) -> Self {
        self.frontmost_pid = pid;
        self
    }

    pub fn menu_bar_reserved_height(mut self, height_px: impl Into<Option<f64>>) -> Self {
        self.menu_bar_reserved_height = height_px.into();
        self
    }

    pub fn own_pid(mut self, pid: Option<ProcessId>) -> Self {
        self.own_pid = pid;
        self
    }

    /// Fails with [`SnapshotError::DisplayEnumerationFailed`] when no display
    /// was added.
    pub fn build(self) -> Result<Snapshot, SnapshotError> {
        if self.displays.is_empty() {
            return Err(SnapshotError::DisplayEnumerationFailed);
        }

        Ok(Snapshot {
            displays: self.displays,
            windows: self.windows,
            frontmost_pid: self.frontmost_pid,
            menu_bar_reserved_height: self.menu_bar_reserved_height,
            own_pid: self.own_pid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_display() {
        let result = Snapshot::builder()
            .window(WindowGeometry::new(800.0, 600.0, 42))
            .build();
        assert_eq!(result, Err(SnapshotError::DisplayEnumerationFailed));
    }

    #[test]
    fn test_build_keeps_display_order() {
        let snapshot = Snapshot::builder()
            .display(DisplayGeometry::new(2880.0, 1800.0, 2.0))
            .display(DisplayGeometry::unscaled(1920.0, 1080.0))
            .frontmost_pid(Some(7))
            .menu_bar_reserved_height(74.0)
            .build()
            .unwrap();

        assert_eq!(snapshot.displays().len(), 2);
        assert_eq!(snapshot.displays()[0].scale_factor, 2.0);
        assert_eq!(snapshot.frontmost_pid(), Some(7));
        assert_eq!(snapshot.menu_bar_reserved_height(), Some(74.0));
        assert!(snapshot.windows().is_empty());
    }

    #[test]
    fn test_window_helpers() {
        let window = WindowGeometry::new(100.0, 50.0, 1).with_layer(3).offscreen();
        assert_eq!(window.layer, 3);
        assert!(!window.is_onscreen);
        assert_eq!(window.area(), 5000.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = Snapshot::builder()
            .display(DisplayGeometry::unscaled(1920.0, 1080.0))
            .build()
            .unwrap();
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"width_px\":1920.0"));
        assert!(json.contains("\"frontmost_pid\":null"));
    }

    #[test]
    fn test_menu_bar_unknown_by_default() {
        let snapshot = Snapshot::builder()
            .display(DisplayGeometry::unscaled(1920.0, 1080.0))
            .build()
            .unwrap();
        assert_eq!(snapshot.menu_bar_reserved_height(), None);

        let window = WindowGeometry::new(960.0, 1080.0, 1).on_display(1);
        assert_eq!(window.display, Some(1));
    }
}

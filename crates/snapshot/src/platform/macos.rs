//! macOS snapshot capture via CoreGraphics and AppKit.

use core_foundation::array::CFArray;
use core_foundation::base::{CFType, TCFType};
use core_foundation::boolean::CFBoolean;
use core_foundation::dictionary::CFDictionary;
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::{
    kCGNullWindowID, kCGWindowListExcludeDesktopElements, kCGWindowListOptionOnScreenOnly,
    CGDisplay, CGWindowListCopyWindowInfo,
};
use core_graphics::geometry::CGRect;
use core_graphics::window::{kCGWindowBounds, kCGWindowIsOnscreen, kCGWindowLayer, kCGWindowOwnerPID};
use objc::runtime::{Class, Object};
use objc::{msg_send, sel, sel_impl};
use tracing::{debug, trace};

use crate::error::SnapshotError;
use crate::normalize::{normalize, RawDisplay, RawScene, RawWindow, Rect};
use crate::provider::SnapshotProvider;
use crate::snapshot::{ProcessId, Snapshot};

/// Captures snapshots from the macOS window server.
///
/// Windows come from `CGWindowListCopyWindowInfo` (on-screen only, desktop
/// elements excluded), displays from `CGGetActiveDisplayList`, the frontmost
/// process from `NSWorkspace` and the menu-bar inset from the primary
/// `NSScreen`.
#[derive(Debug, Clone)]
pub struct MacOSProvider {
    own_pid: ProcessId,
}

impl MacOSProvider {
    pub fn new() -> Self {
        Self {
            own_pid: std::process::id() as ProcessId,
        }
    }
}

impl Default for MacOSProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotProvider for MacOSProvider {
    fn capture(&self) -> Result<Snapshot, SnapshotError> {
        let displays = active_displays()?;
        let windows = onscreen_windows()?;
        let frontmost_pid = frontmost_pid();
        let primary_top_inset_pt = primary_top_inset();

        trace!(
            displays = displays.len(),
            windows = windows.len(),
            ?frontmost_pid,
            ?primary_top_inset_pt,
            "Captured window server state"
        );

        normalize(RawScene {
            displays,
            windows,
            frontmost_pid,
            own_pid: Some(self.own_pid),
            primary_top_inset_pt,
        })
    }
}

/// Active displays, main display first.
fn active_displays() -> Result<Vec<RawDisplay>, SnapshotError> {
    let ids = CGDisplay::active_displays().map_err(|err| {
        debug!(error = err, "CGGetActiveDisplayList failed");
        SnapshotError::DisplayEnumerationFailed
    })?;

    let main_id = CGDisplay::main().id;
    let mut displays: Vec<(bool, RawDisplay)> = ids
        .into_iter()
        .map(|id| {
            let display = CGDisplay::new(id);
            let bounds = display.bounds();
            let scale_factor = if bounds.size.width > 0.0 {
                display.pixels_wide() as f64 / bounds.size.width
            } else {
                1.0
            };
            (
                id == main_id,
                RawDisplay {
                    bounds: Rect::new(
                        bounds.origin.x,
                        bounds.origin.y,
                        bounds.size.width,
                        bounds.size.height,
                    ),
                    scale_factor,
                },
            )
        })
        .collect();

    // Stable sort keeps the window server order for the rest.
    displays.sort_by_key(|(is_main, _)| !is_main);

    if displays.is_empty() {
        return Err(SnapshotError::DisplayEnumerationFailed);
    }
    Ok(displays.into_iter().map(|(_, display)| display).collect())
}

fn onscreen_windows() -> Result<Vec<RawWindow>, SnapshotError> {
    let options = kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements;
    let list_ptr = unsafe { CGWindowListCopyWindowInfo(options, kCGNullWindowID) };
    if list_ptr.is_null() {
        return Err(SnapshotError::WindowEnumerationFailed);
    }

    // SAFETY: non-null and returned by a Copy function, so we own it.
    let list: CFArray<CFDictionary<CFString, CFType>> =
        unsafe { CFArray::wrap_under_create_rule(list_ptr) };

    let pid_key = unsafe { CFString::wrap_under_get_rule(kCGWindowOwnerPID) };
    let layer_key = unsafe { CFString::wrap_under_get_rule(kCGWindowLayer) };
    let bounds_key = unsafe { CFString::wrap_under_get_rule(kCGWindowBounds) };
    let onscreen_key = unsafe { CFString::wrap_under_get_rule(kCGWindowIsOnscreen) };

    let windows = list
        .iter()
        .filter_map(|info| {
            let owner_pid = number(&info, &pid_key)?.to_i32()?;
            let layer = number(&info, &layer_key)
                .and_then(|n| n.to_i32())
                .unwrap_or(0);
            let bounds = bounds(&info, &bounds_key)?;
            // Missing key means not on screen.
            let is_onscreen = info
                .find(&onscreen_key)
                .and_then(|value| value.downcast::<CFBoolean>())
                .map(bool::from)
                .unwrap_or(false);

            Some(RawWindow {
                bounds,
                owner_pid,
                layer,
                is_onscreen,
            })
        })
        .collect();

    Ok(windows)
}

fn number(info: &CFDictionary<CFString, CFType>, key: &CFString) -> Option<CFNumber> {
    info.find(key).and_then(|value| value.downcast::<CFNumber>())
}

fn bounds(info: &CFDictionary<CFString, CFType>, key: &CFString) -> Option<Rect> {
    let value = info.find(key)?;
    // SAFETY: kCGWindowBounds values are always CFDictionaries of CFNumbers.
    let dict: CFDictionary<CFString, CFNumber> =
        unsafe { CFDictionary::wrap_under_get_rule(value.as_concrete_TypeRef().cast()) };
    let field = |name: &str| dict.find(&CFString::new(name)).and_then(|n| n.to_f64());

    Some(Rect::new(
        field("X")?,
        field("Y")?,
        field("Width")?,
        field("Height")?,
    ))
}

/// Process identifier of `[[NSWorkspace sharedWorkspace] frontmostApplication]`.
fn frontmost_pid() -> Option<ProcessId> {
    unsafe {
        let workspace_class = Class::get("NSWorkspace")?;
        let workspace: *mut Object = msg_send![workspace_class, sharedWorkspace];
        if workspace.is_null() {
            return None;
        }

        let app: *mut Object = msg_send![workspace, frontmostApplication];
        if app.is_null() {
            return None;
        }

        let pid: i32 = msg_send![app, processIdentifier];
        (pid > 0).then_some(pid)
    }
}

/// Points reserved above the primary screen's visible frame.
///
/// Zero when the menu bar is hidden, which is the case inside a native
/// fullscreen space. `None` when AppKit cannot report the screen.
fn primary_top_inset() -> Option<f64> {
    unsafe {
        let screen_class = Class::get("NSScreen")?;
        let screens: *mut Object = msg_send![screen_class, screens];
        if screens.is_null() {
            return None;
        }
        let count: usize = msg_send![screens, count];
        if count == 0 {
            return None;
        }

        // The first entry is the screen holding the menu bar.
        let primary: *mut Object = msg_send![screens, objectAtIndex: 0usize];
        if primary.is_null() {
            return None;
        }

        let frame: CGRect = msg_send![primary, frame];
        let visible: CGRect = msg_send![primary, visibleFrame];

        let frame_top = frame.origin.y + frame.size.height;
        let visible_top = visible.origin.y + visible.size.height;
        Some((frame_top - visible_top).max(0.0))
    }
}

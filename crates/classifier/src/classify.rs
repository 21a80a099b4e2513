//! Fullscreen classification.
//!
//! Pure domain logic - no I/O, no clock.

use std::fmt;

use backdrop_snapshot::{DisplayGeometry, ProcessId, Snapshot, WindowGeometry};
use serde::Serialize;

use crate::settings::ClassifierSettings;

/// What decided a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// A window matches the display size within the tight tolerance.
    ExactCover { display: usize },

    /// A window nearly covers the display (one dimension within the loose
    /// tolerance, or almost the whole area).
    NearCover { display: usize },

    /// Enough half-width tiles share the display.
    SplitView { display: usize, windows: usize },

    /// No geometry cover, but the frontmost process hid the menu bar.
    ChromeCollapsed,

    None,
}

impl fmt::Display for Evidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evidence::ExactCover { display } => write!(f, "exact cover on display {display}"),
            Evidence::NearCover { display } => write!(f, "near cover on display {display}"),
            Evidence::SplitView { display, windows } => {
                write!(f, "split view of {windows} windows on display {display}")
            }
            Evidence::ChromeCollapsed => write!(f, "menu bar collapsed"),
            Evidence::None => write!(f, "none"),
        }
    }
}

/// Classifier output for one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub is_fullscreen: bool,
    pub evidence: Evidence,
}

impl Verdict {
    fn from_evidence(evidence: Evidence) -> Self {
        Self {
            is_fullscreen: evidence != Evidence::None,
            evidence,
        }
    }
}

/// Whether the snapshot shows a fullscreen presentation.
pub fn classify(snapshot: &Snapshot, settings: &ClassifierSettings) -> bool {
    classify_detailed(snapshot, settings).is_fullscreen
}

/// Classify and report the deciding evidence.
///
/// Any positive signal wins. When several apply, exact cover beats near
/// cover, near beats split view, split view beats the menu-bar fallback,
/// and lower display indices win within a tier. The result does not depend
/// on the order of `snapshot.windows()`.
pub fn classify_detailed(snapshot: &Snapshot, settings: &ClassifierSettings) -> Verdict {
    let content: Vec<&WindowGeometry> = snapshot
        .windows()
        .iter()
        .filter(|window| is_content(window, snapshot.own_pid(), settings))
        .collect();
    let displays = snapshot.displays();

    let evidence = first_display(displays, |index, display| {
        content
            .iter()
            .any(|w| sits_on(w, index) && exact_cover(w, display, settings))
    })
    .map(|display| Evidence::ExactCover { display })
    .or_else(|| {
        first_display(displays, |index, display| {
            content
                .iter()
                .any(|w| sits_on(w, index) && near_cover(w, display, settings))
        })
        .map(|display| Evidence::NearCover { display })
    })
    .or_else(|| split_view(displays, &content, settings))
    .or_else(|| {
        chrome_collapsed(snapshot, &content, settings).then_some(Evidence::ChromeCollapsed)
    })
    .unwrap_or(Evidence::None);

    tracing::trace!(
        content_windows = content.len(),
        displays = displays.len(),
        %evidence,
        "Classified snapshot"
    );

    Verdict::from_evidence(evidence)
}

fn is_content(
    window: &WindowGeometry,
    own_pid: Option<ProcessId>,
    settings: &ClassifierSettings,
) -> bool {
    Some(window.owner_pid) != own_pid
        && window.layer <= settings.max_content_layer
        && window.is_onscreen
        && window.width_px >= settings.min_content_px
        && window.height_px >= settings.min_content_px
}

fn first_display(
    displays: &[DisplayGeometry],
    covered: impl Fn(usize, &DisplayGeometry) -> bool,
) -> Option<usize> {
    displays
        .iter()
        .enumerate()
        .find_map(|(index, display)| covered(index, display).then_some(index))
}

/// Windows without a known display are tested against every display.
fn sits_on(window: &WindowGeometry, display: usize) -> bool {
    window.display.map_or(true, |index| index == display)
}

fn exact_cover(window: &WindowGeometry, display: &DisplayGeometry, s: &ClassifierSettings) -> bool {
    let tolerance = s.tolerance_px(s.exact_tolerance_pt, display.scale_factor);
    (window.width_px - display.width_px).abs() <= tolerance
        && (window.height_px - display.height_px).abs() <= tolerance
}

fn near_cover(window: &WindowGeometry, display: &DisplayGeometry, s: &ClassifierSettings) -> bool {
    let tolerance = s.tolerance_px(s.near_tolerance_pt, display.scale_factor);
    let ratio = s.near_coverage_ratio;

    let width_matches = (window.width_px - display.width_px).abs() <= tolerance;
    let height_matches = (window.height_px - display.height_px).abs() <= tolerance;

    (width_matches && window.height_px >= ratio * display.height_px)
        || (height_matches && window.width_px >= ratio * display.width_px)
        || window.area() >= ratio * display.area()
}

fn split_tile(window: &WindowGeometry, display: &DisplayGeometry, s: &ClassifierSettings) -> bool {
    let tolerance = s.tolerance_px(s.near_tolerance_pt, display.scale_factor);
    let width_ratio = window.width_px / display.width_px;

    width_ratio >= s.split_min_ratio
        && width_ratio <= s.split_max_ratio
        && (window.height_px - display.height_px).abs() <= tolerance
}

fn split_view(
    displays: &[DisplayGeometry],
    content: &[&WindowGeometry],
    settings: &ClassifierSettings,
) -> Option<Evidence> {
    displays.iter().enumerate().find_map(|(display, geometry)| {
        let windows = content
            .iter()
            .filter(|w| sits_on(w, display) && split_tile(w, geometry, settings))
            .count();
        (windows >= settings.split_min_windows).then_some(Evidence::SplitView { display, windows })
    })
}

/// Menu-bar fallback.
///
/// Consulted only when the menu bar height is known, the frontmost process
/// is some other application, and that process's largest content window
/// covers enough of its display to be ambiguous. A frontmost process without
/// content windows (the desktop, the overlay itself) gives no evidence.
fn chrome_collapsed(
    snapshot: &Snapshot,
    content: &[&WindowGeometry],
    settings: &ClassifierSettings,
) -> bool {
    let Some(menu_bar) = snapshot.menu_bar_reserved_height() else {
        return false;
    };
    let Some(frontmost) = snapshot.frontmost_pid() else {
        return false;
    };
    if snapshot.own_pid() == Some(frontmost) {
        return false;
    }

    let ambiguous = content
        .iter()
        .filter(|w| w.owner_pid == frontmost)
        .any(|w| {
            snapshot
                .displays()
                .iter()
                .enumerate()
                .any(|(index, d)| {
                    sits_on(w, index) && w.area() >= settings.ambiguous_coverage_ratio * d.area()
                })
        });

    ambiguous && menu_bar < settings.chrome_collapse_threshold_px
}

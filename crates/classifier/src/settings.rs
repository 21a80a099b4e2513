//! Geometry tolerances for the classifier.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid classifier tuning.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierSettingsError {
    /// A length or tolerance is negative, NaN or infinite.
    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidLength { field: &'static str, value: f64 },

    /// A ratio falls outside its allowed range.
    #[error("{field} must be within {range} (got {value})")]
    RatioOutOfRange {
        field: &'static str,
        range: &'static str,
        value: f64,
    },

    /// The near tolerance is tighter than the exact one.
    #[error("near_tolerance_pt ({near}) must not be smaller than exact_tolerance_pt ({exact})")]
    NearTighterThanExact { exact: f64, near: f64 },

    /// The split-view width band is empty.
    #[error("split_min_ratio ({min}) must be smaller than split_max_ratio ({max})")]
    InvertedSplitBand { min: f64, max: f64 },

    /// Split view needs at least two tiled windows.
    #[error("split_min_windows must be at least 2 (got {0})")]
    SplitMinWindows(usize),
}

/// Classifier tuning.
///
/// Tolerances are given in logical points and scaled per display by its
/// backing scale factor, never below `tolerance_floor_px`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSettings {
    /// Windows narrower or shorter than this (pixels) are noise.
    pub min_content_px: f64,

    pub exact_tolerance_pt: f64,
    pub near_tolerance_pt: f64,
    pub tolerance_floor_px: f64,

    /// Fraction of a display dimension (or area) that counts as covered.
    pub near_coverage_ratio: f64,

    /// Half-width band for split-view tiles, as a fraction of display width.
    pub split_min_ratio: f64,
    pub split_max_ratio: f64,
    pub split_min_windows: usize,

    /// Windows above this layer are system chrome, not content.
    pub max_content_layer: i32,

    /// Frontmost window coverage above which geometry is considered
    /// ambiguous and the chrome signal is consulted.
    pub ambiguous_coverage_ratio: f64,

    /// Menu-bar height (pixels) below which chrome counts as collapsed.
    pub chrome_collapse_threshold_px: f64,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            min_content_px: 100.0,
            exact_tolerance_pt: 2.0,
            near_tolerance_pt: 5.0,
            tolerance_floor_px: 2.0,
            near_coverage_ratio: 0.98,
            split_min_ratio: 0.48,
            split_max_ratio: 0.52,
            split_min_windows: 2,
            max_content_layer: 1,
            ambiguous_coverage_ratio: 0.90,
            chrome_collapse_threshold_px: 1.0,
        }
    }
}

impl ClassifierSettings {
    pub fn validate(&self) -> Result<(), ClassifierSettingsError> {
        for (field, value) in [
            ("min_content_px", self.min_content_px),
            ("exact_tolerance_pt", self.exact_tolerance_pt),
            ("near_tolerance_pt", self.near_tolerance_pt),
            ("tolerance_floor_px", self.tolerance_floor_px),
            ("chrome_collapse_threshold_px", self.chrome_collapse_threshold_px),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ClassifierSettingsError::InvalidLength { field, value });
            }
        }

        if self.near_tolerance_pt < self.exact_tolerance_pt {
            return Err(ClassifierSettingsError::NearTighterThanExact {
                exact: self.exact_tolerance_pt,
                near: self.near_tolerance_pt,
            });
        }

        for (field, value) in [
            ("near_coverage_ratio", self.near_coverage_ratio),
            ("ambiguous_coverage_ratio", self.ambiguous_coverage_ratio),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ClassifierSettingsError::RatioOutOfRange {
                    field,
                    range: "(0, 1]",
                    value,
                });
            }
        }

        for (field, value) in [
            ("split_min_ratio", self.split_min_ratio),
            ("split_max_ratio", self.split_max_ratio),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ClassifierSettingsError::RatioOutOfRange {
                    field,
                    range: "(0, 1)",
                    value,
                });
            }
        }

        if self.split_min_ratio >= self.split_max_ratio {
            return Err(ClassifierSettingsError::InvertedSplitBand {
                min: self.split_min_ratio,
                max: self.split_max_ratio,
            });
        }

        if self.split_min_windows < 2 {
            return Err(ClassifierSettingsError::SplitMinWindows(
                self.split_min_windows,
            ));
        }

        Ok(())
    }

    /// Pixel tolerance for a display with the given backing scale factor.
    pub(crate) fn tolerance_px(&self, tolerance_pt: f64, scale_factor: f64) -> f64 {
        (tolerance_pt * scale_factor).max(self.tolerance_floor_px)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(ClassifierSettings::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let settings = ClassifierSettings {
            exact_tolerance_pt: -1.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClassifierSettingsError::InvalidLength {
                field: "exact_tolerance_pt",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_nan_length() {
        let settings = ClassifierSettings {
            min_content_px: f64::NAN,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_rejects_near_tighter_than_exact() {
        let settings = ClassifierSettings {
            exact_tolerance_pt: 6.0,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClassifierSettingsError::NearTighterThanExact { .. })
        ));
    }

    #[test]
    fn test_rejects_ratio_out_of_range() {
        let settings = ClassifierSettings {
            near_coverage_ratio: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClassifierSettingsError::RatioOutOfRange {
                field: "near_coverage_ratio",
                ..
            })
        ));
    }

    #[test]
    fn test_rejects_inverted_split_band() {
        let settings = ClassifierSettings {
            split_min_ratio: 0.52,
            split_max_ratio: 0.48,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ClassifierSettingsError::InvertedSplitBand { .. })
        ));
    }

    #[test]
    fn test_rejects_single_window_split() {
        let settings = ClassifierSettings {
            split_min_windows: 1,
            ..Default::default()
        };
        assert_eq!(
            settings.validate(),
            Err(ClassifierSettingsError::SplitMinWindows(1))
        );
    }

    #[test]
    fn test_tolerance_scales_with_floor() {
        let settings = ClassifierSettings::default();
        assert_eq!(settings.tolerance_px(2.0, 2.0), 4.0);
        assert_eq!(settings.tolerance_px(2.0, 1.0), 2.0);
        assert_eq!(settings.tolerance_px(0.5, 1.0), 2.0);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: ClassifierSettings =
            serde_json::from_str(r#"{"near_tolerance_pt": 8.0}"#).unwrap();
        assert_eq!(settings.near_tolerance_pt, 8.0);
        assert_eq!(settings.split_min_windows, 2);
    }
}

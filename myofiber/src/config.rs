//! Configuration types for the fiber analysis pipeline.
//!
//! Every struct carries the reference constants in its `Default` impl and a
//! `validate()` that panics on values the pipeline cannot work with. All of
//! them serialize, so a [`SessionConfig`] can be stored next to the data it
//! was used on.

use serde::{Deserialize, Serialize};

use crate::classifier::OverrideRule;

// ============================================================================
// Enums
// ============================================================================

/// Pixel connectivity for connected component labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Only horizontal and vertical neighbors: (x±1, y) and (x, y±1).
    Four,
    /// All 8 surrounding pixels. Fiber masks are labeled this way.
    #[default]
    Eight,
}

// ============================================================================
// Feature extraction
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Filled pixel area is divided by this to get `area_norm`.
    /// The value ties the feature scale to the pixel size of the reference
    /// microscope; change it only together with [`RuleThresholds`].
    pub area_normalization: f64,
    /// Append minor axis length as a fifth classifier feature.
    pub include_minor_axis: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            area_normalization: 4000.0,
            include_minor_axis: false,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) {
        assert!(
            self.area_normalization > 0.0,
            "area_normalization must be positive, got {}",
            self.area_normalization
        );
    }

    /// Number of columns in a classifier feature row.
    pub fn feature_count(&self) -> usize {
        if self.include_minor_axis { 5 } else { 4 }
    }
}

// ============================================================================
// Rule-based classification
// ============================================================================

/// Thresholds of the fixed rejection decision list.
///
/// Rules are checked in this order, first match rejects:
/// area below `min_area`, convexity below `min_convexity`, eccentricity above
/// `max_eccentricity` together with convexity below `elongated_min_convexity`,
/// area above `max_area`, circularity below `min_circularity`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    pub min_area: f64,
    pub max_area: f64,
    pub min_convexity: f64,
    pub max_eccentricity: f64,
    pub elongated_min_convexity: f64,
    pub min_circularity: f64,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self {
            min_area: 0.05,
            max_area: 3.0,
            min_convexity: 0.7,
            max_eccentricity: 0.96,
            elongated_min_convexity: 0.85,
            min_circularity: 0.4,
        }
    }
}

impl RuleThresholds {
    pub fn validate(&self) {
        assert!(
            self.min_area <= self.max_area,
            "min_area ({}) must not exceed max_area ({})",
            self.min_area,
            self.max_area
        );
        assert!(
            (0.0..=1.0).contains(&self.max_eccentricity),
            "max_eccentricity must be in [0, 1], got {}",
            self.max_eccentricity
        );
        assert!(
            self.min_circularity >= 0.0,
            "min_circularity must be non-negative, got {}",
            self.min_circularity
        );
    }
}

// ============================================================================
// Boundary repair
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRepairConfig {
    /// First threshold level.
    pub lower_bound: f64,
    /// Last threshold level; the repaired mask is `image < upper_bound`.
    pub upper_bound: f64,
    /// Number of evenly spaced levels in `[lower_bound, upper_bound]`.
    pub levels: usize,
    /// Loose regions must have strictly more pixels than this to be checked.
    pub min_region_area: usize,
    /// Strict/loose perimeter ratio above which a region counts as merged.
    pub perimeter_ratio: f64,
    /// Value written into separator pixels.
    pub sentinel: f64,
}

impl Default for BoundaryRepairConfig {
    fn default() -> Self {
        Self {
            lower_bound: 0.22,
            upper_bound: 0.8,
            levels: 8,
            min_region_area: 200,
            perimeter_ratio: 1.5,
            sentinel: 2.0,
        }
    }
}

impl BoundaryRepairConfig {
    pub fn validate(&self) {
        assert!(
            self.lower_bound < self.upper_bound,
            "lower_bound ({}) must be below upper_bound ({})",
            self.lower_bound,
            self.upper_bound
        );
        assert!(self.levels >= 2, "levels must be at least 2, got {}", self.levels);
        assert!(
            self.perimeter_ratio > 0.0,
            "perimeter_ratio must be positive, got {}",
            self.perimeter_ratio
        );
        assert!(
            self.sentinel >= self.upper_bound,
            "sentinel ({}) must not pass the upper_bound threshold ({})",
            self.sentinel,
            self.upper_bound
        );
    }

    /// `levels` evenly spaced thresholds from `lower_bound` to `upper_bound`
    /// inclusive.
    pub fn thresholds(&self) -> Vec<f64> {
        let step = (self.upper_bound - self.lower_bound) / (self.levels - 1) as f64;
        (0..self.levels)
            .map(|i| {
                if i + 1 == self.levels {
                    self.upper_bound
                } else {
                    self.lower_bound + step * i as f64
                }
            })
            .collect()
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// RBF kernel width for the SVM backend.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Gamma {
    /// `1 / (n_features * var(X))` over the normalized training matrix.
    #[default]
    Scale,
    Value(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ClassifierConfig {
    /// L2-regularized logistic regression with penalty `1 / c`.
    LogisticRegression {
        c: f64,
        max_iterations: usize,
        tolerance: f64,
    },
    /// Soft-margin SVM with an RBF kernel.
    Svm {
        c: f64,
        gamma: Gamma,
        tolerance: f64,
        max_iterations: usize,
    },
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::logistic_regression()
    }
}

impl ClassifierConfig {
    /// Effectively unregularized logistic regression.
    pub fn logistic_regression() -> Self {
        Self::LogisticRegression {
            c: 1e9,
            max_iterations: 100,
            tolerance: 1e-8,
        }
    }

    pub fn svm() -> Self {
        Self::Svm {
            c: 1.0,
            gamma: Gamma::Scale,
            tolerance: 1e-3,
            max_iterations: 100_000,
        }
    }

    pub fn validate(&self) {
        match *self {
            Self::LogisticRegression {
                c,
                max_iterations,
                tolerance,
            } => {
                assert!(c > 0.0, "c must be positive, got {}", c);
                assert!(max_iterations > 0, "max_iterations must be positive");
                assert!(tolerance > 0.0, "tolerance must be positive, got {}", tolerance);
            }
            Self::Svm {
                c,
                gamma,
                tolerance,
                max_iterations,
            } => {
                assert!(c > 0.0, "c must be positive, got {}", c);
                if let Gamma::Value(g) = gamma {
                    assert!(g > 0.0, "gamma must be positive, got {}", g);
                }
                assert!(max_iterations > 0, "max_iterations must be positive");
                assert!(tolerance > 0.0, "tolerance must be positive, got {}", tolerance);
            }
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Everything a classification session needs besides its mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub connectivity: Connectivity,
    pub features: FeatureConfig,
    pub rules: RuleThresholds,
    pub classifier: ClassifierConfig,
    /// Applied after prediction, in order.
    pub overrides: Vec<OverrideRule>,
    /// Microns per pixel, used for exported rows.
    pub scale_factor: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            connectivity: Connectivity::default(),
            features: FeatureConfig::default(),
            rules: RuleThresholds::default(),
            classifier: ClassifierConfig::default(),
            overrides: Vec::new(),
            scale_factor: 1.0,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) {
        self.features.validate();
        self.rules.validate();
        self.classifier.validate();
        assert!(
            self.scale_factor > 0.0,
            "scale_factor must be positive, got {}",
            self.scale_factor
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        FeatureConfig::default().validate();
        RuleThresholds::default().validate();
        BoundaryRepairConfig::default().validate();
        ClassifierConfig::logistic_regression().validate();
        ClassifierConfig::svm().validate();
    }

    #[test]
    fn test_thresholds_evenly_spaced() {
        let config = BoundaryRepairConfig {
            lower_bound: 0.2,
            upper_bound: 0.9,
            levels: 8,
            ..Default::default()
        };
        let t = config.thresholds();
        assert_eq!(t.len(), 8);
        assert_eq!(t[0], 0.2);
        assert_eq!(t[7], 0.9);
        for pair in t.windows(2) {
            assert!((pair[1] - pair[0] - 0.1).abs() < 1e-12);
        }
    }

    #[test]
    #[should_panic(expected = "lower_bound")]
    fn test_inverted_bounds_panic() {
        BoundaryRepairConfig {
            lower_bound: 0.5,
            upper_bound: 0.3,
            ..Default::default()
        }
        .validate();
    }

    #[test]
    #[should_panic(expected = "scale_factor")]
    fn test_zero_scale_factor_panics() {
        SessionConfig {
            scale_factor: 0.0,
            ..Default::default()
        }
        .validate();
    }

    #[test]
    fn test_feature_count() {
        let mut config = FeatureConfig::default();
        assert_eq!(config.feature_count(), 4);
        config.include_minor_axis = true;
        assert_eq!(config.feature_count(), 5);
    }

    #[test]
    fn test_session_config_json_round_trip() {
        let config = SessionConfig {
            classifier: ClassifierConfig::svm(),
            overrides: OverrideRule::legacy_defaults(),
            scale_factor: 0.65,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}

//! Myofiber - region features and classification for muscle-fiber
//! cross-section masks.
//!
//! This library provides:
//! - Connected-component labeling of binary masks
//! - Per-region geometry (filled area, convex hull, perimeter, ellipse fit,
//!   minimum feret diameter)
//! - Boundary repair that splits fibers merged at a loose threshold
//! - A tri-state manual classification with persistence
//! - Logistic regression and RBF-SVM classifiers with override rules
//! - Manual vs automatic agreement metrics and per-fiber export rows
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use myofiber::{Session, SessionConfig};
//!
//! let mut session = Session::new(&mask, SessionConfig::default());
//! session.apply_rules()?;
//! session.train()?;
//! session.predict()?;
//!
//! for row in session.fiber_rows()? {
//!     println!("region {} area {}", row.region, row.area);
//! }
//! ```

pub mod boundary_repair;
pub mod classification;
pub mod classifier;
pub mod config;
mod error;
pub mod export;
pub mod features;
pub mod feret;
pub mod labeling;
pub(crate) mod math;
pub mod morphology;
mod persistence;
mod session;
pub mod validation;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};

// ============================================================================
// Labeling and features
// ============================================================================

pub use features::{
    FeatureVector, RegionProps, extended_features, feature_matrix, feature_vectors,
    min_feret_diameters, region_props,
};
pub use labeling::{LabelMap, clear_border};
pub use math::Aabb;

// ============================================================================
// Boundary repair
// ============================================================================

pub use boundary_repair::{
    normalize_intensity, repair, repair_pass, repaired_mask, threshold_markers,
};

// ============================================================================
// Classification
// ============================================================================

pub use classification::{ClassificationState, RegionState};
pub use classifier::{
    ClassifierModel, OverrideRule, TrainedClassifier, TrainingData, fit_from_training_data,
};
pub use validation::ConfusionMatrix;

// ============================================================================
// Configuration, session, export
// ============================================================================

pub use config::{
    BoundaryRepairConfig, ClassifierConfig, Connectivity, FeatureConfig, Gamma, RuleThresholds,
    SessionConfig,
};
pub use export::{FiberRow, FiberStore, MemoryFiberStore};
pub use session::{RegionInspection, Session};

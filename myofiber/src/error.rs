//! Error types for the fiber analysis core.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// User-facing failures. Every operation returning one of these leaves the
/// session state exactly as it was before the call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("State array length {actual} does not match the region count {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Training requires both accepted and rejected regions, found {found} class(es)")]
    InsufficientClasses { found: usize },

    #[error("No regions are labeled; mark some regions before training")]
    EmptyTrainingSet,

    #[error("Feature matrix has {rows} rows but {labels} labels")]
    TrainingShapeMismatch { rows: usize, labels: usize },

    #[error("Nothing selected: {0}")]
    MissingSelection(&'static str),

    #[error("State value {0} is outside 0..=2")]
    InvalidState(u8),

    #[error("Training label {0} is not binary (expected 0 or 1)")]
    InvalidLabel(u8),

    #[error("Model expects {expected} features per row, got {actual}")]
    FeatureCountMismatch { expected: usize, actual: usize },

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

//! Labeled feature rows that outlive the image they were taken from.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::persistence::{read_document, write_document};

/// `features[i]` is labeled `states[i]` (1 accepted, 0 rejected).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrainingData {
    pub features: Vec<Vec<f64>>,
    pub states: Vec<u8>,
}

impl TrainingData {
    pub fn new(features: Vec<Vec<f64>>, states: Vec<u8>) -> Result<Self> {
        let data = Self { features, states };
        data.validate()?;
        Ok(data)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    fn validate(&self) -> Result<()> {
        if self.features.len() != self.states.len() {
            return Err(Error::TrainingShapeMismatch {
                rows: self.features.len(),
                labels: self.states.len(),
            });
        }
        if let Some(&bad) = self.states.iter().find(|&&s| s > 1) {
            return Err(Error::InvalidLabel(bad));
        }
        if let Some(first) = self.features.first()
            && let Some(row) = self.features.iter().find(|r| r.len() != first.len())
        {
            return Err(Error::FeatureCountMismatch {
                expected: first.len(),
                actual: row.len(),
            });
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_document(path, self)?;
        info!(path = %path.display(), rows = self.len(), "Saved training data");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data: Self = read_document(path)?;
        data.validate()?;
        info!(path = %path.display(), rows = data.len(), "Loaded training data");
        Ok(data)
    }
}

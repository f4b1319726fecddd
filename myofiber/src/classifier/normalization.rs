//! Per-column feature scaling fitted on the training rows.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Column means and population standard deviations of a training matrix.
///
/// Computed once at training time and reused unchanged for prediction.
/// A column with zero spread divides by zero; this is logged but not
/// corrected, so callers must not train on constant features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl NormalizationParams {
    /// Fits on `rows`, which must be non-empty and rectangular.
    pub fn fit(rows: &[Vec<f64>]) -> Self {
        assert!(!rows.is_empty(), "cannot fit normalization on zero rows");
        let n_features = rows[0].len();
        let n = rows.len() as f64;

        let mut mean = vec![0.0; n_features];
        for row in rows {
            assert_eq!(row.len(), n_features, "ragged feature matrix");
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut std = vec![0.0; n_features];
        for row in rows {
            for ((s, v), m) in std.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        for s in &mut std {
            *s = (*s / n).sqrt();
        }

        for (column, &s) in std.iter().enumerate() {
            if s == 0.0 {
                warn!(column, "Feature column has zero variance; normalized values will not be finite");
            }
        }

        Self { mean, std }
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// `(x - mean) / (2 * std)` per column.
    pub fn apply_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(&self.mean)
            .zip(&self.std)
            .map(|((x, m), s)| (x - m) / (2.0 * s))
            .collect()
    }

    pub fn apply(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|r| self.apply_row(r)).collect()
    }
}

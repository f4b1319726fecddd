//! Agreement between a manual and an automatic classification of the same
//! regions.

use tracing::info;

use crate::classification::RegionState;
use crate::error::{Error, Result};

/// Counts over regions that are decided (not Unset) on both sides. The manual
/// states are the reference: a positive is an accepted fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn compare(manual: &[RegionState], automatic: &[RegionState]) -> Result<Self> {
        if manual.len() != automatic.len() {
            return Err(Error::LengthMismatch {
                expected: manual.len(),
                actual: automatic.len(),
            });
        }

        let mut m = Self::default();
        for (&reference, &predicted) in manual.iter().zip(automatic) {
            match (reference, predicted) {
                (RegionState::Accept, RegionState::Accept) => m.true_positives += 1,
                (RegionState::Reject, RegionState::Reject) => m.true_negatives += 1,
                (RegionState::Reject, RegionState::Accept) => m.false_positives += 1,
                (RegionState::Accept, RegionState::Reject) => m.false_negatives += 1,
                _ => {}
            }
        }

        info!(
            tp = m.true_positives,
            tn = m.true_negatives,
            fp = m.false_positives,
            fn_ = m.false_negatives,
            precision = ?m.precision(),
            recall = ?m.recall(),
            "Compared classifications"
        );
        Ok(m)
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// TP / (TP + FP), `None` when nothing was predicted positive.
    pub fn precision(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// TP / (TP + FN), `None` when the reference has no positives.
    pub fn recall(&self) -> Option<f64> {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Harmonic mean of precision and recall. `None` when either is undefined
    /// or both are zero.
    pub fn f1(&self) -> Option<f64> {
        let p = self.precision()?;
        let r = self.recall()?;
        if p + r == 0.0 {
            return None;
        }
        Some(2.0 * p * r / (p + r))
    }

    /// Fraction of decided regions on which both sides agree.
    pub fn accuracy(&self) -> Option<f64> {
        ratio(self.true_positives + self.true_negatives, self.total())
    }
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator != 0).then(|| numerator as f64 / denominator as f64)
}

//! Supervised region classification.
//!
//! Training rows are normalized with statistics of the training set itself;
//! the same [`NormalizationParams`] are applied to every row passed to
//! [`TrainedClassifier::predict`]. Two backends are available: logistic
//! regression, which exposes its coefficients, and an RBF-kernel SVM.

pub mod logistic;
mod normalization;
mod overrides;
pub mod svm;
mod training_data;


pub use logistic::LogisticModel;
pub use normalization::NormalizationParams;
pub use overrides::{OverrideRule, apply_overrides};
pub use svm::SvmModel;
pub use training_data::TrainingData;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classification::RegionState;
use crate::config::ClassifierConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClassifierModel {
    Logistic(LogisticModel),
    Svm(SvmModel),
}

impl ClassifierModel {
    fn predict(&self, normalized_row: &[f64]) -> u8 {
        match self {
            Self::Logistic(m) => m.predict(normalized_row),
            Self::Svm(m) => m.predict(normalized_row),
        }
    }
}

/// A fitted model together with the normalization it was trained under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedClassifier {
    normalization: NormalizationParams,
    model: ClassifierModel,
}

impl TrainedClassifier {
    /// Fits on raw feature rows with binary labels (1 accept, 0 reject).
    pub fn fit(x: &[Vec<f64>], y: &[u8], config: &ClassifierConfig) -> Result<Self> {
        config.validate();

        if x.len() != y.len() {
            return Err(Error::TrainingShapeMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        if x.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        if let Some(&bad) = y.iter().find(|&&l| l > 1) {
            return Err(Error::InvalidLabel(bad));
        }
        let n_features = x[0].len();
        if let Some(row) = x.iter().find(|r| r.len() != n_features) {
            return Err(Error::FeatureCountMismatch {
                expected: n_features,
                actual: row.len(),
            });
        }
        let positives = y.iter().filter(|&&l| l == 1).count();
        if positives == 0 || positives == y.len() {
            return Err(Error::InsufficientClasses { found: 1 });
        }

        let normalization = NormalizationParams::fit(x);
        let normalized = normalization.apply(x);

        let model = match *config {
            ClassifierConfig::LogisticRegression {
                c,
                max_iterations,
                tolerance,
            } => ClassifierModel::Logistic(logistic::fit(
                &normalized,
                y,
                c,
                max_iterations,
                tolerance,
            )),
            ClassifierConfig::Svm {
                c,
                gamma,
                tolerance,
                max_iterations,
            } => ClassifierModel::Svm(svm::fit(
                &normalized,
                y,
                c,
                gamma,
                tolerance,
                max_iterations,
            )),
        };

        let classifier = Self {
            normalization,
            model,
        };
        let training_accuracy = classifier.score(x, y)?;
        info!(
            rows = x.len(),
            accepted = positives,
            rejected = x.len() - positives,
            n_features,
            training_accuracy,
            "Trained classifier"
        );
        Ok(classifier)
    }

    #[inline]
    pub fn model(&self) -> &ClassifierModel {
        &self.model
    }

    #[inline]
    pub fn normalization(&self) -> &NormalizationParams {
        &self.normalization
    }

    #[inline]
    pub fn n_features(&self) -> usize {
        self.normalization.n_features()
    }

    /// Binary labels for raw feature rows.
    pub fn predict(&self, x: &[Vec<f64>]) -> Result<Vec<u8>> {
        let expected = self.n_features();
        if let Some(row) = x.iter().find(|r| r.len() != expected) {
            return Err(Error::FeatureCountMismatch {
                expected,
                actual: row.len(),
            });
        }
        Ok(x.iter()
            .map(|row| self.model.predict(&self.normalization.apply_row(row)))
            .collect())
    }

    /// Predicted states for every row: 1 → Accept, 0 → Reject.
    pub fn predict_states(&self, x: &[Vec<f64>]) -> Result<Vec<RegionState>> {
        Ok(self
            .predict(x)?
            .into_iter()
            .map(RegionState::from_prediction)
            .collect())
    }

    /// Fraction of rows whose prediction matches `y`.
    pub fn score(&self, x: &[Vec<f64>], y: &[u8]) -> Result<f64> {
        if x.len() != y.len() {
            return Err(Error::TrainingShapeMismatch {
                rows: x.len(),
                labels: y.len(),
            });
        }
        if x.is_empty() {
            return Err(Error::EmptyTrainingSet);
        }
        let predicted = self.predict(x)?;
        let correct = predicted.iter().zip(y).filter(|(p, t)| p == t).count();
        Ok(correct as f64 / y.len() as f64)
    }

    /// Intercept and per-feature coefficients (in normalized feature space).
    /// Only the logistic backend has them.
    pub fn coefficients(&self) -> Option<(f64, &[f64])> {
        match &self.model {
            ClassifierModel::Logistic(m) => Some((m.intercept, &m.coefficients)),
            ClassifierModel::Svm(_) => None,
        }
    }

    /// `Beta_0=<intercept>, Beta_1=<c1>, ...`
    pub fn coefficient_report(&self) -> Option<String> {
        let (intercept, coefficients) = self.coefficients()?;
        Some(
            std::iter::once(intercept)
                .chain(coefficients.iter().copied())
                .enumerate()
                .map(|(i, beta)| format!("Beta_{i}={beta}"))
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Trains from stored rows, independent of any labeled image.
pub fn fit_from_training_data(
    data: &TrainingData,
    config: &ClassifierConfig,
) -> Result<TrainedClassifier> {
    TrainedClassifier::fit(&data.features, &data.states, config)
}

//! L2-regularized logistic regression fitted by damped Newton iterations.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::math::solve_linear_system;

/// Halvings tried before a Newton step is given up.
const MAX_STEP_HALVINGS: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LogisticModel {
    #[inline]
    pub fn decision(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    /// Probability of label 1.
    pub fn probability(&self, row: &[f64]) -> f64 {
        sigmoid(self.decision(row))
    }

    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.decision(row) > 0.0)
    }
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^z)` without overflow.
#[inline]
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

/// Penalized negative log-likelihood; `params[0]` is the unpenalized intercept.
fn objective(x: &[Vec<f64>], y: &[u8], params: &[f64], lambda: f64) -> f64 {
    let loss: f64 = x
        .iter()
        .zip(y)
        .map(|(row, &label)| {
            let z = params[0] + params[1..].iter().zip(row).map(|(w, v)| w * v).sum::<f64>();
            if label == 1 { softplus(-z) } else { softplus(z) }
        })
        .sum();
    let penalty: f64 = params[1..].iter().map(|w| w * w).sum();
    loss + 0.5 * lambda * penalty
}

/// Gradient and Hessian of [`objective`].
#[allow(clippy::needless_range_loop)]
fn gradient_hessian(
    x: &[Vec<f64>],
    y: &[u8],
    params: &[f64],
    lambda: f64,
) -> (Vec<f64>, Vec<Vec<f64>>) {
    let dim = params.len();
    let mut gradient = vec![0.0; dim];
    let mut hessian = vec![vec![0.0; dim]; dim];
    let mut augmented = vec![1.0; dim];

    for (row, &label) in x.iter().zip(y) {
        augmented[1..].copy_from_slice(row);
        let z: f64 = params.iter().zip(&augmented).map(|(p, a)| p * a).sum();
        let p = sigmoid(z);
        let residual = p - f64::from(label);
        let weight = p * (1.0 - p);

        for i in 0..dim {
            gradient[i] += residual * augmented[i];
            for j in i..dim {
                hessian[i][j] += weight * augmented[i] * augmented[j];
            }
        }
    }

    for i in 1..dim {
        gradient[i] += lambda * params[i];
        hessian[i][i] += lambda;
    }
    for i in 0..dim {
        for j in 0..i {
            hessian[i][j] = hessian[j][i];
        }
    }

    (gradient, hessian)
}

/// Fits on already normalized rows with binary labels.
///
/// The penalty is `1 / c`. Separable data drives the coefficients up until
/// the Hessian turns singular or the step stops improving the objective; the
/// last improving parameters are kept.
pub fn fit(
    x: &[Vec<f64>],
    y: &[u8],
    c: f64,
    max_iterations: usize,
    tolerance: f64,
) -> LogisticModel {
    let n_features = x.first().map_or(0, |r| r.len());
    let lambda = 1.0 / c;
    let mut params = vec![0.0; n_features + 1];
    let mut loss = objective(x, y, &params, lambda);
    let mut converged = false;
    let mut iterations = 0;

    for iter in 0..max_iterations {
        iterations = iter + 1;

        let (gradient, hessian) = gradient_hessian(x, y, &params, lambda);
        let grad_norm = gradient.iter().fold(0.0f64, |a, g| a.max(g.abs()));
        if grad_norm < tolerance {
            converged = true;
            break;
        }

        let Some(step) = solve_linear_system(hessian, gradient) else {
            break;
        };

        let mut scale = 1.0;
        let mut improved = None;
        for _ in 0..MAX_STEP_HALVINGS {
            let candidate: Vec<f64> = params
                .iter()
                .zip(&step)
                .map(|(p, s)| p - scale * s)
                .collect();
            let candidate_loss = objective(x, y, &candidate, lambda);
            if candidate_loss.is_finite() && candidate_loss < loss {
                improved = Some((candidate, candidate_loss));
                break;
            }
            scale *= 0.5;
        }

        let Some((candidate, candidate_loss)) = improved else {
            converged = true;
            break;
        };

        let max_delta = params
            .iter()
            .zip(&candidate)
            .fold(0.0f64, |a, (p, q)| a.max((p - q).abs()));
        params = candidate;
        loss = candidate_loss;
        if max_delta < tolerance {
            converged = true;
            break;
        }
    }

    if converged {
        debug!(iterations, loss, "Logistic regression converged");
    } else {
        warn!(iterations, loss, "Logistic regression stopped before converging");
    }

    LogisticModel {
        intercept: params[0],
        coefficients: params[1..].to_vec(),
    }
}

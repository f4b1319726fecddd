//! Soft-margin SVM with an RBF kernel, trained by sequential minimal
//! optimization with second-order working set selection.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Gamma;

/// Floor for the curvature of a working pair.
const TAU: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmModel {
    pub support_vectors: Vec<Vec<f64>>,
    /// `alpha_i * y_i` per support vector.
    pub dual_coefficients: Vec<f64>,
    pub rho: f64,
    pub gamma: f64,
}

impl SvmModel {
    pub fn decision(&self, row: &[f64]) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.dual_coefficients)
            .map(|(sv, coef)| coef * rbf(sv, row, self.gamma))
            .sum::<f64>()
            - self.rho
    }

    pub fn predict(&self, row: &[f64]) -> u8 {
        u8::from(self.decision(row) > 0.0)
    }
}

#[inline]
fn rbf(a: &[f64], b: &[f64], gamma: f64) -> f64 {
    let d2: f64 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    (-gamma * d2).exp()
}

/// `1 / (n_features * var(X))` over every entry of `x`; 1 when `x` is constant.
pub fn scale_gamma(x: &[Vec<f64>]) -> f64 {
    let n_features = x.first().map_or(0, |r| r.len());
    let count = (x.len() * n_features) as f64;
    if count == 0.0 {
        return 1.0;
    }
    let mean = x.iter().flatten().sum::<f64>() / count;
    let var = x.iter().flatten().map(|v| (v - mean) * (v - mean)).sum::<f64>() / count;
    if var == 0.0 {
        1.0
    } else {
        1.0 / (n_features as f64 * var)
    }
}

/// Dual solver state. `y` is ±1, `grad` is the gradient of the dual objective.
struct Smo<'a> {
    kernel: &'a [Vec<f64>],
    y: Vec<f64>,
    alpha: Vec<f64>,
    grad: Vec<f64>,
    c: f64,
}

impl Smo<'_> {
    #[inline]
    fn is_upper_bound(&self, t: usize) -> bool {
        self.alpha[t] >= self.c
    }

    #[inline]
    fn is_lower_bound(&self, t: usize) -> bool {
        self.alpha[t] <= 0.0
    }

    #[inline]
    fn q(&self, i: usize, j: usize) -> f64 {
        self.y[i] * self.y[j] * self.kernel[i][j]
    }

    /// Maximal violating pair with second-order choice of `j`, or `None` when
    /// the KKT gap is below `tolerance`.
    fn select_working_set(&self, tolerance: f64) -> Option<(usize, usize)> {
        let n = self.y.len();

        let mut g_max = f64::NEG_INFINITY;
        let mut i = None;
        for t in 0..n {
            let candidate = if self.y[t] > 0.0 {
                (!self.is_upper_bound(t)).then(|| -self.grad[t])
            } else {
                (!self.is_lower_bound(t)).then(|| self.grad[t])
            };
            if let Some(v) = candidate
                && v >= g_max
            {
                g_max = v;
                i = Some(t);
            }
        }
        let i = i?;

        let mut g_max2 = f64::NEG_INFINITY;
        let mut j = None;
        let mut best_obj = f64::INFINITY;
        for t in 0..n {
            let (eligible, y_grad) = if self.y[t] > 0.0 {
                (!self.is_lower_bound(t), self.grad[t])
            } else {
                (!self.is_upper_bound(t), -self.grad[t])
            };
            if !eligible {
                continue;
            }
            g_max2 = g_max2.max(y_grad);
            let grad_diff = g_max + y_grad;
            if grad_diff > 0.0 {
                let quad = self.kernel[i][i] + self.kernel[t][t] - 2.0 * self.kernel[i][t];
                let obj = -(grad_diff * grad_diff) / quad.max(TAU);
                if obj <= best_obj {
                    best_obj = obj;
                    j = Some(t);
                }
            }
        }

        if g_max + g_max2 < tolerance {
            return None;
        }
        j.map(|j| (i, j))
    }

    fn update_pair(&mut self, i: usize, j: usize) {
        let c = self.c;
        let old_ai = self.alpha[i];
        let old_aj = self.alpha[j];
        let (mut ai, mut aj) = (old_ai, old_aj);

        if self.y[i] != self.y[j] {
            let quad = (self.kernel[i][i] + self.kernel[j][j] + 2.0 * self.q(i, j)).max(TAU);
            let delta = (-self.grad[i] - self.grad[j]) / quad;
            let diff = ai - aj;
            ai += delta;
            aj += delta;
            if diff > 0.0 {
                if aj < 0.0 {
                    aj = 0.0;
                    ai = diff;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = -diff;
            }
            if diff > 0.0 {
                if ai > c {
                    ai = c;
                    aj = c - diff;
                }
            } else if aj > c {
                aj = c;
                ai = c + diff;
            }
        } else {
            let quad = (self.kernel[i][i] + self.kernel[j][j] - 2.0 * self.q(i, j)).max(TAU);
            let delta = (self.grad[i] - self.grad[j]) / quad;
            let sum = ai + aj;
            ai -= delta;
            aj += delta;
            if sum > c {
                if ai > c {
                    ai = c;
                    aj = sum - c;
                }
            } else if aj < 0.0 {
                aj = 0.0;
                ai = sum;
            }
            if sum > c {
                if aj > c {
                    aj = c;
                    ai = sum - c;
                }
            } else if ai < 0.0 {
                ai = 0.0;
                aj = sum;
            }
        }

        self.alpha[i] = ai;
        self.alpha[j] = aj;

        let d_ai = ai - old_ai;
        let d_aj = aj - old_aj;
        for k in 0..self.grad.len() {
            self.grad[k] += self.q(i, k) * d_ai + self.q(j, k) * d_aj;
        }
    }

    /// Offset from free support vectors, or the middle of the feasible
    /// interval when every alpha sits at a bound.
    fn rho(&self) -> f64 {
        let mut upper = f64::INFINITY;
        let mut lower = f64::NEG_INFINITY;
        let mut free_sum = 0.0;
        let mut free_count = 0usize;

        for t in 0..self.y.len() {
            let y_grad = self.y[t] * self.grad[t];
            if self.is_upper_bound(t) {
                if self.y[t] < 0.0 {
                    upper = upper.min(y_grad);
                } else {
                    lower = lower.max(y_grad);
                }
            } else if self.is_lower_bound(t) {
                if self.y[t] > 0.0 {
                    upper = upper.min(y_grad);
                } else {
                    lower = lower.max(y_grad);
                }
            } else {
                free_count += 1;
                free_sum += y_grad;
            }
        }

        if free_count > 0 {
            free_sum / free_count as f64
        } else {
            (upper + lower) / 2.0
        }
    }
}

/// Fits on already normalized rows with binary labels; both classes must be
/// present.
pub fn fit(
    x: &[Vec<f64>],
    y: &[u8],
    c: f64,
    gamma: Gamma,
    tolerance: f64,
    max_iterations: usize,
) -> SvmModel {
    let gamma = match gamma {
        Gamma::Scale => scale_gamma(x),
        Gamma::Value(g) => g,
    };

    let kernel: Vec<Vec<f64>> = x
        .iter()
        .map(|a| x.iter().map(|b| rbf(a, b, gamma)).collect())
        .collect();

    let n = x.len();
    let mut smo = Smo {
        kernel: &kernel,
        y: y.iter().map(|&l| if l == 1 { 1.0 } else { -1.0 }).collect(),
        alpha: vec![0.0; n],
        grad: vec![-1.0; n],
        c,
    };

    let mut iterations = 0;
    let mut converged = false;
    while iterations < max_iterations {
        let Some((i, j)) = smo.select_working_set(tolerance) else {
            converged = true;
            break;
        };
        smo.update_pair(i, j);
        iterations += 1;
    }

    if converged {
        debug!(iterations, "SVM solver converged");
    } else {
        warn!(iterations, "SVM solver reached the iteration limit");
    }

    let rho = smo.rho();
    let (support_vectors, dual_coefficients) = x
        .iter()
        .zip(smo.alpha.iter().zip(&smo.y))
        .filter(|(_, (a, _))| **a > 0.0)
        .map(|(row, (a, yi))| (row.clone(), a * yi))
        .unzip();

    SvmModel {
        support_vectors,
        dual_coefficients,
        rho,
        gamma,
    }
}

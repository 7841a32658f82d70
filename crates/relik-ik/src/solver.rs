//! Box-constrained gradient descent.
//!
//! Minimizes a smooth objective over the joint-limit box with projected
//! gradient steps. Gradients are central finite differences. The step size
//! follows Barzilai-Borwein and every step must pass an Armijo sufficient
//! decrease test, halving until it does. Nothing carries over between calls,
//! so equal inputs give bit-identical outputs.

use crate::config::SolverSettings;

/// Armijo sufficient-decrease constant.
const ARMIJO: f64 = 1e-4;
/// Halvings tried before a step is declared stalled.
const MAX_BACKTRACKS: u32 = 40;
/// Largest first step along the gradient, per coordinate.
const INITIAL_MOVE: f64 = 0.1;
const MIN_STEP: f64 = 1e-12;
const MAX_STEP: f64 = 1e3;

/// Result of a minimization.
#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: u32,
    /// Whether the projected gradient dropped below tolerance.
    pub converged: bool,
}

/// Projected gradient descent over `[lower, upper]`.
#[derive(Debug, Clone)]
pub struct ProjectedGradient {
    settings: SolverSettings,
}

impl ProjectedGradient {
    pub const fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    /// Minimize `f` starting from `x0` projected into the box.
    pub fn minimize<F>(&self, f: F, x0: &[f64], lower: &[f64], upper: &[f64]) -> Minimum
    where
        F: Fn(&[f64]) -> f64,
    {
        let project = |x: &mut [f64]| {
            for ((v, &lo), &hi) in x.iter_mut().zip(lower).zip(upper) {
                *v = v.clamp(lo, hi);
            }
        };

        let mut x = x0.to_vec();
        project(&mut x);
        let mut fx = f(&x);
        let mut grad = self.gradient(&f, &x);
        let mut step = INITIAL_MOVE / inf_norm(&grad).max(1.0);

        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.settings.max_iterations {
            if !fx.is_finite() {
                break;
            }
            let projected: Vec<f64> = x
                .iter()
                .zip(&grad)
                .zip(lower.iter().zip(upper))
                .map(|((&xi, &gi), (&lo, &hi))| xi - (xi - gi).clamp(lo, hi))
                .collect();
            if inf_norm(&projected) < self.settings.tolerance {
                converged = true;
                break;
            }
            iterations += 1;

            let mut accepted = None;
            for _ in 0..MAX_BACKTRACKS {
                let mut candidate: Vec<f64> =
                    x.iter().zip(&grad).map(|(&xi, &gi)| xi - step * gi).collect();
                project(&mut candidate);
                let decrease: f64 = grad
                    .iter()
                    .zip(candidate.iter().zip(&x))
                    .map(|(&gi, (&ci, &xi))| gi * (ci - xi))
                    .sum();
                let fc = f(&candidate);
                if fc <= fx + ARMIJO * decrease {
                    accepted = Some((candidate, fc));
                    break;
                }
                step *= 0.5;
            }
            let Some((next, f_next)) = accepted else {
                break;
            };

            let next_grad = self.gradient(&f, &next);
            let (ss, sy) = x
                .iter()
                .zip(&next)
                .zip(grad.iter().zip(&next_grad))
                .fold((0.0, 0.0), |(ss, sy), ((&xi, &ni), (&gi, &gn))| {
                    let s = ni - xi;
                    (ss + s * s, sy + s * (gn - gi))
                });
            if sy > 0.0 {
                step = (ss / sy).clamp(MIN_STEP, MAX_STEP);
            }

            x = next;
            fx = f_next;
            grad = next_grad;
        }

        Minimum {
            x,
            value: fx,
            iterations,
            converged,
        }
    }

    fn gradient<F>(&self, f: &F, x: &[f64]) -> Vec<f64>
    where
        F: Fn(&[f64]) -> f64,
    {
        let h = self.settings.finite_difference_step;
        let mut probe = x.to_vec();
        (0..x.len())
            .map(|i| {
                probe[i] = x[i] + h;
                let plus = f(&probe);
                probe[i] = x[i] - h;
                let minus = f(&probe);
                probe[i] = x[i];
                (plus - minus) / (2.0 * h)
            })
            .collect()
    }
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}

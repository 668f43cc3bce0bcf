//! Bounded nonlinear least squares for the power-law-plus-floor model
//! `y(x) = C + N·x^a` with the floor C held fixed.
//!
//! A damped Gauss-Newton iteration on the two free parameters (N, a),
//! with candidate steps projected onto the parameter bounds. Convergence
//! failure is an explicit outcome, not an error: the caller substitutes
//! a flat fallback model and keeps going.

/// Box bounds for the two free parameters.
#[derive(Debug, Clone, Copy)]
pub struct FitBounds {
    /// (min, max) for the amplitude N.
    pub amplitude: (f64, f64),
    /// (min, max) for the exponent a.
    pub exponent: (f64, f64),
}

impl Default for FitBounds {
    fn default() -> Self {
        Self {
            amplitude: (0.0, 1e10),
            exponent: (-3.0, -0.1),
        }
    }
}

/// Result of a bounded power-law fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FitOutcome {
    Converged { amplitude: f64, exponent: f64 },
    Diverged,
}

const MAX_ITER: usize = 100;
const MAX_DAMPING: f64 = 1e12;
const STEP_TOL: f64 = 1e-10;

fn clamp(v: f64, (lo, hi): (f64, f64)) -> f64 {
    v.max(lo).min(hi)
}

fn cost(x: &[f64], y: &[f64], floor: f64, amp: f64, expo: f64) -> f64 {
    x.iter()
        .zip(y)
        .map(|(&xi, &yi)| {
            let r = yi - (floor + amp * xi.powf(expo));
            r * r
        })
        .sum()
}

/// Fit `y = floor + N·x^a` over the given samples.
///
/// All `x` values must be positive. Returns [`FitOutcome::Diverged`] when
/// there are fewer than two samples, the normal equations stay singular,
/// or the damping factor blows up without ever reducing the residual.
pub fn fit_power_law(x: &[f64], y: &[f64], floor: f64, bounds: &FitBounds) -> FitOutcome {
    let n = x.len().min(y.len());
    if n < 2 || x[..n].iter().any(|&xi| xi <= 0.0) {
        return FitOutcome::Diverged;
    }

    // Start from the first sample's excess over the floor at a = -1.
    let mut expo = clamp(-1.0, bounds.exponent);
    let mut amp = clamp((y[0] - floor).max(0.0) * x[0], bounds.amplitude);
    let mut current_cost = cost(x, y, floor, amp, expo);
    let mut lambda = 1e-3;

    for _ in 0..MAX_ITER {
        // Jacobian of the model wrt (N, a) and residuals at the current point.
        let mut jtj = [0.0f64; 4];
        let mut jtr = [0.0f64; 2];
        for k in 0..n {
            let pow = x[k].powf(expo);
            let model = floor + amp * pow;
            let r = y[k] - model;
            let d_amp = pow;
            let d_expo = amp * pow * x[k].ln();
            jtj[0] += d_amp * d_amp;
            jtj[1] += d_amp * d_expo;
            jtj[3] += d_expo * d_expo;
            jtr[0] += d_amp * r;
            jtr[1] += d_expo * r;
        }
        jtj[2] = jtj[1];

        // Damped step, retried with stronger damping until the cost drops.
        let accepted = loop {
            let a00 = jtj[0] + lambda * jtj[0].max(1e-12);
            let a11 = jtj[3] + lambda * jtj[3].max(1e-12);
            let det = a00 * a11 - jtj[1] * jtj[2];
            if det.abs() < 1e-300 {
                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    return FitOutcome::Diverged;
                }
                continue;
            }
            let d_amp = (a11 * jtr[0] - jtj[1] * jtr[1]) / det;
            let d_expo = (a00 * jtr[1] - jtj[2] * jtr[0]) / det;

            let cand_amp = clamp(amp + d_amp, bounds.amplitude);
            let cand_expo = clamp(expo + d_expo, bounds.exponent);

            let step = (cand_amp - amp).abs() / (1.0 + amp.abs())
                + (cand_expo - expo).abs() / (1.0 + expo.abs());
            if step < STEP_TOL {
                // Pinned at the bounds or at a stationary point.
                return FitOutcome::Converged {
                    amplitude: amp,
                    exponent: expo,
                };
            }

            let cand_cost = cost(x, y, floor, cand_amp, cand_expo);
            if cand_cost.is_finite() && cand_cost < current_cost {
                amp = cand_amp;
                expo = cand_expo;
                let improved = (current_cost - cand_cost) / (1.0 + current_cost);
                current_cost = cand_cost;
                lambda = (lambda * 0.3).max(1e-12);
                break improved < 1e-14 || step < 1e-8;
            }
            lambda *= 10.0;
            if lambda > MAX_DAMPING {
                return FitOutcome::Diverged;
            }
        };

        if accepted {
            return FitOutcome::Converged {
                amplitude: amp,
                exponent: expo,
            };
        }
    }

    FitOutcome::Diverged
}

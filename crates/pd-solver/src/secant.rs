//! Secant refinement of a bracketed or tangential root.

use serde::{Deserialize, Serialize};

use crate::bracket::{Bracket, SignChange};

/// Secant iteration configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecantConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Converged once a step is shorter than this
    pub step_tol: f64,
}

impl Default for SecantConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            step_tol: 0.01,
        }
    }
}

/// Secant iteration result.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SecantOutcome {
    /// Final estimate
    pub x: f64,
    /// Function value at `x`
    pub fx: f64,
    /// Number of function evaluations spent
    pub iterations: usize,
    /// Converged flag
    pub converged: bool,
}

/// Secant iteration that never leaves the sign-change bracket.
///
/// Starts from the line through `change.lo` and `(x0, f0)`; whenever a secant
/// step would leave the current bracket a bisection step is taken instead.
/// Returns `Ok(None)` if the function turns non-finite.
pub fn safeguarded_secant<F, E>(
    f: &mut F,
    mut change: SignChange,
    x0: f64,
    f0: f64,
    config: &SecantConfig,
) -> Result<Option<SecantOutcome>, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    let (mut x_prev, mut f_prev) = (change.lo, change.f_lo);
    let (mut x, mut fx) = (x0, f0);

    for iter in 0..config.max_iterations {
        if fx == 0.0 {
            return Ok(Some(SecantOutcome {
                x,
                fx,
                iterations: iter,
                converged: true,
            }));
        }
        change.update(x, fx);

        let (lo, hi) = (change.lo.min(change.hi), change.lo.max(change.hi));
        let denom = fx - f_prev;
        let mut x_next = if denom != 0.0 {
            x - fx * (x - x_prev) / denom
        } else {
            f64::NAN
        };
        if !(x_next > lo && x_next < hi) {
            x_next = change.midpoint();
        }

        let step = x_next - x;
        x_prev = x;
        f_prev = fx;
        x = x_next;
        fx = f(x)?;
        if !fx.is_finite() {
            return Ok(None);
        }

        if step.abs() < config.step_tol || hi - lo < config.step_tol {
            return Ok(Some(SecantOutcome {
                x,
                fx,
                iterations: iter + 1,
                converged: true,
            }));
        }
    }

    Ok(Some(SecantOutcome {
        x,
        fx,
        iterations: config.max_iterations,
        converged: false,
    }))
}

/// Secant search for a root the function touches without crossing zero.
///
/// Starts at `(x0, f0)` and iterates until `|f| <= residual_tol`. Gives up
/// (`Ok(None)`) when an iterate leaves `bounds`, the secant degenerates, or
/// the iteration budget runs out.
pub fn secant_descent<F, E>(
    f: &mut F,
    x0: f64,
    f0: f64,
    bounds: Bracket,
    residual_tol: f64,
    config: &SecantConfig,
) -> Result<Option<SecantOutcome>, E>
where
    F: FnMut(f64) -> Result<f64, E>,
{
    if f0.abs() <= residual_tol {
        return Ok(Some(SecantOutcome {
            x: x0,
            fx: f0,
            iterations: 0,
            converged: true,
        }));
    }

    let delta = 1e-4 * x0.abs().max(1.0);
    let (mut x_prev, mut f_prev) = (x0, f0);
    let mut x = if x0 + delta <= bounds.upper {
        x0 + delta
    } else {
        x0 - delta
    };
    let mut fx = f(x)?;

    for iter in 1..=config.max_iterations {
        if !fx.is_finite() {
            return Ok(None);
        }
        if fx.abs() <= residual_tol {
            return Ok(Some(SecantOutcome {
                x,
                fx,
                iterations: iter,
                converged: true,
            }));
        }

        let denom = fx - f_prev;
        if denom == 0.0 {
            return Ok(None);
        }
        let x_next = x - fx * (x - x_prev) / denom;
        if !(x_next.is_finite() && bounds.contains(x_next)) {
            return Ok(None);
        }

        x_prev = x;
        f_prev = fx;
        x = x_next;
        fx = f(x)?;
    }

    Ok(None)
}

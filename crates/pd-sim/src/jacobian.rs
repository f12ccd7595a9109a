//! Finite difference Jacobian for the two-temperature system.

use nalgebra::{Matrix2, Vector2};

/// Compute Jacobian using forward finite differences.
///
/// For each column j, perturbs x[j] by epsilon and computes (f(x+e) - f(x))/epsilon.
pub fn finite_difference_jacobian<F>(x: &Vector2<f64>, f: F, epsilon: f64) -> Matrix2<f64>
where
    F: Fn(&Vector2<f64>) -> Vector2<f64>,
{
    let f_x = f(x);
    let mut jac = Matrix2::zeros();

    for j in 0..2 {
        let mut x_perturbed = *x;
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] += dx;

        let df = (f(&x_perturbed) - f_x) / dx;
        jac.set_column(j, &df);
    }

    jac
}

/// Partial derivative with respect to time, `∂f/∂t`, by forward difference.
pub fn time_derivative<F>(t: f64, f_t: &Vector2<f64>, f: F, epsilon: f64) -> Vector2<f64>
where
    F: Fn(f64) -> Vector2<f64>,
{
    let dt = epsilon * t.abs().max(1.0);
    (f(t + dt) - f_t) / dt
}

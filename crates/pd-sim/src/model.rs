//! ThermalModel trait for pluggable source/substrate heat balances.

use nalgebra::{Matrix2, Vector2};
use pd_core::units::{Temperature, kelvin_of};

use crate::jacobian::finite_difference_jacobian;

/// Temperatures of the heated source and the substrate (K).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThermalState {
    pub source: f64,
    pub substrate: f64,
}

impl ThermalState {
    pub const fn new(source: f64, substrate: f64) -> Self {
        Self { source, substrate }
    }

    /// Build from unit-checked temperatures.
    pub fn from_temperatures(source: Temperature, substrate: Temperature) -> Self {
        Self::new(kelvin_of(source), kelvin_of(substrate))
    }

    pub fn is_finite(&self) -> bool {
        self.source.is_finite() && self.substrate.is_finite()
    }

    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.source, self.substrate)
    }

    pub fn from_vector(v: &Vector2<f64>) -> Self {
        Self::new(v[0], v[1])
    }
}

/// Right-hand side of the two-temperature system.
///
/// Implementations differ only in coefficients and in which gain/loss terms
/// they include; integration code is written against this trait alone.
pub trait ThermalModel {
    /// Short identifier used in diagnostics.
    fn name(&self) -> &str;

    /// State derivative `dT/dt = f(T, t, P)`.
    fn derivative(&self, state: &ThermalState, t: f64, power: f64) -> ThermalState;

    /// Jacobian `∂f/∂T` at the given point.
    ///
    /// Defaults to forward finite differences; models with a closed form
    /// should override it.
    fn jacobian(&self, state: &ThermalState, t: f64, power: f64) -> Matrix2<f64> {
        finite_difference_jacobian(
            &state.to_vector(),
            |x| self.derivative(&ThermalState::from_vector(x), t, power).to_vector(),
            1e-7,
        )
    }
}

impl<M: ThermalModel + ?Sized> ThermalModel for &M {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn derivative(&self, state: &ThermalState, t: f64, power: f64) -> ThermalState {
        (**self).derivative(state, t, power)
    }

    fn jacobian(&self, state: &ThermalState, t: f64, power: f64) -> Matrix2<f64> {
        (**self).jacobian(state, t, power)
    }
}

impl<M: ThermalModel + ?Sized> ThermalModel for Box<M> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn derivative(&self, state: &ThermalState, t: f64, power: f64) -> ThermalState {
        (**self).derivative(state, t, power)
    }

    fn jacobian(&self, state: &ThermalState, t: f64, power: f64) -> Matrix2<f64> {
        (**self).jacobian(state, t, power)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::units::k;

    struct Linear;

    impl ThermalModel for Linear {
        fn name(&self) -> &str {
            "linear"
        }

        fn derivative(&self, state: &ThermalState, _t: f64, power: f64) -> ThermalState {
            ThermalState::new(power - 2.0 * state.source, state.source - state.substrate)
        }
    }

    #[test]
    fn default_jacobian_matches_linear_coefficients() {
        let jac = Linear.jacobian(&ThermalState::new(10.0, 5.0), 0.0, 1.0);
        assert!((jac[(0, 0)] + 2.0).abs() < 1e-5);
        assert!(jac[(0, 1)].abs() < 1e-5);
        assert!((jac[(1, 0)] - 1.0).abs() < 1e-5);
        assert!((jac[(1, 1)] + 1.0).abs() < 1e-5);
    }

    #[test]
    fn state_vector_round_trip() {
        let state = ThermalState::from_temperatures(k(600.0), k(350.0));
        assert_eq!(ThermalState::from_vector(&state.to_vector()), state);
        assert!(!ThermalState::new(f64::NAN, 1.0).is_finite());
    }

    #[test]
    fn boxed_model_delegates() {
        let boxed: Box<dyn ThermalModel> = Box::new(Linear);
        let d = boxed.derivative(&ThermalState::new(1.0, 0.0), 0.0, 4.0);
        assert_eq!(d, ThermalState::new(2.0, 1.0));
        assert_eq!(boxed.name(), "linear");
    }
}

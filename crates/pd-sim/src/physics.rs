//! Built-in source/substrate heat balances.
//!
//! All models share the radiative core: the source is driven by the absorbed
//! laser power and radiates as `T⁴`, the substrate absorbs part of the source
//! radiation and radiates itself. The variants add one extra loss channel.

use nalgebra::Matrix2;
use serde::{Deserialize, Serialize};

use crate::model::{ThermalModel, ThermalState};

/// Radiative gain/loss only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiativeModel {
    /// Inverse heat capacity of the source
    pub source_inv_heat_capacity: f64,
    /// Radiative emission coefficient of the source (per K⁴)
    pub source_emission: f64,
    /// Fraction of the laser power absorbed by the source
    pub laser_absorption: f64,
    /// Inverse heat capacity of the substrate
    pub substrate_inv_heat_capacity: f64,
    /// Share of the source radiation absorbed by the substrate (per K⁴)
    pub substrate_absorption: f64,
    /// Radiative emission coefficient of the substrate (per K⁴)
    pub substrate_emission: f64,
}

impl Default for RadiativeModel {
    fn default() -> Self {
        Self {
            source_inv_heat_capacity: 0.0133,
            source_emission: 4e-10,
            laser_absorption: 0.5,
            substrate_inv_heat_capacity: 6.722,
            substrate_absorption: 1.88e-11,
            substrate_emission: 1.149e-10,
        }
    }
}

impl RadiativeModel {
    fn source_balance(&self, t_source: f64, power: f64) -> f64 {
        -self.source_emission * t_source.powi(4) + self.laser_absorption * power
    }

    fn substrate_balance(&self, t_source: f64, t_substrate: f64) -> f64 {
        self.substrate_absorption * t_source.powi(4) - self.substrate_emission * t_substrate.powi(4)
    }

    fn radiative_jacobian(&self, state: &ThermalState) -> Matrix2<f64> {
        let ts3 = state.source.powi(3);
        let tb3 = state.substrate.powi(3);
        Matrix2::new(
            -4.0 * self.source_inv_heat_capacity * self.source_emission * ts3,
            0.0,
            4.0 * self.substrate_inv_heat_capacity * self.substrate_absorption * ts3,
            -4.0 * self.substrate_inv_heat_capacity * self.substrate_emission * tb3,
        )
    }
}

impl ThermalModel for RadiativeModel {
    fn name(&self) -> &str {
        "radiative"
    }

    fn derivative(&self, state: &ThermalState, _t: f64, power: f64) -> ThermalState {
        ThermalState::new(
            self.source_inv_heat_capacity * self.source_balance(state.source, power),
            self.substrate_inv_heat_capacity
                * self.substrate_balance(state.source, state.substrate),
        )
    }

    fn jacobian(&self, state: &ThermalState, _t: f64, _power: f64) -> Matrix2<f64> {
        self.radiative_jacobian(state)
    }
}

/// Radiative balance plus Arrhenius-type evaporation from the source.
///
/// The evaporative loss is `k_ev · exp(-E_ev / T)`; it is taken as zero for
/// non-positive source temperatures, where the exponent has no physical meaning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaporativeModel {
    #[serde(flatten)]
    pub radiative: RadiativeModel,
    /// Pre-exponential evaporation loss factor
    pub evaporation_factor: f64,
    /// Evaporation activation temperature (K)
    pub evaporation_activation: f64,
}

impl Default for EvaporativeModel {
    fn default() -> Self {
        Self {
            radiative: RadiativeModel::default(),
            evaporation_factor: 1e1,
            evaporation_activation: 1.128e3,
        }
    }
}

impl EvaporativeModel {
    fn evaporation(&self, t_source: f64) -> f64 {
        if t_source > 0.0 {
            self.evaporation_factor * (-self.evaporation_activation / t_source).exp()
        } else {
            0.0
        }
    }
}

impl ThermalModel for EvaporativeModel {
    fn name(&self) -> &str {
        "evaporative"
    }

    fn derivative(&self, state: &ThermalState, t: f64, power: f64) -> ThermalState {
        let base = self.radiative.derivative(state, t, power);
        ThermalState::new(
            base.source
                - self.radiative.source_inv_heat_capacity * self.evaporation(state.source),
            base.substrate,
        )
    }

    fn jacobian(&self, state: &ThermalState, _t: f64, _power: f64) -> Matrix2<f64> {
        let mut jac = self.radiative.radiative_jacobian(state);
        if state.source > 0.0 {
            let d_evap = self.evaporation(state.source) * self.evaporation_activation
                / (state.source * state.source);
            jac[(0, 0)] -= self.radiative.source_inv_heat_capacity * d_evap;
        }
        jac
    }
}

/// Radiative balance plus linear conduction towards an ambient temperature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductiveModel {
    #[serde(flatten)]
    pub radiative: RadiativeModel,
    /// Conductance between source and ambient
    pub source_conductance: f64,
    /// Conductance between substrate and ambient
    pub substrate_conductance: f64,
    /// Ambient (holder) temperature (K)
    pub ambient_temperature: f64,
}

impl Default for ConductiveModel {
    fn default() -> Self {
        Self {
            radiative: RadiativeModel::default(),
            source_conductance: 5e-2,
            substrate_conductance: 1e-3,
            ambient_temperature: 293.15,
        }
    }
}

impl ThermalModel for ConductiveModel {
    fn name(&self) -> &str {
        "conductive"
    }

    fn derivative(&self, state: &ThermalState, t: f64, power: f64) -> ThermalState {
        let base = self.radiative.derivative(state, t, power);
        let r = &self.radiative;
        ThermalState::new(
            base.source
                - r.source_inv_heat_capacity
                    * self.source_conductance
                    * (state.source - self.ambient_temperature),
            base.substrate
                - r.substrate_inv_heat_capacity
                    * self.substrate_conductance
                    * (state.substrate - self.ambient_temperature),
        )
    }

    fn jacobian(&self, state: &ThermalState, _t: f64, _power: f64) -> Matrix2<f64> {
        let r = &self.radiative;
        let mut jac = r.radiative_jacobian(state);
        jac[(0, 0)] -= r.source_inv_heat_capacity * self.source_conductance;
        jac[(1, 1)] -= r.substrate_inv_heat_capacity * self.substrate_conductance;
        jac
    }
}

/// Model selection for configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    Radiative(RadiativeModel),
    Evaporative(EvaporativeModel),
    Conductive(ConductiveModel),
}

impl Default for ModelKind {
    fn default() -> Self {
        Self::Radiative(RadiativeModel::default())
    }
}

impl ThermalModel for ModelKind {
    fn name(&self) -> &str {
        match self {
            Self::Radiative(m) => m.name(),
            Self::Evaporative(m) => m.name(),
            Self::Conductive(m) => m.name(),
        }
    }

    fn derivative(&self, state: &ThermalState, t: f64, power: f64) -> ThermalState {
        match self {
            Self::Radiative(m) => m.derivative(state, t, power),
            Self::Evaporative(m) => m.derivative(state, t, power),
            Self::Conductive(m) => m.derivative(state, t, power),
        }
    }

    fn jacobian(&self, state: &ThermalState, t: f64, power: f64) -> Matrix2<f64> {
        match self {
            Self::Radiative(m) => m.jacobian(state, t, power),
            Self::Evaporative(m) => m.jacobian(state, t, power),
            Self::Conductive(m) => m.jacobian(state, t, power),
        }
    }
}

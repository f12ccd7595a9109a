//! Experiment setup loaded from YAML.

use pd_sim::{ModelKind, SimOptions, ThermalState};
use pd_solver::RootFindConfig;
use serde::{Deserialize, Serialize};

use crate::error::{SweepError, SweepResult};
use crate::matcher::MatchTarget;
use crate::sweep::Execution;

/// Inputs of a power-matching sweep; missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepositionSetup {
    /// Source temperature at t = 0 (K)
    pub initial_source_temperature: f64,
    /// Substrate temperature at t = 0 (K)
    pub initial_substrate_temperature: f64,
    /// Pulse repetition frequency (Hz)
    pub frequency: f64,
    pub pulse_count: usize,
    /// Duration of the continuous reference run (s)
    pub reference_duration: f64,
    pub power_upper_bound: f64,
    pub model: ModelKind,
    /// Integrator, sampling, growth law and initial thickness
    pub sim: SimOptions,
    pub root: RootFindConfig,
    pub execution: Execution,
}

impl Default for DepositionSetup {
    fn default() -> Self {
        Self {
            initial_source_temperature: 1e-14,
            initial_substrate_temperature: 0.0,
            frequency: 0.1,
            pulse_count: 10,
            reference_duration: 100.0,
            power_upper_bound: 1e3,
            model: ModelKind::default(),
            sim: SimOptions::default(),
            root: RootFindConfig::default(),
            execution: Execution::default(),
        }
    }
}

impl DepositionSetup {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(text: &str) -> SweepResult<Self> {
        let setup: Self = serde_yaml::from_str(text)?;
        setup.validate()?;
        Ok(setup)
    }

    pub fn to_yaml_string(&self) -> SweepResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn initial_state(&self) -> ThermalState {
        ThermalState::new(
            self.initial_source_temperature,
            self.initial_substrate_temperature,
        )
    }

    pub fn target(&self) -> MatchTarget {
        MatchTarget {
            initial: self.initial_state(),
            frequency: self.frequency,
            pulse_count: self.pulse_count,
            reference_duration: self.reference_duration,
            power_upper_bound: self.power_upper_bound,
        }
    }

    pub fn validate(&self) -> SweepResult<()> {
        if self.initial_source_temperature < 0.0 || self.initial_substrate_temperature < 0.0 {
            return Err(SweepError::InvalidConfiguration(
                "initial temperatures must not be negative".to_string(),
            ));
        }
        if !self.sim.initial_thickness.is_finite() {
            return Err(SweepError::InvalidConfiguration(
                "initial thickness must be finite".to_string(),
            ));
        }
        self.target().validate()
    }
}

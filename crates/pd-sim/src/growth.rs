//! Arrhenius growth law and thickness accumulation.

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// `growth_rate = factor · exp(-activation / T_source)`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthLaw {
    /// Pre-exponential factor (thickness per second)
    pub factor: f64,
    /// Activation temperature (K)
    pub activation: f64,
}

impl Default for GrowthLaw {
    fn default() -> Self {
        Self {
            factor: 8e1,
            activation: 1.128e3,
        }
    }
}

impl GrowthLaw {
    pub fn new(factor: f64, activation: f64) -> Self {
        Self { factor, activation }
    }

    /// Instantaneous growth rate at the given source temperature.
    ///
    /// The exponent is only defined for positive temperatures: a source
    /// temperature `<= 0` or a non-finite one yields `NaN`.
    pub fn rate(&self, t_source: f64) -> f64 {
        if !(t_source.is_finite() && t_source > 0.0) {
            return f64::NAN;
        }
        self.factor * (-self.activation / t_source).exp()
    }
}

/// Thickness and growth rate sampled on a simulation time grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrowthRecord {
    pub thickness: Vec<f64>,
    pub growth_rate: Vec<f64>,
}

/// Integrate the growth law over a temperature trajectory with forward Euler.
///
/// `thickness[0] = initial_thickness` and
/// `thickness[i + 1] = thickness[i] + growth_rate[i] · (times[i + 1] - times[i])`.
pub fn compute_thickness(
    source_temperatures: &[f64],
    times: &[f64],
    initial_thickness: f64,
    law: &GrowthLaw,
) -> SimResult<GrowthRecord> {
    if source_temperatures.len() != times.len() {
        return Err(SimError::InvalidArg {
            what: "temperature and time sequences must have equal length",
        });
    }

    let growth_rate: Vec<f64> = source_temperatures.iter().map(|&t| law.rate(t)).collect();

    let mut thickness = Vec::with_capacity(times.len());
    if !times.is_empty() {
        thickness.push(initial_thickness);
    }
    for i in 1..times.len() {
        let dt = times[i] - times[i - 1];
        thickness.push(thickness[i - 1] + growth_rate[i - 1] * dt);
    }

    Ok(GrowthRecord {
        thickness,
        growth_rate,
    })
}

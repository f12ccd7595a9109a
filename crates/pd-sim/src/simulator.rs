//! Temperature and thickness simulation over a power schedule.

use pd_core::PdError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::SimResult;
use crate::growth::{GrowthLaw, compute_thickness};
use crate::integrator::{Integrator, IntegratorType, Sampling};
use crate::model::{ThermalModel, ThermalState};
use crate::schedule::{Phase, PowerSchedule, PulseTrain, TimeSpan};

/// Options for simulation runs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimOptions {
    /// Integrator type (default: adaptive Rosenbrock 2(3))
    pub integrator: IntegratorType,
    /// Output sampling within each phase
    pub sampling: Sampling,
    /// Growth law applied to the source temperature
    pub growth: GrowthLaw,
    /// Layer thickness at the first sample
    pub initial_thickness: f64,
}

/// Boundary bookkeeping for one phase of a simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhaseRecord {
    pub phase: Phase,
    /// State the phase was started from
    pub initial: ThermalState,
    /// State reached at the end of the phase
    pub terminal: ThermalState,
    /// Index of the sample at the phase start
    pub first_sample: usize,
    /// Index of the sample at the phase end
    pub last_sample: usize,
}

/// Sampled trajectory of one simulation; all sequences have equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationResult {
    /// Time points (s), strictly increasing
    pub time: Vec<f64>,
    pub source_temperature: Vec<f64>,
    pub substrate_temperature: Vec<f64>,
    /// Laser power applied over the interval starting at each sample
    pub power: Vec<f64>,
    pub thickness: Vec<f64>,
    pub growth_rate: Vec<f64>,
    pub phases: Vec<PhaseRecord>,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn state_at(&self, index: usize) -> Option<ThermalState> {
        Some(ThermalState::new(
            *self.source_temperature.get(index)?,
            *self.substrate_temperature.get(index)?,
        ))
    }

    pub fn final_thickness(&self) -> Option<f64> {
        self.thickness.last().copied()
    }

    /// Highest substrate temperature reached (non-finite samples ignored).
    pub fn peak_substrate_temperature(&self) -> Option<f64> {
        peak(&self.substrate_temperature)
    }

    /// Highest source temperature reached (non-finite samples ignored).
    pub fn peak_source_temperature(&self) -> Option<f64> {
        peak(&self.source_temperature)
    }
}

fn peak(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .reduce(f64::max)
}

/// Integrates a [`ThermalModel`] over power schedules.
///
/// Holds only configuration; every call starts from the state it is given.
#[derive(Clone, Debug)]
pub struct TemperatureSimulator<M> {
    model: M,
    options: SimOptions,
}

impl<M: ThermalModel> TemperatureSimulator<M> {
    pub fn new(model: M, options: SimOptions) -> Self {
        Self { model, options }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn options(&self) -> &SimOptions {
        &self.options
    }

    /// Constant power over `span`.
    pub fn simulate_continuous(
        &self,
        power: f64,
        initial: ThermalState,
        span: TimeSpan,
    ) -> SimResult<SimulationResult> {
        self.simulate(&PowerSchedule::continuous(power, span)?, initial)
    }

    /// `pulse_count` square pulses of `power` and length `pulse_duration`,
    /// one per period `1 / frequency`, starting at t = 0.
    pub fn simulate_pulsed(
        &self,
        power: f64,
        initial: ThermalState,
        frequency: f64,
        pulse_duration: f64,
        pulse_count: usize,
    ) -> SimResult<SimulationResult> {
        let train = PulseTrain::new(frequency, pulse_duration, pulse_count)?;
        self.simulate(&PowerSchedule::pulsed(power, train)?, initial)
    }

    /// Integrate phase by phase; each phase starts from the exact terminal
    /// state of the one before it.
    pub fn simulate(
        &self,
        schedule: &PowerSchedule,
        initial: ThermalState,
    ) -> SimResult<SimulationResult> {
        let phases = schedule.phases();
        let mut result = SimulationResult {
            phases: Vec::with_capacity(phases.len()),
            ..SimulationResult::default()
        };

        let mut state = initial;
        for phase in phases {
            let traj = self.options.integrator.integrate(
                &self.model,
                phase.power,
                state,
                phase.start,
                phase.end,
                &self.options.sampling,
            )?;
            let terminal = traj.terminal().ok_or(PdError::Invariant {
                what: "integrator returned an empty trajectory",
            })?;

            // The first sample of every later phase repeats the previous terminal sample.
            let skip = usize::from(!result.is_empty());
            let first_sample = result.len() - skip;
            for (t, x) in traj.t.iter().zip(&traj.x).skip(skip) {
                result.time.push(*t);
                result.source_temperature.push(x.source);
                result.substrate_temperature.push(x.substrate);
                result.power.push(phase.power);
            }

            result.phases.push(PhaseRecord {
                phase,
                initial: state,
                terminal,
                first_sample,
                last_sample: result.len() - 1,
            });
            state = terminal;
        }

        let growth = compute_thickness(
            &result.source_temperature,
            &result.time,
            self.options.initial_thickness,
            &self.options.growth,
        )?;
        result.thickness = growth.thickness;
        result.growth_rate = growth.growth_rate;

        debug!(
            model = self.model.name(),
            phases = result.phases.len(),
            samples = result.len(),
            final_thickness = ?result.final_thickness(),
            "simulation finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimError;
    use crate::physics::RadiativeModel;

    #[test]
    fn sim_options_defaults() {
        let opts = SimOptions::default();
        assert_eq!(opts.initial_thickness, 0.0);
        assert_eq!(opts.sampling, Sampling::Adaptive { min_samples: 100 });
        assert!(matches!(opts.integrator, IntegratorType::Rosenbrock23(_)));
    }

    #[test]
    fn peak_ignores_non_finite_samples() {
        assert_eq!(peak(&[1.0, f64::NAN, 3.0, 2.0]), Some(3.0));
        assert_eq!(peak(&[]), None);
    }

    #[test]
    fn pulsed_without_parameters_is_a_config_error() {
        let sim = TemperatureSimulator::new(RadiativeModel::default(), SimOptions::default());
        let err = sim
            .simulate_pulsed(100.0, ThermalState::new(300.0, 300.0), 0.1, 0.0, 10)
            .unwrap_err();
        assert!(matches!(err, SimError::Config { .. }));
    }
}

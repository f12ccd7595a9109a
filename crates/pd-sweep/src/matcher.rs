//! Laser power search matching pulsed to continuous deposition.

use pd_core::PdError;
use pd_sim::{
    PulseTrain, SimError, SimResult, SimulationResult, TemperatureSimulator, ThermalModel,
    ThermalState,
};
use pd_solver::{Bracket, RootFindResult, RootFinder};
use tracing::debug;

use crate::cache::{DifferenceCache, DifferenceKey};
use crate::error::{SweepError, SweepResult};

/// Fixed parameters shared by every power search of a sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MatchTarget {
    /// State every pulsed run starts from
    pub initial: ThermalState,
    /// Pulse repetition frequency (Hz)
    pub frequency: f64,
    pub pulse_count: usize,
    /// Duration of the continuous reference run (s)
    pub reference_duration: f64,
    /// Powers are searched in `[0, power_upper_bound]`
    pub power_upper_bound: f64,
}

impl MatchTarget {
    pub fn validate(&self) -> SweepResult<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !self.initial.is_finite() {
            return Err(SweepError::InvalidConfiguration(
                "initial temperatures must be finite".to_string(),
            ));
        }
        if !positive(self.frequency) {
            return Err(SweepError::InvalidConfiguration(format!(
                "frequency must be positive, got {}",
                self.frequency
            )));
        }
        if self.pulse_count == 0 {
            return Err(SweepError::InvalidConfiguration(
                "pulse_count must be at least 1".to_string(),
            ));
        }
        if !positive(self.reference_duration) {
            return Err(SweepError::InvalidConfiguration(format!(
                "reference_duration must be positive, got {}",
                self.reference_duration
            )));
        }
        if !positive(self.power_upper_bound) {
            return Err(SweepError::InvalidConfiguration(format!(
                "power_upper_bound must be positive, got {}",
                self.power_upper_bound
            )));
        }
        Ok(())
    }
}

/// Finds the pulsed power whose final thickness equals `rate * reference_duration`.
pub struct PowerMatcher<M> {
    simulator: TemperatureSimulator<M>,
    finder: RootFinder,
    target: MatchTarget,
    bracket: Bracket,
    cache: DifferenceCache,
}

impl<M: ThermalModel> PowerMatcher<M> {
    /// Each matcher starts with an empty cache.
    pub fn new(
        simulator: TemperatureSimulator<M>,
        finder: RootFinder,
        target: MatchTarget,
    ) -> SweepResult<Self> {
        target.validate()?;
        let bracket = Bracket::new(0.0, target.power_upper_bound)?;
        Ok(Self {
            simulator,
            finder,
            target,
            bracket,
            cache: DifferenceCache::new(),
        })
    }

    pub fn target(&self) -> &MatchTarget {
        &self.target
    }

    pub fn cache(&self) -> &DifferenceCache {
        &self.cache
    }

    /// Pulsed run at `power` with the target's frequency and pulse count.
    pub fn simulate(&self, power: f64, pulse_duration: f64) -> SimResult<SimulationResult> {
        self.simulator.simulate_pulsed(
            power,
            self.target.initial,
            self.target.frequency,
            pulse_duration,
            self.target.pulse_count,
        )
    }

    /// Reference thickness minus the final pulsed thickness at `power`.
    pub fn difference(&mut self, power: f64, pulse_duration: f64, rate: f64) -> SimResult<f64> {
        let Self {
            simulator,
            target,
            cache,
            ..
        } = self;
        evaluate(simulator, target, cache, power, pulse_duration, rate)
    }

    /// Search `[0, power_upper_bound]` for the matching power.
    ///
    /// Unreachable targets give [`RootFindResult::NotFound`]; simulation
    /// failures after a bracket was found are returned as errors.
    pub fn find_power(&mut self, pulse_duration: f64, rate: f64) -> SimResult<RootFindResult> {
        PulseTrain::new(self.target.frequency, pulse_duration, self.target.pulse_count)?;
        if !rate.is_finite() {
            return Err(SimError::InvalidArg {
                what: "deposition rate must be finite",
            });
        }

        let Self {
            simulator,
            finder,
            target,
            bracket,
            cache,
        } = self;
        let result = finder.find(
            |power| evaluate(simulator, target, cache, power, pulse_duration, rate),
            *bracket,
        )?;

        debug!(
            pulse_duration,
            rate,
            power = ?result.value(),
            cache_hits = cache.hits(),
            cache_misses = cache.misses(),
            "power search finished"
        );
        Ok(result)
    }
}

fn evaluate<M: ThermalModel>(
    simulator: &TemperatureSimulator<M>,
    target: &MatchTarget,
    cache: &mut DifferenceCache,
    power: f64,
    pulse_duration: f64,
    rate: f64,
) -> SimResult<f64> {
    let key = DifferenceKey::new(
        pulse_duration,
        rate,
        power,
        target.reference_duration,
        target.pulse_count,
    );
    cache.get_or_try_insert_with(key, || -> SimResult<f64> {
        let run = simulator.simulate_pulsed(
            power,
            target.initial,
            target.frequency,
            pulse_duration,
            target.pulse_count,
        )?;
        let thickness = run.final_thickness().ok_or(PdError::Invariant {
            what: "simulation produced no samples",
        })?;
        Ok(rate * target.reference_duration - thickness)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix2;
    use pd_sim::{GrowthLaw, SimOptions};

    /// Source relaxes towards `300 + P`; substrate follows the source.
    struct Linear;

    impl ThermalModel for Linear {
        fn name(&self) -> &str {
            "linear"
        }

        fn derivative(&self, state: &ThermalState, _t: f64, power: f64) -> ThermalState {
            ThermalState::new(
                power - (state.source - 300.0),
                0.5 * (state.source - state.substrate),
            )
        }

        fn jacobian(&self, _state: &ThermalState, _t: f64, _power: f64) -> Matrix2<f64> {
            Matrix2::new(-1.0, 0.0, 0.5, -0.5)
        }
    }

    fn matcher() -> PowerMatcher<Linear> {
        let options = SimOptions {
            growth: GrowthLaw::new(1.0, 2000.0),
            ..SimOptions::default()
        };
        PowerMatcher::new(
            TemperatureSimulator::new(Linear, options),
            RootFinder::default(),
            MatchTarget {
                initial: ThermalState::new(300.0, 300.0),
                frequency: 0.1,
                pulse_count: 3,
                reference_duration: 30.0,
                power_upper_bound: 2e4,
            },
        )
        .unwrap()
    }

    #[test]
    fn difference_decreases_with_power() {
        let mut m = matcher();
        let low = m.difference(100.0, 5.0, 0.1).unwrap();
        let high = m.difference(5000.0, 5.0, 0.1).unwrap();
        assert!(low > high);
    }

    #[test]
    fn repeated_difference_uses_cache() {
        let mut m = matcher();
        let a = m.difference(1000.0, 2.0, 0.1).unwrap();
        let b = m.difference(1000.0, 2.0, 0.1).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
        assert_eq!(m.cache().hits(), 1);
        assert_eq!(m.cache().misses(), 1);
    }

    #[test]
    fn found_power_matches_reference_thickness() {
        let mut m = matcher();
        let power = m.find_power(5.0, 0.1).unwrap().value().unwrap();
        let thickness = m.simulate(power, 5.0).unwrap().final_thickness().unwrap();
        assert!((thickness - 3.0).abs() / 3.0 < 1e-2);
    }

    #[test]
    fn pulse_longer_than_period_is_an_error() {
        let mut m = matcher();
        assert!(matches!(
            m.find_power(20.0, 0.1),
            Err(SimError::Config { .. })
        ));
    }
}

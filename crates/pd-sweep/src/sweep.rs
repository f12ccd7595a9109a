//! Sweep execution over (pulse duration, rate) grids.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use pd_sim::{ModelKind, PulseTrain, SimError, SimOptions, TemperatureSimulator, ThermalModel};
use pd_solver::{RootFindResult, RootFinder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::axis::SweepPlan;
use crate::error::{SweepError, SweepResult};
use crate::maps::{CellOutcome, SweepMaps};
use crate::matcher::{MatchTarget, PowerMatcher};
use crate::progress::SweepProgress;
use crate::setup::DepositionSetup;

/// How sweep cells are scheduled. Results do not depend on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Execution {
    Sequential,
    /// Cells spread over the rayon thread pool
    #[default]
    Parallel,
}

/// Runs a [`PowerMatcher`] for every cell of a sweep grid.
pub struct SweepEngine<M> {
    model: M,
    options: SimOptions,
    finder: RootFinder,
    target: MatchTarget,
    execution: Execution,
}

impl SweepEngine<ModelKind> {
    pub fn from_setup(setup: &DepositionSetup) -> SweepResult<Self> {
        setup.validate()?;
        let finder = RootFinder::new(setup.root)?;
        Ok(Self::new(setup.model.clone(), setup.sim.clone(), finder, setup.target())?
            .with_execution(setup.execution))
    }
}

impl<M: ThermalModel + Sync> SweepEngine<M> {
    pub fn new(
        model: M,
        options: SimOptions,
        finder: RootFinder,
        target: MatchTarget,
    ) -> SweepResult<Self> {
        target.validate()?;
        Ok(Self {
            model,
            options,
            finder,
            target,
            execution: Execution::default(),
        })
    }

    pub fn with_execution(mut self, execution: Execution) -> Self {
        self.execution = execution;
        self
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    pub fn target(&self) -> &MatchTarget {
        &self.target
    }

    /// A matcher with its own empty cache.
    pub fn matcher(&self) -> SweepResult<PowerMatcher<&M>> {
        PowerMatcher::new(
            TemperatureSimulator::new(&self.model, self.options.clone()),
            self.finder.clone(),
            self.target,
        )
    }

    /// Solve one (pulse duration, rate) pair.
    ///
    /// A cell without a matching power is a regular outcome; simulation
    /// failures are returned as [`SweepError::Cell`].
    pub fn compute_cell(&self, pulse_duration: f64, rate: f64) -> SweepResult<CellOutcome> {
        let cell_error = |source: SimError| SweepError::Cell {
            pulse_duration,
            rate,
            source,
        };

        let mut matcher = self.matcher()?;
        let power = matcher.find_power(pulse_duration, rate).map_err(cell_error)?;

        match power {
            RootFindResult::Found(p) => {
                let run = matcher.simulate(p, pulse_duration).map_err(cell_error)?;
                Ok(CellOutcome {
                    pulse_duration,
                    rate,
                    power,
                    final_thickness: run.final_thickness(),
                    peak_substrate_temperature: run.peak_substrate_temperature(),
                })
            }
            RootFindResult::NotFound(ref reason) => {
                warn!(pulse_duration, rate, %reason, "no matching power");
                Ok(CellOutcome::unsolved(pulse_duration, rate, power))
            }
        }
    }

    pub fn run(&self, pulse_durations: &[f64], rates: &[f64]) -> SweepResult<SweepMaps> {
        self.run_with_progress(pulse_durations, rates, |_| {})
    }

    pub fn run_axes(&self, plan: &SweepPlan) -> SweepResult<SweepMaps> {
        plan.validate()?;
        self.run(&plan.pulse_duration.values(), &plan.rate.values())
    }

    /// Like [`run`](Self::run), calling `on_progress` after every cell.
    ///
    /// Under [`Execution::Parallel`] the callback runs on worker threads in
    /// completion order; the returned maps are always in input order.
    pub fn run_with_progress<P>(
        &self,
        pulse_durations: &[f64],
        rates: &[f64],
        on_progress: P,
    ) -> SweepResult<SweepMaps>
    where
        P: Fn(SweepProgress) + Sync,
    {
        self.validate_axes(pulse_durations, rates)?;

        let cols = rates.len();
        let total = pulse_durations.len() * cols;
        info!(
            pulse_durations = pulse_durations.len(),
            rates = cols,
            execution = ?self.execution,
            model = self.model.name(),
            "sweep started"
        );

        let started = Instant::now();
        let completed = AtomicUsize::new(0);
        let solve = |idx: usize| -> SweepResult<CellOutcome> {
            let (pulse_duration, rate) = (pulse_durations[idx / cols], rates[idx % cols]);
            let cell = self.compute_cell(pulse_duration, rate)?;
            on_progress(SweepProgress {
                completed: completed.fetch_add(1, Ordering::Relaxed) + 1,
                total,
                pulse_duration,
                rate,
                solved: cell.is_solved(),
                elapsed_wall_s: started.elapsed().as_secs_f64(),
            });
            Ok(cell)
        };

        let cells: Vec<CellOutcome> = match self.execution {
            Execution::Sequential => (0..total).map(solve).collect::<SweepResult<_>>()?,
            Execution::Parallel => (0..total)
                .into_par_iter()
                .map(solve)
                .collect::<SweepResult<_>>()?,
        };

        let maps = SweepMaps::new(pulse_durations.to_vec(), rates.to_vec(), cells)?;
        info!(
            cells = total,
            unsolved = maps.unsolved_cells().len(),
            elapsed_wall_s = started.elapsed().as_secs_f64(),
            "sweep finished"
        );
        Ok(maps)
    }

    fn validate_axes(&self, pulse_durations: &[f64], rates: &[f64]) -> SweepResult<()> {
        for &t_p in pulse_durations {
            PulseTrain::new(self.target.frequency, t_p, self.target.pulse_count).map_err(|e| {
                SweepError::InvalidConfiguration(format!("pulse duration {t_p}: {e}"))
            })?;
        }
        if let Some(rate) = rates.iter().find(|r| !r.is_finite()) {
            return Err(SweepError::InvalidConfiguration(format!(
                "rate must be finite, got {rate}"
            )));
        }
        Ok(())
    }
}

//! Two-dimensional sweep results.

use nalgebra::DMatrix;
use pd_solver::RootFindResult;

use crate::error::{SweepError, SweepResult};

/// Result of one (pulse duration, rate) cell.
#[derive(Clone, Debug, PartialEq)]
pub struct CellOutcome {
    pub pulse_duration: f64,
    pub rate: f64,
    /// Matching laser power, or why none was found
    pub power: RootFindResult,
    /// Final thickness of the pulsed run at the matching power
    pub final_thickness: Option<f64>,
    /// Peak substrate temperature of that run (K)
    pub peak_substrate_temperature: Option<f64>,
}

impl CellOutcome {
    pub fn unsolved(pulse_duration: f64, rate: f64, power: RootFindResult) -> Self {
        Self {
            pulse_duration,
            rate,
            power,
            final_thickness: None,
            peak_substrate_temperature: None,
        }
    }

    pub fn is_solved(&self) -> bool {
        self.power.is_found()
    }
}

/// Cells of a sweep indexed `[pulse_duration_index][rate_index]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SweepMaps {
    pulse_durations: Vec<f64>,
    rates: Vec<f64>,
    /// Row-major by pulse duration
    cells: Vec<CellOutcome>,
}

impl SweepMaps {
    pub fn new(
        pulse_durations: Vec<f64>,
        rates: Vec<f64>,
        cells: Vec<CellOutcome>,
    ) -> SweepResult<Self> {
        if cells.len() != pulse_durations.len() * rates.len() {
            return Err(SweepError::InvalidConfiguration(format!(
                "expected {} cells, got {}",
                pulse_durations.len() * rates.len(),
                cells.len()
            )));
        }
        Ok(Self {
            pulse_durations,
            rates,
            cells,
        })
    }

    pub fn pulse_durations(&self) -> &[f64] {
        &self.pulse_durations
    }

    pub fn rates(&self) -> &[f64] {
        &self.rates
    }

    pub fn cells(&self) -> &[CellOutcome] {
        &self.cells
    }

    /// `(len(pulse_durations), len(rates))`
    pub fn shape(&self) -> (usize, usize) {
        (self.pulse_durations.len(), self.rates.len())
    }

    pub fn cell(&self, i: usize, j: usize) -> Option<&CellOutcome> {
        if i >= self.pulse_durations.len() || j >= self.rates.len() {
            return None;
        }
        self.cells.get(i * self.rates.len() + j)
    }

    /// Matching power per cell, `NaN` where unsolved.
    pub fn power_map(&self) -> DMatrix<f64> {
        self.grid(|c| c.power.to_sentinel())
    }

    /// Final thickness per cell, `NaN` where unsolved.
    pub fn thickness_map(&self) -> DMatrix<f64> {
        self.grid(|c| c.final_thickness.unwrap_or(f64::NAN))
    }

    /// Peak substrate temperature per cell, `NaN` where unsolved.
    pub fn temperature_map(&self) -> DMatrix<f64> {
        self.grid(|c| c.peak_substrate_temperature.unwrap_or(f64::NAN))
    }

    /// Indices `(i, j)` of cells without a matching power.
    pub fn unsolved_cells(&self) -> Vec<(usize, usize)> {
        let cols = self.rates.len();
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_solved())
            .map(|(idx, _)| (idx / cols, idx % cols))
            .collect()
    }

    fn grid(&self, value: impl Fn(&CellOutcome) -> f64) -> DMatrix<f64> {
        let (rows, cols) = self.shape();
        DMatrix::from_fn(rows, cols, |i, j| value(&self.cells[i * cols + j]))
    }
}

//! Error types for sweep operations.

use pd_sim::SimError;
use pd_solver::SolverError;
use thiserror::Error;

/// Errors that abort a sweep or reject its setup.
#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Setup parse error: {0}")]
    Setup(#[from] serde_yaml::Error),

    #[error("Simulation error: {0}")]
    Sim(#[from] SimError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    /// A simulation failed outside bracketing while solving one cell.
    #[error("Cell (pulse_duration = {pulse_duration}, rate = {rate}) failed: {source}")]
    Cell {
        pulse_duration: f64,
        rate: f64,
        source: SimError,
    },
}

pub type SweepResult<T> = Result<T, SweepError>;

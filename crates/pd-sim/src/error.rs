//! Error types for simulation operations.

use thiserror::Error;

/// Errors encountered during temperature simulation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// A schedule was requested without the parameters it needs.
    #[error("Configuration error: {what}")]
    Config { what: &'static str },

    #[error("Non-finite state at t = {t}")]
    NonFinite { t: f64 },

    #[error("Step size underflow at t = {t} (h = {h:e})")]
    StepSizeUnderflow { t: f64, h: f64 },

    #[error("Maximum number of steps ({steps}) exceeded at t = {t}")]
    MaxStepsExceeded { t: f64, steps: usize },

    #[error("Core error: {0}")]
    Core(#[from] pd_core::PdError),
}

pub type SimResult<T> = Result<T, SimError>;

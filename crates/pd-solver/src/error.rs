//! Error types for solver configuration.

use pd_core::PdError;
use thiserror::Error;

/// Errors raised while setting up a root search.
///
/// A search that merely fails to find a root is not an error; see
/// [`crate::RootFindResult`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Invalid solver configuration: {what}")]
    InvalidConfig { what: String },

    #[error("Core error: {0}")]
    Core(#[from] PdError),
}

pub type SolverResult<T> = Result<T, SolverError>;

//! pd-core: shared foundation for pulsedep.
//!
//! Contains:
//! - units (uom SI types + constructors used at the configuration boundary)
//! - numeric (Real + tolerances + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{PdError, PdResult};
pub use numeric::*;
pub use units::*;

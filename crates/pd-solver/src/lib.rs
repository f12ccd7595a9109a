//! Scalar root finding with graceful failure.
//!
//! A root is first bracketed by bisection to a coarse tolerance and then
//! polished with a safeguarded secant iteration. Functions that never change
//! sign in the search interval yield [`RootFindResult::NotFound`] instead of an
//! error, so callers sweeping many problems can keep going.

pub mod bracket;
pub mod error;
pub mod root;
pub mod secant;

pub use bracket::{Bracket, bisect, scan};
pub use error::{SolverError, SolverResult};
pub use root::{NotFoundReason, RootFindConfig, RootFindResult, RootFinder};
pub use secant::{SecantConfig, SecantOutcome, safeguarded_secant, secant_descent};

//! Power matching and parameter sweeps over pulsed deposition runs.
//!
//! A [`PowerMatcher`] searches the laser power at which a pulsed run grows
//! the same layer as a continuous run at a given rate. [`SweepEngine`] repeats
//! that search over a grid of pulse durations and rates and assembles the
//! results into [`SweepMaps`].

pub mod axis;
pub mod cache;
pub mod error;
pub mod maps;
pub mod matcher;
pub mod progress;
pub mod setup;
pub mod sweep;

pub use axis::{Spacing, SweepAxis, SweepPlan};
pub use cache::{DifferenceCache, DifferenceKey};
pub use error::{SweepError, SweepResult};
pub use maps::{CellOutcome, SweepMaps};
pub use matcher::{MatchTarget, PowerMatcher};
pub use progress::SweepProgress;
pub use setup::DepositionSetup;
pub use sweep::{Execution, SweepEngine};

//! Sweep axis generation.
//!
//! An axis keeps the user-specified bounds and produces the ordered input
//! values of one sweep dimension.

use std::fmt;

use pd_core::linspace;
use serde::{Deserialize, Serialize};

use crate::error::{SweepError, SweepResult};

/// Type of sweep progression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// Uniformly spaced points
    #[default]
    Linear,
    /// Logarithmically spaced points
    Logarithmic,
}

/// One dimension of a sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepAxis {
    pub start: f64,
    pub end: f64,
    /// Number of points to generate
    pub points: usize,
    #[serde(default)]
    pub spacing: Spacing,
}

impl SweepAxis {
    pub fn linear(start: f64, end: f64, points: usize) -> SweepResult<Self> {
        Self::new(start, end, points, Spacing::Linear)
    }

    pub fn logarithmic(start: f64, end: f64, points: usize) -> SweepResult<Self> {
        Self::new(start, end, points, Spacing::Logarithmic)
    }

    pub fn new(start: f64, end: f64, points: usize, spacing: Spacing) -> SweepResult<Self> {
        let axis = Self {
            start,
            end,
            points,
            spacing,
        };
        axis.validate()?;
        Ok(axis)
    }

    pub fn validate(&self) -> SweepResult<()> {
        if !(self.start.is_finite() && self.end.is_finite()) {
            return Err(SweepError::InvalidConfiguration(format!(
                "axis bounds must be finite, got {} and {}",
                self.start, self.end
            )));
        }
        if self.points == 0 {
            return Err(SweepError::InvalidConfiguration(
                "axis must have at least 1 point".to_string(),
            ));
        }
        if self.points > 1 && self.start == self.end {
            return Err(SweepError::InvalidConfiguration(
                "start and end values must be different".to_string(),
            ));
        }
        if self.spacing == Spacing::Logarithmic && (self.start <= 0.0 || self.end <= 0.0) {
            return Err(SweepError::InvalidConfiguration(
                "logarithmic axis requires positive bounds".to_string(),
            ));
        }
        Ok(())
    }

    /// Generate all points; first and last equal the bounds exactly.
    pub fn values(&self) -> Vec<f64> {
        match self.spacing {
            Spacing::Linear => linspace(self.start, self.end, self.points),
            Spacing::Logarithmic => {
                let mut points: Vec<f64> = linspace(self.start.ln(), self.end.ln(), self.points)
                    .into_iter()
                    .map(f64::exp)
                    .collect();
                if let Some(first) = points.first_mut() {
                    *first = self.start;
                }
                if self.points > 1 {
                    if let Some(last) = points.last_mut() {
                        *last = self.end;
                    }
                }
                points
            }
        }
    }
}

impl fmt::Display for Spacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => write!(f, "Linear"),
            Self::Logarithmic => write!(f, "Logarithmic"),
        }
    }
}

impl fmt::Display for SweepAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} ({} points, {})",
            self.start, self.end, self.points, self.spacing
        )
    }
}

/// Pulse duration and rate axes of a two-dimensional sweep.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepPlan {
    pub pulse_duration: SweepAxis,
    pub rate: SweepAxis,
}

impl SweepPlan {
    pub fn validate(&self) -> SweepResult<()> {
        self.pulse_duration.validate()?;
        self.rate.validate()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.pulse_duration.points, self.rate.points)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn log_axis_is_increasing_within_bounds(
            start in 1e-4_f64..1e2,
            ratio in 1.01_f64..1e3,
            points in 2_usize..60,
        ) {
            let end = start * ratio;
            let values = SweepAxis::logarithmic(start, end, points).unwrap().values();
            prop_assert_eq!(values.len(), points);
            prop_assert_eq!(values[0], start);
            prop_assert_eq!(values[points - 1], end);
            prop_assert!(values.windows(2).all(|w| w[1] > w[0]));
        }
    }
}

//! Laser power schedules.
//!
//! A schedule expands into an ordered list of constant-power phases. Pulsed
//! schedules start with the laser on; each pulse is followed by a pause that
//! lasts until the next period begins.

use pd_core::units::{Frequency, Power, Time, hertz_of, seconds_of, watts_of};
use pd_core::ensure_finite;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Closed time interval `[start, end]` in seconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: f64,
    pub end: f64,
}

impl TimeSpan {
    pub fn new(start: f64, end: f64) -> SimResult<Self> {
        ensure_finite(start, "time span start")?;
        ensure_finite(end, "time span end")?;
        if end <= start {
            return Err(SimError::InvalidArg {
                what: "time span end must be after start",
            });
        }
        Ok(Self { start, end })
    }

    pub fn from_times(start: Time, end: Time) -> SimResult<Self> {
        Self::new(seconds_of(start), seconds_of(end))
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Square-wave pulse train starting at t = 0.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PulseTrain {
    frequency: f64,
    pulse_duration: f64,
    pulse_count: usize,
}

impl PulseTrain {
    pub fn new(frequency: f64, pulse_duration: f64, pulse_count: usize) -> SimResult<Self> {
        if !(frequency.is_finite() && frequency > 0.0) {
            return Err(SimError::Config {
                what: "pulsed heating requires a positive frequency",
            });
        }
        if !(pulse_duration.is_finite() && pulse_duration > 0.0) {
            return Err(SimError::Config {
                what: "pulsed heating requires a positive pulse duration",
            });
        }
        if pulse_count == 0 {
            return Err(SimError::Config {
                what: "pulsed heating requires at least one pulse",
            });
        }
        if pulse_duration >= 1.0 / frequency {
            return Err(SimError::Config {
                what: "pulse duration must be shorter than the period",
            });
        }
        Ok(Self {
            frequency,
            pulse_duration,
            pulse_count,
        })
    }

    pub fn from_quantities(
        frequency: Frequency,
        pulse_duration: Time,
        pulse_count: usize,
    ) -> SimResult<Self> {
        Self::new(hertz_of(frequency), seconds_of(pulse_duration), pulse_count)
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn pulse_duration(&self) -> f64 {
        self.pulse_duration
    }

    pub fn pulse_count(&self) -> usize {
        self.pulse_count
    }

    pub fn period(&self) -> f64 {
        1.0 / self.frequency
    }

    /// Start of pulse `j`.
    fn pulse_start(&self, j: usize) -> f64 {
        j as f64 / self.frequency
    }

    /// End of pulse `j`, which is also the start of the pause after it.
    fn pulse_end(&self, j: usize) -> f64 {
        self.pulse_start(j) + self.pulse_duration
    }

    /// Time at which the last pause ends: `pulse_count / frequency`.
    pub fn total_duration(&self) -> f64 {
        self.pulse_start(self.pulse_count)
    }
}

/// A constant-power interval of a schedule.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Phase {
    pub index: usize,
    pub power: f64,
    pub start: f64,
    pub end: f64,
}

/// Laser power as a function of time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PowerSchedule {
    /// Constant power over the whole span.
    Continuous { power: f64, span: TimeSpan },
    /// `power` while a pulse is active, zero in between.
    Pulsed { power: f64, train: PulseTrain },
}

impl PowerSchedule {
    pub fn continuous(power: f64, span: TimeSpan) -> SimResult<Self> {
        ensure_finite(power, "laser power")?;
        Ok(Self::Continuous { power, span })
    }

    pub fn pulsed(power: f64, train: PulseTrain) -> SimResult<Self> {
        ensure_finite(power, "laser power")?;
        Ok(Self::Pulsed { power, train })
    }

    /// Continuous schedule from a unit-checked power.
    pub fn continuous_from_quantity(power: Power, span: TimeSpan) -> SimResult<Self> {
        Self::continuous(watts_of(power), span)
    }

    /// Pulsed schedule from a unit-checked power.
    pub fn pulsed_from_quantity(power: Power, train: PulseTrain) -> SimResult<Self> {
        Self::pulsed(watts_of(power), train)
    }

    pub fn start(&self) -> f64 {
        match self {
            Self::Continuous { span, .. } => span.start,
            Self::Pulsed { .. } => 0.0,
        }
    }

    pub fn end(&self) -> f64 {
        match self {
            Self::Continuous { span, .. } => span.end,
            Self::Pulsed { train, .. } => train.total_duration(),
        }
    }

    /// Expand into phases that tile `[start, end]` without gaps or overlaps.
    ///
    /// Adjacent phases share the same floating point boundary value.
    pub fn phases(&self) -> Vec<Phase> {
        match *self {
            Self::Continuous { power, span } => vec![Phase {
                index: 0,
                power,
                start: span.start,
                end: span.end,
            }],
            Self::Pulsed { power, train } => {
                let mut phases = Vec::with_capacity(2 * train.pulse_count);
                for j in 0..train.pulse_count {
                    let on_start = train.pulse_start(j);
                    let on_end = train.pulse_end(j);
                    phases.push(Phase {
                        index: 2 * j,
                        power,
                        start: on_start,
                        end: on_end,
                    });
                    phases.push(Phase {
                        index: 2 * j + 1,
                        power: 0.0,
                        start: on_end,
                        end: train.pulse_start(j + 1),
                    });
                }
                phases
            }
        }
    }
}

/// Heating mode selector for configuration input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatingMode {
    #[default]
    Continuous,
    Pulsed,
}

/// Loosely specified schedule, e.g. from a configuration file.
///
/// Fields not needed by the selected mode are ignored; fields it needs must
/// be present and non-zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub mode: HeatingMode,
    pub power: f64,
    pub t_range: Option<[f64; 2]>,
    pub frequency: Option<f64>,
    pub pulse_duration: Option<f64>,
    pub pulse_count: Option<usize>,
}

impl ScheduleConfig {
    pub fn build(&self) -> SimResult<PowerSchedule> {
        match self.mode {
            HeatingMode::Continuous => {
                let [start, end] = self.t_range.ok_or(SimError::Config {
                    what: "t_range is required for continuous heating",
                })?;
                PowerSchedule::continuous(self.power, TimeSpan::new(start, end)?)
            }
            HeatingMode::Pulsed => {
                let (Some(f), Some(t_p), Some(n)) =
                    (self.frequency, self.pulse_duration, self.pulse_count)
                else {
                    return Err(SimError::Config {
                        what: "frequency, pulse_duration and pulse_count are required for pulsed heating",
                    });
                };
                PowerSchedule::pulsed(self.power, PulseTrain::new(f, t_p, n)?)
            }
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn pulsed_phases_cover_total_duration(
            frequency in 1e-3_f64..10.0,
            duty in 0.01_f64..0.99,
            pulse_count in 1_usize..50,
        ) {
            let train = PulseTrain::new(frequency, duty / frequency, pulse_count).unwrap();
            let phases = PowerSchedule::pulsed(1.0, train).unwrap().phases();
            prop_assert_eq!(phases.len(), 2 * pulse_count);
            prop_assert_eq!(phases[0].start, 0.0);
            prop_assert_eq!(phases.last().unwrap().end, pulse_count as f64 / frequency);
            for pair in phases.windows(2) {
                prop_assert_eq!(pair[0].end, pair[1].start);
                prop_assert!(pair[0].end > pair[0].start);
            }
        }
    }
}

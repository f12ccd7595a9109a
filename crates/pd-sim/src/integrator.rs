//! Time integrators for a single constant-power phase.
//!
//! The default is a linearly-implicit Rosenbrock 2(3) pair (the Shampine &
//! Reichelt `ode23s` scheme): L-stable, one Jacobian and one 2x2 LU per step,
//! with an embedded third-order error estimate driving the step size. The
//! fixed-step RK4 is kept for non-stiff parameter sets and as a reference.

use std::f64::consts::SQRT_2;

use nalgebra::{Matrix2, Vector2};
use pd_core::{ensure_positive, linspace};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SimError, SimResult};
use crate::jacobian::time_derivative;
use crate::model::{ThermalModel, ThermalState};

/// Time points and states produced by integrating one phase.
///
/// Always starts with the initial state at the phase start and ends exactly
/// at the phase end.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trajectory {
    pub t: Vec<f64>,
    pub x: Vec<ThermalState>,
}

impl Trajectory {
    fn starting_at(t: f64, x: ThermalState) -> Self {
        Self {
            t: vec![t],
            x: vec![x],
        }
    }

    fn push(&mut self, t: f64, x: ThermalState) {
        self.t.push(t);
        self.x.push(x);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// State at the last sampled instant.
    pub fn terminal(&self) -> Option<ThermalState> {
        self.x.last().copied()
    }
}

/// Where output samples are taken within a phase.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sampling {
    /// Every accepted solver step, with the step capped at `span / min_samples`.
    Adaptive { min_samples: usize },
    /// `points` equally spaced instants (endpoints included).
    Uniform { points: usize },
}

impl Default for Sampling {
    fn default() -> Self {
        Self::Adaptive { min_samples: 100 }
    }
}

/// Output instants after the start, largest permitted step, and whether every
/// step is recorded.
struct OutputPlan {
    targets: Vec<f64>,
    h_max: f64,
    record_steps: bool,
}

impl Sampling {
    fn plan(&self, start: f64, end: f64) -> SimResult<OutputPlan> {
        let span = end - start;
        match *self {
            Sampling::Adaptive { min_samples } => {
                if min_samples == 0 {
                    return Err(SimError::InvalidArg {
                        what: "min_samples must be positive",
                    });
                }
                Ok(OutputPlan {
                    targets: vec![end],
                    h_max: span / min_samples as f64,
                    record_steps: true,
                })
            }
            Sampling::Uniform { points } => {
                if points < 2 {
                    return Err(SimError::InvalidArg {
                        what: "uniform sampling needs at least two points",
                    });
                }
                Ok(OutputPlan {
                    targets: linspace(start, end, points).split_off(1),
                    h_max: span,
                    record_steps: false,
                })
            }
        }
    }
}

/// Error control for the adaptive integrator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepControl {
    /// Relative error tolerance per step
    pub rel_tol: f64,
    /// Absolute error tolerance per step (K)
    pub abs_tol: f64,
    /// First trial step; estimated from the initial slope when absent
    pub initial_step: Option<f64>,
    /// Smallest step before the integration is declared failed
    pub min_step: f64,
    /// Maximum number of step attempts per phase (safety limit)
    pub max_steps: usize,
}

impl Default for StepControl {
    fn default() -> Self {
        Self {
            rel_tol: 1e-6,
            abs_tol: 1e-8,
            initial_step: None,
            min_step: 1e-12,
            max_steps: 1_000_000,
        }
    }
}

impl StepControl {
    fn validate(&self) -> SimResult<()> {
        if !(self.rel_tol > 0.0 && self.abs_tol > 0.0) {
            return Err(SimError::InvalidArg {
                what: "tolerances must be positive",
            });
        }
        if !(self.min_step > 0.0) {
            return Err(SimError::InvalidArg {
                what: "min_step must be positive",
            });
        }
        if self.max_steps == 0 {
            return Err(SimError::InvalidArg {
                what: "max_steps must be positive",
            });
        }
        Ok(())
    }

    /// Weighted max-norm of a local error estimate; accept when `<= 1`.
    fn error_norm(&self, err: &Vector2<f64>, y: &Vector2<f64>, y_new: &Vector2<f64>) -> f64 {
        (0..2)
            .map(|i| {
                let scale = (self.rel_tol * y[i].abs().max(y_new[i].abs())).max(self.abs_tol);
                err[i].abs() / scale
            })
            .fold(0.0, f64::max)
    }
}

/// Trait for time integrators over one constant-power phase.
pub trait Integrator {
    fn integrate<M: ThermalModel + ?Sized>(
        &self,
        model: &M,
        power: f64,
        initial: ThermalState,
        start: f64,
        end: f64,
        sampling: &Sampling,
    ) -> SimResult<Trajectory>;
}

fn rhs<M: ThermalModel + ?Sized>(model: &M, t: f64, y: &Vector2<f64>, power: f64) -> Vector2<f64> {
    model
        .derivative(&ThermalState::from_vector(y), t, power)
        .to_vector()
}

/// Rosenbrock 2(3) integrator with adaptive step size.
#[derive(Clone, Debug, Default)]
pub struct Rosenbrock23 {
    pub control: StepControl,
}

/// Outcome of one attempted Rosenbrock step.
struct StepAttempt {
    y_new: Vector2<f64>,
    f_new: Vector2<f64>,
    error: f64,
}

impl Rosenbrock23 {
    pub fn new(control: StepControl) -> Self {
        Self { control }
    }

    fn attempt<M: ThermalModel + ?Sized>(
        &self,
        model: &M,
        power: f64,
        t: f64,
        y: &Vector2<f64>,
        f0: &Vector2<f64>,
        h: f64,
    ) -> Option<StepAttempt> {
        let d = 1.0 / (2.0 + SQRT_2);
        let e32 = 6.0 + SQRT_2;

        let jac = model.jacobian(&ThermalState::from_vector(y), t, power);
        let dfdt = time_derivative(t, f0, |tt| rhs(model, tt, y, power), 1e-7);
        let lu = (Matrix2::identity() - jac * (h * d)).lu();

        let k1 = lu.solve(&(f0 + dfdt * (h * d)))?;
        let f1 = rhs(model, t + 0.5 * h, &(y + k1 * (0.5 * h)), power);
        let k2 = lu.solve(&(f1 - k1))? + k1;
        let y_new = y + k2 * h;
        let f_new = rhs(model, t + h, &y_new, power);
        let k3 = lu.solve(&(f_new - (k2 - f1) * e32 - (k1 - f0) * 2.0 + dfdt * (h * d)))?;

        let err = (k1 - k2 * 2.0 + k3) * (h / 6.0);
        if !(y_new.iter().all(|v| v.is_finite()) && err.iter().all(|v| v.is_finite())) {
            return None;
        }
        Some(StepAttempt {
            error: self.control.error_norm(&err, y, &y_new),
            y_new,
            f_new,
        })
    }

    fn initial_step(&self, y: &Vector2<f64>, f0: &Vector2<f64>, h_max: f64) -> f64 {
        if let Some(h) = self.control.initial_step {
            return h.min(h_max);
        }
        let threshold = self.control.abs_tol / self.control.rel_tol;
        let rate = (0..2)
            .map(|i| f0[i].abs() / y[i].abs().max(threshold))
            .fold(0.0, f64::max)
            / (0.8 * self.control.rel_tol.cbrt());
        if h_max * rate > 1.0 {
            1.0 / rate
        } else {
            h_max
        }
    }
}

impl Integrator for Rosenbrock23 {
    fn integrate<M: ThermalModel + ?Sized>(
        &self,
        model: &M,
        power: f64,
        initial: ThermalState,
        start: f64,
        end: f64,
        sampling: &Sampling,
    ) -> SimResult<Trajectory> {
        self.control.validate()?;
        if !initial.is_finite() {
            return Err(SimError::NonFinite { t: start });
        }
        let plan = sampling.plan(start, end)?;

        let mut traj = Trajectory::starting_at(start, initial);
        let mut t = start;
        let mut y = initial.to_vector();
        let mut f0 = rhs(model, t, &y, power);
        if !f0.iter().all(|v| v.is_finite()) {
            return Err(SimError::NonFinite { t });
        }
        let mut h = self.initial_step(&y, &f0, plan.h_max);
        let mut attempts = 0_usize;
        let mut rejected = 0_usize;

        for &target in &plan.targets {
            while t < target {
                if attempts >= self.control.max_steps {
                    return Err(SimError::MaxStepsExceeded { t, steps: attempts });
                }
                attempts += 1;

                let h_min = self.control.min_step.max(16.0 * f64::EPSILON * t.abs());
                let mut h_try = h.min(plan.h_max);
                // Stretch onto the target rather than leaving a sliver behind.
                let last = t + h_try >= target - h_min;
                if last {
                    h_try = target - t;
                }

                match self.attempt(model, power, t, &y, &f0, h_try) {
                    Some(step) if step.error <= 1.0 => {
                        t = if last { target } else { t + h_try };
                        y = step.y_new;
                        f0 = step.f_new;
                        if plan.record_steps || last {
                            traj.push(t, ThermalState::from_vector(&y));
                        }
                        let grow = if step.error == 0.0 {
                            5.0
                        } else {
                            (0.8 * step.error.powf(-1.0 / 3.0)).clamp(0.2, 5.0)
                        };
                        if !last {
                            h = h_try * grow;
                        }
                    }
                    outcome => {
                        rejected += 1;
                        let shrink = match &outcome {
                            Some(step) => (0.8 * step.error.powf(-1.0 / 3.0)).clamp(0.1, 0.5),
                            None => 0.1,
                        };
                        h = h_try * shrink;
                        if h < h_min {
                            return Err(match outcome {
                                None => SimError::NonFinite { t },
                                Some(_) => SimError::StepSizeUnderflow { t, h },
                            });
                        }
                    }
                }
            }
        }

        debug!(
            model = model.name(),
            power,
            start,
            end,
            attempts,
            rejected,
            samples = traj.len(),
            "phase integrated"
        );
        Ok(traj)
    }
}

/// Classical RK4 (Runge-Kutta 4th order) with a fixed step.
#[derive(Clone, Debug)]
pub struct Rk4 {
    pub dt: f64,
}

impl Rk4 {
    fn step<M: ThermalModel + ?Sized>(
        model: &M,
        power: f64,
        t: f64,
        y: &Vector2<f64>,
        dt: f64,
    ) -> Vector2<f64> {
        let k1 = rhs(model, t, y, power);
        let k2 = rhs(model, t + 0.5 * dt, &(y + k1 * (0.5 * dt)), power);
        let k3 = rhs(model, t + 0.5 * dt, &(y + k2 * (0.5 * dt)), power);
        let k4 = rhs(model, t + dt, &(y + k3 * dt), power);

        // x_new = x + (dt/6) * (k1 + 2*k2 + 2*k3 + k4)
        y + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)
    }
}

impl Integrator for Rk4 {
    fn integrate<M: ThermalModel + ?Sized>(
        &self,
        model: &M,
        power: f64,
        initial: ThermalState,
        start: f64,
        end: f64,
        sampling: &Sampling,
    ) -> SimResult<Trajectory> {
        ensure_positive(self.dt, "rk4 step")?;
        let plan = sampling.plan(start, end)?;
        let dt_max = self.dt.min(plan.h_max);

        let mut traj = Trajectory::starting_at(start, initial);
        let mut t = start;
        let mut y = initial.to_vector();

        for &target in &plan.targets {
            let n = ((target - t) / dt_max).ceil().max(1.0) as usize;
            let dt = (target - t) / n as f64;
            let t0 = t;
            for i in 1..=n {
                y = Self::step(model, power, t, &y, dt);
                t = if i == n { target } else { t0 + i as f64 * dt };
                if !y.iter().all(|v| v.is_finite()) {
                    return Err(SimError::NonFinite { t });
                }
                if plan.record_steps || i == n {
                    traj.push(t, ThermalState::from_vector(&y));
                }
            }
        }

        Ok(traj)
    }
}

/// Integrator selection for simulation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum IntegratorType {
    /// Adaptive Rosenbrock 2(3) (default, suited to stiff coefficients).
    Rosenbrock23(StepControl),
    /// Fixed-step 4th-order Runge-Kutta.
    Rk4 { dt: f64 },
}

impl Default for IntegratorType {
    fn default() -> Self {
        Self::Rosenbrock23(StepControl::default())
    }
}

impl Integrator for IntegratorType {
    fn integrate<M: ThermalModel + ?Sized>(
        &self,
        model: &M,
        power: f64,
        initial: ThermalState,
        start: f64,
        end: f64,
        sampling: &Sampling,
    ) -> SimResult<Trajectory> {
        match *self {
            IntegratorType::Rosenbrock23(control) => {
                Rosenbrock23::new(control).integrate(model, power, initial, start, end, sampling)
            }
            IntegratorType::Rk4 { dt } => {
                Rk4 { dt }.integrate(model, power, initial, start, end, sampling)
            }
        }
    }
}

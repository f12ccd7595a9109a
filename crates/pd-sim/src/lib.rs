//! Transient source/substrate temperature simulation for laser-heated deposition.
//!
//! Provides:
//! - Pluggable thermal models (radiative, evaporative, conductive)
//! - Continuous and pulsed power schedules with exact phase tiling
//! - Adaptive Rosenbrock 2(3) integrator for stiff systems, plus fixed-step RK4
//! - Arrhenius growth law and forward-Euler thickness accumulation

pub mod error;
pub mod growth;
pub mod integrator;
pub mod jacobian;
pub mod model;
pub mod physics;
pub mod schedule;
pub mod simulator;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use growth::{GrowthLaw, GrowthRecord, compute_thickness};
pub use integrator::{
    Integrator, IntegratorType, Rk4, Rosenbrock23, Sampling, StepControl, Trajectory,
};
pub use model::{ThermalModel, ThermalState};
pub use physics::{ConductiveModel, EvaporativeModel, ModelKind, RadiativeModel};
pub use schedule::{HeatingMode, Phase, PowerSchedule, PulseTrain, ScheduleConfig, TimeSpan};
pub use simulator::{PhaseRecord, SimOptions, SimulationResult, TemperatureSimulator};

//! Integration test: continuous laser heating of a cold source.
//!
//! Checks the sampled trajectory contract (time grid, equal lengths), the
//! thickness integral, and agreement between the adaptive and fixed-step
//! integrators.

use pd_core::{Tolerances, nearly_equal};
use pd_sim::{
    ConductiveModel, EvaporativeModel, IntegratorType, ModelKind, RadiativeModel, SimError,
    SimOptions, TemperatureSimulator, ThermalModel, ThermalState, TimeSpan,
};

fn cold_start() -> ThermalState {
    ThermalState::new(1e-14, 0.0)
}

#[test]
fn continuous_time_grid_spans_requested_range() {
    let sim = TemperatureSimulator::new(RadiativeModel::default(), SimOptions::default());
    let span = TimeSpan::new(0.0, 100.0).unwrap();
    let result = sim.simulate_continuous(100.0, cold_start(), span).unwrap();

    assert_eq!(result.time[0], 0.0);
    assert_eq!(*result.time.last().unwrap(), 100.0);
    assert!(result.time.windows(2).all(|w| w[1] > w[0]));

    let n = result.len();
    assert!(n > 100);
    assert_eq!(result.source_temperature.len(), n);
    assert_eq!(result.substrate_temperature.len(), n);
    assert_eq!(result.power.len(), n);
    assert_eq!(result.thickness.len(), n);
    assert_eq!(result.growth_rate.len(), n);
    assert!(result.power.iter().all(|&p| p == 100.0));
    assert_eq!(result.phases.len(), 1);
}

#[test]
fn constant_power_heats_monotonically_and_grows_layer() {
    let sim = TemperatureSimulator::new(RadiativeModel::default(), SimOptions::default());
    let span = TimeSpan::new(0.0, 100.0).unwrap();
    let result = sim.simulate_continuous(500.0, cold_start(), span).unwrap();

    assert!(result.source_temperature.windows(2).all(|w| w[1] >= w[0]));
    assert!(result.growth_rate.iter().all(|&g| g >= 0.0));
    assert!(result.thickness.windows(2).all(|w| w[1] >= w[0]));
    assert_eq!(result.thickness[0], 0.0);
    assert!(result.final_thickness().unwrap() > 0.0);
    assert!(result.peak_substrate_temperature().unwrap() > 0.0);
}

#[test]
fn initial_thickness_seeds_the_integral() {
    let options = SimOptions {
        initial_thickness: 12.5,
        ..SimOptions::default()
    };
    let sim = TemperatureSimulator::new(RadiativeModel::default(), options);
    let span = TimeSpan::new(0.0, 10.0).unwrap();
    let result = sim.simulate_continuous(100.0, cold_start(), span).unwrap();

    assert_eq!(result.thickness[0], 12.5);
    assert!(result.final_thickness().unwrap() >= 12.5);
}

#[test]
fn rosenbrock_agrees_with_fine_rk4() {
    let span = TimeSpan::new(0.0, 50.0).unwrap();
    let initial = ThermalState::new(400.0, 300.0);

    let adaptive = TemperatureSimulator::new(RadiativeModel::default(), SimOptions::default())
        .simulate_continuous(800.0, initial, span)
        .unwrap();
    let reference = TemperatureSimulator::new(
        RadiativeModel::default(),
        SimOptions {
            integrator: IntegratorType::Rk4 { dt: 1e-3 },
            ..SimOptions::default()
        },
    )
    .simulate_continuous(800.0, initial, span)
    .unwrap();

    let a = adaptive.state_at(adaptive.len() - 1).unwrap();
    let r = reference.state_at(reference.len() - 1).unwrap();
    let tol = Tolerances { abs: 0.0, rel: 1e-3 };
    assert!(nearly_equal(a.source, r.source, tol));
    assert!(nearly_equal(a.substrate, r.substrate, tol));
}

#[test]
fn every_model_variant_runs_through_the_same_simulator() {
    let span = TimeSpan::new(0.0, 20.0).unwrap();
    let initial = ThermalState::new(300.0, 300.0);
    let models = [
        ModelKind::Radiative(RadiativeModel::default()),
        ModelKind::Evaporative(EvaporativeModel::default()),
        ModelKind::Conductive(ConductiveModel::default()),
    ];

    let mut finals = Vec::new();
    for model in models {
        let sim = TemperatureSimulator::new(model, SimOptions::default());
        let result = sim.simulate_continuous(1000.0, initial, span).unwrap();
        assert!(result.time.windows(2).all(|w| w[1] > w[0]));
        finals.push(result.state_at(result.len() - 1).unwrap().source);
    }

    // Extra loss channels can only cool the source relative to radiation alone.
    assert!(finals[1] <= finals[0]);
    assert!(finals[2] <= finals[0]);
}

/// Source obeys dT/dt = T², which diverges at t = 1 from T = 1.
struct Runaway;

impl ThermalModel for Runaway {
    fn name(&self) -> &str {
        "runaway"
    }

    fn derivative(&self, state: &ThermalState, _t: f64, _power: f64) -> ThermalState {
        ThermalState::new(state.source * state.source, 0.0)
    }
}

#[test]
fn runaway_heating_surfaces_an_error() {
    let sim = TemperatureSimulator::new(Runaway, SimOptions::default());
    let span = TimeSpan::new(0.0, 2.0).unwrap();
    let result = sim.simulate_continuous(0.0, ThermalState::new(1.0, 0.0), span);
    match result {
        Err(SimError::NonFinite { t }) => assert!(t > 0.9 && t < 1.0 + 1e-3, "t = {t}"),
        other => panic!("expected a non-finite error, got {other:?}"),
    }
}

use std::sync::Mutex;

use nalgebra::Matrix2;
use pd_sim::{GrowthLaw, SimOptions, ThermalModel, ThermalState};
use pd_solver::{NotFoundReason, RootFindResult, RootFinder};
use pd_sweep::{Execution, MatchTarget, SweepAxis, SweepEngine, SweepError, SweepPlan};

/// Source relaxes towards `300 + P` with a 1 s time constant; the substrate
/// follows the source at half that rate.
struct Relaxation;

impl ThermalModel for Relaxation {
    fn name(&self) -> &str {
        "relaxation"
    }

    fn derivative(&self, state: &ThermalState, _t: f64, power: f64) -> ThermalState {
        ThermalState::new(
            power - (state.source - 300.0),
            0.5 * (state.source - state.substrate),
        )
    }

    fn jacobian(&self, _state: &ThermalState, _t: f64, _power: f64) -> Matrix2<f64> {
        Matrix2::new(-1.0, 0.0, 0.5, -0.5)
    }
}

const REFERENCE_DURATION: f64 = 30.0;
const PULSE_DURATIONS: [f64; 2] = [2.0, 5.0];
// Growth rate stays below 1, so a rate of 1.0 can never be matched.
const RATES: [f64; 3] = [0.05, 0.1, 1.0];

fn engine(execution: Execution) -> SweepEngine<Relaxation> {
    let options = SimOptions {
        growth: GrowthLaw::new(1.0, 2000.0),
        ..SimOptions::default()
    };
    let target = MatchTarget {
        initial: ThermalState::new(300.0, 300.0),
        frequency: 0.1,
        pulse_count: 3,
        reference_duration: REFERENCE_DURATION,
        power_upper_bound: 2e4,
    };
    SweepEngine::new(Relaxation, options, RootFinder::default(), target)
        .unwrap()
        .with_execution(execution)
}

#[test]
fn maps_have_duration_by_rate_shape() {
    let maps = engine(Execution::Parallel)
        .run(&PULSE_DURATIONS, &RATES)
        .unwrap();
    assert_eq!(maps.shape(), (2, 3));
    assert_eq!(maps.power_map().shape(), (2, 3));
    assert_eq!(maps.thickness_map().shape(), (2, 3));
    assert_eq!(maps.temperature_map().shape(), (2, 3));
    assert_eq!(maps.pulse_durations(), &PULSE_DURATIONS);
    assert_eq!(maps.rates(), &RATES);
}

#[test]
fn solved_cells_match_reference_thickness() {
    let maps = engine(Execution::Parallel)
        .run(&PULSE_DURATIONS, &RATES)
        .unwrap();
    let thickness = maps.thickness_map();
    let power = maps.power_map();
    for i in 0..PULSE_DURATIONS.len() {
        for j in 0..2 {
            let target = RATES[j] * REFERENCE_DURATION;
            assert!(
                (thickness[(i, j)] - target).abs() / target < 1e-2,
                "cell ({i}, {j}): thickness {} vs target {target}",
                thickness[(i, j)]
            );
            assert!(power[(i, j)] > 0.0 && power[(i, j)] < 2e4);
        }
    }
    // Shorter pulses need more power for the same layer.
    assert!(power[(0, 1)] > power[(1, 1)]);
}

#[test]
fn unreachable_rate_is_nan_without_aborting() {
    let maps = engine(Execution::Parallel)
        .run(&PULSE_DURATIONS, &RATES)
        .unwrap();
    assert_eq!(maps.unsolved_cells(), vec![(0, 2), (1, 2)]);
    for i in 0..2 {
        assert!(maps.power_map()[(i, 2)].is_nan());
        assert!(maps.thickness_map()[(i, 2)].is_nan());
        assert!(maps.temperature_map()[(i, 2)].is_nan());
        assert_eq!(
            maps.cell(i, 2).unwrap().power,
            RootFindResult::NotFound(NotFoundReason::NoSignChange)
        );
    }
}

#[test]
fn each_cell_equals_single_pair_computation() {
    let engine = engine(Execution::Parallel);
    let maps = engine.run(&PULSE_DURATIONS, &RATES).unwrap();
    for (i, &t_p) in PULSE_DURATIONS.iter().enumerate() {
        for (j, &rate) in RATES.iter().enumerate() {
            let single = engine.compute_cell(t_p, rate).unwrap();
            assert_eq!(maps.cell(i, j), Some(&single));
        }
    }
}

#[test]
fn sequential_and_parallel_agree() {
    let sequential = engine(Execution::Sequential)
        .run(&PULSE_DURATIONS, &RATES)
        .unwrap();
    let parallel = engine(Execution::Parallel)
        .run(&PULSE_DURATIONS, &RATES)
        .unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn progress_reports_every_cell() {
    let seen = Mutex::new(Vec::new());
    engine(Execution::Parallel)
        .run_with_progress(&PULSE_DURATIONS, &RATES[..2], |p| {
            seen.lock().unwrap().push(p)
        })
        .unwrap();
    let seen = seen.into_inner().unwrap();
    assert_eq!(seen.len(), 4);
    assert!(seen.iter().all(|p| p.total == 4 && p.solved));
    let mut completed: Vec<usize> = seen.iter().map(|p| p.completed).collect();
    completed.sort_unstable();
    assert_eq!(completed, vec![1, 2, 3, 4]);
    assert!(seen.iter().any(|p| p.is_finished()));
}

#[test]
fn plan_axes_drive_the_sweep() {
    let plan = SweepPlan {
        pulse_duration: SweepAxis::linear(2.0, 5.0, 2).unwrap(),
        rate: SweepAxis::logarithmic(0.05, 0.1, 2).unwrap(),
    };
    let maps = engine(Execution::Sequential).run_axes(&plan).unwrap();
    assert_eq!(maps.shape(), plan.shape());
    assert!(maps.unsolved_cells().is_empty());
}

#[test]
fn pulse_longer_than_period_is_rejected_up_front() {
    let result = engine(Execution::Sequential).run(&[12.0], &[0.1]);
    assert!(matches!(result, Err(SweepError::InvalidConfiguration(_))));
}

#[test]
fn empty_axes_give_empty_maps() {
    let maps = engine(Execution::Sequential).run(&[], &RATES).unwrap();
    assert_eq!(maps.shape(), (0, 3));
    assert!(maps.cells().is_empty());
}

//! Integration test: square-wave pulsed heating.
//!
//! Phases must tile the schedule exactly and hand their terminal state to the
//! next phase unchanged; repeated runs must be bit-identical.

use pd_sim::{
    RadiativeModel, Sampling, SimError, SimOptions, TemperatureSimulator, ThermalState,
};

const POWER: f64 = 2000.0;
const FREQUENCY: f64 = 0.1;
const PULSE_DURATION: f64 = 2.0;
const PULSE_COUNT: usize = 5;

fn simulator() -> TemperatureSimulator<RadiativeModel> {
    TemperatureSimulator::new(RadiativeModel::default(), SimOptions::default())
}

fn warm_start() -> ThermalState {
    ThermalState::new(300.0, 300.0)
}

#[test]
fn phase_boundaries_are_continuous() {
    let result = simulator()
        .simulate_pulsed(POWER, warm_start(), FREQUENCY, PULSE_DURATION, PULSE_COUNT)
        .unwrap();

    assert_eq!(result.phases.len(), 2 * PULSE_COUNT);
    assert_eq!(result.phases[0].initial, warm_start());

    for pair in result.phases.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        assert_eq!(prev.phase.end, next.phase.start);
        assert_eq!(
            prev.terminal.source.to_bits(),
            next.initial.source.to_bits()
        );
        assert_eq!(
            prev.terminal.substrate.to_bits(),
            next.initial.substrate.to_bits()
        );
        assert_eq!(prev.last_sample, next.first_sample);
        assert_eq!(result.state_at(prev.last_sample).unwrap(), prev.terminal);
        assert_eq!(result.time[prev.last_sample], prev.phase.end);
    }
}

#[test]
fn total_duration_is_pulse_count_over_frequency() {
    let result = simulator()
        .simulate_pulsed(POWER, warm_start(), FREQUENCY, PULSE_DURATION, PULSE_COUNT)
        .unwrap();

    assert_eq!(result.time[0], 0.0);
    assert_eq!(*result.time.last().unwrap(), PULSE_COUNT as f64 / FREQUENCY);
    assert!(result.time.windows(2).all(|w| w[1] > w[0]));
}

#[test]
fn laser_on_phases_heat_and_pauses_cool() {
    let result = simulator()
        .simulate_pulsed(POWER, warm_start(), FREQUENCY, PULSE_DURATION, PULSE_COUNT)
        .unwrap();

    for record in &result.phases {
        if record.phase.index % 2 == 0 {
            assert_eq!(record.phase.power, POWER);
            assert!(record.terminal.source > record.initial.source);
        } else {
            assert_eq!(record.phase.power, 0.0);
            assert!(record.terminal.source < record.initial.source);
        }
        // Interior samples carry the power of their own phase.
        for i in record.first_sample + 1..record.last_sample {
            assert_eq!(result.power[i], record.phase.power);
        }
    }
}

#[test]
fn repeated_runs_are_identical() {
    let sim = simulator();
    let first = sim
        .simulate_pulsed(POWER, warm_start(), FREQUENCY, PULSE_DURATION, PULSE_COUNT)
        .unwrap();
    let second = sim
        .simulate_pulsed(POWER, warm_start(), FREQUENCY, PULSE_DURATION, PULSE_COUNT)
        .unwrap();

    assert_eq!(first, second);
}

#[test]
fn uniform_sampling_emits_boundary_sample_once() {
    let options = SimOptions {
        sampling: Sampling::Uniform { points: 50 },
        ..SimOptions::default()
    };
    let sim = TemperatureSimulator::new(RadiativeModel::default(), options);
    let result = sim
        .simulate_pulsed(POWER, warm_start(), FREQUENCY, PULSE_DURATION, PULSE_COUNT)
        .unwrap();

    // 50 points per phase, shared boundaries counted once.
    assert_eq!(result.len(), 2 * PULSE_COUNT * 49 + 1);
    assert!(result.thickness.windows(2).all(|w| w[1] >= w[0]));
}

#[test]
fn missing_pulse_parameters_fail_only_that_call() {
    let sim = simulator();
    for (f, t_p, n) in [(0.0, 2.0, 5), (0.1, 0.0, 5), (0.1, 2.0, 0)] {
        let err = sim.simulate_pulsed(POWER, warm_start(), f, t_p, n).unwrap_err();
        assert!(matches!(err, SimError::Config { .. }), "{err}");
    }

    // The simulator stays usable afterwards.
    assert!(
        sim.simulate_pulsed(POWER, warm_start(), FREQUENCY, PULSE_DURATION, 1)
            .is_ok()
    );
}

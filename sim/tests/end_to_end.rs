//! End-to-end runs: simulate, filter and solve whole scenarios.

use approx::assert_abs_diff_eq;
use sensor_models::compass;
use sim::{
    config::{NoiseConfig, PlatformConfig, RawPlatformInput, RawSimulationInput, SimulationConfig},
    platform::Maneuver,
    runner::{refilter, run_seeded},
    scenarios::{Scenario, ScenarioKind},
};
use tma_core::solution::{closest_approach, Tcpa};

fn course_error(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[test]
fn converging_scenario_recovers_course_speed_and_cpa() {
    let s = Scenario::build(ScenarioKind::Converging, 42);
    let run = run_seeded(&s.config, s.seed).unwrap();
    let sol = run.solution.expect("solution");

    assert_abs_diff_eq!(sol.target_course, 225.0, epsilon = 0.5);
    assert_abs_diff_eq!(sol.target_speed, 8.0, epsilon = 0.05);
    assert!(sol.tcpa.is_finite());
    assert!(sol.cpa < 14_142.0);
    assert!(sol.cpa >= 0.0);
    assert_eq!(run.track.len(), run.samples.len());
    assert_eq!(run.track.skipped.total(), 0);
}

#[test]
fn crossing_cpa_matches_true_geometry() {
    let s = Scenario::build(ScenarioKind::Crossing, 0);
    let run = run_seeded(&s.config, s.seed).unwrap();
    let last = run.samples.last().unwrap();

    // Final truth: observer (0, 1200) northbound, contact (3800, -2000) westbound
    assert_abs_diff_eq!(last.observer.y, 1200.0, epsilon = 1e-6);
    assert_abs_diff_eq!(last.contact.x, 3800.0, epsilon = 1e-6);

    let (ovx, ovy) = compass::velocity(10.0, 0.0);
    let (cvx, cvy) = compass::velocity(10.0, 270.0);
    let (cpa, tcpa) = closest_approach(
        nalgebra::Vector2::new(last.contact.x - last.observer.x, last.contact.y - last.observer.y),
        nalgebra::Vector2::new(cvx - ovx, cvy - ovy),
    );
    assert_abs_diff_eq!(tcpa.seconds(), 30.0, epsilon = 1e-6);
    assert_abs_diff_eq!(cpa, 4949.747, epsilon = 1e-2);

    let sol = run.solution.unwrap();
    assert_abs_diff_eq!(sol.tcpa.seconds(), 30.0, epsilon = 0.5);
    assert_abs_diff_eq!(sol.cpa, cpa, epsilon = 5.0);
    assert_abs_diff_eq!(sol.target_course, 270.0, epsilon = 0.5);
}

#[test]
fn co_moving_contact_has_infinite_tcpa() {
    let s = Scenario::build(ScenarioKind::CoMoving, 0);
    let run = run_seeded(&s.config, s.seed).unwrap();
    let sol = run.solution.unwrap();
    assert_eq!(sol.tcpa, Tcpa::Infinite);
    assert_eq!(sol.tcpa.to_string(), "infinite");
    assert_abs_diff_eq!(sol.cpa, 1000.0, epsilon = 1.0);
}

#[test]
fn contact_reverts_to_base_course_after_maneuver() {
    let s = Scenario::build(ScenarioKind::ContactManeuver, 0);
    let run = run_seeded(&s.config, s.seed).unwrap();

    // Inside the ramp the true course is interpolated
    let mid = run.samples.iter().find(|r| r.time == 345.0).unwrap();
    assert_abs_diff_eq!(mid.contact_course, 245.0, epsilon = 1e-9);
    // After it, back to the base course
    assert_abs_diff_eq!(run.samples.last().unwrap().contact_course, 200.0, epsilon = 1e-9);

    let sol = run.solution.unwrap();
    assert!(course_error(sol.target_course, 200.0) < 1.0, "{sol}");
    assert_abs_diff_eq!(sol.target_speed, 6.0, epsilon = 0.1);
}

#[test]
fn own_ship_leg_change_still_solves() {
    let s = Scenario::build(ScenarioKind::OwnShipLegChange, 42);
    let run = run_seeded(&s.config, s.seed).unwrap();
    let last = run.samples.last().unwrap();
    assert_abs_diff_eq!(last.observer_course, 0.0, epsilon = 1e-9);
    let during = run.samples.iter().find(|r| r.time == 315.0).unwrap();
    assert_abs_diff_eq!(during.observer_course, 45.0, epsilon = 1e-9);

    let sol = run.solution.unwrap();
    assert!(course_error(sol.target_course, 250.0) < 15.0, "{sol}");
    assert!((sol.target_speed - 7.0).abs() < 2.0, "{sol}");
}

#[test]
fn cpa_uses_observer_base_course_while_turning() {
    // Observer ramps 0° → 180° at 1°/s from t = 0; still turning at the last sample
    let config = SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 5.0, 0.0),
        contact: PlatformConfig::new(4000.0, 3000.0, 6.0, 250.0),
        rate: 1.0,
        duration: 100.0,
        noise: NoiseConfig::none(),
        observer_maneuver: Some(Maneuver::new(0.0, 0.0, 180.0, 1.0)),
        ..SimulationConfig::default()
    };
    let run = run_seeded(&config, 0).unwrap();
    let last = run.samples.last().unwrap();
    assert_abs_diff_eq!(last.observer_course, 100.0, epsilon = 1e-9);

    let rel_pos = nalgebra::Vector2::new(
        last.contact.x - last.observer.x,
        last.contact.y - last.observer.y,
    );
    let (cvx, cvy) = compass::velocity(6.0, 250.0);
    let relative_to = |course: f64| {
        let (ovx, ovy) = compass::velocity(5.0, course);
        closest_approach(rel_pos, nalgebra::Vector2::new(cvx - ovx, cvy - ovy))
    };
    let (cpa, tcpa) = relative_to(0.0);
    let (turning_cpa, _) = relative_to(last.observer_course);
    assert!((cpa - turning_cpa).abs() > 100.0);

    let sol = run.solution.unwrap();
    assert_abs_diff_eq!(sol.cpa, cpa, epsilon = 1e-3);
    assert_abs_diff_eq!(sol.tcpa.seconds(), tcpa.seconds(), epsilon = 1e-3);
}

#[test]
fn bearing_through_north_does_not_disturb_filter() {
    // Contact passes due north of a stationary observer at t = 200
    let config = SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 0.0, 0.0),
        contact: PlatformConfig::new(-2000.0, 5000.0, 10.0, 90.0),
        rate: 1.0,
        duration: 400.0,
        noise: NoiseConfig::none(),
        ..SimulationConfig::default()
    };
    let run = run_seeded(&config, 0).unwrap();
    let bearings: Vec<f64> = run.samples.iter().map(|r| r.bearing).collect();
    assert!(bearings.iter().any(|b| *b > 350.0));
    assert!(bearings.iter().any(|b| *b < 10.0));
    assert_eq!(run.track.skipped.total(), 0);

    for est in &run.track.estimates {
        assert!(course_error(est.course, 90.0) < 0.5, "t = {}: {}", est.time, est.course);
    }

    let noisy = SimulationConfig {
        noise: NoiseConfig::default_with_sensor(20.0, 1.0),
        ..config
    };
    for seed in 1..=5 {
        let sol = run_seeded(&noisy, seed).unwrap().solution.unwrap();
        assert!(course_error(sol.target_course, 90.0) < 20.0, "seed {seed}: {sol}");
        assert!((sol.target_speed - 10.0).abs() < 3.0, "seed {seed}: {sol}");
    }
}

#[test]
fn contact_course_near_north_wraps() {
    let config = SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 4.0, 90.0),
        contact: PlatformConfig::new(3000.0, -6000.0, 9.0, 359.5),
        rate: 2.0,
        duration: 300.0,
        noise: NoiseConfig::none(),
        ..SimulationConfig::default()
    };
    let sol = run_seeded(&config, 0).unwrap().solution.unwrap();
    assert!((0.0..360.0).contains(&sol.target_course));
    assert!(course_error(sol.target_course, 359.5) < 0.5, "{sol}");
}

#[test]
fn degenerate_geometry_is_skipped_not_fatal() {
    // Contact runs straight through a stationary observer at t = 5
    let config = SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 0.0, 0.0),
        contact: PlatformConfig::new(0.0, -50.0, 10.0, 0.0),
        rate: 1.0,
        duration: 20.0,
        noise: NoiseConfig::none(),
        ..SimulationConfig::default()
    };
    let run = run_seeded(&config, 0).unwrap();
    assert!(run.track.skipped.degenerate_geometry >= 1);
    assert_eq!(run.samples.len(), 21);
    let sol = run.solution.unwrap();
    assert!(sol.target_speed.is_finite());
    assert!(course_error(sol.target_course, 0.0) < 1.0, "{sol}");

    // Coincident, motionless platforms: every update skipped, state untouched
    let config = SimulationConfig {
        contact: PlatformConfig::new(0.0, 0.0, 0.0, 0.0),
        ..config
    };
    let run = run_seeded(&config, 0).unwrap();
    assert_eq!(run.track.applied_updates, 0);
    assert_eq!(run.track.skipped.degenerate_geometry as usize, run.samples.len());
    let sol = run.solution.unwrap();
    assert_eq!(sol.tcpa, Tcpa::Infinite);
    assert_eq!(sol.cpa, 0.0);
}

#[test]
fn noisy_runs_stay_within_bounds() {
    let s = Scenario::build(ScenarioKind::Noisy, 0);
    for seed in 0..20 {
        let run = run_seeded(&s.config, seed).unwrap();
        let sol = run.solution.unwrap();
        assert!(course_error(sol.target_course, 225.0) < 20.0, "seed {seed}: {sol}");
        assert!((sol.target_speed - 8.0).abs() < 3.0, "seed {seed}: {sol}");
        assert!(run.metrics.final_pos_err < 400.0, "seed {seed}");
        for r in &run.samples {
            assert!(r.range >= 0.0);
            assert!((0.0..360.0).contains(&r.bearing));
        }
    }
}

#[test]
fn same_seed_same_run_different_seed_different_noise() {
    let s = Scenario::build(ScenarioKind::Noisy, 0);
    let a = run_seeded(&s.config, 5).unwrap();
    let b = run_seeded(&s.config, 5).unwrap();
    let c = run_seeded(&s.config, 6).unwrap();
    assert_eq!(a.samples, b.samples);
    assert_eq!(a.track.estimates, b.track.estimates);
    assert_eq!(a.solution, b.solution);
    assert_ne!(a.samples[3].range, c.samples[3].range);
}

#[test]
fn refilter_reproduces_a_noisy_run() {
    let s = Scenario::build(ScenarioKind::Noisy, 0);
    let run = run_seeded(&s.config, 77).unwrap();
    let again = refilter(&run.config, run.samples.clone()).unwrap();
    assert_eq!(again.track.estimates, run.track.estimates);
    assert_eq!(again.solution, run.solution);
    assert_eq!(again.metrics.n_matched, run.metrics.n_matched);
}

#[test]
fn form_input_drives_a_run() {
    let raw = RawSimulationInput {
        observer: RawPlatformInput {
            x: "0".into(),
            y: "".into(),
            speed: "5".into(),
            course: "0".into(),
        },
        contact: RawPlatformInput {
            x: "10000".into(),
            y: "10000m".into(),
            speed: "8".into(),
            course: "225".into(),
        },
        rate: "10".into(),
        duration: "600".into(),
        speed_std: "0".into(),
        course_std: "0".into(),
        ..RawSimulationInput::default()
    };
    let config = raw.to_config();
    assert_eq!(config.contact.y, 10_000.0);
    let sol = run_seeded(&config, 1).unwrap().solution.unwrap();
    assert_abs_diff_eq!(sol.target_course, 225.0, epsilon = 0.5);
}

#[test]
fn config_file_round_trip() {
    let config = Scenario::build(ScenarioKind::ContactManeuver, 0).config;
    let path = std::env::temp_dir().join(format!("tma_config_{}.json", std::process::id()));
    config.save(&path).unwrap();
    let loaded = SimulationConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();
    assert_eq!(loaded, config);
}

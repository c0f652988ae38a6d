//! Monte-Carlo batches: many independently seeded runs in parallel.
//!
//! Each run owns its RNG, filter and buffers, so runs share nothing and the
//! batch result does not depend on thread scheduling.

use crate::{
    config::SimulationConfig,
    runner::{self, RunError, SimulationRun},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Aggregate solution error over a batch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Runs that produced a solution
    pub runs: usize,
    /// Runs that aborted or produced no solution
    pub failures: usize,
    /// Course error against the contact's final true course (degrees)
    pub mean_course_error: f64,
    pub max_course_error: f64,
    pub mean_speed_error: f64,
    pub max_speed_error: f64,
    pub mean_position_rmse: f64,
}

/// Execute one run per seed in parallel; results keep seed order.
pub fn run_many(config: &SimulationConfig, seeds: &[u64]) -> Vec<Result<SimulationRun, RunError>> {
    seeds
        .par_iter()
        .map(|&seed| runner::run_seeded(config, seed))
        .collect()
}

/// Absolute course difference folded into [0, 180].
fn course_error(estimated: f64, truth: f64) -> f64 {
    let d = (estimated - truth).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Run the batch and summarise solution accuracy.
pub fn run_batch(config: &SimulationConfig, seeds: &[u64]) -> BatchSummary {
    let results = run_many(config, seeds);
    let mut summary = BatchSummary::default();
    let (mut course_sum, mut speed_sum, mut rmse_sum) = (0.0, 0.0, 0.0);

    for (seed, result) in seeds.iter().zip(&results) {
        let run = match result {
            Ok(run) => run,
            Err(e) => {
                warn!(seed, error = %e, "run aborted");
                summary.failures += 1;
                continue;
            }
        };
        let (Some(solution), Some(last)) = (run.solution, run.samples.last()) else {
            summary.failures += 1;
            continue;
        };
        let ce = course_error(solution.target_course, last.contact_course);
        let se = (solution.target_speed - last.contact_speed).abs();
        course_sum += ce;
        speed_sum += se;
        rmse_sum += run.metrics.rmse_position();
        summary.max_course_error = summary.max_course_error.max(ce);
        summary.max_speed_error = summary.max_speed_error.max(se);
        summary.runs += 1;
    }

    if summary.runs > 0 {
        let n = summary.runs as f64;
        summary.mean_course_error = course_sum / n;
        summary.mean_speed_error = speed_sum / n;
        summary.mean_position_rmse = rmse_sum / n;
    }
    info!(
        runs = summary.runs,
        failures = summary.failures,
        mean_course_error = summary.mean_course_error,
        mean_speed_error = summary.mean_speed_error,
        "batch complete"
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{Scenario, ScenarioKind};
    use approx::assert_abs_diff_eq;

    #[test]
    fn course_error_wraps() {
        assert_abs_diff_eq!(course_error(359.0, 1.0), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(course_error(1.0, 359.0), 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(course_error(90.0, 270.0), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn parallel_runs_match_sequential_runs() {
        let config = Scenario::build(ScenarioKind::Noisy, 0).config;
        let seeds: Vec<u64> = (0..8).collect();
        let parallel = run_many(&config, &seeds);
        for (seed, par) in seeds.iter().zip(parallel) {
            let seq = runner::run_seeded(&config, *seed).unwrap();
            let par = par.unwrap();
            assert_eq!(par.samples, seq.samples);
            assert_eq!(par.track.estimates, seq.track.estimates);
        }
    }

    #[test]
    fn noisy_batch_stays_bounded() {
        let config = Scenario::build(ScenarioKind::Noisy, 0).config;
        let seeds: Vec<u64> = (100..132).collect();
        let summary = run_batch(&config, &seeds);
        assert_eq!(summary.runs, 32);
        assert_eq!(summary.failures, 0);
        assert!(summary.max_course_error < 20.0, "{summary:?}");
        assert!(summary.max_speed_error < 3.0, "{summary:?}");
        assert!(summary.mean_course_error < summary.max_course_error + 1e-12);
    }
}

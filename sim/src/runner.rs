//! Run orchestration: simulate, observe, filter, solve.
//!
//! One run is strictly sequential. For each sample time t_k = k·rate:
//! 1. Resolve both platforms' courses at t_k and advance them (k > 0)
//! 2. Draw a noisy range/bearing sample
//! 3. Predict the filter by `rate` and update with the sample
//! 4. Record the estimate and accumulate error metrics
//!
//! The final estimate becomes the TMA solution.

use crate::{
    config::{SimulationConfig, MAX_SAMPLES},
    sensor_sim::SensorSimulator,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sensor_models::compass;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tma_core::{
    error::FilterError, metrics::EstimationMetrics, pipeline::Pipeline, solution::TmaSolution,
    track::Track, types::StateVec,
};
use tracing::{debug, info};

pub use crate::sensor_sim::SampleRecord;

/// Fatal failure of a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("filter failed at t = {time} s: {source}")]
    Filter {
        time: f64,
        #[source]
        source: FilterError,
    },
    #[error("no samples to filter")]
    NoSamples,
    #[error("duration {duration} s at rate {rate} s exceeds {max} samples")]
    TooManySamples { duration: f64, rate: f64, max: usize },
}

/// Everything a run produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimulationRun {
    /// The sanitized configuration actually simulated
    pub config: SimulationConfig,
    pub samples: Vec<SampleRecord>,
    pub track: Track,
    /// `None` when no finite estimate was produced
    pub solution: Option<TmaSolution>,
    pub metrics: EstimationMetrics,
}

/// Filter side of a run, shared by live runs and replays.
struct Estimator {
    pipeline: Pipeline,
    metrics: EstimationMetrics,
    rate: f64,
    /// Observer's own velocity for CPA/TCPA, from its base course and speed
    observer_velocity: (f64, f64),
}

impl Estimator {
    fn new(config: &SimulationConfig) -> Result<Self, RunError> {
        let (vx, vy) = compass::velocity(config.contact.speed, config.contact.course);
        let initial = StateVec::new(config.contact.x, config.contact.y, vx, vy);
        let pipeline = Pipeline::new(
            config.filter.clone(),
            initial,
            &config.noise.sensor_params(),
        )
        .map_err(|source| RunError::Filter { time: 0.0, source })?;
        Ok(Self {
            pipeline,
            metrics: EstimationMetrics::default(),
            rate: config.rate,
            observer_velocity: compass::velocity(config.observer.speed, config.observer.course),
        })
    }

    fn step(&mut self, sample: &SampleRecord) -> Result<(), RunError> {
        let out = self
            .pipeline
            .process(&sample.observation(), self.rate)
            .map_err(|source| RunError::Filter {
                time: sample.time,
                source,
            })?;
        if let Some(est) = &out.estimate {
            self.metrics.accumulate(est, &sample.ground_truth());
        }
        Ok(())
    }

    fn finish(self, last: &SampleRecord) -> (Track, Option<TmaSolution>, EstimationMetrics) {
        let solution = self.pipeline.solve(last.observer, self.observer_velocity);
        (self.pipeline.into_track(), solution, self.metrics)
    }
}

/// Run one simulation drawing noise from `rng`.
pub fn run_simulation<R: Rng + ?Sized>(
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<SimulationRun, RunError> {
    let config = config.clone().sanitized();
    let n = config.sample_count().ok_or(RunError::TooManySamples {
        duration: config.duration,
        rate: config.rate,
        max: MAX_SAMPLES,
    })?;
    info!(
        samples = n,
        rate = config.rate,
        duration = config.duration,
        "starting simulation"
    );

    let mut observer = config.observer_platform();
    let mut contact = config.contact_platform();
    let mut sensor = SensorSimulator::new(config.noise, rng);
    let mut estimator = Estimator::new(&config)?;
    let mut samples = Vec::with_capacity(n);

    for k in 0..n {
        let t = config.sample_time(k);
        if k > 0 {
            observer.step(t, config.rate);
            contact.step(t, config.rate);
        }
        let sample = sensor.observe(t, &observer, &contact);
        estimator.step(&sample)?;
        samples.push(sample);
    }

    let last = samples.last().ok_or(RunError::NoSamples)?;
    let (track, solution, metrics) = estimator.finish(last);
    finish_log(&track, solution.as_ref(), &metrics);

    Ok(SimulationRun {
        config,
        samples,
        track,
        solution,
        metrics,
    })
}

/// Run one simulation with a fresh `ChaCha8Rng` seeded from `seed`.
pub fn run_seeded(config: &SimulationConfig, seed: u64) -> Result<SimulationRun, RunError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    run_simulation(config, &mut rng)
}

/// Re-run the estimator over recorded samples.
///
/// With the same config this reproduces the original run exactly: the
/// filter only ever sees the recorded observations.
pub fn refilter(
    config: &SimulationConfig,
    samples: Vec<SampleRecord>,
) -> Result<SimulationRun, RunError> {
    let config = config.clone().sanitized();
    let mut estimator = Estimator::new(&config)?;
    for sample in &samples {
        estimator.step(sample)?;
    }
    let last = samples.last().ok_or(RunError::NoSamples)?;
    let (track, solution, metrics) = estimator.finish(last);
    finish_log(&track, solution.as_ref(), &metrics);

    Ok(SimulationRun {
        config,
        samples,
        track,
        solution,
        metrics,
    })
}

fn finish_log(track: &Track, solution: Option<&TmaSolution>, metrics: &EstimationMetrics) {
    debug!(
        applied = track.applied_updates,
        skipped = track.skipped.total(),
        dropped = track.dropped_estimates,
        rmse_pos = metrics.rmse_position(),
        "filter finished"
    );
    match solution {
        Some(s) => info!(solution = %s, "simulation complete"),
        None => info!("simulation complete, no solution"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{NoiseConfig, PlatformConfig};
    use approx::assert_abs_diff_eq;
    use tma_core::types::Position;

    fn converging() -> SimulationConfig {
        SimulationConfig {
            observer: PlatformConfig::new(0.0, 0.0, 5.0, 0.0),
            contact: PlatformConfig::new(10_000.0, 10_000.0, 8.0, 225.0),
            rate: 10.0,
            duration: 600.0,
            noise: NoiseConfig::none(),
            ..SimulationConfig::default()
        }
    }

    #[test]
    fn samples_follow_index_times() {
        let run = run_seeded(&converging(), 1).unwrap();
        assert_eq!(run.samples.len(), 61);
        assert_eq!(run.samples[0].time, 0.0);
        assert_eq!(run.samples[60].time, 600.0);
        // Platforms have not moved at t = 0
        assert_eq!(run.samples[0].observer, Position::new(0.0, 0.0));
        assert_abs_diff_eq!(run.samples[1].observer.y, 50.0, epsilon = 1e-9);
        assert_eq!(run.track.len(), 61);
    }

    #[test]
    fn converging_run_recovers_contact_motion() {
        let run = run_seeded(&converging(), 1).unwrap();
        let sol = run.solution.unwrap();
        assert_abs_diff_eq!(sol.target_course, 225.0, epsilon = 0.5);
        assert_abs_diff_eq!(sol.target_speed, 8.0, epsilon = 0.05);
        assert!(sol.tcpa.is_finite());
        assert_abs_diff_eq!(sol.cpa, 4144.16, epsilon = 5.0);
        assert_abs_diff_eq!(sol.tcpa.seconds(), 520.69, epsilon = 2.0);
        assert!(run.metrics.final_pos_err < 1.0);
    }

    #[test]
    fn refilter_reproduces_estimates() {
        let mut cfg = converging();
        cfg.noise = NoiseConfig::default_with_sensor(20.0, 1.0);
        let run = run_seeded(&cfg, 42).unwrap();
        let replayed = refilter(&run.config, run.samples.clone()).unwrap();
        assert_eq!(replayed.track.estimates, run.track.estimates);
        assert_eq!(replayed.solution, run.solution);
    }

    #[test]
    fn oversized_run_is_rejected_before_simulating() {
        let cfg = SimulationConfig {
            rate: 1e-300,
            duration: 1e300,
            ..converging()
        };
        assert!(matches!(
            run_seeded(&cfg, 0),
            Err(RunError::TooManySamples { .. })
        ));
    }

    #[test]
    fn refilter_needs_samples() {
        assert!(matches!(
            refilter(&converging(), Vec::new()),
            Err(RunError::NoSamples)
        ));
    }
}

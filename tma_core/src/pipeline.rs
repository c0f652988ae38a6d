//! Pipeline orchestrator: the estimation cycle for one observation.
//!
//! # Processing steps per observation
//! 1. Predict the contact state forward by the sample interval
//! 2. EKF update with [range, bearing] from the observer position
//! 3. Record skip reasons for updates that were not applied
//! 4. Derive a display record from the estimate (dropped if non-finite)
//!
//! After the last observation, [`Pipeline::solve`] turns the final estimate
//! into a [`TmaSolution`].

use crate::{
    ekf::{ExtendedKalmanFilter, UpdateOutcome},
    error::FilterResult,
    kf::{POSITION_PROCESS_NOISE, VELOCITY_PROCESS_NOISE},
    solution::{self, TmaSolution},
    track::{EstimateRecord, Track},
    types::{all_finite, Observation, Position, StateCov, StateVec},
};
use sensor_models::SensorParams;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Diagonal of the initial covariance P₀ [px, py, vx, vy]
    pub initial_cov_diag: [f64; 4],
    /// Diagonal of the process noise Q [px, py, vx, vy]
    pub process_noise_diag: [f64; 4],
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            initial_cov_diag: [100.0, 100.0, 10.0, 10.0],
            process_noise_diag: [
                POSITION_PROCESS_NOISE,
                POSITION_PROCESS_NOISE,
                VELOCITY_PROCESS_NOISE,
                VELOCITY_PROCESS_NOISE,
            ],
        }
    }
}

impl FilterConfig {
    pub fn initial_cov(&self) -> StateCov {
        StateCov::from_diagonal(&StateVec::from(self.initial_cov_diag))
    }

    pub fn process_noise(&self) -> StateCov {
        StateCov::from_diagonal(&StateVec::from(self.process_noise_diag))
    }
}

/// Outputs of one pipeline step.
#[derive(Clone, Debug)]
pub struct StepOutput {
    pub outcome: UpdateOutcome,
    /// Filter state after the step, finite or not
    pub state: [f64; 4],
    /// Display record; `None` when the state was unusable
    pub estimate: Option<EstimateRecord>,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// One estimator run. Owns its filter and track; build a new one per run.
pub struct Pipeline {
    pub config: FilterConfig,
    ekf: ExtendedKalmanFilter,
    track: Track,
}

impl Pipeline {
    /// Create a pipeline seeded with an initial contact estimate.
    pub fn new(
        config: FilterConfig,
        initial_state: StateVec,
        sensor: &SensorParams,
    ) -> FilterResult<Self> {
        let ekf = ExtendedKalmanFilter::new(
            initial_state,
            config.initial_cov(),
            config.process_noise(),
            sensor.noise_cov(),
        )?;
        Ok(Self {
            config,
            ekf,
            track: Track::default(),
        })
    }

    /// Run predict(`dt`) then update for one observation.
    ///
    /// Fatal filter errors propagate; skipped updates are recorded and the
    /// step still succeeds.
    pub fn process(&mut self, obs: &Observation, dt: f64) -> FilterResult<StepOutput> {
        self.ekf.predict(dt)?;
        let outcome = self.ekf.update(obs.measurement(), obs.observer)?;

        match &outcome {
            UpdateOutcome::Applied(res) => {
                self.track.applied_updates += 1;
                debug!(
                    t = obs.time,
                    nu_range = res.innovation[0],
                    nu_bearing_deg = res.innovation[1].to_degrees(),
                    regularized = res.regularized,
                    "update applied"
                );
            }
            UpdateOutcome::Skipped(reason) => {
                self.track.skipped.record(reason);
                warn!(t = obs.time, %reason, "update skipped, keeping predicted state");
            }
        }

        let state = self.ekf.state();
        let estimate = EstimateRecord::from_state(obs.time, self.ekf.state_vec(), obs.observer);
        match estimate {
            Some(rec) => self.track.estimates.push(rec),
            None => {
                self.track.dropped_estimates += 1;
                warn!(t = obs.time, "dropping non-finite estimate");
            }
        }

        Ok(StepOutput {
            outcome,
            state,
            estimate,
        })
    }

    /// Derive the TMA solution from the current estimate.
    ///
    /// `None` until at least one finite estimate exists, or if the final
    /// state is not finite.
    pub fn solve(&self, observer: Position, observer_velocity: (f64, f64)) -> Option<TmaSolution> {
        if self.track.is_empty() || !all_finite(self.ekf.state_vec()) {
            return None;
        }
        Some(solution::solve(
            self.ekf.state_vec(),
            observer,
            observer_velocity,
        ))
    }

    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn into_track(self) -> Track {
        self.track
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

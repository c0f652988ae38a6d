//! Estimation metrics: RMSE of the filtered track against ground truth.

use crate::track::EstimateRecord;
use serde::{Deserialize, Serialize};

/// Ground-truth contact state at one sample.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GroundTruth {
    pub time: f64,
    /// True state [px, py, vx, vy]
    pub state: [f64; 4],
}

/// Accumulated metric statistics.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EstimationMetrics {
    /// Number of (estimate, truth) pairs evaluated
    pub n_matched: u64,
    /// Sum of squared position errors (for RMSE)
    pub sum_sq_pos_err: f64,
    /// Sum of squared velocity errors (for RMSE)
    pub sum_sq_vel_err: f64,
    /// Position error of the most recent pair
    pub final_pos_err: f64,
    /// Velocity error of the most recent pair
    pub final_vel_err: f64,
}

impl EstimationMetrics {
    /// Root-mean-square position error (meters).
    pub fn rmse_position(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_pos_err / self.n_matched as f64).sqrt()
    }

    /// Root-mean-square velocity error.
    pub fn rmse_velocity(&self) -> f64 {
        if self.n_matched == 0 {
            return 0.0;
        }
        (self.sum_sq_vel_err / self.n_matched as f64).sqrt()
    }

    /// Accumulate one estimate against the truth at the same sample.
    pub fn accumulate(&mut self, estimate: &EstimateRecord, truth: &GroundTruth) {
        let dx = estimate.x - truth.state[0];
        let dy = estimate.y - truth.state[1];
        let dvx = estimate.vx - truth.state[2];
        let dvy = estimate.vy - truth.state[3];
        let pos_sq = dx * dx + dy * dy;
        let vel_sq = dvx * dvx + dvy * dvy;
        self.sum_sq_pos_err += pos_sq;
        self.sum_sq_vel_err += vel_sq;
        self.final_pos_err = pos_sq.sqrt();
        self.final_vel_err = vel_sq.sqrt();
        self.n_matched += 1;
    }
}

//! Motion model and the linear prediction step.
//!
//! ## State vector
//! x = [px, py, vx, vy]ᵀ  (4-dimensional)
//!
//! ## CV Transition model
//! F = I₄ + dt * [[0₂ I₂]; [0₂ 0₂]]
//! i.e. px += vx*dt, py += vy*dt
//!
//! ## Process noise
//! Q is fixed for the run and added once per prediction regardless of dt.

use crate::types::{StateCov, StateVec};

/// Default position process noise (diagonal of Q).
pub const POSITION_PROCESS_NOISE: f64 = 1.0;

/// Default velocity process noise (diagonal of Q).
pub const VELOCITY_PROCESS_NOISE: f64 = 0.1;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Trait for a linear motion model used by the prediction step.
pub trait MotionModel {
    /// State transition matrix F for a step of `dt` seconds.
    fn transition_matrix(&self, dt: f64) -> StateCov;

    /// Process noise covariance Q for a step of `dt` seconds.
    fn process_noise(&self, dt: f64) -> StateCov;

    /// Predict state and covariance forward by `dt` seconds.
    /// x' = F·x,  P' = F·P·Fᵀ + Q
    fn predict(&self, state: &StateVec, cov: &StateCov, dt: f64) -> (StateVec, StateCov) {
        let f = self.transition_matrix(dt);
        let predicted_state = f * state;
        let predicted_cov = f * cov * f.transpose() + self.process_noise(dt);
        (predicted_state, predicted_cov)
    }
}

// ---------------------------------------------------------------------------
// Constant Velocity model
// ---------------------------------------------------------------------------

/// Constant-velocity model with a fixed process noise matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstantVelocity {
    pub q: StateCov,
}

impl Default for ConstantVelocity {
    fn default() -> Self {
        Self::new(default_process_noise())
    }
}

impl ConstantVelocity {
    pub fn new(q: StateCov) -> Self {
        Self { q }
    }
}

impl MotionModel for ConstantVelocity {
    fn transition_matrix(&self, dt: f64) -> StateCov {
        let mut f = StateCov::identity();
        // position += velocity * dt
        f[(0, 2)] = dt;
        f[(1, 3)] = dt;
        f
    }

    fn process_noise(&self, _dt: f64) -> StateCov {
        self.q
    }
}

/// Q = diag(1, 1, 0.1, 0.1)
pub fn default_process_noise() -> StateCov {
    StateCov::from_diagonal(&StateVec::new(
        POSITION_PROCESS_NOISE,
        POSITION_PROCESS_NOISE,
        VELOCITY_PROCESS_NOISE,
        VELOCITY_PROCESS_NOISE,
    ))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! `tma_core` — Target motion analysis from range/bearing observations.
//!
//! # Module layout
//! - [`types`]     — Fundamental types (state vectors, positions, observations)
//! - [`error`]     — Fatal filter errors
//! - [`kf`]        — Constant-velocity motion model (predict)
//! - [`ekf`]       — Range/bearing Extended Kalman Filter (predict / update)
//! - [`solution`]  — Target course/speed, CPA, TCPA
//! - [`track`]     — Filtered estimate series and update bookkeeping
//! - [`metrics`]   — RMSE against ground truth
//! - [`pipeline`]  — Per-observation estimation cycle for one run

pub mod ekf;
pub mod error;
pub mod kf;
pub mod metrics;
pub mod pipeline;
pub mod solution;
pub mod track;
pub mod types;

pub use ekf::{ExtendedKalmanFilter, SkipReason, UpdateOutcome};
pub use error::{FilterError, FilterResult};
pub use pipeline::{FilterConfig, Pipeline, StepOutput};
pub use solution::{Tcpa, TmaSolution};
pub use track::{EstimateRecord, Track};
pub use types::{Observation, Position, StateCov, StateVec};

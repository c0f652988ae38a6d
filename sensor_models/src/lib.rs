//! `sensor_models` — Range/bearing observation model, compass conventions, noise covariance.

pub mod compass;
pub mod observation;
pub mod sensor;

pub use observation::{MeasCov, MeasJacobian, MeasVec, ObservationModel, RangeBearing};
pub use sensor::SensorParams;

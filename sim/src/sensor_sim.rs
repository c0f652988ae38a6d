//! Sensor simulator: noisy range/bearing samples of the contact.
//!
//! Generates one sample per call with:
//! - Gaussian range and bearing noise (fed to the filter)
//! - Gaussian contact speed and course noise (display only)

use crate::{config::NoiseConfig, noise::gaussian, platform::Platform};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use sensor_models::compass;
use serde::{Deserialize, Serialize};
use tma_core::{
    metrics::GroundTruth,
    types::{Observation, Position},
};

/// Ground truth and noisy measurements at one sample time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    pub time: f64,
    pub observer: Position,
    /// Observer course steered at this sample (degrees, [0, 360))
    pub observer_course: f64,
    pub contact: Position,
    /// True contact course (degrees, [0, 360))
    pub contact_course: f64,
    /// True contact speed
    pub contact_speed: f64,
    pub true_range: f64,
    /// True bearing observer → contact (degrees, [0, 360))
    pub true_bearing: f64,
    /// Noisy range, clamped at 0
    pub range: f64,
    /// Noisy bearing (degrees, [0, 360))
    pub bearing: f64,
    /// Noisy contact speed (display only)
    pub contact_speed_noisy: f64,
    /// Noisy contact course (degrees, [0, 360), display only)
    pub contact_course_noisy: f64,
}

impl SampleRecord {
    /// The observation handed to the estimator.
    pub fn observation(&self) -> Observation {
        Observation {
            time: self.time,
            range: self.range,
            bearing: self.bearing,
            observer: self.observer,
        }
    }

    /// True contact state for metrics.
    pub fn ground_truth(&self) -> GroundTruth {
        let (vx, vy) = compass::velocity(self.contact_speed, self.contact_course);
        GroundTruth {
            time: self.time,
            state: [self.contact.x, self.contact.y, vx, vy],
        }
    }
}

/// Generates noisy samples of one contact seen from one observer.
pub struct SensorSimulator<R: Rng = ChaCha8Rng> {
    pub noise: NoiseConfig,
    rng: R,
}

impl SensorSimulator<ChaCha8Rng> {
    pub fn seeded(noise: NoiseConfig, seed: u64) -> Self {
        Self::new(noise, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: Rng> SensorSimulator<R> {
    pub fn new(noise: NoiseConfig, rng: R) -> Self {
        Self { noise, rng }
    }

    /// Sample the current geometry at time `t`. Every call draws fresh noise.
    pub fn observe(&mut self, t: f64, observer: &Platform, contact: &Platform) -> SampleRecord {
        let dx = contact.position.x - observer.position.x;
        let dy = contact.position.y - observer.position.y;
        let true_range = dx.hypot(dy);
        let true_bearing = compass::bearing_deg(dx, dy);
        let contact_course = contact.course_at(t);

        let range = (true_range + gaussian(&mut self.rng, self.noise.range_std)).max(0.0);
        let bearing = compass::normalize_degrees(
            true_bearing + gaussian(&mut self.rng, self.noise.bearing_std),
        );
        let contact_speed_noisy = contact.speed + gaussian(&mut self.rng, self.noise.speed_std);
        let contact_course_noisy = compass::normalize_degrees(
            contact_course + gaussian(&mut self.rng, self.noise.course_std),
        );

        SampleRecord {
            time: t,
            observer: observer.position,
            observer_course: compass::normalize_degrees(observer.course_at(t)),
            contact: contact.position,
            contact_course: compass::normalize_degrees(contact_course),
            contact_speed: contact.speed,
            true_range,
            true_bearing,
            range,
            bearing,
            contact_speed_noisy,
            contact_course_noisy,
        }
    }
}

//! Track: the filtered estimate series of one run plus update bookkeeping.

use crate::{
    ekf::SkipReason,
    types::{Position, StateVec},
};
use sensor_models::compass;
use serde::{Deserialize, Serialize};

/// Filtered estimate at one sample, with quantities derived for display.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EstimateRecord {
    pub time: f64,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    /// Range from the observer to the estimate
    pub range: f64,
    /// Compass bearing from the observer to the estimate (degrees)
    pub bearing: f64,
    pub speed: f64,
    /// Course over ground (degrees)
    pub course: f64,
}

impl EstimateRecord {
    /// Derive a record, or `None` if anything came out non-finite.
    pub fn from_state(time: f64, state: &StateVec, observer: Position) -> Option<Self> {
        let (x, y, vx, vy) = (state[0], state[1], state[2], state[3]);
        let (dx, dy) = (x - observer.x, y - observer.y);
        let record = Self {
            time,
            x,
            y,
            vx,
            vy,
            range: dx.hypot(dy),
            bearing: compass::bearing_deg(dx, dy),
            speed: vx.hypot(vy),
            course: compass::course_deg(vx, vy),
        };
        record.is_finite().then_some(record)
    }

    fn is_finite(&self) -> bool {
        [
            self.time,
            self.x,
            self.y,
            self.vx,
            self.vy,
            self.range,
            self.bearing,
            self.speed,
            self.course,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }
}

/// Count of skipped updates by reason.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipCounts {
    pub degenerate_geometry: u32,
    pub singular_innovation: u32,
    pub non_finite: u32,
}

impl SkipCounts {
    pub fn record(&mut self, reason: &SkipReason) {
        match reason {
            SkipReason::DegenerateGeometry { .. } => self.degenerate_geometry += 1,
            SkipReason::SingularInnovation { .. } => self.singular_innovation += 1,
            SkipReason::NonFinite { .. } => self.non_finite += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.degenerate_geometry + self.singular_innovation + self.non_finite
    }
}

/// The estimated contact track of one run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Track {
    /// Finite estimates in time order; gaps mark dropped samples
    pub estimates: Vec<EstimateRecord>,
    /// Number of updates folded into the state
    pub applied_updates: u32,
    pub skipped: SkipCounts,
    /// Samples whose estimate was non-finite and therefore dropped
    pub dropped_estimates: u32,
}

impl Track {
    pub fn latest(&self) -> Option<&EstimateRecord> {
        self.estimates.last()
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}

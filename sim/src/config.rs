//! Simulation configuration.
//!
//! [`SimulationConfig`] is the typed input of a run and the on-disk JSON
//! format. [`RawSimulationInput`] carries the free-text fields of an
//! interactive form and converts them leniently.

use crate::platform::{Maneuver, MotionProfile, Platform};
use anyhow::Context;
use sensor_models::SensorParams;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tma_core::{pipeline::FilterConfig, types::Position};

/// Sampling interval used when the configured rate is not positive (s).
pub const DEFAULT_RATE: f64 = 1.0;
/// Duration used when the configured duration is not positive (s).
pub const DEFAULT_DURATION: f64 = 60.0;
/// Upper bound on the number of samples in one run.
pub const MAX_SAMPLES: usize = 1_000_000;
pub const DEFAULT_SPEED_NOISE_STD: f64 = 0.5;
pub const DEFAULT_COURSE_NOISE_STD: f64 = 2.0;

/// Initial kinematics of one platform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub x: f64,
    pub y: f64,
    pub speed: f64,
    /// Compass course (degrees, 0 = +y, clockwise)
    pub course: f64,
}

impl PlatformConfig {
    pub fn new(x: f64, y: f64, speed: f64, course: f64) -> Self {
        Self { x, y, speed, course }
    }

    pub fn position(&self) -> Position {
        Position::new(self.x, self.y)
    }

    /// Build the simulated platform, optionally with a course ramp.
    pub fn platform(&self, maneuver: Option<Maneuver>) -> Platform {
        Platform::new(self.position(), self.speed, self.course)
            .with_motion(MotionProfile::from(maneuver))
    }
}

/// Standard deviations of the simulated sensor noise.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    pub range_std: f64,
    /// Degrees
    pub bearing_std: f64,
    pub speed_std: f64,
    /// Degrees
    pub course_std: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            range_std: 0.0,
            bearing_std: 0.0,
            speed_std: DEFAULT_SPEED_NOISE_STD,
            course_std: DEFAULT_COURSE_NOISE_STD,
        }
    }
}

impl NoiseConfig {
    /// Default display noise with the given range/bearing sensor noise.
    pub fn default_with_sensor(range_std: f64, bearing_std: f64) -> Self {
        Self {
            range_std,
            bearing_std,
            ..Self::default()
        }
    }

    /// Noise-free in every channel.
    pub fn none() -> Self {
        Self {
            range_std: 0.0,
            bearing_std: 0.0,
            speed_std: 0.0,
            course_std: 0.0,
        }
    }

    /// Sensor parameters the estimator derives R from.
    pub fn sensor_params(&self) -> SensorParams {
        SensorParams::new(self.range_std, self.bearing_std)
    }

    fn sanitized(self) -> Self {
        let clamp = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
        Self {
            range_std: clamp(self.range_std),
            bearing_std: clamp(self.bearing_std),
            speed_std: clamp(self.speed_std),
            course_std: clamp(self.course_std),
        }
    }
}

/// Complete input of one simulation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub observer: PlatformConfig,
    pub contact: PlatformConfig,
    /// Sampling interval (s)
    pub rate: f64,
    /// Total simulated time (s)
    pub duration: f64,
    pub noise: NoiseConfig,
    pub observer_maneuver: Option<Maneuver>,
    pub contact_maneuver: Option<Maneuver>,
    pub filter: FilterConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            observer: PlatformConfig::default(),
            contact: PlatformConfig::default(),
            rate: DEFAULT_RATE,
            duration: DEFAULT_DURATION,
            noise: NoiseConfig::default(),
            observer_maneuver: None,
            contact_maneuver: None,
            filter: FilterConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Apply the input coercions: non-positive rate/duration fall back to
    /// defaults, maneuver turn rates are forced positive, negative noise is 0.
    pub fn sanitized(mut self) -> Self {
        if !(self.rate.is_finite() && self.rate > 0.0) {
            self.rate = DEFAULT_RATE;
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            self.duration = DEFAULT_DURATION;
        }
        self.noise = self.noise.sanitized();
        self.observer_maneuver = self.observer_maneuver.map(Maneuver::sanitized);
        self.contact_maneuver = self.contact_maneuver.map(Maneuver::sanitized);
        self
    }

    /// Number of samples: t = 0, rate, 2·rate, … ≤ duration.
    ///
    /// `None` when the run would exceed [`MAX_SAMPLES`].
    pub fn sample_count(&self) -> Option<usize> {
        let steps = (self.duration / self.rate + 1e-9).floor();
        if !(steps.is_finite() && steps < MAX_SAMPLES as f64) {
            return None;
        }
        (steps as usize).checked_add(1).filter(|&n| n <= MAX_SAMPLES)
    }

    /// Time of sample `k`, computed from the index so it never drifts.
    pub fn sample_time(&self, k: usize) -> f64 {
        k as f64 * self.rate
    }

    pub fn observer_platform(&self) -> Platform {
        self.observer.platform(self.observer_maneuver)
    }

    pub fn contact_platform(&self) -> Platform {
        self.contact.platform(self.contact_maneuver)
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening config {}", path.display()))?;
        let config: SimulationConfig = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Free-text input
// ---------------------------------------------------------------------------

/// Parse a decimal number the way a permissive form field does: leading
/// whitespace is skipped, the longest numeric prefix is used, and blank,
/// unparseable or non-finite text yields 0.
pub fn parse_lenient(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    let mut best = None;
    // Candidate prefixes only grow on numeric characters; keep the last one that parses.
    while end < bytes.len() {
        let c = bytes[end] as char;
        if !(c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')) {
            break;
        }
        end += 1;
        if let Ok(v) = s[..end].parse::<f64>() {
            best = Some(v);
        }
    }
    match best {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Text fields for one platform.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPlatformInput {
    pub x: String,
    pub y: String,
    pub speed: String,
    pub course: String,
}

impl RawPlatformInput {
    fn parse(&self) -> PlatformConfig {
        PlatformConfig::new(
            parse_lenient(&self.x),
            parse_lenient(&self.y),
            parse_lenient(&self.speed),
            parse_lenient(&self.course),
        )
    }
}

/// Text fields for one maneuver plus its enable toggle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawManeuverInput {
    pub enabled: bool,
    pub start_time: String,
    pub start_course: String,
    pub end_course: String,
    pub rate_of_change: String,
}

impl RawManeuverInput {
    fn parse(&self) -> Option<Maneuver> {
        self.enabled.then(|| {
            Maneuver::new(
                parse_lenient(&self.start_time),
                parse_lenient(&self.start_course),
                parse_lenient(&self.end_course),
                parse_lenient(&self.rate_of_change),
            )
        })
    }
}

/// Every field of the interactive input form, as text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawSimulationInput {
    pub observer: RawPlatformInput,
    pub contact: RawPlatformInput,
    pub rate: String,
    pub duration: String,
    pub range_std: String,
    pub bearing_std: String,
    pub speed_std: String,
    pub course_std: String,
    pub observer_maneuver: RawManeuverInput,
    pub contact_maneuver: RawManeuverInput,
}

impl Default for RawSimulationInput {
    fn default() -> Self {
        Self {
            observer: RawPlatformInput::default(),
            contact: RawPlatformInput::default(),
            rate: String::new(),
            duration: String::new(),
            range_std: String::new(),
            bearing_std: String::new(),
            speed_std: DEFAULT_SPEED_NOISE_STD.to_string(),
            course_std: DEFAULT_COURSE_NOISE_STD.to_string(),
            observer_maneuver: RawManeuverInput::default(),
            contact_maneuver: RawManeuverInput::default(),
        }
    }
}

impl RawSimulationInput {
    /// Convert to a sanitized [`SimulationConfig`].
    pub fn to_config(&self) -> SimulationConfig {
        let or_default = |text: &str, default: f64| {
            if text.trim().is_empty() {
                default
            } else {
                parse_lenient(text)
            }
        };
        SimulationConfig {
            observer: self.observer.parse(),
            contact: self.contact.parse(),
            rate: parse_lenient(&self.rate),
            duration: parse_lenient(&self.duration),
            noise: NoiseConfig {
                range_std: parse_lenient(&self.range_std),
                bearing_std: parse_lenient(&self.bearing_std),
                speed_std: or_default(&self.speed_std, DEFAULT_SPEED_NOISE_STD),
                course_std: or_default(&self.course_std, DEFAULT_COURSE_NOISE_STD),
            },
            observer_maneuver: self.observer_maneuver.parse(),
            contact_maneuver: self.contact_maneuver.parse(),
            filter: FilterConfig::default(),
        }
        .sanitized()
    }
}

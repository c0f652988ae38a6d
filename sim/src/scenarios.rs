//! Scenario definitions.
//!
//! Each scenario is a named observer/contact geometry. All scenarios are
//! deterministic given the same seed.

use crate::{
    config::{NoiseConfig, PlatformConfig, SimulationConfig},
    platform::Maneuver,
};
use serde::{Deserialize, Serialize};

/// Which pre-defined scenario to load.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, clap::ValueEnum)]
pub enum ScenarioKind {
    /// Contact closing from the north-east on course 225, noise-free
    Converging,
    /// Contact crossing ahead from starboard at equal speed
    Crossing,
    /// Contact on the same course and speed; CPA never changes
    CoMoving,
    /// Contact turns 200° → 290° mid-run
    ContactManeuver,
    /// Observer turns 0° → 90° mid-run (classical leg change)
    OwnShipLegChange,
    /// Converging geometry with realistic sensor noise
    Noisy,
}

/// A fully configured simulation scenario.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub seed: u64,
    pub config: SimulationConfig,
}

impl Scenario {
    /// Build the named scenario. `seed` drives the noise draws of the run.
    pub fn build(kind: ScenarioKind, seed: u64) -> Self {
        let (name, config) = match kind {
            ScenarioKind::Converging => ("converging", converging()),
            ScenarioKind::Crossing => ("crossing", crossing()),
            ScenarioKind::CoMoving => ("co_moving", co_moving()),
            ScenarioKind::ContactManeuver => ("contact_maneuver", contact_maneuver()),
            ScenarioKind::OwnShipLegChange => ("own_ship_leg_change", own_ship_leg_change()),
            ScenarioKind::Noisy => ("noisy", noisy()),
        };
        Self {
            name: name.to_string(),
            seed,
            config,
        }
    }
}

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

fn crossing() -> SimulationConfig {
    SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 10.0, 0.0),
        contact: PlatformConfig::new(5000.0, -2000.0, 10.0, 270.0),
        rate: 1.0,
        duration: 120.0,
        noise: NoiseConfig::none(),
        ..SimulationConfig::default()
    }
}

fn co_moving() -> SimulationConfig {
    SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 10.0, 90.0),
        contact: PlatformConfig::new(0.0, 1000.0, 10.0, 90.0),
        rate: 1.0,
        duration: 120.0,
        noise: NoiseConfig::none(),
        ..SimulationConfig::default()
    }
}

fn contact_maneuver() -> SimulationConfig {
    SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 5.0, 0.0),
        contact: PlatformConfig::new(8000.0, 3000.0, 6.0, 200.0),
        rate: 5.0,
        duration: 900.0,
        noise: NoiseConfig::none(),
        contact_maneuver: Some(Maneuver::new(300.0, 200.0, 290.0, 1.0)),
        ..SimulationConfig::default()
    }
}

fn own_ship_leg_change() -> SimulationConfig {
    SimulationConfig {
        observer: PlatformConfig::new(0.0, 0.0, 5.0, 0.0),
        contact: PlatformConfig::new(8000.0, 6000.0, 7.0, 250.0),
        rate: 5.0,
        duration: 900.0,
        noise: NoiseConfig::default_with_sensor(10.0, 0.5),
        observer_maneuver: Some(Maneuver::new(300.0, 0.0, 90.0, 3.0)),
        ..SimulationConfig::default()
    }
}

fn noisy() -> SimulationConfig {
    SimulationConfig {
        noise: NoiseConfig::default_with_sensor(20.0, 1.0),
        ..converging()
    }
}

//! `sim` — Kinematic simulator: platforms, noisy range/bearing samples,
//! run orchestration, scenarios, replay and Monte-Carlo batches.

pub mod config;
pub mod monte_carlo;
pub mod noise;
pub mod platform;
pub mod replay;
pub mod runner;
pub mod scenarios;
pub mod sensor_sim;

pub use config::{NoiseConfig, PlatformConfig, RawSimulationInput, SimulationConfig};
pub use monte_carlo::{run_batch, BatchSummary};
pub use platform::{Maneuver, MotionProfile, Platform};
pub use replay::{load_replay, save_replay, ReplayLog};
pub use runner::{refilter, run_seeded, run_simulation, RunError, SimulationRun};
pub use scenarios::{Scenario, ScenarioKind};
pub use sensor_sim::{SampleRecord, SensorSimulator};

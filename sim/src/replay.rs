//! Replay: serialize/deserialize run logs for offline analysis.
//!
//! A log stores the configuration and every recorded sample, so the filter
//! can be re-run on the exact observations it originally saw.

use crate::{
    config::SimulationConfig,
    runner::{self, RunError, SampleRecord, SimulationRun},
};
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tma_core::{solution::TmaSolution, track::EstimateRecord};

/// A full recorded run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReplayLog {
    pub scenario_name: String,
    pub seed: u64,
    pub config: SimulationConfig,
    /// Every sample in chronological order
    pub samples: Vec<SampleRecord>,
    /// The filtered series as originally produced
    pub estimates: Vec<EstimateRecord>,
    pub solution: Option<TmaSolution>,
}

impl ReplayLog {
    pub fn from_run(scenario_name: impl Into<String>, seed: u64, run: &SimulationRun) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            seed,
            config: run.config.clone(),
            samples: run.samples.clone(),
            estimates: run.track.estimates.clone(),
            solution: run.solution,
        }
    }

    /// Re-run the filter over the recorded samples.
    pub fn replay(&self) -> Result<SimulationRun, RunError> {
        runner::refilter(&self.config, self.samples.clone())
    }

    /// True if a replayed run reproduced the recorded estimates and solution.
    pub fn matches(&self, run: &SimulationRun) -> bool {
        self.estimates == run.track.estimates && self.solution == run.solution
    }
}

/// Save a replay log to a JSON file.
pub fn save_replay(log: &ReplayLog, path: &Path) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, log)?;
    Ok(())
}

/// Load a replay log from a JSON file.
pub fn load_replay(path: &Path) -> anyhow::Result<ReplayLog> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);
    let log: ReplayLog = serde_json::from_reader(reader)?;
    Ok(log)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenarios::{Scenario, ScenarioKind};

    #[test]
    fn json_round_trip_replays_identically() {
        let scenario = Scenario::build(ScenarioKind::Noisy, 9);
        let run = runner::run_seeded(&scenario.config, scenario.seed).unwrap();
        let log = ReplayLog::from_run(&scenario.name, scenario.seed, &run);

        let path = std::env::temp_dir().join(format!("tma_replay_{}.json", std::process::id()));
        save_replay(&log, &path).unwrap();
        let loaded = load_replay(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.scenario_name, "noisy");
        assert_eq!(loaded.samples, log.samples);
        let replayed = loaded.replay().unwrap();
        assert!(loaded.matches(&replayed));
    }
}

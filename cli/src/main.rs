//! `tma` CLI: scenario runs, config-file runs, replay, Monte-Carlo batches.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sim::config::SimulationConfig;
use sim::monte_carlo;
use sim::replay::{load_replay, save_replay, ReplayLog};
use sim::runner::{self, SimulationRun};
use sim::scenarios::{Scenario, ScenarioKind};
use std::path::{Path, PathBuf};
use tma_core::solution::TmaSolution;

#[derive(Parser)]
#[command(name = "tma", about = "Target motion analysis simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a named scenario and print the TMA solution.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
        /// Also save the full replay log
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Run a simulation described by a JSON config file.
    Run {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        save_replay: Option<PathBuf>,
    },
    /// Re-filter a previously recorded log.
    Replay {
        /// Path to replay JSON file
        input: PathBuf,
        /// Output metrics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run many seeded copies of a scenario in parallel and summarise errors.
    MonteCarlo {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        #[arg(long, default_value_t = 100)]
        runs: u64,
        /// First seed; run i uses seed + i
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            output,
            save_replay: save_path,
        } => {
            let scenario = Scenario::build(scenario, seed);
            execute(
                &scenario.name,
                &scenario.config,
                seed,
                output.as_deref(),
                save_path.as_deref(),
            )?;
        }
        Commands::Run {
            config,
            seed,
            output,
            save_replay: save_path,
        } => {
            let cfg = SimulationConfig::load(&config)?;
            let name = config
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "config".to_string());
            execute(&name, &cfg, seed, output.as_deref(), save_path.as_deref())?;
        }
        Commands::Replay { input, output } => {
            run_replay(&input, output.as_deref())?;
        }
        Commands::MonteCarlo {
            scenario,
            runs,
            seed,
        } => {
            let scenario = Scenario::build(scenario, seed);
            let seeds: Vec<u64> = (0..runs).map(|i| seed.wrapping_add(i)).collect();
            println!(
                "Monte-Carlo '{}': {} runs from seed {}...",
                scenario.name, runs, seed
            );
            let start = std::time::Instant::now();
            let summary = monte_carlo::run_batch(&scenario.config, &seeds);
            println!("Done in {:.2}s", start.elapsed().as_secs_f64());
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}

fn execute(
    name: &str,
    config: &SimulationConfig,
    seed: u64,
    output_path: Option<&Path>,
    replay_path: Option<&Path>,
) -> Result<()> {
    println!("Running '{}' (seed={})...", name, seed);
    let start = std::time::Instant::now();
    let run = runner::run_seeded(config, seed).with_context(|| format!("running '{name}'"))?;
    let elapsed = start.elapsed();

    println!(
        "Done: {} samples, {} updates applied, {} skipped, elapsed={:.3}s",
        run.samples.len(),
        run.track.applied_updates,
        run.track.skipped.total(),
        elapsed.as_secs_f64(),
    );
    print_solution(run.solution.as_ref());

    if let Some(rpath) = replay_path {
        let log = ReplayLog::from_run(name, seed, &run);
        save_replay(&log, rpath)?;
        println!("Replay saved to {}", rpath.display());
    }

    if let Some(opath) = output_path {
        write_metrics(opath, name, seed, &run)?;
        println!("Metrics saved to {}", opath.display());
    }

    Ok(())
}

fn run_replay(input: &Path, output_path: Option<&Path>) -> Result<()> {
    let log = load_replay(input)?;
    println!(
        "Replaying '{}' ({} samples)...",
        log.scenario_name,
        log.samples.len()
    );

    let run = log.replay().context("re-filtering recorded samples")?;
    if log.matches(&run) {
        println!("Replay reproduces the recorded estimates");
    } else {
        println!("Replay DIFFERS from the recorded estimates");
    }
    print_solution(run.solution.as_ref());

    if let Some(opath) = output_path {
        write_metrics(opath, &log.scenario_name, log.seed, &run)?;
    }

    Ok(())
}

fn print_solution(solution: Option<&TmaSolution>) {
    match solution {
        Some(s) => {
            println!("Target course: {:.1}°", s.target_course);
            println!("Target speed:  {:.2}", s.target_speed);
            println!("CPA:           {:.1}", s.cpa);
            println!("TCPA:          {}", s.tcpa);
        }
        None => println!("No solution: the filter produced no usable estimate"),
    }
}

fn write_metrics(path: &Path, name: &str, seed: u64, run: &SimulationRun) -> Result<()> {
    let json = serde_json::json!({
        "scenario": name,
        "seed": seed,
        "samples": run.samples.len(),
        "applied_updates": run.track.applied_updates,
        "skipped": run.track.skipped,
        "dropped_estimates": run.track.dropped_estimates,
        "rmse_position": run.metrics.rmse_position(),
        "rmse_velocity": run.metrics.rmse_velocity(),
        "final_position_error": run.metrics.final_pos_err,
        "solution": run.solution,
    });
    std::fs::write(path, serde_json::to_string_pretty(&json)?)?;
    Ok(())
}

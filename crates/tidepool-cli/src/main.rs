//! Command-line driver: runs a simulation day by day, draws it, and
//! optionally saves the run history.

mod render;
mod telemetry;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tidepool_core::{Milestone, SimConfig};
use tidepool_world::{run, Meadow, RunReport, World};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
enum Mode {
    /// Ocean, tidal and land zones with chemical pools
    Ocean,
    /// Open grid with discrete food items
    Meadow,
}

#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(author, version, about = "Tidepool - watch life crawl from the ocean onto land", long_about = None)]
struct Cli {
    /// Which world to simulate
    #[arg(short, long, value_enum, default_value_t = Mode::Ocean)]
    mode: Mode,

    /// JSON configuration file (missing fields take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of days to simulate
    #[arg(short, long)]
    days: Option<u64>,

    /// Random seed for a reproducible run
    #[arg(short, long)]
    seed: Option<u64>,

    /// Grid width
    #[arg(long)]
    width: Option<i32>,

    /// Grid height
    #[arg(long)]
    height: Option<i32>,

    /// Number of ocean depth layers
    #[arg(long)]
    max_depth: Option<i32>,

    /// Initial population size
    #[arg(long)]
    population: Option<usize>,

    /// Probability that a chemical affinity is redrawn at birth
    #[arg(long)]
    mutation_rate: Option<f64>,

    /// Upper bound of land-trait mutation noise
    #[arg(long)]
    land_mutation_bias: Option<f64>,

    /// Minimum age before reproducing
    #[arg(long)]
    reproduction_age: Option<u32>,

    /// Fraction of energy a parent keeps after reproducing
    #[arg(long)]
    reproduction_cost: Option<f64>,

    /// Pause between days, in milliseconds
    #[arg(long, default_value_t = 1200)]
    delay_ms: u64,

    /// Do not draw the map each day
    #[arg(short, long)]
    quiet: bool,

    /// Write the run history as JSON to this path
    #[arg(long)]
    history: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    fn sim_config(&self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => SimConfig::default(),
        };

        if let Some(days) = self.days {
            config.days = days;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(width) = self.width {
            config.world.width = width;
        }
        if let Some(height) = self.height {
            config.world.height = height;
        }
        if let Some(max_depth) = self.max_depth {
            config.world.max_depth = max_depth;
        }
        if let Some(population) = self.population {
            config.world.initial_population = population;
        }
        if let Some(rate) = self.mutation_rate {
            config.evolution.mutation_rate = rate;
        }
        if let Some(bias) = self.land_mutation_bias {
            config.evolution.land_mutation_bias = bias;
        }
        if let Some(age) = self.reproduction_age {
            config.evolution.reproduction_age = age;
        }
        if let Some(cost) = self.reproduction_cost {
            config.evolution.energy_reproduction_cost = cost;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Everything written to the history file
#[derive(Serialize)]
struct HistoryFile<'a, S> {
    mode: Mode,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    config: &'a SimConfig,
    report: &'a RunReport<S>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    telemetry::init_telemetry(cli.log_json)?;

    let config = cli.sim_config()?;
    let delay = Duration::from_millis(cli.delay_ms);
    let started_at = Utc::now();

    info!(mode = ?cli.mode, days = config.days, seed = ?config.seed, "Starting simulation");

    match cli.mode {
        Mode::Ocean => {
            let mut world = World::new(config.clone())?;
            let report = run(&mut world, config.days, |world, stats| {
                if !cli.quiet {
                    println!("\n{}", render::world_summary(stats));
                    println!("{}", render::world_map(world));
                }
                if let Some(milestone) = Milestone::detect(stats.day, stats) {
                    info!(day = stats.day, ?milestone, "{}", milestone.message());
                    if !cli.quiet {
                        println!("{}", milestone.message());
                    }
                }
                pause(delay);
            });

            print_outcome(report.extinct_on, report.history.last().map(|s| s.population));
            if let Some(last) = report.history.last() {
                println!("Land colonizers: {}", last.land_population);
            }
            save_history(cli.history.as_deref(), cli.mode, started_at, &config, &report)?;
        }
        Mode::Meadow => {
            let mut meadow = Meadow::new(config.clone())?;
            let report = run(&mut meadow, config.days, |meadow, stats| {
                if !cli.quiet {
                    println!("\n{}", render::meadow_summary(stats));
                    print!("{}", render::meadow_map(meadow));
                }
                pause(delay);
            });

            print_outcome(report.extinct_on, report.history.last().map(|s| s.population));
            save_history(cli.history.as_deref(), cli.mode, started_at, &config, &report)?;
        }
    }

    Ok(())
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

fn print_outcome(extinct_on: Option<u64>, final_population: Option<usize>) {
    match extinct_on {
        Some(day) => println!("\nMASS EXTINCTION on day {day} - all life has perished."),
        None => println!(
            "\nSimulation concluded. Final population: {} organisms",
            final_population.unwrap_or(0)
        ),
    }
}

fn save_history<S: Serialize>(
    path: Option<&Path>,
    mode: Mode,
    started_at: DateTime<Utc>,
    config: &SimConfig,
    report: &RunReport<S>,
) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create history file {}", path.display()))?;
    let history = HistoryFile {
        mode,
        started_at,
        finished_at: Utc::now(),
        config,
        report,
    };
    serde_json::to_writer_pretty(BufWriter::new(file), &history)?;

    info!(path = %path.display(), days = report.days_run, "Run history written");
    Ok(())
}

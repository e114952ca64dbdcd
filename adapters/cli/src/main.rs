#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line driver for Bastion levels.

mod driver;

use std::{fs, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use bastion_level::{LevelData, BUILTIN_LEVEL_COUNT};
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::driver::{Driver, Summary};

/// Runs a Bastion level without presentation and reports how it ended.
#[derive(Debug, Parser)]
#[command(name = "bastion", version, about)]
struct Cli {
    /// Built-in level to play, counting from 1.
    #[arg(long, default_value_t = 1, conflicts_with = "level_file")]
    level: usize,
    /// TOML file describing the level to play.
    #[arg(long)]
    level_file: Option<PathBuf>,
    /// Overrides the level's RNG seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Simulated seconds after which the run is abandoned.
    #[arg(long, default_value_t = 600)]
    max_seconds: u64,
    /// Log filter, for example `debug` or `bastion_level=trace`. Falls back
    /// to `RUST_LOG`, then `info`.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn load_level(&self) -> Result<LevelData> {
        let mut data = match &self.level_file {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("failed to read level file {}", path.display()))?;
                LevelData::from_toml_str(&contents)
                    .with_context(|| format!("failed to load level file {}", path.display()))?
            }
            None => LevelData::builtin(self.level).with_context(|| {
                format!(
                    "unknown level {}; built-in levels are 1 to {BUILTIN_LEVEL_COUNT}",
                    self.level
                )
            })?,
        };
        if let Some(seed) = self.seed {
            data.seed = seed;
        }
        Ok(data)
    }
}

fn init_tracing(directive: Option<&str>) -> Result<()> {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive)
            .with_context(|| format!("invalid log filter {directive:?}"))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("failed to install tracing subscriber")
}

fn print_summary(name: &str, summary: &Summary) {
    let outcome = match summary.outcome {
        Some(outcome) if outcome.user_success() => "won",
        Some(_) => "lost",
        None => "unfinished",
    };
    println!("level: {name}");
    println!("outcome: {outcome}");
    println!("simulated: {:.1}s", summary.elapsed.as_secs_f32());
    println!("spawned: {}", summary.spawned);
    println!("killed: {}", summary.killed);
    for (kind, count) in &summary.kills_by_kind {
        println!("  {kind:?}: {count}");
    }
    println!("arrived: {}", summary.arrived);
    println!("shots: {}", summary.shots);
    println!("balance: {}", summary.balance);
    if let Some(energy) = summary.energy {
        println!("headquarters energy: {energy}");
    }
}

/// Entry point for the Bastion command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref())?;

    if cli.tick_ms == 0 {
        bail!("--tick-ms must be positive");
    }

    let data = cli.load_level()?;
    let name = data.name.clone();
    let mut driver = Driver::new(data).context("failed to set up level")?;
    let summary = driver
        .run(
            Duration::from_millis(cli.tick_ms),
            Duration::from_secs(cli.max_seconds),
        )
        .context("simulation halted")?;
    print_summary(&name, &summary);
    Ok(())
}

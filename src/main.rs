use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use epidemy::sim::{CensusLogger, SimConfig, SimulationRunner, sweep};
use epidemy::SimError;

/// Agent-based epidemic spread on a 2-D grid.
#[derive(Debug, Parser)]
#[command(name = "epidemy", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run one outbreak and report how many weak agents died.
    Run {
        #[command(flatten)]
        common: CommonArgs,
        /// Fraction of the population that starts immune.
        #[arg(long, value_name = "FRACTION")]
        immune: Option<f64>,
        /// Log a census after every tick and pace the run.
        #[arg(long)]
        interactive: bool,
        /// Milliseconds to wait between ticks in interactive mode.
        #[arg(long, value_name = "MILLISECONDS", default_value_t = 2)]
        frame_delay_ms: u64,
    },
    /// Run one outbreak per immune percentage in `from..to`.
    Sweep {
        #[command(flatten)]
        common: CommonArgs,
        /// First immune percentage.
        #[arg(long, default_value_t = 66, value_parser = clap::value_parser!(u32).range(0..=100))]
        from: u32,
        /// Immune percentage to stop before.
        #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(0..=101))]
        to: u32,
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        step: u32,
    },
}

#[derive(Debug, Args)]
struct CommonArgs {
    /// JSON file with config overrides.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Number of agents.
    #[arg(long)]
    population: Option<usize>,
    /// RNG seed; omit for a fresh run every time.
    #[arg(long)]
    seed: Option<u64>,
    /// Give up after this many ticks.
    #[arg(long)]
    max_ticks: Option<u64>,
    /// Print summaries as JSON instead of a sentence.
    #[arg(long)]
    json: bool,
}

impl CommonArgs {
    fn load(&self) -> Result<SimConfig, SimError> {
        let mut config = match &self.config {
            Some(path) => SimConfig::from_json_file(path)?,
            None => SimConfig::default(),
        };
        if let Some(population) = self.population {
            config.population_size = population;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.max_ticks.is_some() {
            config.max_ticks = self.max_ticks;
        }
        Ok(config)
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn print_summary(summary: &epidemy::OutbreakSummary, json: bool) -> Result<(), SimError> {
    if json {
        println!("{}", serde_json::to_string(summary)?);
    } else {
        println!("{summary}");
    }
    Ok(())
}

fn main() -> Result<(), SimError> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            common,
            immune,
            interactive,
            frame_delay_ms,
        } => {
            let mut config = common.load()?;
            if let Some(immune) = immune {
                config.immune_proportion = immune;
            }
            let mut runner = SimulationRunner::new(config)?;
            if interactive {
                runner.add_observer(Box::new(
                    CensusLogger::new(1).with_frame_delay(Duration::from_millis(frame_delay_ms)),
                ));
            }
            let summary = runner.run()?;
            print_summary(&summary, common.json)?;
        }
        Command::Sweep {
            common,
            from,
            to,
            step,
        } => {
            let config = common.load()?;
            let proportions: Vec<f64> = (from..to)
                .step_by(step as usize)
                .map(|pct| f64::from(pct) / 100.0)
                .collect();
            for summary in sweep(&config, &proportions)? {
                print_summary(&summary, common.json)?;
            }
        }
    }
    Ok(())
}

//! Funding Simulator CLI
//!
//! Runs a simulation from a JSON config, or the built-in open-science
//! scenario, writing status rows as CSV.

use clap::Parser;
use funding_simulator_core_rs::orchestrator::{CsvSink, SimEngine, StatusSink};
use funding_simulator_core_rs::scenario::{open_science_config, ScenarioOptions};
use funding_simulator_core_rs::{SimulationConfig, SimulationError};
use std::fs::File;
use std::io::{self, BufWriter};
use std::process::ExitCode;
use thiserror::Error;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "funding-sim")]
#[command(about = "Agent-based research funding simulator")]
struct Args {
    /// JSON simulation config (built-in scenario when omitted)
    #[arg(short, long)]
    config: Option<String>,

    /// Seed for the run's random generator
    #[arg(short, long)]
    seed: Option<u64>,

    /// Stop once this tick is reached
    #[arg(short, long)]
    max_ticks: Option<usize>,

    /// Researchers in the built-in scenario
    #[arg(short, long, default_value = "2")]
    researchers: usize,

    /// CSV file for status rows (stdout when omitted)
    #[arg(short, long)]
    output: Option<String>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}: {1}")]
    Io(String, #[source] io::Error),

    #[error("Invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

fn load_config(args: &Args) -> Result<SimulationConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            let file = File::open(path).map_err(|e| CliError::Io(path.clone(), e))?;
            serde_json::from_reader(io::BufReader::new(file))?
        }
        None => open_science_config(&ScenarioOptions {
            num_researchers: args.researchers,
            ..Default::default()
        }),
    };

    if let Some(seed) = args.seed {
        config.params.rng_seed = seed;
    }
    if let Some(max_ticks) = args.max_ticks {
        config.params.max_ticks = max_ticks;
    }
    Ok(config)
}

fn run(args: &Args) -> Result<(), CliError> {
    let config = load_config(args)?;
    let state = config.build()?;

    let sink: Box<dyn StatusSink> = match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| CliError::Io(path.clone(), e))?;
            Box::new(CsvSink::new(BufWriter::new(file)))
        }
        None => Box::new(CsvSink::new(io::stdout())),
    };

    let mut engine = SimEngine::new(state, sink);
    let summary = engine.run()?;

    if args.json {
        let value = serde_json::json!({
            "final_tick": summary.final_tick,
            "ticks_executed": summary.ticks_executed,
            "status_rows": summary.status_rows,
            "total_balance_a": summary.total_balance_a,
            "total_balance_b": summary.total_balance_b,
            "kpi_digest": summary.kpi_digest,
        });
        println!("{}", value);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!("Final tick:   {}", summary.final_tick);
        info!("Status rows:  {}", summary.status_rows);
        info!("Total A / B:  {} / {}", summary.total_balance_a, summary.total_balance_b);
        info!("KPI digest:   {}", summary.kpi_digest);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Failed to set tracing subscriber");
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

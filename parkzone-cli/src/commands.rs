use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use opentelemetry::KeyValue;
use tracing::{error, info, instrument, warn};

use parkzone_config::ParkzoneConfig;
use parkzone_core::ParkingSystem;
use parkzone_simulator::{ReplayEngine, Scenario, SimulationError, Simulator, TopologyBase};
use parkzone_telemetry::{EventLogger, MetricsRecorder};

use crate::report;

#[derive(Parser)]
#[command(name = "parkzone", version, about)]
pub struct Cli {
    /// Configuration file; defaults to config/parkzone.yaml plus environment overrides
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print full reports as YAML instead of a summary
    #[arg(long, global = true)]
    pub yaml: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a seeded random simulation against the configured facility
    Simulate(SimulateArgs),
    /// Replay a scenario file step by step
    Replay(ReplayArgs),
    /// Print configured zones, areas and adjacency
    Topology,
    /// Run simulations over successive seeds, checking invariants after every event
    Fuzz(FuzzArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Number of events to simulate
    #[arg(long, default_value_t = 1000)]
    pub events: usize,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Fail unless the final state hash equals this value
    #[arg(long)]
    pub validate_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ReplayArgs {
    /// Scenario file (YAML)
    #[arg(short, long)]
    pub scenario: PathBuf,
    /// Fail unless the final state hash equals this value
    #[arg(long)]
    pub validate_hash: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct FuzzArgs {
    /// Initial seed (will auto-increment)
    #[arg(long, default_value_t = 1)]
    pub seed: u64,
    /// Number of fuzzing iterations (0 for unlimited)
    #[arg(long, default_value_t = 100)]
    pub iterations: usize,
    /// Events per iteration
    #[arg(long, default_value_t = 1000)]
    pub max_events: usize,
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => ParkzoneConfig::load_from_path(path),
        None => ParkzoneConfig::load(),
    }
    .context("failed to load configuration")?;

    EventLogger::init(&config.telemetry.log_level)
        .map_err(|err| anyhow::anyhow!("failed to initialize logging: {err}"))?;

    let metrics = if config.telemetry.metrics_enabled {
        Some(Arc::new(MetricsRecorder::new().context("failed to register metrics")?))
    } else {
        None
    };

    match cli.command {
        Commands::Simulate(args) => run_simulation(&config, args, metrics, cli.yaml),
        Commands::Replay(args) => run_replay(&config, args, metrics, cli.yaml),
        Commands::Topology => print_topology(&config, cli.yaml),
        Commands::Fuzz(args) => run_fuzz(&config, args),
    }
}

fn build_system(
    config: &ParkzoneConfig,
    metrics: &Option<Arc<MetricsRecorder>>,
) -> anyhow::Result<ParkingSystem> {
    let system = ParkingSystem::from_config(config).context("invalid facility layout")?;
    Ok(match metrics {
        Some(metrics) => system.with_metrics(Arc::clone(metrics)),
        None => system,
    })
}

#[instrument(level = "info", skip(config, metrics, yaml))]
fn run_simulation(
    config: &ParkzoneConfig,
    args: SimulateArgs,
    metrics: Option<Arc<MetricsRecorder>>,
    yaml: bool,
) -> anyhow::Result<()> {
    let mut simulator = Simulator::with_system(build_system(config, &metrics)?, args.seed);
    let report = simulator.run(args.events)?;

    if let Some(expected) = &args.validate_hash {
        if let Err(err) = report.verify(expected) {
            report::write_bug_report(&format!(
                "Simulation state hash mismatch\nseed: {}\nevents: {}\nexpected: {}\ngot: {}\n",
                args.seed, args.events, expected, report.state_hash
            ));
            return Err(err.into());
        }
        info!("State hash validated");
    }

    EventLogger::log_event(
        "simulation_complete",
        &[
            KeyValue::new("event_count", args.events as i64),
            KeyValue::new("seed", args.seed.to_string()),
            KeyValue::new("final_hash", report.state_hash.clone()),
        ],
    );

    if yaml {
        println!("{}", serde_yaml::to_string(&report)?);
    } else {
        report::print_simulation(&report);
    }
    report::print_metrics(metrics.as_deref());
    Ok(())
}

#[instrument(level = "info", skip(config, metrics, yaml))]
fn run_replay(
    config: &ParkzoneConfig,
    args: ReplayArgs,
    metrics: Option<Arc<MetricsRecorder>>,
    yaml: bool,
) -> anyhow::Result<()> {
    let scenario = Scenario::load_from_file(&args.scenario)
        .with_context(|| format!("failed to load scenario {}", args.scenario.display()))?;
    let engine = ReplayEngine::new(scenario);

    // Only a configured facility can carry the shared recorder.
    let report = if metrics.is_some() && engine.scenario().topology == TopologyBase::Configured {
        let mut system = build_system(config, &metrics)?;
        engine.run_on(&mut system)?
    } else {
        engine.run(config)?
    };

    if let Some(expected) = &args.validate_hash {
        if let Err(err) = report.verify(expected) {
            report::write_bug_report(&format!(
                "Replay state hash mismatch\nscenario: {}\nexpected: {}\ngot: {}\n",
                args.scenario.display(),
                expected,
                report.state_hash
            ));
            return Err(err.into());
        }
        info!("State hash validated");
    }

    EventLogger::log_event(
        "replay_complete",
        &[
            KeyValue::new("scenario", args.scenario.display().to_string()),
            KeyValue::new("final_hash", report.state_hash.clone()),
        ],
    );

    if yaml {
        println!("{}", serde_yaml::to_string(&report)?);
    } else {
        report::print_replay(&report);
    }
    report::print_metrics(metrics.as_deref());
    Ok(())
}

fn print_topology(config: &ParkzoneConfig, yaml: bool) -> anyhow::Result<()> {
    if yaml {
        println!("{}", serde_yaml::to_string(&config.topology)?);
        return Ok(());
    }
    let system = ParkingSystem::from_config(config).context("invalid facility layout")?;
    report::print_topology(&system);
    Ok(())
}

#[instrument(level = "info", skip(config))]
fn run_fuzz(config: &ParkzoneConfig, args: FuzzArgs) -> anyhow::Result<()> {
    let mut seed = args.seed;
    let mut count = 0;

    loop {
        let outcome = Simulator::new(config, seed)
            .map(Simulator::with_invariant_checks)
            .and_then(|mut simulator| simulator.run(args.max_events));

        match outcome {
            Ok(report) => {
                info!(seed, state_hash = %report.state_hash, "Fuzz iteration passed");
            }
            Err(err @ SimulationError::Invariant { .. }) => {
                error!(seed, "Invariant violated: {err}");
                report::write_bug_report(&format!(
                    "Fuzzing found an invariant violation\nseed: {}\nevents: {}\nerror: {}\n",
                    seed, args.max_events, err
                ));
                bail!("fuzzing failed at seed {seed}: {err}");
            }
            Err(err) => {
                warn!(seed, "Fuzz iteration could not run: {err}");
                return Err(err.into());
            }
        }

        count += 1;
        if args.iterations > 0 && count >= args.iterations {
            break;
        }
        seed += 1;
    }

    println!("fuzzing passed: {count} iterations from seed {}", args.seed);
    Ok(())
}

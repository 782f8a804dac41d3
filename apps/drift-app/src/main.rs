//! Drift vehicle-control CLI.
//!
//! - `run`: connect to a simulator bridge and drive episodes with a seeded
//!   uniform random policy, then export telemetry
//! - `check-config`: load and validate a TOML config, print the effective one
//! - `info`: print crate versions and the default spaces

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing_subscriber::EnvFilter;

use drift_core::prelude::*;
use drift_env::prelude::*;
use drift_sim::prelude::*;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Reinforcement-learning control loop for an external vehicle simulator.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run episodes against a remote simulator with a random policy.
    Run {
        /// TOML configuration file. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of episodes to run.
        #[arg(short = 'n', long, default_value_t = 1)]
        episodes: u32,

        /// Seed for the random policy.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Record telemetry and write CSV and plots into this directory.
        #[arg(short, long)]
        telemetry_dir: Option<PathBuf>,
    },

    /// Validate a configuration file and print the effective configuration.
    CheckConfig {
        /// TOML configuration file.
        path: PathBuf,
    },

    /// Print crate information.
    Info,
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn load_config(path: Option<&Path>) -> Result<DriftConfig, ConfigError> {
    path.map_or_else(|| Ok(DriftConfig::default()), DriftConfig::from_file)
}

fn run_episodes(
    config_path: Option<&Path>,
    episodes: u32,
    seed: u64,
    telemetry_dir: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(config_path)?;
    if let Some(dir) = telemetry_dir {
        config.telemetry.enabled = true;
        config.telemetry.output_dir = dir;
    }

    let factory = RemoteSimulatorFactory::new(config.simulator.clone());
    let mut env = DriftEnv::from_config(&config, Box::new(factory))?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    tracing::info!(
        address = %config.simulator.address,
        episodes,
        seed,
        reward = env.reward_name(),
        "starting run"
    );

    for ep in 1..=episodes {
        env.reset()?;
        let mut steps = 0u32;
        let mut total = 0.0f32;
        let mut outcome = "truncated";
        loop {
            let sample = env.action_space().sample(&mut rng);
            let action = Action::from_slice(&sample)?;
            match env.step(&action) {
                Ok(result) => {
                    steps += 1;
                    total += result.reward;
                    env.render_default();
                    if result.terminated {
                        outcome = "terminated";
                    }
                    if result.done() {
                        break;
                    }
                }
                Err(err) if err.is_session_fault() => {
                    tracing::warn!(episode = ep, error = %err, "episode aborted");
                    outcome = "aborted";
                    break;
                }
                Err(err) => return Err(err.into()),
            }
        }
        println!("episode {ep}: steps={steps}, reward={total:.3}, {outcome}");
    }

    let counters = env.counters();
    println!("\ntotal: episodes={episodes}, ticks={}", counters.global_tick);

    if config.telemetry.enabled {
        let csv = config.telemetry.csv_path();
        env.telemetry().save_csv(&csv)?;
        let plots = env.telemetry().plot(&config.telemetry.output_dir)?;
        println!("telemetry: {}", csv.display());
        for plot in plots {
            println!("plot: {}", plot.display());
        }
    }

    env.close();
    Ok(())
}

fn check_config(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let config = DriftConfig::from_file(path)?;
    println!("{} is valid\n", path.display());
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn run_info() {
    let version = env!("CARGO_PKG_VERSION");
    println!("drift v{version}");
    println!();
    println!("crates:");
    println!("  drift-core {version}");
    println!("  drift-sim  {version}");
    println!("  drift-env  {version}");
    println!();
    println!("observation: Box({OBS_DIM}) in [-1, 1]  [s, l, vx, vy, yaw, yaw_rate]");
    println!("action:      Box({ACTION_DIM}) in [-1, 1]  [steer, throttle]");
    println!(
        "max_episode_iters: {}",
        DriftConfig::default().env.max_episode_iters
    );
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run {
            config,
            episodes,
            seed,
            telemetry_dir,
        } => run_episodes(config.as_deref(), episodes, seed, telemetry_dir),
        Commands::CheckConfig { path } => check_config(&path),
        Commands::Info => {
            run_info();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

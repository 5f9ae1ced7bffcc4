//! LeapMove CLI — drive hand-tracked object motion from the terminal.
//!
//! Usage:
//!   leapmove run [OPTIONS]     Track a demo scene until Ctrl+C or --ticks
//!   leapmove check             Start and stop the configured sensor
//!   leapmove config            Show or save the effective configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use leapmove_common::config::{AppConfig, DriverKind, StrategyKind};

mod commands;

#[derive(Parser)]
#[command(
    name = "leapmove",
    about = "Move scene objects with a hand-tracking sensor",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/leapmove/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a tracking session against the demo scene
    Run {
        /// Stop after this many ticks (default: run until Ctrl+C)
        #[arg(long)]
        ticks: Option<u64>,

        /// Tick interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Sensor driver
        #[arg(long, value_enum)]
        driver: Option<DriverArg>,

        /// Play back recorded frames (JSONL) through the stub driver
        #[arg(long)]
        frames: Option<PathBuf>,

        /// Interaction strategy
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Scale applied to each camera axis
        #[arg(long)]
        scale: Option<f64>,

        /// Listener buffer capacity (events)
        #[arg(long)]
        capacity: Option<usize>,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the configured sensor can be started
    Check,

    /// Show the effective configuration
    Config {
        /// Write the effective configuration back to the config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DriverArg {
    Simulated,
    Stub,
}

impl From<DriverArg> for DriverKind {
    fn from(arg: DriverArg) -> Self {
        match arg {
            DriverArg::Simulated => DriverKind::Simulated,
            DriverArg::Stub => DriverKind::Stub,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    ObjectMove,
    SensorSpaceMove,
    Idle,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::ObjectMove => StrategyKind::ObjectMove,
            StrategyArg::SensorSpaceMove => StrategyKind::SensorSpaceMove,
            StrategyArg::Idle => StrategyKind::Idle,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(leapmove_common::config::config_file_path);
    let mut config = AppConfig::load_from(&config_path);

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    leapmove_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Run {
            ticks,
            interval_ms,
            driver,
            frames,
            strategy,
            scale,
            capacity,
            json,
        } => {
            if let Some(interval_ms) = interval_ms {
                config.tracking.tick_interval_ms = interval_ms;
            }
            if let Some(driver) = driver {
                config.tracking.driver = driver.into();
            }
            if let Some(strategy) = strategy {
                config.tracking.strategy = strategy.into();
            }
            if let Some(scale) = scale {
                config.tracking.move_scale = scale;
            }
            if let Some(capacity) = capacity {
                config.tracking.buffer_capacity = capacity;
            }
            commands::run::run(config.tracking, ticks, frames, json).await
        }
        Commands::Check => commands::check::run(&config.tracking).await,
        Commands::Config { save } => commands::config::run(&config, &config_path, save),
    }
}

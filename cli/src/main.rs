use inapp_core::config::ConfigError;
use inapp_core::{Config, InAppError};
use log::{error, info};
use std::process::ExitCode;
use thiserror::Error;

mod cli;
mod logger;
mod player;
mod scenario;

use cli::Args;
use player::Player;
use scenario::{Scenario, ScenarioError};

#[derive(Debug, Error)]
enum DriverError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
    #[error(transparent)]
    InApp(#[from] InAppError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = cli::parse_args();

    if let Err(e) = logger::init_logger(args.quiet, args.verbose) {
        eprintln!("Failed to initialize logger: {e}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), DriverError> {
    info!("InApp driver {}", inapp_core::version());

    let config = if args.use_defaults {
        info!("Using default configuration");
        Config::default()
    } else {
        let config = Config::load(args.config_path.as_deref(), true)?;
        if let Some(path) = &config.config_path {
            info!("Loaded config from {}", path.display());
        }
        config
    };

    let scenario = Scenario::load(&args.scenario)?;
    info!(
        "Loaded scenario {} with {} steps",
        args.scenario.display(),
        scenario.steps.len()
    );

    if args.dry_run {
        info!("Configuration and scenario are valid");
        return Ok(());
    }

    let report = Player::new(config, scenario).run().await?;

    match report.phase {
        Some(phase) => info!("Final phase: {phase:?}"),
        None => info!("Message never loaded"),
    }
    for event in &report.events {
        info!("  {event:?}");
    }
    Ok(())
}

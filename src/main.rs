//! courtside - NBA statistics from the command line
//!
//! Fetches one resource through the caching gateway and prints it as JSON. Logs
//! go to stderr so stdout stays machine readable.

use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use courtside::cache::{SweeperHandle, TtlCache};
use courtside::cli::{self, Cli, CliError};
use courtside::config::GatewayConfig;
use courtside::StatsGateway;

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("courtside=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<String, CliError> {
    let config = GatewayConfig::from_env().map_err(courtside::GatewayError::from)?;
    let cache = TtlCache::new();
    let sweeper = SweeperHandle::spawn(cache.clone(), config.sweep_interval);

    let mut gateway =
        StatsGateway::from_config(&config, cache).map_err(courtside::GatewayError::from)?;
    if let Some(seed) = cli.seed {
        gateway = gateway.with_seed(seed);
    }

    let result = cli::run(cli, &gateway).await;
    sweeper.shutdown().await;

    Ok(serde_json::to_string_pretty(&result?)?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    match run(&cli).await {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "command failed");
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

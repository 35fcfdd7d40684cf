use clap::Parser;
use polyclaim::cli::{self, Cli, Commands};
use polyclaim::config::AppConfig;
use polyclaim::error::ClaimError;
use std::process::ExitCode;
use tracing::error;

mod main_runtime;

use main_runtime::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env is fine; real environment variables still apply.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match AppConfig::load_from(&cli.config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::from(2);
        }
    };
    init_logging(&config.logging.level, cli.log_json || config.logging.json);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("Invalid configuration: {}", e);
        }
        return ExitCode::from(2);
    }

    match run(&cli, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            if e.is_input_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: &Cli, config: &AppConfig) -> Result<(), ClaimError> {
    match &cli.command {
        Commands::Claim(args) => {
            let report = cli::run_claim(args, config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Positions { address, json } => {
            cli::run_positions(address.as_deref(), *json, config).await?;
        }
        Commands::Balance {
            address,
            rpc_url,
            json,
        } => {
            cli::run_balance(address.as_deref(), rpc_url.as_deref(), *json, config).await?;
        }
    }
    Ok(())
}

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tripplanner::{Orchestrator, TripPlannerConfig, telemetry, web};

#[derive(Parser)]
#[command(
    name = "tripplanner",
    version,
    about = "Trip planning assistant: weather and attractions for any destination"
)]
struct Cli {
    /// Configuration file (defaults to <config dir>/tripplanner/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Plan a trip from a free-text query and print the result as JSON
    Plan {
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Serve the planning API over HTTP
    Serve {
        /// Port to listen on (defaults to server.port from the config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = TripPlannerConfig::load_from_path(cli.config)?;
    let _telemetry = telemetry::init(&config.logging, cli.verbose)?;

    let Some(command) = cli.command else {
        println!("Usage: tripplanner plan \"What's the weather in Paris?\"");
        println!("       tripplanner serve --port 8080");
        println!("Run `tripplanner --help` for all options.");
        return Ok(ExitCode::SUCCESS);
    };

    let orchestrator = Orchestrator::from_config(&config)?;

    match command {
        Command::Plan { query } => match orchestrator.plan(&query.join(" ")).await {
            Ok(result) => {
                let json = serde_json::to_string_pretty(&result)
                    .context("Failed to serialize plan")?;
                println!("{json}");
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                eprintln!("{}", e.user_message());
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Serve { port } => {
            let port = port.unwrap_or(config.server.port);
            web::run(Arc::new(orchestrator), port).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

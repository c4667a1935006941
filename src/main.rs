use anyhow::Context;
use clap::{Parser, Subcommand};
use layer_registry::app::refresh_use_case::AgeFilter;
use layer_registry::config::Config;
use layer_registry::server::{self, AppState};
use layer_registry::{logging, metrics};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "layer_registry")]
#[command(about = "Registration catalog service for map and feature layers")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP registration service
    Serve,
    /// Rebuild stored records from their cached requests
    Refresh {
        /// `all`, or the minimum age in days of records to refresh
        filter: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    logging::init_logging(&config.logging.directory);
    if let Some(listen) = config.metrics.listen {
        metrics::init_metrics(listen);
    }

    let state = AppState::from_config(&config).context("Failed to initialise services")?;

    match cli.command {
        Commands::Serve => {
            server::start_server(state, config.server.bind)
                .await
                .context("HTTP server failed")?;
        }
        Commands::Refresh { filter } => {
            let filter: AgeFilter = filter.parse()?;
            info!(filter = ?filter, "Running refresh from the command line");
            let summary = state.refresh.refresh(filter).await?;
            if !summary.errors.is_empty() {
                error!("{} records could not be refreshed", summary.errors.len());
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}

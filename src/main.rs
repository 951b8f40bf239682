//! Experiment Notes - Main Server
//!
//! Experiment flowcharts filed under project/folder hierarchies in Neo4j.

use anyhow::Result;
use clap::{Parser, Subcommand};
use experiment_notes::{AppState, Config};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "experiment-notes")]
#[command(about = "Experiment notes server backed by Neo4j")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Connect to Neo4j, ensure the schema and report connectivity
    Check {
        /// Path to the YAML config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,experiment_notes=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let mut config = Config::from_yaml_and_env(config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            experiment_notes::start_server(config).await
        }
        Commands::Check { config } => {
            let config = Config::from_yaml_and_env(config.as_deref())?;
            run_check(config).await
        }
    }
}

async fn run_check(config: Config) -> Result<()> {
    tracing::info!("Checking Neo4j at {}", config.neo4j_uri);

    // Connecting also ensures constraints and indexes
    let state = AppState::new(config).await?;
    let healthy = state.neo4j.health_check().await?;
    let projects = state.neo4j.list_projects().await?;

    tracing::info!(
        "Neo4j {}: {} project(s) stored",
        if healthy { "reachable" } else { "unhealthy" },
        projects.len()
    );

    if !healthy {
        anyhow::bail!("Neo4j health check failed");
    }
    Ok(())
}

//! Taste Graph - Main Server
//!
//! Food interaction graph service backed by Neo4j.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use taste_graph::{insights::InsightAggregator, Config, GraphContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taste-graph")]
#[command(about = "Food interaction graph server")]
struct Cli {
    /// Path to the YAML config file (defaults to ./config.yaml)
    #[arg(short, long, global = true, env = "TASTE_GRAPH_CONFIG")]
    config: Option<PathBuf>,

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
    },

    /// Check connectivity and create the graph constraints
    Check,

    /// Print the insight report for one user as JSON
    Insights {
        /// User id to aggregate
        user_id: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,taste_graph=debug,tower_http=debug".into());
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            taste_graph::start_server(config).await
        }
        Commands::Check => run_check(config).await,
        Commands::Insights { user_id } => run_insights(config, &user_id).await,
    }
}

async fn run_check(config: Config) -> Result<()> {
    let graph = GraphContext::from_config(&config);

    let result = async {
        graph
            .verify_connectivity()
            .await
            .context("Neo4j connectivity check failed")?;
        tracing::info!("Connected to Neo4j");

        graph
            .ensure_constraints()
            .await
            .context("Failed to create graph constraints")?;
        anyhow::Ok(())
    }
    .await;

    graph.close().await;
    result?;

    tracing::info!("Graph backend ready");
    Ok(())
}

async fn run_insights(config: Config, user_id: &str) -> Result<()> {
    let graph = std::sync::Arc::new(GraphContext::from_config(&config));
    let aggregator = InsightAggregator::new(graph.clone());

    let result = aggregator.get_insights(user_id).await;
    graph.close().await;

    let insights = result.context("Failed to load insights")?;
    println!("{}", serde_json::to_string_pretty(&insights)?);
    Ok(())
}

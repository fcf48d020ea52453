//! Taste Graph
//!
//! Records how users interact with food items as a Neo4j property graph:
//! - preference swipes, recipe adjustments and logged meals as append-only edges
//! - profile syncs replacing the user's region preference and health goals
//! - per-user insight queries aggregated over those edges

pub mod api;
pub mod context;
pub mod error;
pub mod ingest;
pub mod insights;
pub mod neo4j;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use context::GraphContext;
pub use error::{GraphError, GraphResult};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub neo4j: Neo4jYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Neo4j configuration section.
///
/// No defaults for the connection fields: a deployment without them runs
/// with the graph backend unconfigured.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: Option<String>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub max_connections: Option<usize>,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub server_port: u16,
    pub neo4j_uri: Option<String>,
    pub neo4j_user: Option<String>,
    pub neo4j_password: Option<String>,
    pub neo4j_database: Option<String>,
    pub neo4j_max_connections: Option<usize>,
}

/// Connection settings for the graph backend
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub max_connections: Option<usize>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_var(names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| non_empty(std::env::var(name).ok()))
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let server_port = match env_var(&["SERVER_PORT"]) {
            Some(port) => port.parse().context("SERVER_PORT must be a port number")?,
            None => yaml.server.port,
        };
        let neo4j_max_connections = match env_var(&["NEO4J_MAX_CONNECTIONS"]) {
            Some(n) => Some(n.parse().context("NEO4J_MAX_CONNECTIONS must be a number")?),
            None => yaml.neo4j.max_connections,
        };

        Ok(Self {
            server_port,
            neo4j_uri: env_var(&["NEO4J_URI"]).or(non_empty(yaml.neo4j.uri)),
            neo4j_user: env_var(&["NEO4J_USER", "NEO4J_USERNAME"]).or(non_empty(yaml.neo4j.user)),
            neo4j_password: env_var(&["NEO4J_PASSWORD"]).or(non_empty(yaml.neo4j.password)),
            neo4j_database: env_var(&["NEO4J_DATABASE"]).or(non_empty(yaml.neo4j.database)),
            neo4j_max_connections,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }

    /// Graph connection settings, or the names of the missing ones.
    pub fn graph_settings(&self) -> std::result::Result<GraphSettings, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.neo4j_uri.is_none() {
            missing.push("NEO4J_URI");
        }
        if self.neo4j_user.is_none() {
            missing.push("NEO4J_USER");
        }
        if self.neo4j_password.is_none() {
            missing.push("NEO4J_PASSWORD");
        }

        match (&self.neo4j_uri, &self.neo4j_user, &self.neo4j_password) {
            (Some(uri), Some(user), Some(password)) => Ok(GraphSettings {
                uri: uri.clone(),
                user: user.clone(),
                password: password.clone(),
                database: self.neo4j_database.clone(),
                max_connections: self.neo4j_max_connections,
            }),
            _ => Err(missing),
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub graph: Arc<GraphContext>,
}

impl AppState {
    /// Create application state backed by Neo4j.
    ///
    /// Does not connect: the graph handle is built on first use.
    pub fn new(config: &Config) -> Self {
        Self {
            graph: Arc::new(GraphContext::from_config(config)),
        }
    }
}

/// Serve the HTTP API until ctrl-c, then release the graph handle.
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(&config);
    if !state.graph.is_configured() {
        tracing::warn!("Neo4j is not configured; graph endpoints will answer 503");
    }

    let app = api::create_router(Arc::new(api::ServerState::new(state.clone())));
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    state.graph.close().await;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

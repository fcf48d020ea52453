//! Lifecycle-scoped access to the graph backend
//!
//! One `GraphContext` is built at process start and shared by every request.
//! It owns the lazily-built store handle, the schema-ready flag and the
//! readiness gate that runs before any ingestor or insight query.

use crate::error::{GraphError, GraphResult};
use crate::neo4j::{InteractionStore, Neo4jConnector, StoreConnector};
use crate::{Config, GraphSettings};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

pub struct GraphContext {
    settings: Result<GraphSettings, Vec<&'static str>>,
    connector: Arc<dyn StoreConnector>,
    handle: Mutex<Option<Arc<dyn InteractionStore>>>,
    /// Set once constraints were created; never reset
    schema: OnceCell<()>,
}

impl GraphContext {
    /// Create a context; `settings` carries the missing setting names when unconfigured.
    pub fn new(
        settings: Result<GraphSettings, Vec<&'static str>>,
        connector: Arc<dyn StoreConnector>,
    ) -> Self {
        Self {
            settings,
            connector,
            handle: Mutex::new(None),
            schema: OnceCell::new(),
        }
    }

    /// Context backed by Neo4j, configured from `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.graph_settings(), Arc::new(Neo4jConnector))
    }

    pub fn is_configured(&self) -> bool {
        self.settings.is_ok()
    }

    pub fn schema_ready(&self) -> bool {
        self.schema.initialized()
    }

    fn settings(&self) -> GraphResult<&GraphSettings> {
        self.settings
            .as_ref()
            .map_err(|missing| GraphError::Config(missing.join(", ")))
    }

    // ========================================================================
    // Connection manager
    // ========================================================================

    /// Return the store handle, connecting on first use.
    ///
    /// Concurrent first callers wait for a single connection attempt; a
    /// failed attempt leaves no handle behind, so the next call retries.
    pub async fn handle(&self) -> GraphResult<Arc<dyn InteractionStore>> {
        let settings = self.settings()?;
        let mut slot = self.handle.lock().await;
        if let Some(store) = slot.as_ref() {
            return Ok(store.clone());
        }

        tracing::debug!(uri = %settings.uri, "Building graph handle");
        let store = self.connector.connect(settings).await?;
        *slot = Some(store.clone());
        Ok(store)
    }

    /// Round-trip check against the backend
    pub async fn verify_connectivity(&self) -> GraphResult<()> {
        let store = self.handle().await?;
        store.verify_connectivity().await?;
        Ok(())
    }

    /// Release the handle. Safe to call repeatedly; the next `handle()` reconnects.
    pub async fn close(&self) {
        let store = self.handle.lock().await.take();
        if let Some(store) = store {
            store.close().await;
            tracing::info!("Graph handle closed");
        }
    }

    // ========================================================================
    // Schema guard
    // ========================================================================

    /// Create the uniqueness constraints once per process.
    ///
    /// Only success is remembered: a failed attempt is retried by the next caller.
    pub async fn ensure_constraints(&self) -> GraphResult<()> {
        self.schema
            .get_or_try_init(|| async {
                let store = self.handle().await?;
                store.ensure_constraints().await?;
                tracing::info!("Graph constraints ensured");
                Ok::<(), GraphError>(())
            })
            .await?;
        Ok(())
    }

    // ========================================================================
    // Readiness gate
    // ========================================================================

    /// Precondition for every ingestor and insight query.
    ///
    /// Rejects without connecting when unconfigured, and rejects as
    /// unavailable when the schema guard cannot pass.
    pub async fn ready(&self) -> GraphResult<Arc<dyn InteractionStore>> {
        self.settings()?;
        match self.ensure_constraints().await {
            Ok(()) => {}
            Err(GraphError::Transport(e)) | Err(GraphError::Unavailable(e)) => {
                tracing::error!("Graph backend not ready: {:#}", e);
                return Err(GraphError::Unavailable(e));
            }
            Err(e) => return Err(e),
        }
        self.handle().await.map_err(|e| match e {
            GraphError::Transport(e) => GraphError::Unavailable(e),
            other => other,
        })
    }
}

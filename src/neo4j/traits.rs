//! InteractionStore trait definition
//!
//! Defines the abstract interface for the graph operations behind the
//! ingestors and the insight aggregator. `Neo4jClient` is the production
//! implementation; tests use an in-memory mock.

use crate::neo4j::models::*;
use crate::neo4j::value::RawRecord;
use crate::GraphSettings;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Abstract interface for all graph database operations.
///
/// Every write method runs as exactly one transaction: either all of its
/// node merges and edge changes commit, or none do.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Round-trip health check
    async fn verify_connectivity(&self) -> Result<()>;

    /// Create the uniqueness constraints on `User`, `Food`, `Region` and `HealthGoal` ids
    async fn ensure_constraints(&self) -> Result<()>;

    /// Release engine resources. Safe to call more than once.
    async fn close(&self);

    // ========================================================================
    // Event ingestion
    // ========================================================================

    /// Update profile scalars, replace `PREFERS_REGION` and the full `HAS_GOAL` set
    async fn sync_profile(&self, event: &ProfileSync) -> Result<()>;

    /// Append one `SWIPED` edge
    async fn record_swipe(&self, event: &SwipeEvent) -> Result<()>;

    /// Append one `ADJUSTED_RECIPE` edge
    async fn record_adjustment(&self, event: &AdjustmentEvent) -> Result<()>;

    /// Append one `LOGGED_MEAL` edge
    async fn record_meal_log(&self, event: &MealLogEvent) -> Result<()>;

    // ========================================================================
    // Insights
    // ========================================================================

    /// Run one read-only aggregation for a user.
    ///
    /// Each returned row lists exactly `query.columns()`, in that order.
    async fn run_insight(&self, query: InsightQuery, user_id: &str) -> Result<Vec<RawRecord>>;
}

/// Builds a store handle from connection settings.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, settings: &GraphSettings) -> Result<Arc<dyn InteractionStore>>;
}

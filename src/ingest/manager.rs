//! Event ingestion operations

use super::models::*;
use crate::context::GraphContext;
use crate::error::{GraphError, GraphResult};
use chrono::Utc;
use std::sync::Arc;

/// Manager for the four write operations.
///
/// Each call passes the readiness gate, validates the payload, then runs one
/// write transaction. Engine failures are logged here with full detail and
/// returned as `GraphError::Transport`.
pub struct IngestManager {
    graph: Arc<GraphContext>,
}

fn engine_failure(operation: &str, user_id: &str, err: anyhow::Error) -> GraphError {
    tracing::error!(user_id = %user_id, "Failed to record {}: {:#}", operation, err);
    GraphError::Transport(err)
}

impl IngestManager {
    /// Create a new ingest manager
    pub fn new(graph: Arc<GraphContext>) -> Self {
        Self { graph }
    }

    /// Replace the user's profile scalars, preferred region and health goals
    pub async fn sync_profile(&self, req: ProfileSyncRequest) -> GraphResult<()> {
        let store = self.graph.ready().await?;
        let event = req.into_event(Utc::now())?;

        store
            .sync_profile(&event)
            .await
            .map_err(|e| engine_failure("profile sync", &event.user_id, e))?;

        tracing::debug!(
            user_id = %event.user_id,
            goals = event.profile.health_goals.len(),
            "Profile synced"
        );
        Ok(())
    }

    /// Record one preference swipe
    pub async fn record_swipe(&self, req: SwipeRequest) -> GraphResult<()> {
        let store = self.graph.ready().await?;
        let event = req.into_event(Utc::now())?;

        store
            .record_swipe(&event)
            .await
            .map_err(|e| engine_failure("swipe", &event.user_id, e))?;

        tracing::debug!(
            user_id = %event.user_id,
            food_id = %event.food.id,
            action = %event.action,
            "Swipe recorded"
        );
        Ok(())
    }

    /// Record one recipe adjustment
    pub async fn record_adjustment(&self, req: AdjustmentRequest) -> GraphResult<()> {
        let store = self.graph.ready().await?;
        let event = req.into_event(Utc::now())?;

        store
            .record_adjustment(&event)
            .await
            .map_err(|e| engine_failure("recipe adjustment", &event.user_id, e))?;

        tracing::debug!(
            user_id = %event.user_id,
            food_id = %event.food.id,
            adjust_type = %event.adjust_type,
            "Recipe adjustment recorded"
        );
        Ok(())
    }

    /// Record one logged meal
    pub async fn record_meal_log(&self, req: MealLogRequest) -> GraphResult<()> {
        let store = self.graph.ready().await?;
        let event = req.into_event(Utc::now())?;

        store
            .record_meal_log(&event)
            .await
            .map_err(|e| engine_failure("meal log", &event.user_id, e))?;

        tracing::debug!(
            user_id = %event.user_id,
            food_id = %event.food.id,
            "Meal log recorded"
        );
        Ok(())
    }
}

//! Per-user insight aggregation
//!
//! Six read-only queries run concurrently, each in its own transaction, so
//! the sections of one response are not guaranteed to share a snapshot.
//! If any query fails the whole call fails.

use crate::context::GraphContext;
use crate::error::{GraphError, GraphResult};
use crate::neo4j::{normalize_records, InsightQuery, InteractionStore, Record};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Merged insight response for one user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub user_id: String,
    pub swipe_breakdown: Vec<Record>,
    pub top_liked_foods: Vec<Record>,
    pub top_disliked_foods: Vec<Record>,
    pub preferred_regions: Vec<Record>,
    pub adjustment_patterns: Vec<Record>,
    pub meal_summary: Record,
}

/// Single meal summary row; nulls and a missing row both read as zero
fn meal_summary(rows: Vec<Record>) -> Record {
    let row = rows.into_iter().next().unwrap_or_default();
    InsightQuery::MealSummary
        .columns()
        .iter()
        .map(|col| {
            let value = match row.get(*col) {
                Some(v) if !v.is_null() => v.clone(),
                _ => Value::from(0),
            };
            (col.to_string(), value)
        })
        .collect()
}

pub struct InsightAggregator {
    graph: Arc<GraphContext>,
}

impl InsightAggregator {
    pub fn new(graph: Arc<GraphContext>) -> Self {
        Self { graph }
    }

    async fn fetch(
        store: &dyn InteractionStore,
        query: InsightQuery,
        user_id: &str,
    ) -> anyhow::Result<Vec<Record>> {
        let rows = store.run_insight(query, user_id).await?;
        Ok(normalize_records(&rows))
    }

    /// Run all six aggregations for `user_id` and merge them
    pub async fn get_insights(&self, user_id: &str) -> GraphResult<Insights> {
        let store = self.graph.ready().await?;
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(GraphError::validation("userId is required"));
        }

        let store = store.as_ref();
        let (
            swipe_breakdown,
            top_liked_foods,
            top_disliked_foods,
            preferred_regions,
            adjustment_patterns,
            meals,
        ) = futures::try_join!(
            Self::fetch(store, InsightQuery::SwipeBreakdown, user_id),
            Self::fetch(store, InsightQuery::TopLikedFoods, user_id),
            Self::fetch(store, InsightQuery::TopDislikedFoods, user_id),
            Self::fetch(store, InsightQuery::PreferredRegions, user_id),
            Self::fetch(store, InsightQuery::AdjustmentPatterns, user_id),
            Self::fetch(store, InsightQuery::MealSummary, user_id),
        )
        .map_err(|e| {
            tracing::error!(user_id = %user_id, "Insight query failed: {:#}", e);
            GraphError::Transport(e)
        })?;

        Ok(Insights {
            user_id: user_id.to_string(),
            swipe_breakdown,
            top_liked_foods,
            top_disliked_foods,
            preferred_regions,
            adjustment_patterns,
            meal_summary: meal_summary(meals),
        })
    }
}

//! `InteractionStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;

use super::client::Neo4jClient;
use super::models::*;
use super::traits::InteractionStore;
use super::value::RawRecord;

#[async_trait]
impl InteractionStore for Neo4jClient {
    async fn verify_connectivity(&self) -> anyhow::Result<()> {
        self.verify_connectivity().await
    }

    async fn ensure_constraints(&self) -> anyhow::Result<()> {
        self.ensure_constraints().await
    }

    async fn close(&self) {
        // The bolt pool is released when the last handle is dropped.
        tracing::debug!("Neo4j handle released");
    }

    async fn sync_profile(&self, event: &ProfileSync) -> anyhow::Result<()> {
        self.sync_profile(event).await
    }

    async fn record_swipe(&self, event: &SwipeEvent) -> anyhow::Result<()> {
        self.record_swipe(event).await
    }

    async fn record_adjustment(&self, event: &AdjustmentEvent) -> anyhow::Result<()> {
        self.record_adjustment(event).await
    }

    async fn record_meal_log(&self, event: &MealLogEvent) -> anyhow::Result<()> {
        self.record_meal_log(event).await
    }

    async fn run_insight(
        &self,
        query: InsightQuery,
        user_id: &str,
    ) -> anyhow::Result<Vec<RawRecord>> {
        self.run_insight(query, user_id).await
    }
}

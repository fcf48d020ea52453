//! Neo4j client for the food interaction graph

use super::models::*;
use super::traits::{InteractionStore, StoreConnector};
use super::value::{GraphValue, RawRecord};
use crate::GraphSettings;
use anyhow::{Context, Result};
use async_trait::async_trait;
use neo4rs::{query, BoltNull, BoltType, ConfigBuilder, Graph, Query, Txn};
use std::sync::Arc;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

// ============================================================================
// Cypher
// ============================================================================

const CONSTRAINTS: [&str; 4] = [
    "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
    "CREATE CONSTRAINT food_id IF NOT EXISTS FOR (f:Food) REQUIRE f.id IS UNIQUE",
    "CREATE CONSTRAINT region_id IF NOT EXISTS FOR (r:Region) REQUIRE r.id IS UNIQUE",
    "CREATE CONSTRAINT health_goal_id IF NOT EXISTS FOR (g:HealthGoal) REQUIRE g.id IS UNIQUE",
];

/// Merge the user; `created_at` only on first creation
const MERGE_USER: &str = r#"
    MERGE (u:User {id: $user_id})
    ON CREATE SET u.created_at = datetime($occurred_at)
    SET u.updated_at = datetime($occurred_at)
"#;

/// Merge the food and overwrite its whole descriptive projection
const MERGE_FOOD: &str = r#"
    MERGE (f:Food {id: $food_id})
    SET f.name = $food_name,
        f.name_th = $food_name_th,
        f.name_en = $food_name_en,
        f.category = $food_category,
        f.region = $food_region,
        f.sodium_level = $food_sodium_level,
        f.sodium_mg = $food_sodium_mg,
        f.calories = $food_calories,
        f.protein = $food_protein,
        f.carbs = $food_carbs,
        f.fat = $food_fat,
        f.spice_level = $food_spice_level
"#;

const CREATE_SWIPED: &str = r#"
    CREATE (u)-[:SWIPED {
        action: $action,
        mood: $mood,
        selected_region: $selected_region,
        created_at: datetime($occurred_at)
    }]->(f)
"#;

const CREATE_ADJUSTED_RECIPE: &str = r#"
    CREATE (u)-[:ADJUSTED_RECIPE {
        adjust_type: $adjust_type,
        source: $source,
        prompt: $prompt,
        sodium_delta: $sodium_delta,
        sugar_delta: $sugar_delta,
        calories_delta: $calories_delta,
        bp_risk_delta: $bp_risk_delta,
        taste_retention: $taste_retention,
        created_at: datetime($occurred_at)
    }]->(f)
"#;

const CREATE_LOGGED_MEAL: &str = r#"
    CREATE (u)-[:LOGGED_MEAL {
        meal_type: $meal_type,
        is_modified: $is_modified,
        sodium_saved: $sodium_saved,
        calories: $calories,
        points_earned: $points_earned,
        created_at: datetime($occurred_at)
    }]->(f)
"#;

const SET_PROFILE: &str = r#"
    SET u.region = $region,
        u.sodium_limit = $sodium_limit,
        u.spice_level = $spice_level,
        u.health_goals = $health_goals,
        u.points = $points,
        u.streak_days = $streak_days
"#;

const DELETE_PREFERRED_REGION: &str =
    "MATCH (:User {id: $user_id})-[r:PREFERS_REGION]->(:Region) DELETE r";

const CREATE_PREFERRED_REGION: &str = r#"
    MATCH (u:User {id: $user_id})
    MERGE (r:Region {id: $region})
    CREATE (u)-[:PREFERS_REGION {created_at: datetime($occurred_at)}]->(r)
"#;

const DELETE_HEALTH_GOALS: &str =
    "MATCH (:User {id: $user_id})-[g:HAS_GOAL]->(:HealthGoal) DELETE g";

const CREATE_HEALTH_GOALS: &str = r#"
    MATCH (u:User {id: $user_id})
    UNWIND $health_goals AS goal
    MERGE (g:HealthGoal {id: goal})
    CREATE (u)-[:HAS_GOAL {created_at: datetime($occurred_at)}]->(g)
"#;

/// Cypher for one insight query.
///
/// Ties on count are broken by the group label, ascending.
fn insight_cypher(q: InsightQuery) -> &'static str {
    match q {
        InsightQuery::SwipeBreakdown => {
            r#"
            MATCH (:User {id: $user_id})-[s:SWIPED]->(:Food)
            RETURN s.action AS action, count(s) AS count
            ORDER BY count DESC, action ASC
            "#
        }
        InsightQuery::TopLikedFoods | InsightQuery::TopDislikedFoods => {
            r#"
            MATCH (:User {id: $user_id})-[s:SWIPED]->(f:Food)
            WHERE s.action = $action
            RETURN f.id AS foodId,
                   coalesce(f.name_th, f.name_en, f.name, f.id) AS name,
                   count(s) AS count
            ORDER BY count DESC, foodId ASC
            LIMIT $limit
            "#
        }
        InsightQuery::PreferredRegions => {
            r#"
            MATCH (:User {id: $user_id})-[s:SWIPED]->(f:Food)
            WHERE s.action = $action AND f.region IS NOT NULL
            RETURN f.region AS region, count(s) AS count
            ORDER BY count DESC, region ASC
            LIMIT $limit
            "#
        }
        InsightQuery::AdjustmentPatterns => {
            r#"
            MATCH (:User {id: $user_id})-[a:ADJUSTED_RECIPE]->(:Food)
            RETURN a.adjust_type AS adjustType,
                   count(a) AS count,
                   avg(a.taste_retention) AS avgTasteRetention
            ORDER BY count DESC, adjustType ASC
            "#
        }
        InsightQuery::MealSummary => {
            r#"
            OPTIONAL MATCH (:User {id: $user_id})-[m:LOGGED_MEAL]->(:Food)
            RETURN count(m) AS mealLogs,
                   coalesce(sum(coalesce(m.sodium_saved, 0)), 0) AS sodiumSaved,
                   coalesce(avg(coalesce(m.calories, 0)), 0.0) AS avgCalories,
                   coalesce(sum(coalesce(m.points_earned, 0)), 0) AS pointsEarned
            "#
        }
    }
}

/// Statements of a profile sync, in execution order
fn profile_sync_statements(event: &ProfileSync) -> Vec<String> {
    let mut statements = vec![
        format!("{MERGE_USER}{SET_PROFILE}"),
        DELETE_PREFERRED_REGION.to_string(),
    ];
    if event.profile.region.is_some() {
        statements.push(CREATE_PREFERRED_REGION.to_string());
    }
    statements.push(DELETE_HEALTH_GOALS.to_string());
    if !event.profile.health_goals.is_empty() {
        statements.push(CREATE_HEALTH_GOALS.to_string());
    }
    statements
}

// ============================================================================
// Parameter helpers
// ============================================================================

fn scalar_param(value: &Option<Scalar>) -> BoltType {
    match value {
        Some(Scalar::Integer(i)) => (*i).into(),
        Some(Scalar::Float(f)) => (*f).into(),
        Some(Scalar::Text(s)) => s.clone().into(),
        None => BoltType::Null(BoltNull),
    }
}

fn with_food(q: Query, food: &FoodProjection) -> Query {
    q.param("food_id", food.id.clone())
        .param("food_name", food.name.clone())
        .param("food_name_th", food.name_th.clone())
        .param("food_name_en", food.name_en.clone())
        .param("food_category", food.category.clone())
        .param("food_region", food.region.clone())
        .param("food_sodium_level", scalar_param(&food.sodium_level))
        .param("food_sodium_mg", food.sodium_mg)
        .param("food_calories", food.calories)
        .param("food_protein", food.protein)
        .param("food_carbs", food.carbs)
        .param("food_fat", food.fat)
        .param("food_spice_level", scalar_param(&food.spice_level))
}

fn with_user(q: Query, user_id: &str, occurred_at: &chrono::DateTime<chrono::Utc>) -> Query {
    q.param("user_id", user_id.to_string())
        .param("occurred_at", occurred_at.to_rfc3339())
}

async fn collect_rows(txn: &mut Txn, q: Query, columns: &[&str]) -> Result<Vec<RawRecord>> {
    let mut stream = txn.execute(q).await?;
    let mut rows = Vec::new();
    while let Some(row) = stream.next(txn.handle()).await? {
        let mut record = Vec::with_capacity(columns.len());
        for column in columns {
            let value: GraphValue = row
                .get(column)
                .with_context(|| format!("Result row has no column {}", column))?;
            record.push((column.to_string(), value));
        }
        rows.push(record);
    }
    Ok(rows)
}

impl Neo4jClient {
    /// Connect to Neo4j using the given settings.
    ///
    /// Does not touch the schema; constraints are created by the readiness gate.
    pub async fn connect(settings: &GraphSettings) -> Result<Self> {
        let mut builder = ConfigBuilder::default()
            .uri(settings.uri.as_str())
            .user(settings.user.as_str())
            .password(settings.password.as_str());
        if let Some(db) = &settings.database {
            builder = builder.db(db.as_str());
        }
        if let Some(max) = settings.max_connections {
            builder = builder.max_connections(max);
        }
        let config = builder.build().context("Invalid Neo4j configuration")?;

        let graph = Graph::connect(config)
            .await
            .context("Failed to connect to Neo4j")?;

        tracing::info!(uri = %settings.uri, "Connected to Neo4j");
        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Run statements in one write transaction, rolling back on failure.
    ///
    /// The pooled connection goes back to the pool when the transaction is
    /// committed, rolled back, or dropped with the enclosing future.
    pub(crate) async fn run_write(&self, queries: Vec<Query>) -> Result<()> {
        let mut txn = self
            .graph
            .start_txn()
            .await
            .context("Failed to open write transaction")?;

        if let Err(e) = txn.run_queries(queries).await {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!("Rollback after failed write also failed: {}", rollback);
            }
            return Err(anyhow::Error::new(e).context("Write transaction failed"));
        }

        txn.commit()
            .await
            .context("Failed to commit write transaction")?;
        Ok(())
    }

    /// Run one query in its own transaction and collect the declared columns.
    pub(crate) async fn run_read(&self, q: Query, columns: &[&str]) -> Result<Vec<RawRecord>> {
        let mut txn = self
            .graph
            .start_txn()
            .await
            .context("Failed to open read transaction")?;

        match collect_rows(&mut txn, q, columns).await {
            Ok(rows) => {
                txn.commit()
                    .await
                    .context("Failed to close read transaction")?;
                Ok(rows)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    tracing::warn!("Rollback after failed read also failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    pub async fn verify_connectivity(&self) -> Result<()> {
        let rows = self
            .run_read(query("RETURN 1 AS ping"), &["ping"])
            .await
            .context("Neo4j connectivity check failed")?;
        anyhow::ensure!(rows.len() == 1, "Neo4j connectivity check returned no row");
        Ok(())
    }

    /// Create the uniqueness constraints in one write transaction
    pub async fn ensure_constraints(&self) -> Result<()> {
        self.run_write(CONSTRAINTS.iter().map(|c| query(c)).collect())
            .await
            .context("Failed to create graph constraints")
    }

    // ========================================================================
    // Event ingestion
    // ========================================================================

    pub async fn sync_profile(&self, event: &ProfileSync) -> Result<()> {
        let p = &event.profile;
        let queries = profile_sync_statements(event)
            .iter()
            .map(|cypher| {
                with_user(query(cypher), &event.user_id, &event.occurred_at)
                    .param("region", p.region.clone())
                    .param("sodium_limit", p.sodium_limit)
                    .param("spice_level", scalar_param(&p.spice_level))
                    .param("health_goals", p.health_goals.clone())
                    .param("points", p.points)
                    .param("streak_days", p.streak_days)
            })
            .collect();
        self.run_write(queries).await
    }

    pub async fn record_swipe(&self, event: &SwipeEvent) -> Result<()> {
        let cypher = format!("{MERGE_USER}{MERGE_FOOD}{CREATE_SWIPED}");
        let q = with_food(
            with_user(query(&cypher), &event.user_id, &event.occurred_at),
            &event.food,
        )
        .param("action", event.action.clone())
        .param("mood", event.mood.clone())
        .param("selected_region", event.selected_region.clone());
        self.run_write(vec![q]).await
    }

    pub async fn record_adjustment(&self, event: &AdjustmentEvent) -> Result<()> {
        let cypher = format!("{MERGE_USER}{MERGE_FOOD}{CREATE_ADJUSTED_RECIPE}");
        let q = with_food(
            with_user(query(&cypher), &event.user_id, &event.occurred_at),
            &event.food,
        )
        .param("adjust_type", event.adjust_type.clone())
        .param("source", event.source.clone())
        .param("prompt", event.prompt.clone())
        .param("sodium_delta", event.impacts.sodium)
        .param("sugar_delta", event.impacts.sugar)
        .param("calories_delta", event.impacts.calories)
        .param("bp_risk_delta", event.impacts.bp_risk)
        .param("taste_retention", event.taste_retention);
        self.run_write(vec![q]).await
    }

    pub async fn record_meal_log(&self, event: &MealLogEvent) -> Result<()> {
        let cypher = format!("{MERGE_USER}{MERGE_FOOD}{CREATE_LOGGED_MEAL}");
        let m = &event.meal;
        let q = with_food(
            with_user(query(&cypher), &event.user_id, &event.occurred_at),
            &event.food,
        )
        .param("meal_type", m.meal_type.clone())
        .param("is_modified", m.is_modified)
        .param("sodium_saved", m.sodium_saved)
        .param("calories", m.calories)
        .param("points_earned", m.points_earned);
        self.run_write(vec![q]).await
    }

    // ========================================================================
    // Insights
    // ========================================================================

    pub async fn run_insight(&self, q: InsightQuery, user_id: &str) -> Result<Vec<RawRecord>> {
        let mut cypher = query(insight_cypher(q))
            .param("user_id", user_id.to_string())
            .param("limit", TOP_LIMIT as i64);
        if let Some(action) = q.swipe_action() {
            cypher = cypher.param("action", action);
        }
        self.run_read(cypher, q.columns())
            .await
            .with_context(|| format!("Insight query {} failed", q.response_key()))
    }
}

/// Connects real Neo4j handles
pub struct Neo4jConnector;

#[async_trait]
impl StoreConnector for Neo4jConnector {
    async fn connect(&self, settings: &GraphSettings) -> Result<Arc<dyn InteractionStore>> {
        Ok(Arc::new(Neo4jClient::connect(settings).await?))
    }
}

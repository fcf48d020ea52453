//! In-memory mock implementation of InteractionStore for testing.
//!
//! Holds the whole graph behind one `tokio::sync::RwLock` so each write
//! method is atomic, like the single transaction it stands in for.
//! Conditionally compiled with `#[cfg(test)]`.
#![allow(dead_code)]

use crate::neo4j::models::*;
use crate::neo4j::traits::{InteractionStore, StoreConnector};
use crate::neo4j::value::{GraphValue, RawRecord};
use crate::GraphSettings;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct MockUser {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub profile: UserProfile,
}

#[derive(Debug, Clone)]
pub struct SwipeEdge {
    pub user_id: String,
    pub food_id: String,
    pub action: String,
    pub mood: Option<String>,
    pub selected_region: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AdjustmentEdge {
    pub user_id: String,
    pub food_id: String,
    pub adjust_type: String,
    pub source: Option<String>,
    pub prompt: Option<String>,
    pub impacts: RecipeImpacts,
    pub taste_retention: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MealLogEdge {
    pub user_id: String,
    pub food_id: String,
    pub meal: MealLog,
    pub created_at: DateTime<Utc>,
}

/// Nodes and relationships of the mock graph
#[derive(Debug, Default)]
pub struct MockGraph {
    pub users: HashMap<String, MockUser>,
    pub foods: HashMap<String, FoodProjection>,
    pub regions: HashSet<String>,
    pub health_goals: HashSet<String>,
    /// user id -> region id
    pub prefers_region: HashMap<String, String>,
    /// user id -> goal ids
    pub has_goal: HashMap<String, Vec<String>>,
    pub swipes: Vec<SwipeEdge>,
    pub adjustments: Vec<AdjustmentEdge>,
    pub meal_logs: Vec<MealLogEdge>,
}

impl MockGraph {
    fn merge_user(&mut self, user_id: &str, at: DateTime<Utc>) -> &mut MockUser {
        let user = self
            .users
            .entry(user_id.to_string())
            .or_insert_with(|| MockUser {
                id: user_id.to_string(),
                created_at: at,
                updated_at: at,
                profile: UserProfile::default(),
            });
        user.updated_at = at;
        user
    }

    fn merge_food(&mut self, food: &FoodProjection) {
        self.foods.insert(food.id.clone(), food.clone());
    }

    /// Number of `SWIPED` edges between a user and a food
    pub fn swipe_count(&self, user_id: &str, food_id: &str) -> usize {
        self.swipes
            .iter()
            .filter(|s| s.user_id == user_id && s.food_id == food_id)
            .count()
    }

    pub fn goals_of(&self, user_id: &str) -> Vec<String> {
        let mut goals = self.has_goal.get(user_id).cloned().unwrap_or_default();
        goals.sort();
        goals
    }
}

/// In-memory mock implementation of InteractionStore for testing.
pub struct MockGraphStore {
    pub graph: RwLock<MockGraph>,
    /// Number of `ensure_constraints` calls that reached the store
    pub constraint_calls: AtomicUsize,
    /// While set, `ensure_constraints` fails
    pub fail_constraints: AtomicBool,
    /// While set, every write fails
    pub fail_writes: AtomicBool,
    /// Insight query that fails when run
    pub failing_insight: std::sync::Mutex<Option<InsightQuery>>,
    pub close_calls: AtomicUsize,
}

impl MockGraphStore {
    /// Create a new empty MockGraphStore.
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(MockGraph::default()),
            constraint_calls: AtomicUsize::new(0),
            fail_constraints: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            failing_insight: std::sync::Mutex::new(None),
            close_calls: AtomicUsize::new(0),
        }
    }

    pub fn fail_insight(&self, query: InsightQuery) {
        *self.failing_insight.lock().unwrap() = Some(query);
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("mock: write transaction failed");
        }
        Ok(())
    }
}

impl Default for MockGraphStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Aggregation helpers
// ============================================================================

/// Count items per label, then sort by count desc and label asc
fn ranked_counts<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<(String, i64)> {
    let mut counts: HashMap<&str, i64> = HashMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    let mut ranked: Vec<(String, i64)> = counts
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

fn row(pairs: Vec<(&str, GraphValue)>) -> RawRecord {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

impl MockGraph {
    fn insight(&self, query: InsightQuery, user_id: &str) -> Vec<RawRecord> {
        let swipes = self.swipes.iter().filter(|s| s.user_id == user_id);
        match query {
            InsightQuery::SwipeBreakdown => ranked_counts(swipes.map(|s| s.action.as_str()))
                .into_iter()
                .map(|(action, count)| {
                    row(vec![
                        ("action", GraphValue::String(action)),
                        ("count", GraphValue::Integer(count)),
                    ])
                })
                .collect(),
            InsightQuery::TopLikedFoods | InsightQuery::TopDislikedFoods => {
                let action = query.swipe_action().unwrap_or_default();
                ranked_counts(
                    swipes
                        .filter(|s| s.action == action)
                        .map(|s| s.food_id.as_str()),
                )
                .into_iter()
                .take(TOP_LIMIT)
                .map(|(food_id, count)| {
                    let name = self
                        .foods
                        .get(&food_id)
                        .map(|f| f.label().to_string())
                        .unwrap_or_else(|| food_id.clone());
                    row(vec![
                        ("foodId", GraphValue::String(food_id)),
                        ("name", GraphValue::String(name)),
                        ("count", GraphValue::Integer(count)),
                    ])
                })
                .collect()
            }
            InsightQuery::PreferredRegions => ranked_counts(
                swipes
                    .filter(|s| s.action == "like")
                    .filter_map(|s| self.foods.get(&s.food_id)?.region.as_deref()),
            )
            .into_iter()
            .take(TOP_LIMIT)
            .map(|(region, count)| {
                row(vec![
                    ("region", GraphValue::String(region)),
                    ("count", GraphValue::Integer(count)),
                ])
            })
            .collect(),
            InsightQuery::AdjustmentPatterns => {
                let adjustments: Vec<&AdjustmentEdge> = self
                    .adjustments
                    .iter()
                    .filter(|a| a.user_id == user_id)
                    .collect();
                ranked_counts(adjustments.iter().map(|a| a.adjust_type.as_str()))
                    .into_iter()
                    .map(|(adjust_type, count)| {
                        let retained: Vec<f64> = adjustments
                            .iter()
                            .filter(|a| a.adjust_type == adjust_type)
                            .filter_map(|a| a.taste_retention)
                            .collect();
                        let avg = if retained.is_empty() {
                            GraphValue::Null
                        } else {
                            GraphValue::Float(retained.iter().sum::<f64>() / retained.len() as f64)
                        };
                        row(vec![
                            ("adjustType", GraphValue::String(adjust_type)),
                            ("count", GraphValue::Integer(count)),
                            ("avgTasteRetention", avg),
                        ])
                    })
                    .collect()
            }
            InsightQuery::MealSummary => {
                let meals: Vec<&MealLog> = self
                    .meal_logs
                    .iter()
                    .filter(|m| m.user_id == user_id)
                    .map(|m| &m.meal)
                    .collect();
                let count = meals.len();
                let sodium: f64 = meals.iter().filter_map(|m| m.sodium_saved).sum();
                let calories: f64 = meals.iter().map(|m| m.calories.unwrap_or(0.0)).sum();
                let points: i64 = meals.iter().map(|m| m.points_earned.unwrap_or(0)).sum();
                let avg = if count == 0 {
                    0.0
                } else {
                    calories / count as f64
                };
                vec![row(vec![
                    ("mealLogs", GraphValue::Integer(count as i64)),
                    ("sodiumSaved", GraphValue::Float(sodium)),
                    ("avgCalories", GraphValue::Float(avg)),
                    ("pointsEarned", GraphValue::Integer(points)),
                ])]
            }
        }
    }
}

#[async_trait]
impl InteractionStore for MockGraphStore {
    async fn verify_connectivity(&self) -> Result<()> {
        Ok(())
    }

    async fn ensure_constraints(&self) -> Result<()> {
        self.constraint_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_constraints.load(Ordering::SeqCst) {
            anyhow::bail!("mock: constraint creation failed");
        }
        Ok(())
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn sync_profile(&self, event: &ProfileSync) -> Result<()> {
        self.check_writable()?;
        let mut graph = self.graph.write().await;
        let user = graph.merge_user(&event.user_id, event.occurred_at);
        user.profile = event.profile.clone();

        graph.prefers_region.remove(&event.user_id);
        if let Some(region) = &event.profile.region {
            graph.regions.insert(region.clone());
            graph
                .prefers_region
                .insert(event.user_id.clone(), region.clone());
        }

        graph.has_goal.remove(&event.user_id);
        if !event.profile.health_goals.is_empty() {
            for goal in &event.profile.health_goals {
                graph.health_goals.insert(goal.clone());
            }
            graph
                .has_goal
                .insert(event.user_id.clone(), event.profile.health_goals.clone());
        }
        Ok(())
    }

    async fn record_swipe(&self, event: &SwipeEvent) -> Result<()> {
        self.check_writable()?;
        let mut graph = self.graph.write().await;
        graph.merge_user(&event.user_id, event.occurred_at);
        graph.merge_food(&event.food);
        graph.swipes.push(SwipeEdge {
            user_id: event.user_id.clone(),
            food_id: event.food.id.clone(),
            action: event.action.clone(),
            mood: event.mood.clone(),
            selected_region: event.selected_region.clone(),
            created_at: event.occurred_at,
        });
        Ok(())
    }

    async fn record_adjustment(&self, event: &AdjustmentEvent) -> Result<()> {
        self.check_writable()?;
        let mut graph = self.graph.write().await;
        graph.merge_user(&event.user_id, event.occurred_at);
        graph.merge_food(&event.food);
        graph.adjustments.push(AdjustmentEdge {
            user_id: event.user_id.clone(),
            food_id: event.food.id.clone(),
            adjust_type: event.adjust_type.clone(),
            source: event.source.clone(),
            prompt: event.prompt.clone(),
            impacts: event.impacts.clone(),
            taste_retention: event.taste_retention,
            created_at: event.occurred_at,
        });
        Ok(())
    }

    async fn record_meal_log(&self, event: &MealLogEvent) -> Result<()> {
        self.check_writable()?;
        let mut graph = self.graph.write().await;
        graph.merge_user(&event.user_id, event.occurred_at);
        graph.merge_food(&event.food);
        graph.meal_logs.push(MealLogEdge {
            user_id: event.user_id.clone(),
            food_id: event.food.id.clone(),
            meal: event.meal.clone(),
            created_at: event.occurred_at,
        });
        Ok(())
    }

    async fn run_insight(&self, query: InsightQuery, user_id: &str) -> Result<Vec<RawRecord>> {
        if *self.failing_insight.lock().unwrap() == Some(query) {
            anyhow::bail!("mock: insight query {} failed", query.response_key());
        }
        Ok(self.graph.read().await.insight(query, user_id))
    }
}

/// Connector handing out one shared mock store, counting connection attempts.
pub struct MockConnector {
    pub store: Arc<MockGraphStore>,
    pub connects: AtomicUsize,
    pub fail: AtomicBool,
}

impl MockConnector {
    pub fn new(store: Arc<MockGraphStore>) -> Self {
        Self {
            store,
            connects: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for MockConnector {
    async fn connect(&self, _settings: &GraphSettings) -> Result<Arc<dyn InteractionStore>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("mock: connection refused");
        }
        Ok(self.store.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn swipe(user: &str, food: &str, action: &str) -> SwipeEvent {
        SwipeEvent {
            user_id: user.into(),
            food: FoodProjection {
                id: food.into(),
                ..Default::default()
            },
            action: action.into(),
            mood: None,
            selected_region: None,
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_ranking_breaks_ties_by_label() {
        let store = MockGraphStore::new();
        for (food, action) in [("b", "like"), ("a", "like"), ("c", "like"), ("c", "like")] {
            store.record_swipe(&swipe("u1", food, action)).await.unwrap();
        }
        let rows = store
            .run_insight(InsightQuery::TopLikedFoods, "u1")
            .await
            .unwrap();
        let ids: Vec<&GraphValue> = rows.iter().map(|r| &r[0].1).collect();
        assert_eq!(
            ids,
            [
                &GraphValue::from("c"),
                &GraphValue::from("a"),
                &GraphValue::from("b")
            ]
        );
    }

    #[tokio::test]
    async fn test_insights_are_scoped_to_user() {
        let store = MockGraphStore::new();
        store.record_swipe(&swipe("u1", "f1", "like")).await.unwrap();
        store.record_swipe(&swipe("u2", "f1", "like")).await.unwrap();
        let rows = store
            .run_insight(InsightQuery::SwipeBreakdown, "u2")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][1].1, GraphValue::Integer(1));
    }
}

//! Request payloads for the event ingestors and their conversion into graph events

use crate::error::{GraphError, GraphResult};
use crate::neo4j::models::*;
use chrono::{DateTime, Utc};
use serde::Deserialize;

// ============================================================================
// Shared payload pieces
// ============================================================================

/// Menu identifiers arrive as strings or as integers; both are stored as strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FoodId {
    Text(String),
    Number(i64),
}

impl FoodId {
    fn into_key(self) -> Option<String> {
        match self {
            FoodId::Text(s) => non_blank(Some(s)),
            FoodId::Number(n) => Some(n.to_string()),
        }
    }
}

/// The `menu` object sent with swipe, adjustment and meal-log events.
///
/// Only the food projection fields are read; anything else in the object is dropped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuPayload {
    pub id: Option<FoodId>,
    pub name: Option<String>,
    pub name_th: Option<String>,
    pub name_en: Option<String>,
    pub category: Option<String>,
    pub region: Option<String>,
    pub sodium_level: Option<Scalar>,
    pub sodium_mg: Option<f64>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub spice_level: Option<Scalar>,
}

impl MenuPayload {
    /// Field-by-field projection onto the `Food` node
    fn into_projection(self) -> GraphResult<FoodProjection> {
        let id = self
            .id
            .and_then(FoodId::into_key)
            .ok_or_else(|| GraphError::validation("menu.id is required"))?;
        Ok(FoodProjection {
            id,
            name: self.name,
            name_th: self.name_th,
            name_en: self.name_en,
            category: self.category,
            region: non_blank(self.region),
            sodium_level: self.sodium_level,
            sodium_mg: self.sodium_mg,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            spice_level: self.spice_level,
        })
    }
}

/// `health_goals` may be a list or, under the legacy `health_goal` key, a single string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum GoalList {
    One(String),
    Many(Vec<String>),
}

impl GoalList {
    fn into_vec(self) -> Vec<String> {
        match self {
            GoalList::One(g) => vec![g],
            GoalList::Many(gs) => gs,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, field: &str) -> GraphResult<String> {
    non_blank(value).ok_or_else(|| GraphError::validation(format!("{} is required", field)))
}

fn menu(value: Option<MenuPayload>) -> GraphResult<FoodProjection> {
    value
        .ok_or_else(|| GraphError::validation("menu is required"))?
        .into_projection()
}

/// Parse `occurredAt`, defaulting to `now` when absent
fn occurred_at(value: Option<String>, now: DateTime<Utc>) -> GraphResult<DateTime<Utc>> {
    match non_blank(value) {
        None => Ok(now),
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| GraphError::validation("occurredAt must be an RFC 3339 timestamp")),
    }
}

/// Trimmed, non-empty, distinct goals in first-seen order
fn distinct_goals(goals: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(goals.len());
    for goal in goals {
        let goal = goal.trim();
        if !goal.is_empty() && !out.iter().any(|g| g == goal) {
            out.push(goal.to_string());
        }
    }
    out
}

// ============================================================================
// Profile sync
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePayload {
    pub region: Option<String>,
    pub health_goals: Option<GoalList>,
    pub health_goal: Option<GoalList>,
    pub spice_level: Option<Scalar>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub sodium_limit: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub sodium_target: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub points: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub streak_days: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSyncRequest {
    pub user_id: Option<String>,
    #[serde(default)]
    pub profile: ProfilePayload,
    pub occurred_at: Option<String>,
}

impl ProfileSyncRequest {
    pub fn into_event(self, now: DateTime<Utc>) -> GraphResult<ProfileSync> {
        let user_id = required(self.user_id, "userId")?;
        let occurred_at = occurred_at(self.occurred_at, now)?;
        let p = self.profile;
        let goals = p
            .health_goals
            .or(p.health_goal)
            .map(GoalList::into_vec)
            .unwrap_or_default();

        Ok(ProfileSync {
            user_id,
            profile: UserProfile {
                region: non_blank(p.region),
                health_goals: distinct_goals(goals),
                spice_level: p.spice_level,
                sodium_limit: p.sodium_limit.or(p.sodium_target),
                points: p.points,
                streak_days: p.streak_days,
            },
            occurred_at,
        })
    }
}

// ============================================================================
// Swipe
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwipeRequest {
    pub user_id: Option<String>,
    pub menu: Option<MenuPayload>,
    pub action: Option<String>,
    pub selected_region: Option<String>,
    pub mood: Option<String>,
    pub occurred_at: Option<String>,
}

impl SwipeRequest {
    pub fn into_event(self, now: DateTime<Utc>) -> GraphResult<SwipeEvent> {
        Ok(SwipeEvent {
            user_id: required(self.user_id, "userId")?,
            food: menu(self.menu)?,
            action: required(self.action, "action")?,
            mood: non_blank(self.mood),
            selected_region: non_blank(self.selected_region),
            occurred_at: occurred_at(self.occurred_at, now)?,
        })
    }
}

// ============================================================================
// Recipe adjustment
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustmentRequest {
    pub user_id: Option<String>,
    pub menu: Option<MenuPayload>,
    pub adjust_type: Option<String>,
    pub source: Option<String>,
    pub prompt: Option<String>,
    #[serde(default)]
    pub impacts: RecipeImpacts,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub taste_retention: Option<f64>,
    pub occurred_at: Option<String>,
}

impl AdjustmentRequest {
    /// Impact and retention numbers come from the recipe assistant and are kept verbatim.
    pub fn into_event(self, now: DateTime<Utc>) -> GraphResult<AdjustmentEvent> {
        Ok(AdjustmentEvent {
            user_id: required(self.user_id, "userId")?,
            food: menu(self.menu)?,
            adjust_type: required(self.adjust_type, "adjustType")?,
            source: self.source,
            prompt: self.prompt,
            impacts: self.impacts,
            taste_retention: self.taste_retention,
            occurred_at: occurred_at(self.occurred_at, now)?,
        })
    }
}

// ============================================================================
// Meal log
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealLogRequest {
    pub user_id: Option<String>,
    pub menu: Option<MenuPayload>,
    pub meal_log: Option<MealLog>,
    pub occurred_at: Option<String>,
}

impl MealLogRequest {
    pub fn into_event(self, now: DateTime<Utc>) -> GraphResult<MealLogEvent> {
        Ok(MealLogEvent {
            user_id: required(self.user_id, "userId")?,
            food: menu(self.menu)?,
            meal: self
                .meal_log
                .ok_or_else(|| GraphError::validation("mealLog is required"))?,
            occurred_at: occurred_at(self.occurred_at, now)?,
        })
    }
}

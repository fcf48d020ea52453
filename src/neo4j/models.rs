//! Graph models for users, foods and the interaction events linking them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

// ============================================================================
// Scalars
// ============================================================================

/// A property that upstream clients send either as a number or as a label
/// (e.g. `spice_level: 3` or `spice_level: "hot"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

/// A number sent either as a JSON number or as a numeric string
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

/// Deserialize an optional number, also accepting numeric strings like `"85"`.
///
/// Blank strings read as absent; any other non-numeric string is an error.
pub fn deserialize_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumberOrText::Number(n)) => Ok(Some(n)),
        Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(NumberOrText::Text(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
    }
}

// ============================================================================
// Food Node
// ============================================================================

/// Descriptive projection written onto a `Food` node.
///
/// Every event referencing the food overwrites all twelve descriptive fields,
/// so a field absent from the latest payload ends up null on the node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FoodProjection {
    pub id: String,
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

impl FoodProjection {
    /// Display label: `name_th`, then `name_en`, then `name`, then the id.
    pub fn label(&self) -> &str {
        self.name_th
            .as_deref()
            .or(self.name_en.as_deref())
            .or(self.name.as_deref())
            .unwrap_or(&self.id)
    }
}

// ============================================================================
// User profile
// ============================================================================

/// Profile scalars written onto a `User` node during a profile sync
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub region: Option<String>,
    /// Distinct, trimmed, first-seen order
    pub health_goals: Vec<String>,
    pub spice_level: Option<Scalar>,
    pub sodium_limit: Option<f64>,
    pub points: Option<i64>,
    pub streak_days: Option<i64>,
}

// ============================================================================
// Events
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSync {
    pub user_id: String,
    pub profile: UserProfile,
    pub occurred_at: DateTime<Utc>,
}

/// One preference swipe (`SWIPED` edge)
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeEvent {
    pub user_id: String,
    pub food: FoodProjection,
    pub action: String,
    pub mood: Option<String>,
    pub selected_region: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Nutritional deltas reported by the recipe-adjustment assistant
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecipeImpacts {
    #[serde(default, deserialize_with = "deserialize_number")]
    pub sodium: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub sugar: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub bp_risk: Option<f64>,
}

/// One recipe adjustment (`ADJUSTED_RECIPE` edge)
#[derive(Debug, Clone, PartialEq)]
pub struct AdjustmentEvent {
    pub user_id: String,
    pub food: FoodProjection,
    pub adjust_type: String,
    pub source: Option<String>,
    pub prompt: Option<String>,
    pub impacts: RecipeImpacts,
    pub taste_retention: Option<f64>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MealLog {
    pub meal_type: Option<String>,
    pub is_modified: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub sodium_saved: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub calories: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_number")]
    pub points_earned: Option<i64>,
}

/// One logged meal (`LOGGED_MEAL` edge)
#[derive(Debug, Clone, PartialEq)]
pub struct MealLogEvent {
    pub user_id: String,
    pub food: FoodProjection,
    pub meal: MealLog,
    pub occurred_at: DateTime<Utc>,
}

// ============================================================================
// Insight queries
// ============================================================================

/// The six per-user aggregation queries behind the insights endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsightQuery {
    SwipeBreakdown,
    TopLikedFoods,
    TopDislikedFoods,
    PreferredRegions,
    AdjustmentPatterns,
    MealSummary,
}

/// Row limit for the "top N" insight queries
pub const TOP_LIMIT: usize = 5;

impl InsightQuery {
    pub const ALL: [InsightQuery; 6] = [
        InsightQuery::SwipeBreakdown,
        InsightQuery::TopLikedFoods,
        InsightQuery::TopDislikedFoods,
        InsightQuery::PreferredRegions,
        InsightQuery::AdjustmentPatterns,
        InsightQuery::MealSummary,
    ];

    /// Key under which the result appears in the insights response
    pub fn response_key(&self) -> &'static str {
        match self {
            InsightQuery::SwipeBreakdown => "swipeBreakdown",
            InsightQuery::TopLikedFoods => "topLikedFoods",
            InsightQuery::TopDislikedFoods => "topDislikedFoods",
            InsightQuery::PreferredRegions => "preferredRegions",
            InsightQuery::AdjustmentPatterns => "adjustmentPatterns",
            InsightQuery::MealSummary => "mealSummary",
        }
    }

    /// Declared result columns, in order
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            InsightQuery::SwipeBreakdown => &["action", "count"],
            InsightQuery::TopLikedFoods | InsightQuery::TopDislikedFoods => {
                &["foodId", "name", "count"]
            }
            InsightQuery::PreferredRegions => &["region", "count"],
            InsightQuery::AdjustmentPatterns => &["adjustType", "count", "avgTasteRetention"],
            InsightQuery::MealSummary => {
                &["mealLogs", "sodiumSaved", "avgCalories", "pointsEarned"]
            }
        }
    }

    /// Swipe action counted by the food ranking queries
    pub fn swipe_action(&self) -> Option<&'static str> {
        match self {
            InsightQuery::TopLikedFoods | InsightQuery::PreferredRegions => Some("like"),
            InsightQuery::TopDislikedFoods => Some("dislike"),
            _ => None,
        }
    }
}

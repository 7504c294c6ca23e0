use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::council::NutritionSummary;

#[derive(Debug, Serialize)]
pub struct AnalyzeImageResponse {
    pub detected_text: String,
}

#[derive(Debug, Deserialize)]
pub struct LogMealRequest {
    pub user_id: Uuid,
    /// User-verified dish description from the Vision Step.
    pub verified_text: String,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LogMealResponse {
    pub meal_id: Uuid,
    pub dish_name: String,
    pub nutrition: NutritionSummary,
    pub ai_advice: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user_id: Uuid,
    pub daily_goal: i32,
    pub total_consumed: f64,
    pub remaining: f64,
    pub meals_today: usize,
    pub nutrition_totals: NutritionSummary,
}

#[derive(Debug, Serialize)]
pub struct MealListItem {
    pub id: Uuid,
    pub dish_name: String,
    pub calories: f64,
    pub ai_advice: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    20
}

use sqlx::{FromRow, PgPool};
use time::{OffsetDateTime, Time, UtcOffset};
use uuid::Uuid;

use crate::council::{round1, NutritionSummary};

/// One logged meal. Inserted exactly once per successful pipeline run and
/// never updated afterwards.
#[derive(Debug, Clone, FromRow)]
pub struct MealLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub timestamp: OffsetDateTime,
    pub dish_name: String,
    pub image_url: Option<String>,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fats: f64,
    pub ai_advice: String,
}

const COLUMNS: &str =
    "id, user_id, timestamp, dish_name, image_url, calories, protein, carbs, fats, ai_advice";

impl MealLog {
    pub async fn insert(
        db: &PgPool,
        user_id: Uuid,
        dish_name: &str,
        image_url: Option<&str>,
        nutrition: &NutritionSummary,
        ai_advice: &str,
    ) -> Result<MealLog, sqlx::Error> {
        sqlx::query_as::<_, MealLog>(&format!(
            r#"
            INSERT INTO meal_logs (user_id, dish_name, image_url, calories, protein, carbs, fats, ai_advice)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(dish_name)
        .bind(image_url)
        .bind(nutrition.calories)
        .bind(nutrition.protein)
        .bind(nutrition.carbs)
        .bind(nutrition.fats)
        .bind(ai_advice)
        .fetch_one(db)
        .await
    }

    /// Meals logged at or after `since`, oldest first. The boundary is
    /// inclusive: a record stamped exactly at `since` counts.
    pub async fn list_since(
        db: &PgPool,
        user_id: Uuid,
        since: OffsetDateTime,
    ) -> Result<Vec<MealLog>, sqlx::Error> {
        sqlx::query_as::<_, MealLog>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM meal_logs
            WHERE user_id = $1 AND timestamp >= $2
            ORDER BY timestamp ASC
            "#
        ))
        .bind(user_id)
        .bind(since)
        .fetch_all(db)
        .await
    }

    pub async fn list_by_user(
        db: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MealLog>, sqlx::Error> {
        sqlx::query_as::<_, MealLog>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM meal_logs
            WHERE user_id = $1
            ORDER BY timestamp DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(db)
        .await
    }
}

/// Start of "today" as the server-process UTC midnight, regardless of user
/// locale. Deliberately kept from the reference behavior; pure in `now` so
/// tests never need a real clock.
pub fn utc_day_start(now: OffsetDateTime) -> OffsetDateTime {
    now.to_offset(UtcOffset::UTC).replace_time(Time::MIDNIGHT)
}

/// Derived per-user, per-day totals. Recomputed on every read from the
/// underlying records, never cached, so it is consistent at read time but not
/// a transactional snapshot across concurrent writes.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub totals: NutritionSummary,
    pub meals_today: usize,
}

impl DailyAggregate {
    /// Sum nutrition over the meals that fall on or after `day_start`. The
    /// query already filters, but the aggregate owns the inclusive-boundary
    /// rule rather than trusting every caller's SQL.
    pub fn compute(day_start: OffsetDateTime, meals: &[MealLog]) -> Self {
        let today: Vec<&MealLog> = meals.iter().filter(|m| m.timestamp >= day_start).collect();
        let totals = NutritionSummary {
            calories: round1(today.iter().map(|m| m.calories).sum()),
            protein: round1(today.iter().map(|m| m.protein).sum()),
            carbs: round1(today.iter().map(|m| m.carbs).sum()),
            fats: round1(today.iter().map(|m| m.fats).sum()),
        };
        Self {
            totals,
            meals_today: today.len(),
        }
    }

    /// May be negative once the goal is exceeded; that is meaningful input to
    /// the advisor, not an error.
    pub fn remaining(&self, daily_calorie_goal: i32) -> f64 {
        round1(f64::from(daily_calorie_goal) - self.totals.calories)
    }
}

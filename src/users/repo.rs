use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::council::HealthGoal;

/// Health profile; read-only from the pipeline's point of view. Profile
/// management lives elsewhere, only seeding writes through `create`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub daily_calorie_goal: i32,
    pub health_goal: HealthGoal,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
}

impl UserProfile {
    pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, daily_calorie_goal, health_goal, height_cm, weight_kg
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_username(
        db: &PgPool,
        username: &str,
    ) -> Result<Option<UserProfile>, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, username, daily_calorie_goal, health_goal, height_cm, weight_kg
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(db)
        .await
    }

    pub async fn create(
        db: &PgPool,
        username: &str,
        daily_calorie_goal: i32,
        health_goal: HealthGoal,
        height_cm: Option<f64>,
        weight_kg: Option<f64>,
    ) -> Result<UserProfile, sqlx::Error> {
        sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO users (username, daily_calorie_goal, health_goal, height_cm, weight_kg)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, daily_calorie_goal, health_goal, height_cm, weight_kg
            "#,
        )
        .bind(username)
        .bind(daily_calorie_goal)
        .bind(health_goal)
        .bind(height_cm)
        .bind(weight_kg)
        .fetch_one(db)
        .await
    }
}

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use time::OffsetDateTime;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{council::GoalContext, error::ApiError, state::AppState, users::UserProfile};

use super::dto::{
    AnalyzeImageResponse, DashboardResponse, LogMealRequest, LogMealResponse, MealListItem,
    Pagination,
};
use super::repo::{utc_day_start, DailyAggregate, MealLog};

const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
const MIN_DESCRIPTION_CHARS: usize = 3;

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/:user_id", get(dashboard))
        .route("/meals/:user_id", get(list_meals))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/log-meal", post(log_meal))
        .merge(
            Router::new()
                .route("/analyze", post(analyze_image))
                // a little headroom over the image cap for multipart framing
                .layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + 64 * 1024)),
        )
}

fn is_image_content_type(content_type: &str) -> bool {
    content_type.starts_with("image/")
}

/// Vision Step endpoint: image in, AI-detected dish description out. The user
/// verifies or edits the text before submitting it to `/log-meal`; nothing is
/// persisted here.
#[instrument(skip(state, multipart))]
async fn analyze_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeImageResponse>, ApiError> {
    let mut image: Option<Bytes> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_image_content_type(&content_type) {
            return Err(ApiError::Validation(
                "Invalid file type. Only images (JPEG/PNG) are supported.".into(),
            ));
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read upload: {e}")))?;
        image = Some(data);
        break;
    }

    let image = image.ok_or_else(|| ApiError::Validation("field 'image' is required".into()))?;
    if image.is_empty() {
        return Err(ApiError::Validation("uploaded image is empty".into()));
    }
    if image.len() > MAX_IMAGE_BYTES {
        return Err(ApiError::Validation("Image too large (max 10MB).".into()));
    }

    let detected_text = state.council.analyze(&image).await?;
    Ok(Json(AnalyzeImageResponse { detected_text }))
}

/// Log-meal endpoint: verified text in, persisted meal with nutrition and
/// advice out. All-or-nothing: any pipeline failure aborts before the insert,
/// so no partial record can exist.
///
/// Two concurrent calls for one user may both read the same daily total and
/// each append a record; both records persist correctly, the advice just sees
/// a stale total. Accepted race given the advisory nature of the text.
#[instrument(skip(state, body))]
async fn log_meal(
    State(state): State<AppState>,
    Json(body): Json<LogMealRequest>,
) -> Result<(StatusCode, Json<LogMealResponse>), ApiError> {
    let verified_text = body.verified_text.trim();
    if verified_text.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(ApiError::Validation(format!(
            "verified_text must be at least {MIN_DESCRIPTION_CHARS} characters"
        )));
    }

    let user = UserProfile::find(&state.db, body.user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let day_start = utc_day_start(OffsetDateTime::now_utc());
    let today = MealLog::list_since(&state.db, user.id, day_start).await?;
    let current_daily_total = DailyAggregate::compute(day_start, &today).totals.calories;

    let goals = GoalContext {
        health_goal: user.health_goal,
        daily_calorie_goal: user.daily_calorie_goal,
    };
    let analysis = state
        .council
        .process_meal(verified_text, &goals, current_daily_total)
        .await?;

    let meal = MealLog::insert(
        &state.db,
        user.id,
        verified_text,
        body.image_url.as_deref(),
        &analysis.nutrition,
        &analysis.ai_advice,
    )
    .await?;

    info!(
        user_id = %user.id,
        meal_id = %meal.id,
        calories = analysis.nutrition.calories,
        "meal logged"
    );

    Ok((
        StatusCode::CREATED,
        Json(LogMealResponse {
            meal_id: meal.id,
            dish_name: meal.dish_name,
            nutrition: analysis.nutrition,
            ai_advice: meal.ai_advice,
            timestamp: meal.timestamp,
        }),
    ))
}

/// Daily totals vs. the calorie goal, recomputed from today's records on
/// every call.
#[instrument(skip(state))]
async fn dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let user = UserProfile::find(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let day_start = utc_day_start(OffsetDateTime::now_utc());
    let today = MealLog::list_since(&state.db, user.id, day_start).await?;
    let aggregate = DailyAggregate::compute(day_start, &today);

    Ok(Json(DashboardResponse {
        user_id: user.id,
        daily_goal: user.daily_calorie_goal,
        total_consumed: aggregate.totals.calories,
        remaining: aggregate.remaining(user.daily_calorie_goal),
        meals_today: aggregate.meals_today,
        nutrition_totals: aggregate.totals,
    }))
}

#[instrument(skip(state))]
async fn list_meals(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<MealListItem>>, ApiError> {
    let user = UserProfile::find(&state.db, user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))?;

    let meals = MealLog::list_by_user(&state.db, user.id, p.limit, p.offset).await?;
    let items = meals
        .into_iter()
        .map(|m| MealListItem {
            id: m.id,
            dish_name: m.dish_name,
            calories: m.calories,
            ai_advice: m.ai_advice,
            timestamp: m.timestamp,
        })
        .collect();
    Ok(Json(items))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_content_types_are_accepted() {
        assert!(is_image_content_type("image/jpeg"));
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("image/webp"));
    }

    #[test]
    fn non_image_content_types_are_rejected() {
        assert!(!is_image_content_type("application/pdf"));
        assert!(!is_image_content_type("text/plain"));
        assert!(!is_image_content_type(""));
    }
}

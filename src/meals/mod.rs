mod dto;
mod handlers;
mod repo;

use crate::state::AppState;
use axum::Router;

pub use repo::{utc_day_start, DailyAggregate, MealLog};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}

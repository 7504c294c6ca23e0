//! Development seeding: creates the test user used for manual API testing.
//!
//! Run with: `cargo run --bin seed`

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use nutrisnap::council::HealthGoal;
use nutrisnap::users::UserProfile;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "nutrisnap=info".to_string());
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is required")?;
    let db = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations").run(&db).await?;

    if let Some(existing) = UserProfile::find_by_username(&db, "test_user").await? {
        tracing::info!(user_id = %existing.id, "test user already exists, use this id for API testing");
        return Ok(());
    }

    let user = UserProfile::create(
        &db,
        "test_user",
        2500,
        HealthGoal::GainMuscle,
        Some(175.0),
        Some(70.0),
    )
    .await?;

    tracing::info!(user_id = %user.id, "created test user, use this id for API testing");
    Ok(())
}

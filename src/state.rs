use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::AppConfig;
use crate::council::Council;

/// Process-wide shared state: one pool, one config, one council, all built in
/// `init` and cloned into every request task. No module-level globals.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub council: Arc<Council>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        let council = Arc::new(Council::from_config(&config)?);
        Ok(Self {
            db,
            config,
            council,
        })
    }
}

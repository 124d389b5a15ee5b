use anyhow::Context;
use sqlx::migrate::{MigrateError, Migrator};
use tracing::info;

use admitrack_config::{AllocatorConfig, CorsConfig, DatabaseConfig};
use admitrack_db::{PgPool, try_init_db_pool};

use crate::state::AppState;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn run_migrations(db: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(db).await?;
    info!("Database migrations applied");
    Ok(())
}

pub async fn init_app_state(database_config: &DatabaseConfig) -> anyhow::Result<AppState> {
    let db = try_init_db_pool(database_config)
        .await
        .context("Failed to connect to database")?;
    info!(
        max_connections = database_config.max_connections,
        "Database pool initialized"
    );

    if database_config.run_migrations {
        run_migrations(&db)
            .await
            .context("Failed to run database migrations")?;
    }

    let allocator_config = AllocatorConfig::from_env();
    info!(
        overflow_policy = %allocator_config.overflow_policy,
        regeneration_mode = %allocator_config.regeneration_mode,
        "Admission number allocator configured"
    );

    Ok(AppState::new(db, allocator_config, CorsConfig::from_env()))
}

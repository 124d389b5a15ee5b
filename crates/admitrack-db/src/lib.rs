//! # Admitrack DB
//!
//! PostgreSQL connection pool construction for the Admitrack API.
//!
//! # Example
//!
//! ```ignore
//! use admitrack_config::DatabaseConfig;
//! use admitrack_db::init_db_pool;
//!
//! #[tokio::main]
//! async fn main() {
//!     let pool = init_db_pool(&DatabaseConfig::from_env()).await;
//! }
//! ```

use admitrack_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

/// Initializes a PostgreSQL connection pool.
///
/// The returned pool is cheaply cloneable and should be stored in the
/// application state.
///
/// # Panics
///
/// Panics if the connection to the database fails.
pub async fn init_db_pool(config: &DatabaseConfig) -> PgPool {
    let pool = try_init_db_pool(config)
        .await
        .expect("Failed to connect to database");

    info!(
        max_connections = config.max_connections,
        "Database pool initialized"
    );

    pool
}

/// Fallible variant of [`init_db_pool`] for callers that report their own errors.
pub async fn try_init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.url)
        .await
}

// Re-export PgPool for convenience
pub use sqlx::PgPool;

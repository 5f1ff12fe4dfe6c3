//! SQLite-backed persistence for the AQI forecasting pipeline: the
//! append-only feature store and the versioned model registry.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

mod error;
mod feature_store;
mod models;
mod registry;

pub use error::StoreError;
pub use feature_store::FeatureStore;
pub use models::{CreateModelArtifact, ModelArtifact, ModelSummary};
pub use registry::ModelRegistry;

/// Creates a connection pool to the `SQLite` database, creating the file if
/// it does not exist. In-memory databases are pinned to a single connection
/// so every caller sees the same data.
///
/// # Errors
///
/// Returns an error if the URL is invalid or the connection fails.
pub async fn create_pool(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Runs all pending migrations.
///
/// # Errors
///
/// Returns an error if running migrations fails.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

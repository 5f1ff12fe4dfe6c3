//! Activate command - promotes a specific artifact to active.

use anyhow::Result;
use database::ModelRegistry;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Runs the activate command.
///
/// # Errors
///
/// Returns an error if the id is unknown or the database operation fails.
pub async fn run(pool: &SqlitePool, id: Uuid) -> Result<()> {
    ModelRegistry::set_active(pool, id).await?;
    info!(%id, "model activated");
    Ok(())
}

//! Ingest command - stores one hourly observation in the feature store.

use std::path::Path;

use anyhow::{Context, Result};
use feature_engineering::RawObservation;
use sqlx::SqlitePool;
use tracing::info;

use crate::ingest::{ingest_observation, IngestOutcome};

/// Runs the ingest command.
///
/// # Errors
///
/// Returns an error if the observation file is missing or malformed, or the
/// database operation fails. A redelivered hour is a successful no-op.
pub async fn run(pool: &SqlitePool, observation_path: &Path) -> Result<()> {
    let payload = std::fs::read_to_string(observation_path)
        .with_context(|| format!("failed to read {}", observation_path.display()))?;
    let observation: RawObservation = serde_json::from_str(&payload)
        .with_context(|| format!("malformed observation in {}", observation_path.display()))?;

    match ingest_observation(pool, &observation).await? {
        IngestOutcome::Stored => info!("observation ingested"),
        IngestOutcome::Skipped => info!("observation already present"),
    }

    Ok(())
}

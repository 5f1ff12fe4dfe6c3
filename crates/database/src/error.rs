//! Error taxonomy for the feature store and model registry.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Errors surfaced by the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A feature record for this hour is already stored. Ingestion callers
    /// treat this as a successful no-op.
    #[error("a feature record for {timestamp} already exists")]
    DuplicateTimestamp { timestamp: DateTime<Utc> },

    /// Fewer records exist than the caller asked for. Recoverable: wait for
    /// more data.
    #[error("insufficient history: {available} records available, {requested} requested")]
    InsufficientHistory { available: usize, requested: usize },

    /// No artifact is currently active for the family. Recoverable: run
    /// training.
    #[error("no active model for family '{family}'; run training first")]
    NoActiveModel { family: String },

    /// Unknown artifact id.
    #[error("model artifact {id} not found")]
    NotFound { id: Uuid },

    /// A stored timestamp could not be interpreted.
    #[error("stored timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    /// A stored JSON payload (features, model, scaler, metrics) failed to
    /// decode.
    #[error("invalid stored payload: {0}")]
    Payload(#[from] serde_json::Error),

    /// A stored artifact id is not a valid UUID.
    #[error("invalid stored artifact id: {0}")]
    InvalidId(#[from] uuid::Error),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

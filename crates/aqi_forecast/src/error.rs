//! Pipeline-level error types for training and forecasting.

use chrono::{DateTime, Utc};
use database::StoreError;
use ml_model::TrainError;

/// Errors raised by the retraining pipeline.
#[derive(Debug, thiserror::Error)]
pub enum TrainerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Train(#[from] TrainError),

    #[error("failed to encode model artifact payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Errors raised by the forecasting engine.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    /// `NoActiveModel` and `InsufficientHistory` surface through here.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The active artifact's feature contract names columns feature
    /// engineering no longer produces. Fatal for this call; values are never
    /// guessed or zero-substituted.
    #[error("model feature contract violated; missing columns: {}", missing.join(", "))]
    FeatureMismatch { missing: Vec<String> },

    /// The artifact's scaler width disagrees with its own feature list.
    #[error("scaler covers {actual} columns but the feature contract has {expected}")]
    ScalerMismatch { expected: usize, actual: usize },

    /// A stored record lacks the raw columns needed for the persistence
    /// assumption.
    #[error("stored record at {timestamp} is missing raw observation columns")]
    CorruptRecord { timestamp: DateTime<Utc> },

    #[error("failed to decode model artifact payload: {0}")]
    Payload(#[from] serde_json::Error),
}

//! Registry row types.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// A persisted model artifact, immutable apart from its `is_active` bit.
///
/// `feature_names` is the model's input contract: consumers must present
/// exactly these columns, in this order. `model` and `scaler` are the
/// serialized parameter payloads produced by the `ml_model` crate.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub id: Uuid,
    pub family: String,
    pub algorithm: String,
    pub version: i64,
    pub model: serde_json::Value,
    pub scaler: serde_json::Value,
    pub feature_names: Vec<String>,
    pub metrics: serde_json::Value,
    pub training_info: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Registry listing entry: artifact metadata without the parameter payloads.
#[derive(Debug, Clone)]
pub struct ModelSummary {
    pub id: Uuid,
    pub family: String,
    pub algorithm: String,
    pub version: i64,
    pub metrics: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

/// Input for persisting a newly trained artifact. The registry assigns the
/// id, version and creation time; new artifacts are saved inactive.
#[derive(Debug, Clone)]
pub struct CreateModelArtifact {
    pub family: String,
    pub algorithm: String,
    pub model: serde_json::Value,
    pub scaler: serde_json::Value,
    pub feature_names: Vec<String>,
    pub metrics: serde_json::Value,
    pub training_info: serde_json::Value,
}

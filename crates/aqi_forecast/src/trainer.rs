//! Daily retraining pipeline: pull the feature store, select and fit
//! candidates, commit the winner to the registry and activate it.

use database::{CreateModelArtifact, FeatureStore, ModelRegistry};
use ml_model::{
    train_and_select, CandidateReport, Dataset, FailedCandidate, ModelAlgorithm,
    DEFAULT_MIN_TRAINING_ROWS, DEFAULT_TOP_K,
};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::TrainerError;

/// The default registry scope for this deployment's single location.
pub const DEFAULT_FAMILY: &str = "aqi";

/// Tunables for one retraining run.
#[derive(Debug, Clone)]
pub struct TrainerConfig {
    pub family: String,
    pub top_k: usize,
    pub min_rows: usize,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            family: DEFAULT_FAMILY.to_string(),
            top_k: DEFAULT_TOP_K,
            min_rows: DEFAULT_MIN_TRAINING_ROWS,
        }
    }
}

/// What a successful retraining run produced.
#[derive(Debug)]
pub struct TrainingSummary {
    pub artifact_id: Uuid,
    pub family: String,
    pub algorithm: ModelAlgorithm,
    pub version: i64,
    pub report: CandidateReport,
    pub candidates: Vec<CandidateReport>,
    pub failures: Vec<FailedCandidate>,
    pub training_rows: usize,
}

/// Runs the full retraining pipeline. All-or-nothing with respect to the
/// registry: nothing is written unless a winner was selected, and the new
/// artifact is saved and then activated.
///
/// # Errors
///
/// Returns an error if too little data is stored, every candidate fails to
/// fit, or a database operation fails.
pub async fn retrain(
    pool: &SqlitePool,
    config: &TrainerConfig,
) -> Result<TrainingSummary, TrainerError> {
    let records = FeatureStore::all(pool).await?;
    info!(records = records.len(), family = %config.family, "starting retraining");

    let dataset = Dataset::from_records(&records);
    let outcome = train_and_select(&dataset, config.top_k, config.min_rows)?;

    for failure in &outcome.failures {
        warn!(
            algorithm = %failure.algorithm,
            error = %failure.error,
            "candidate model failed to fit; excluded from selection"
        );
    }

    let (training_samples, validation_samples, test_samples) = outcome.split_sizes;
    let target_min = dataset.targets.iter().copied().fold(f64::INFINITY, f64::min);
    let target_max = dataset
        .targets
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);
    let training_info = json!({
        "training_samples": training_samples,
        "validation_samples": validation_samples,
        "test_samples": test_samples,
        "start_timestamp": dataset.timestamps.first().map(|ts| ts.timestamp()),
        "end_timestamp": dataset.timestamps.last().map(|ts| ts.timestamp()),
        "target_min": target_min,
        "target_max": target_max,
    });

    let algorithm = outcome.model.algorithm();
    let input = CreateModelArtifact {
        family: config.family.clone(),
        algorithm: algorithm.to_string(),
        model: serde_json::to_value(&outcome.model)?,
        scaler: serde_json::to_value(&outcome.scaler)?,
        feature_names: outcome.feature_names.clone(),
        metrics: serde_json::to_value(&outcome.report)?,
        training_info,
    };

    let artifact = ModelRegistry::save(pool, input).await?;
    ModelRegistry::set_active(pool, artifact.id).await?;

    info!(
        id = %artifact.id,
        %algorithm,
        version = artifact.version,
        test_rmse = outcome.report.test.rmse,
        test_mae = outcome.report.test.mae,
        test_r2 = outcome.report.test.r2,
        "model trained and activated"
    );

    Ok(TrainingSummary {
        artifact_id: artifact.id,
        family: artifact.family,
        algorithm,
        version: artifact.version,
        report: outcome.report,
        candidates: outcome.candidates,
        failures: outcome.failures,
        training_rows: records.len(),
    })
}

//! Regression models for AQI prediction: a linear baseline plus random
//! forest and gradient boosting ensembles, with the scaling, dataset and
//! selection machinery around them.
//!
//! Trained models serialize to JSON parameter payloads so the registry can
//! persist and reload them without touching this crate's internals.

use serde::{Deserialize, Serialize};

mod boosting;
mod dataset;
mod forest;
mod linear;
mod metrics;
mod scaler;
mod selection;
mod tree;

pub use boosting::{GradientBoostingParams, GradientBoostingRegressor};
pub use dataset::{pearson, Dataset, Split, TRAIN_FRACTION, VALIDATION_FRACTION};
pub use forest::{RandomForestParams, RandomForestRegressor};
pub use linear::LinearRegressionModel;
pub use metrics::{evaluate, RegressionMetrics};
pub use scaler::StandardScaler;
pub use selection::{
    train_and_select, CandidateReport, FailedCandidate, SelectionOutcome, DEFAULT_MIN_TRAINING_ROWS,
    DEFAULT_TOP_K,
};
pub use tree::{DecisionTreeParams, DecisionTreeRegressor};

/// Errors raised while fitting or selecting models.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// Not enough usable data to train; recoverable by waiting for more
    /// ingested hours.
    #[error("insufficient data for training: {0}")]
    InsufficientData(String),

    /// The inputs cannot support a fit (empty matrix, misaligned lengths,
    /// singular system).
    #[error("degenerate training input: {0}")]
    Degenerate(String),
}

/// The fixed candidate set of model families.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelAlgorithm {
    LinearRegression,
    RandomForest,
    GradientBoosting,
}

/// A fitted regressor of any family, serializable as a tagged JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum TrainedRegressor {
    LinearRegression(LinearRegressionModel),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl TrainedRegressor {
    pub fn algorithm(&self) -> ModelAlgorithm {
        match self {
            Self::LinearRegression(_) => ModelAlgorithm::LinearRegression,
            Self::RandomForest(_) => ModelAlgorithm::RandomForest,
            Self::GradientBoosting(_) => ModelAlgorithm::GradientBoosting,
        }
    }

    /// Predicts a single (already scaled) feature row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        match self {
            Self::LinearRegression(model) => model.predict_row(row),
            Self::RandomForest(model) => model.predict_row(row),
            Self::GradientBoosting(model) => model.predict_row(row),
        }
    }

    /// Predicts a batch of rows.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Vec<f64> {
        rows.iter().map(|row| self.predict_row(row)).collect()
    }
}

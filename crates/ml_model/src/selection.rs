//! Candidate training and model selection.

use serde::{Deserialize, Serialize};

use crate::boosting::{GradientBoostingParams, GradientBoostingRegressor};
use crate::dataset::Dataset;
use crate::forest::{RandomForestParams, RandomForestRegressor};
use crate::linear::LinearRegressionModel;
use crate::metrics::{evaluate, RegressionMetrics};
use crate::scaler::StandardScaler;
use crate::{ModelAlgorithm, TrainError, TrainedRegressor};

/// Number of feature columns kept by correlation-based selection.
pub const DEFAULT_TOP_K: usize = 40;

/// Minimum rows before training is attempted (two full days of hourly data,
/// enough for non-empty validation and test splits).
pub const DEFAULT_MIN_TRAINING_ROWS: usize = 48;

/// Per-candidate evaluation across all three splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateReport {
    pub algorithm: ModelAlgorithm,
    pub train: RegressionMetrics,
    pub validation: RegressionMetrics,
    pub test: RegressionMetrics,
}

/// A candidate that failed to fit; recorded and excluded from comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedCandidate {
    pub algorithm: ModelAlgorithm,
    pub error: String,
}

/// The winning model with everything needed to package an artifact.
#[derive(Debug)]
pub struct SelectionOutcome {
    pub model: TrainedRegressor,
    pub scaler: StandardScaler,
    pub feature_names: Vec<String>,
    pub report: CandidateReport,
    pub candidates: Vec<CandidateReport>,
    pub failures: Vec<FailedCandidate>,
    pub split_sizes: (usize, usize, usize),
}

/// Runs the full selection algorithm over a dataset: correlation top-K,
/// chronological split, train-split scaling, candidate fitting and
/// test-RMSE ranking (ties: lowest MAE, then earliest-trained).
///
/// # Errors
///
/// Returns [`TrainError::InsufficientData`] if fewer than `min_rows` rows are
/// available or no candidate could be fitted. A candidate failure on its own
/// does not abort the selection.
pub fn train_and_select(
    dataset: &Dataset,
    top_k: usize,
    min_rows: usize,
) -> Result<SelectionOutcome, TrainError> {
    if dataset.len() < min_rows {
        return Err(TrainError::InsufficientData(format!(
            "{} feature records available, {min_rows} required",
            dataset.len()
        )));
    }

    let selected = dataset.select_top_features(top_k);
    let (train, validation, test) = selected.split_chronological();
    let split_sizes = (train.rows.len(), validation.rows.len(), test.rows.len());

    let scaler = StandardScaler::fit(&train.rows)?;
    let train_x = scaler.transform(&train.rows);
    let validation_x = scaler.transform(&validation.rows);
    let test_x = scaler.transform(&test.rows);

    let mut fitted: Vec<(TrainedRegressor, CandidateReport)> = Vec::new();
    let mut failures = Vec::new();

    for algorithm in [
        ModelAlgorithm::LinearRegression,
        ModelAlgorithm::RandomForest,
        ModelAlgorithm::GradientBoosting,
    ] {
        match fit_candidate(algorithm, &train_x, &train.targets) {
            Ok(model) => {
                let report = CandidateReport {
                    algorithm,
                    train: evaluate(&train.targets, &model.predict(&train_x)),
                    validation: evaluate(&validation.targets, &model.predict(&validation_x)),
                    test: evaluate(&test.targets, &model.predict(&test_x)),
                };
                fitted.push((model, report));
            }
            Err(err) => failures.push(FailedCandidate {
                algorithm,
                error: err.to_string(),
            }),
        }
    }

    if fitted.is_empty() {
        return Err(TrainError::InsufficientData(format!(
            "all {} candidate models failed to fit",
            failures.len()
        )));
    }

    let candidates: Vec<CandidateReport> =
        fitted.iter().map(|(_, report)| report.clone()).collect();

    // Lowest test RMSE wins; ties fall to lowest MAE, then to the earliest-
    // trained candidate (a challenger must be strictly better to displace).
    let mut winner = 0;
    for i in 1..fitted.len() {
        let best = &fitted[winner].1.test;
        let challenger = &fitted[i].1.test;
        let ordering = challenger
            .rmse
            .total_cmp(&best.rmse)
            .then_with(|| challenger.mae.total_cmp(&best.mae));
        if ordering == std::cmp::Ordering::Less {
            winner = i;
        }
    }
    let (model, report) = fitted.swap_remove(winner);

    Ok(SelectionOutcome {
        model,
        scaler,
        feature_names: selected.feature_names,
        report,
        candidates,
        failures,
        split_sizes,
    })
}

fn fit_candidate(
    algorithm: ModelAlgorithm,
    x: &[Vec<f64>],
    y: &[f64],
) -> Result<TrainedRegressor, TrainError> {
    Ok(match algorithm {
        ModelAlgorithm::LinearRegression => {
            TrainedRegressor::LinearRegression(LinearRegressionModel::fit(x, y)?)
        }
        ModelAlgorithm::RandomForest => TrainedRegressor::RandomForest(
            RandomForestRegressor::fit(x, y, &RandomForestParams::default())?,
        ),
        ModelAlgorithm::GradientBoosting => TrainedRegressor::GradientBoosting(
            GradientBoostingRegressor::fit(x, y, &GradientBoostingParams::default())?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{Duration, TimeZone, Utc};
    use feature_engineering::FeatureRecord;

    use super::*;

    /// A target that is a perfect linear function of one monotone feature;
    /// trees cannot extrapolate past the training range, so the linear
    /// baseline must win on the chronologically later test split.
    fn linear_dataset(n: i64) -> Dataset {
        let records: Vec<FeatureRecord> = (0..n)
            .map(|i| {
                let x = i as f64;
                let mut features = BTreeMap::new();
                features.insert("signal".to_string(), x);
                features.insert("wiggle".to_string(), f64::from((i % 3) as i32));
                FeatureRecord {
                    timestamp: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
                        + Duration::hours(i),
                    aqi: 3.0 * x + 10.0,
                    features,
                }
            })
            .collect();
        Dataset::from_records(&records)
    }

    #[test]
    fn selects_near_perfect_model_on_linear_data() {
        let outcome = train_and_select(&linear_dataset(120), 40, 48).unwrap();

        assert_eq!(outcome.model.algorithm(), ModelAlgorithm::LinearRegression);
        assert!(
            outcome.report.test.rmse < 1e-3,
            "test RMSE {} not near zero",
            outcome.report.test.rmse
        );
        assert_eq!(outcome.split_sizes, (84, 18, 18));
        // All three candidates fit on clean data.
        assert_eq!(outcome.candidates.len(), 3);
        assert!(outcome.failures.is_empty());
    }

    #[test]
    fn winner_has_lowest_test_rmse() {
        let outcome = train_and_select(&linear_dataset(120), 40, 48).unwrap();
        for candidate in &outcome.candidates {
            assert!(outcome.report.test.rmse <= candidate.test.rmse + 1e-12);
        }
    }

    #[test]
    fn feature_contract_matches_selected_columns() {
        let outcome = train_and_select(&linear_dataset(120), 1, 48).unwrap();
        assert_eq!(outcome.feature_names, vec!["signal".to_string()]);
        assert_eq!(outcome.scaler.len(), 1);
    }

    #[test]
    fn too_few_rows_is_insufficient_data() {
        let err = train_and_select(&linear_dataset(10), 40, 48).unwrap_err();
        assert!(matches!(err, TrainError::InsufficientData(_)));
    }
}

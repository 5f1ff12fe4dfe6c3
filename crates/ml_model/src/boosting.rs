//! Gradient boosting: shallow regression trees fit to residuals with
//! shrinkage.

use serde::{Deserialize, Serialize};

use crate::tree::{DecisionTreeParams, DecisionTreeRegressor};
use crate::TrainError;

/// Boosting schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
}

impl Default for GradientBoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            learning_rate: 0.05,
            max_depth: 3,
            min_samples_split: 5,
            min_samples_leaf: 2,
        }
    }
}

/// A fitted boosted ensemble: a constant initial prediction plus
/// shrinkage-weighted residual trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    init: f64,
    learning_rate: f64,
    trees: Vec<DecisionTreeRegressor>,
}

impl GradientBoostingRegressor {
    /// Fits the ensemble on a row-major matrix and target vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty or misaligned.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        params: &GradientBoostingParams,
    ) -> Result<Self, TrainError> {
        let n = x.len();
        if n == 0 || n != y.len() || params.n_estimators == 0 {
            return Err(TrainError::Degenerate(
                "gradient boosting needs a non-empty, aligned training set".to_string(),
            ));
        }

        let tree_params = DecisionTreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
        };

        let init = y.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![init; n];
        let mut residuals = vec![0.0; n];
        let mut trees = Vec::with_capacity(params.n_estimators);

        for _ in 0..params.n_estimators {
            for (r, (target, pred)) in residuals.iter_mut().zip(y.iter().zip(&predictions)) {
                *r = target - pred;
            }

            let tree = DecisionTreeRegressor::fit(x, &residuals, &tree_params)?;
            for (pred, row) in predictions.iter_mut().zip(x) {
                *pred += params.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);
        }

        Ok(Self {
            init,
            learning_rate: params.learning_rate,
            trees,
        })
    }

    /// Predicts a single row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.init
            + self.learning_rate
                * self
                    .trees
                    .iter()
                    .map(|tree| tree.predict_row(row))
                    .sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> GradientBoostingParams {
        GradientBoostingParams {
            n_estimators: 50,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }

    #[test]
    fn boosting_reduces_error_over_the_mean() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..40).map(|i| f64::from(i) * 2.0 + 1.0).collect();

        let model = GradientBoostingRegressor::fit(&x, &y, &small_params()).unwrap();

        let mean = y.iter().sum::<f64>() / y.len() as f64;
        let mean_sse: f64 = y.iter().map(|t| (t - mean).powi(2)).sum();
        let model_sse: f64 = x
            .iter()
            .zip(&y)
            .map(|(row, t)| (t - model.predict_row(row)).powi(2))
            .sum();
        assert!(model_sse < mean_sse / 10.0);
    }

    #[test]
    fn constant_target_predicts_the_constant() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i)]).collect();
        let y = vec![4.0; 10];

        let model = GradientBoostingRegressor::fit(&x, &y, &small_params()).unwrap();
        assert!((model.predict_row(&[3.0]) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(GradientBoostingRegressor::fit(&[], &[], &small_params()).is_err());
    }
}

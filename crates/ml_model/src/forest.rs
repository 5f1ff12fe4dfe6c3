//! Random forest: bootstrap-bagged regression trees.

use serde::{Deserialize, Serialize};

use crate::tree::{DecisionTreeParams, DecisionTreeRegressor};
use crate::TrainError;

/// Forest shape and sampling seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomForestParams {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: 15,
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

/// Deterministic LCG driving bootstrap sampling; no RNG dependency needed.
struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(12345),
        }
    }

    fn next_index(&mut self, bound: usize) -> usize {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        ((self.state >> 33) as usize) % bound
    }
}

/// A fitted forest; prediction averages the member trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForestRegressor {
    trees: Vec<DecisionTreeRegressor>,
}

impl RandomForestRegressor {
    /// Fits `n_trees` trees, each on a bootstrap resample of the rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the training set is empty or misaligned.
    pub fn fit(
        x: &[Vec<f64>],
        y: &[f64],
        params: &RandomForestParams,
    ) -> Result<Self, TrainError> {
        let n = x.len();
        if n == 0 || n != y.len() || params.n_trees == 0 {
            return Err(TrainError::Degenerate(
                "random forest needs a non-empty, aligned training set".to_string(),
            ));
        }

        let tree_params = DecisionTreeParams {
            max_depth: params.max_depth,
            min_samples_split: params.min_samples_split,
            min_samples_leaf: params.min_samples_leaf,
        };

        let mut trees = Vec::with_capacity(params.n_trees);
        for t in 0..params.n_trees {
            let mut rng = Lcg::new(params.seed.wrapping_add(t as u64));
            let mut sample_x = Vec::with_capacity(n);
            let mut sample_y = Vec::with_capacity(n);
            for _ in 0..n {
                let i = rng.next_index(n);
                sample_x.push(x[i].clone());
                sample_y.push(y[i]);
            }
            trees.push(DecisionTreeRegressor::fit(&sample_x, &sample_y, &tree_params)?);
        }

        Ok(Self { trees })
    }

    /// Predicts a single row as the mean of all member trees.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.trees
            .iter()
            .map(|tree| tree.predict_row(row))
            .sum::<f64>()
            / self.trees.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> RandomForestParams {
        RandomForestParams {
            n_trees: 25,
            max_depth: 6,
            min_samples_split: 2,
            min_samples_leaf: 1,
            seed: 42,
        }
    }

    #[test]
    fn fits_a_step_function() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..40).map(|i| if i < 20 { 0.0 } else { 10.0 }).collect();

        let forest = RandomForestRegressor::fit(&x, &y, &small_params()).unwrap();
        assert!(forest.predict_row(&[5.0]) < 2.0);
        assert!(forest.predict_row(&[35.0]) > 8.0);
    }

    #[test]
    fn training_is_deterministic_for_a_seed() {
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..30).map(|i| f64::from(i * 2)).collect();

        let a = RandomForestRegressor::fit(&x, &y, &small_params()).unwrap();
        let b = RandomForestRegressor::fit(&x, &y, &small_params()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(RandomForestRegressor::fit(&[], &[], &small_params()).is_err());
    }
}

//! Ordinary least-squares baseline.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::TrainError;

/// Tiny diagonal jitter keeping the normal equations solvable when columns
/// are collinear (constant columns scale to zero variance).
const RIDGE: f64 = 1e-9;

/// Linear regression with an intercept, fit by normal equations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressionModel {
    /// Fits on a row-major matrix and target vector.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty or the system is singular.
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self, TrainError> {
        let n = x.len();
        let p = x.first().map_or(0, Vec::len);
        if n == 0 || n != y.len() {
            return Err(TrainError::Degenerate(
                "linear regression needs a non-empty, aligned training set".to_string(),
            ));
        }

        // Design matrix with a leading intercept column.
        let design = DMatrix::from_fn(n, p + 1, |row, col| {
            if col == 0 {
                1.0
            } else {
                x[row][col - 1]
            }
        });
        let targets = DVector::from_column_slice(y);

        let transpose = design.transpose();
        let mut gram = &transpose * &design;
        for i in 0..p + 1 {
            gram[(i, i)] += RIDGE;
        }
        let moment = &transpose * &targets;

        let beta = gram
            .lu()
            .solve(&moment)
            .ok_or_else(|| TrainError::Degenerate("singular normal equations".to_string()))?;

        Ok(Self {
            intercept: beta[0],
            coefficients: beta.iter().skip(1).copied().collect(),
        })
    }

    /// Predicts a single row.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(row)
            .map(|(c, v)| c * v)
            .sum::<f64>()
            + self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_linear_relationship() {
        // y = 3x + 5
        let x: Vec<Vec<f64>> = (0..20).map(|i| vec![f64::from(i)]).collect();
        let y: Vec<f64> = (0..20).map(|i| 3.0 * f64::from(i) + 5.0).collect();

        let model = LinearRegressionModel::fit(&x, &y).unwrap();
        assert!((model.coefficients[0] - 3.0).abs() < 1e-6);
        assert!((model.intercept - 5.0).abs() < 1e-6);
        assert!((model.predict_row(&[100.0]) - 305.0).abs() < 1e-4);
    }

    #[test]
    fn handles_multiple_features() {
        // y = 2a - b + 1
        let x: Vec<Vec<f64>> = (0..30)
            .map(|i| vec![f64::from(i), f64::from(i % 7)])
            .collect();
        let y: Vec<f64> = x.iter().map(|r| 2.0 * r[0] - r[1] + 1.0).collect();

        let model = LinearRegressionModel::fit(&x, &y).unwrap();
        assert!((model.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((model.coefficients[1] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn tolerates_constant_columns() {
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![f64::from(i), 4.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| f64::from(i)).collect();

        let model = LinearRegressionModel::fit(&x, &y).unwrap();
        assert!((model.predict_row(&[5.0, 4.0]) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(LinearRegressionModel::fit(&[], &[]).is_err());
    }
}

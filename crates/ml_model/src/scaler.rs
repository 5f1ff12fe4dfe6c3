//! Feature scaling fit on the training split and applied unchanged at
//! validation, test and serve time.

use serde::{Deserialize, Serialize};

use crate::TrainError;

/// Per-column standardization: subtract the mean, divide by the (population)
/// standard deviation. Columns with zero variance divide by 1.0 so constant
/// features pass through centered instead of producing infinities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl StandardScaler {
    /// Fits the scaler on a row-major matrix.
    ///
    /// # Errors
    ///
    /// Returns an error if the matrix is empty.
    pub fn fit(rows: &[Vec<f64>]) -> Result<Self, TrainError> {
        let n = rows.len();
        let columns = rows.first().map_or(0, Vec::len);
        if n == 0 || columns == 0 {
            return Err(TrainError::Degenerate(
                "cannot fit a scaler on an empty matrix".to_string(),
            ));
        }

        let mut mean = vec![0.0; columns];
        for row in rows {
            for (m, value) in mean.iter_mut().zip(row) {
                *m += value;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        let mut std = vec![0.0; columns];
        for row in rows {
            for ((s, m), value) in std.iter_mut().zip(&mean).zip(row) {
                let d = value - m;
                *s += d * d;
            }
        }
        for s in &mut std {
            *s = (*s / n as f64).sqrt();
            if *s == 0.0 {
                *s = 1.0;
            }
        }

        Ok(Self { mean, std })
    }

    /// Number of columns the scaler was fit on.
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Scales a single row. The row must have the fitted width.
    pub fn transform_row(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(value, (mean, std))| (value - mean) / std)
            .collect()
    }

    /// Scales a row-major matrix.
    pub fn transform(&self, rows: &[Vec<f64>]) -> Vec<Vec<f64>> {
        rows.iter().map(|row| self.transform_row(row)).collect()
    }
}

//! Regression evaluation metrics.

use serde::{Deserialize, Serialize};

/// Held-out performance of a regressor: RMSE is the primary selection
/// criterion, MAE breaks ties, R² is reported.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
}

/// Evaluates predictions against actuals. Empty input yields zeroed metrics.
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> RegressionMetrics {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return RegressionMetrics {
            rmse: 0.0,
            mae: 0.0,
            r2: 0.0,
        };
    }

    let mut sum_sq = 0.0;
    let mut sum_abs = 0.0;
    for (a, p) in actual.iter().zip(predicted) {
        let err = a - p;
        sum_sq += err * err;
        sum_abs += err.abs();
    }

    let mean_actual = actual[..n].iter().sum::<f64>() / n as f64;
    let ss_tot: f64 = actual[..n].iter().map(|a| (a - mean_actual).powi(2)).sum();

    let r2 = if ss_tot == 0.0 {
        // A constant target: perfect iff the residuals vanish.
        if sum_sq == 0.0 {
            1.0
        } else {
            0.0
        }
    } else {
        1.0 - sum_sq / ss_tot
    };

    RegressionMetrics {
        rmse: (sum_sq / n as f64).sqrt(),
        mae: sum_abs / n as f64,
        r2,
    }
}

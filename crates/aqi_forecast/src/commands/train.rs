//! Train command - retrains on the full feature store and activates the
//! winner.

use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

use crate::trainer::{retrain, TrainerConfig};

/// Runs the train command.
///
/// # Errors
///
/// Returns an error if training fails.
pub async fn run(
    pool: &SqlitePool,
    family: &str,
    top_k: usize,
    min_rows: usize,
) -> Result<()> {
    let config = TrainerConfig {
        family: family.to_string(),
        top_k,
        min_rows,
    };

    let summary = retrain(pool, &config).await?;

    for candidate in &summary.candidates {
        info!(
            algorithm = %candidate.algorithm,
            test_rmse = candidate.test.rmse,
            test_mae = candidate.test.mae,
            test_r2 = candidate.test.r2,
            "candidate evaluated"
        );
    }

    println!(
        "Trained {} v{} on {} records (test RMSE {:.4}, MAE {:.4}, R\u{b2} {:.4})",
        summary.algorithm,
        summary.version,
        summary.training_rows,
        summary.report.test.rmse,
        summary.report.test.mae,
        summary.report.test.r2,
    );

    Ok(())
}

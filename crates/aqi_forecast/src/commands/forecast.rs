//! Forecast command - prints the 3-day forecast as JSON.

use anyhow::Result;
use sqlx::SqlitePool;

use crate::forecast::{forecast, ForecastConfig};

/// Runs the forecast command, writing the structured report to stdout.
///
/// # Errors
///
/// Returns an error if no model is active, history is too short, or the
/// artifact's feature contract cannot be satisfied.
pub async fn run(
    pool: &SqlitePool,
    family: &str,
    hazard_threshold: f64,
    severe_threshold: f64,
) -> Result<()> {
    let config = ForecastConfig {
        family: family.to_string(),
        hazard_threshold,
        severe_threshold,
    };

    let report = forecast(pool, &config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

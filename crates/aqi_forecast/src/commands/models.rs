//! Models command - lists registry entries newest-first.

use anyhow::Result;
use database::ModelRegistry;
use sqlx::SqlitePool;

/// Runs the models command.
///
/// # Errors
///
/// Returns an error if the database operation fails.
pub async fn run(pool: &SqlitePool, family: &str, limit: usize) -> Result<()> {
    let summaries = ModelRegistry::list(pool, family, limit).await?;

    if summaries.is_empty() {
        println!("No models in registry for family '{family}'");
        return Ok(());
    }

    for summary in summaries {
        let marker = if summary.is_active { " (active)" } else { "" };
        let rmse = summary
            .metrics
            .get("test")
            .and_then(|t| t.get("rmse"))
            .and_then(serde_json::Value::as_f64);
        match rmse {
            Some(rmse) => println!(
                "v{} {} {} test RMSE {:.4}{marker}",
                summary.version, summary.algorithm, summary.id, rmse
            ),
            None => println!(
                "v{} {} {}{marker}",
                summary.version, summary.algorithm, summary.id
            ),
        }
    }

    Ok(())
}

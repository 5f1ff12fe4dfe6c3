//! Repository for the versioned model registry.

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{CreateModelArtifact, ModelArtifact, ModelSummary};

/// Repository for model artifact operations.
///
/// Versions increase monotonically per family; at most one artifact per
/// family is active at any instant, and both mutations commit atomically.
pub struct ModelRegistry;

impl ModelRegistry {
    /// Persists a new artifact with the family's next version number
    /// (max existing + 1, starting at 1). Saving never alters which artifact
    /// is active.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be serialized or the database
    /// operation fails.
    pub async fn save(
        pool: &SqlitePool,
        input: CreateModelArtifact,
    ) -> Result<ModelArtifact, StoreError> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query(
            "SELECT MAX(version) AS max_version FROM model_registry WHERE family = ?1",
        )
        .bind(&input.family)
        .fetch_one(&mut *tx)
        .await?;
        let max_version: Option<i64> = row.try_get("max_version")?;
        let version = max_version.unwrap_or(0) + 1;

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let feature_names = serde_json::to_string(&input.feature_names)?;

        sqlx::query(
            r"
            INSERT INTO model_registry
                (id, family, algorithm, version, model, scaler, feature_names,
                 metrics, training_info, created_at, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0)
            ",
        )
        .bind(id.to_string())
        .bind(&input.family)
        .bind(&input.algorithm)
        .bind(version)
        .bind(input.model.to_string())
        .bind(input.scaler.to_string())
        .bind(feature_names)
        .bind(input.metrics.to_string())
        .bind(input.training_info.to_string())
        .bind(created_at.timestamp())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ModelArtifact {
            id,
            family: input.family,
            algorithm: input.algorithm,
            version,
            model: input.model,
            scaler: input.scaler,
            feature_names: input.feature_names,
            metrics: input.metrics,
            training_info: input.training_info,
            created_at,
            is_active: false,
        })
    }

    /// Atomically deactivates the family's current active artifact (if any)
    /// and activates the target. Readers never observe zero or two active
    /// artifacts for the family.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id, or an error if the
    /// database operation fails.
    pub async fn set_active(pool: &SqlitePool, id: Uuid) -> Result<(), StoreError> {
        let mut tx = pool.begin().await?;

        let row = sqlx::query("SELECT family FROM model_registry WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            return Err(StoreError::NotFound { id });
        };
        let family: String = row.try_get("family")?;

        sqlx::query("UPDATE model_registry SET is_active = 0 WHERE family = ?1 AND is_active = 1")
            .bind(&family)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE model_registry SET is_active = 1 WHERE id = ?1")
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Loads the family's active artifact.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NoActiveModel`] if no artifact is active, or an
    /// error if the database operation fails.
    pub async fn load_active(
        pool: &SqlitePool,
        family: &str,
    ) -> Result<ModelArtifact, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, family, algorithm, version, model, scaler, feature_names,
                   metrics, training_info, created_at, is_active
            FROM model_registry
            WHERE family = ?1 AND is_active = 1
            ",
        )
        .bind(family)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => artifact_from_row(&row),
            None => Err(StoreError::NoActiveModel {
                family: family.to_string(),
            }),
        }
    }

    /// Lists the family's artifacts, newest-first, without parameter
    /// payloads.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn list(
        pool: &SqlitePool,
        family: &str,
        limit: usize,
    ) -> Result<Vec<ModelSummary>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT id, family, algorithm, version, metrics, created_at, is_active
            FROM model_registry
            WHERE family = ?1
            ORDER BY version DESC
            LIMIT ?2
            ",
        )
        .bind(family)
        .bind(limit as i64)
        .fetch_all(pool)
        .await?;

        rows.iter().map(summary_from_row).collect()
    }

    /// Loads an artifact by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id, or an error if the
    /// database operation fails.
    pub async fn get_by_id(pool: &SqlitePool, id: Uuid) -> Result<ModelArtifact, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, family, algorithm, version, model, scaler, feature_names,
                   metrics, training_info, created_at, is_active
            FROM model_registry
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => artifact_from_row(&row),
            None => Err(StoreError::NotFound { id }),
        }
    }
}

fn parse_created_at(row: &SqliteRow) -> Result<DateTime<Utc>, StoreError> {
    let unix: i64 = row.try_get("created_at")?;
    DateTime::from_timestamp(unix, 0).ok_or(StoreError::InvalidTimestamp(unix))
}

fn artifact_from_row(row: &SqliteRow) -> Result<ModelArtifact, StoreError> {
    let id: String = row.try_get("id")?;
    let model: String = row.try_get("model")?;
    let scaler: String = row.try_get("scaler")?;
    let feature_names: String = row.try_get("feature_names")?;
    let metrics: String = row.try_get("metrics")?;
    let training_info: String = row.try_get("training_info")?;

    Ok(ModelArtifact {
        id: Uuid::parse_str(&id)?,
        family: row.try_get("family")?,
        algorithm: row.try_get("algorithm")?,
        version: row.try_get("version")?,
        model: serde_json::from_str(&model)?,
        scaler: serde_json::from_str(&scaler)?,
        feature_names: serde_json::from_str(&feature_names)?,
        metrics: serde_json::from_str(&metrics)?,
        training_info: serde_json::from_str(&training_info)?,
        created_at: parse_created_at(row)?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
    })
}

fn summary_from_row(row: &SqliteRow) -> Result<ModelSummary, StoreError> {
    let id: String = row.try_get("id")?;
    let metrics: String = row.try_get("metrics")?;

    Ok(ModelSummary {
        id: Uuid::parse_str(&id)?,
        family: row.try_get("family")?,
        algorithm: row.try_get("algorithm")?,
        version: row.try_get("version")?,
        metrics: serde_json::from_str(&metrics)?,
        created_at: parse_created_at(row)?,
        is_active: row.try_get::<i64, _>("is_active")? != 0,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{create_pool, run_migrations};

    async fn test_pool() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    fn artifact_input(family: &str) -> CreateModelArtifact {
        CreateModelArtifact {
            family: family.to_string(),
            algorithm: "linear_regression".to_string(),
            model: json!({"coefficients": [1.0, 2.0], "intercept": 0.5}),
            scaler: json!({"mean": [0.0, 0.0], "std": [1.0, 1.0]}),
            feature_names: vec!["pm2_5".to_string(), "temperature".to_string()],
            metrics: json!({"rmse": 1.5, "mae": 1.1, "r2": 0.92}),
            training_info: json!({"training_samples": 100}),
        }
    }

    #[tokio::test]
    async fn versions_increase_per_family() {
        let pool = test_pool().await;

        // Interleave two families; versions are independent sequences.
        let a1 = ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();
        let b1 = ModelRegistry::save(&pool, artifact_input("other")).await.unwrap();
        let a2 = ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();
        let a3 = ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();

        assert_eq!((a1.version, a2.version, a3.version), (1, 2, 3));
        assert_eq!(b1.version, 1);
    }

    #[tokio::test]
    async fn save_does_not_activate() {
        let pool = test_pool().await;
        let saved = ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();

        assert!(!saved.is_active);
        let err = ModelRegistry::load_active(&pool, "aqi").await.unwrap_err();
        assert!(matches!(err, StoreError::NoActiveModel { .. }));
    }

    #[tokio::test]
    async fn set_active_swaps_exactly_one_holder() {
        let pool = test_pool().await;
        let v1 = ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();
        let v2 = ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();

        ModelRegistry::set_active(&pool, v1.id).await.unwrap();
        assert_eq!(ModelRegistry::load_active(&pool, "aqi").await.unwrap().id, v1.id);

        ModelRegistry::set_active(&pool, v2.id).await.unwrap();
        let active = ModelRegistry::load_active(&pool, "aqi").await.unwrap();
        assert_eq!(active.id, v2.id);

        let summaries = ModelRegistry::list(&pool, "aqi", 10).await.unwrap();
        assert_eq!(summaries.iter().filter(|s| s.is_active).count(), 1);
    }

    #[tokio::test]
    async fn set_active_is_scoped_to_family() {
        let pool = test_pool().await;
        let a = ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();
        let b = ModelRegistry::save(&pool, artifact_input("other")).await.unwrap();

        ModelRegistry::set_active(&pool, a.id).await.unwrap();
        ModelRegistry::set_active(&pool, b.id).await.unwrap();

        // Activating in one family leaves the other family's holder alone.
        assert_eq!(ModelRegistry::load_active(&pool, "aqi").await.unwrap().id, a.id);
        assert_eq!(ModelRegistry::load_active(&pool, "other").await.unwrap().id, b.id);
    }

    #[tokio::test]
    async fn set_active_unknown_id_is_not_found() {
        let pool = test_pool().await;
        let err = ModelRegistry::set_active(&pool, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn artifact_round_trips_by_id() {
        let pool = test_pool().await;
        let input = artifact_input("aqi");
        let saved = ModelRegistry::save(&pool, input.clone()).await.unwrap();

        let loaded = ModelRegistry::get_by_id(&pool, saved.id).await.unwrap();
        assert_eq!(loaded.feature_names, input.feature_names);
        assert_eq!(loaded.metrics, input.metrics);
        assert_eq!(loaded.algorithm, input.algorithm);
        assert_eq!(loaded.model, input.model);
        assert_eq!(loaded.scaler, input.scaler);
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let pool = test_pool().await;
        for _ in 0..3 {
            ModelRegistry::save(&pool, artifact_input("aqi")).await.unwrap();
        }

        let summaries = ModelRegistry::list(&pool, "aqi", 2).await.unwrap();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].version, 3);
        assert_eq!(summaries[1].version, 2);
    }
}

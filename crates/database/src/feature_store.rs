//! Repository for the append-only, time-indexed feature store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use feature_engineering::FeatureRecord;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use crate::error::StoreError;

/// Repository for feature record operations.
///
/// Records are written exactly once (insert-if-absent by timestamp) and never
/// mutated; all reads return ascending timestamp order.
pub struct FeatureStore;

impl FeatureStore {
    /// Appends a record, failing with [`StoreError::DuplicateTimestamp`] if
    /// the hour is already stored. A record becomes visible only once fully
    /// written (single-statement insert).
    ///
    /// # Errors
    ///
    /// Returns an error if the hour already exists or the database operation
    /// fails.
    pub async fn append(pool: &SqlitePool, record: &FeatureRecord) -> Result<(), StoreError> {
        let features = serde_json::to_string(&record.features)?;
        let result = sqlx::query(
            r"
            INSERT INTO feature_records (timestamp, aqi, features, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (timestamp) DO NOTHING
            ",
        )
        .bind(record.timestamp.timestamp())
        .bind(record.aqi)
        .bind(features)
        .bind(Utc::now().timestamp())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicateTimestamp {
                timestamp: record.timestamp,
            });
        }

        Ok(())
    }

    /// Returns all records with `start <= timestamp <= end`, ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn query_range(
        pool: &SqlitePool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<FeatureRecord>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT timestamp, aqi, features
            FROM feature_records
            WHERE timestamp >= ?1 AND timestamp <= ?2
            ORDER BY timestamp ASC
            ",
        )
        .bind(start.timestamp())
        .bind(end.timestamp())
        .fetch_all(pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Returns the `n` most recent records, ascending, failing with
    /// [`StoreError::InsufficientHistory`] if fewer exist.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than `n` records exist or the database
    /// operation fails.
    pub async fn latest(pool: &SqlitePool, n: usize) -> Result<Vec<FeatureRecord>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT timestamp, aqi, features
            FROM feature_records
            ORDER BY timestamp DESC
            LIMIT ?1
            ",
        )
        .bind(n as i64)
        .fetch_all(pool)
        .await?;

        if rows.len() < n {
            return Err(StoreError::InsufficientHistory {
                available: rows.len(),
                requested: n,
            });
        }

        let mut records: Vec<FeatureRecord> =
            rows.iter().map(record_from_row).collect::<Result<_, _>>()?;
        records.reverse();
        Ok(records)
    }

    /// Returns every stored record, ascending (the training read path).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn all(pool: &SqlitePool) -> Result<Vec<FeatureRecord>, StoreError> {
        let rows = sqlx::query(
            r"
            SELECT timestamp, aqi, features
            FROM feature_records
            ORDER BY timestamp ASC
            ",
        )
        .fetch_all(pool)
        .await?;

        rows.iter().map(record_from_row).collect()
    }

    /// Counts stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn count(pool: &SqlitePool) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM feature_records")
            .fetch_one(pool)
            .await?;
        Ok(row.try_get("count")?)
    }
}

fn record_from_row(row: &SqliteRow) -> Result<FeatureRecord, StoreError> {
    let unix: i64 = row.try_get("timestamp")?;
    let timestamp =
        DateTime::from_timestamp(unix, 0).ok_or(StoreError::InvalidTimestamp(unix))?;
    let aqi: f64 = row.try_get("aqi")?;
    let features: String = row.try_get("features")?;
    let features: BTreeMap<String, f64> = serde_json::from_str(&features)?;

    Ok(FeatureRecord {
        timestamp,
        aqi,
        features,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use feature_engineering::{compute_record, RawObservation};

    use super::*;
    use crate::{create_pool, run_migrations};

    async fn test_pool() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    fn observation(hours_offset: i64) -> RawObservation {
        RawObservation {
            timestamp: Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap()
                + Duration::hours(hours_offset),
            co: 250.0,
            no: 0.5,
            no2: 10.0,
            o3: 30.0,
            so2: 4.0,
            pm2_5: 12.0 + hours_offset as f64,
            pm10: 25.0,
            nh3: 1.5,
            temperature: 22.0,
            humidity: 60.0,
            pressure: 1010.0,
            wind_speed: 2.5,
            wind_direction: 90.0,
            precipitation: 0.0,
            dew_point: 12.0,
        }
    }

    fn record(hours_offset: i64) -> FeatureRecord {
        compute_record(&observation(hours_offset), &[])
    }

    #[tokio::test]
    async fn append_then_read_back_in_order() {
        let pool = test_pool().await;

        // Insert out of order; reads must come back ascending.
        for offset in [2, 0, 1] {
            FeatureStore::append(&pool, &record(offset)).await.unwrap();
        }

        let all = FeatureStore::all(&pool).await.unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(FeatureStore::count(&pool).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn duplicate_timestamp_is_rejected() {
        let pool = test_pool().await;
        let rec = record(0);

        FeatureStore::append(&pool, &rec).await.unwrap();
        let err = FeatureStore::append(&pool, &rec).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTimestamp { .. }));

        // The original row is untouched.
        assert_eq!(FeatureStore::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn latest_returns_most_recent_ascending() {
        let pool = test_pool().await;
        for offset in 0..5 {
            FeatureStore::append(&pool, &record(offset)).await.unwrap();
        }

        let latest = FeatureStore::latest(&pool, 3).await.unwrap();
        assert_eq!(latest.len(), 3);
        assert!(latest.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(latest[2].timestamp, record(4).timestamp);
        assert_eq!(latest[0].timestamp, record(2).timestamp);
    }

    #[tokio::test]
    async fn latest_fails_on_short_history() {
        let pool = test_pool().await;
        FeatureStore::append(&pool, &record(0)).await.unwrap();

        let err = FeatureStore::latest(&pool, 24).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientHistory {
                available: 1,
                requested: 24
            }
        ));
    }

    #[tokio::test]
    async fn query_range_is_inclusive_and_ordered() {
        let pool = test_pool().await;
        for offset in 0..6 {
            FeatureStore::append(&pool, &record(offset)).await.unwrap();
        }

        let start = record(1).timestamp;
        let end = record(4).timestamp;
        let range = FeatureStore::query_range(&pool, start, end).await.unwrap();
        assert_eq!(range.len(), 4);
        assert_eq!(range[0].timestamp, start);
        assert_eq!(range[3].timestamp, end);
    }

    #[tokio::test]
    async fn stored_features_round_trip() {
        let pool = test_pool().await;
        let rec = record(0);
        FeatureStore::append(&pool, &rec).await.unwrap();

        let all = FeatureStore::all(&pool).await.unwrap();
        assert_eq!(all[0], rec);
    }
}

//! Hourly ingestion entry point: one raw observation in, one feature record
//! appended.

use chrono::Timelike;
use database::{FeatureStore, StoreError};
use feature_engineering::{compute_record, RawObservation, HISTORY_HOURS};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// What happened to an ingested observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new record was appended.
    Stored,
    /// The hour was already stored; nothing changed. External schedulers may
    /// retry deliveries, so this is success, not failure.
    Skipped,
}

/// Ingests one observation: floors its timestamp to the hour, computes the
/// feature record against the trailing window of stored history, and appends
/// it. Idempotent under at-least-once delivery.
///
/// # Errors
///
/// Returns an error if the database operation fails. A duplicate hour is a
/// successful [`IngestOutcome::Skipped`], not an error.
pub async fn ingest_observation(
    pool: &SqlitePool,
    observation: &RawObservation,
) -> Result<IngestOutcome, StoreError> {
    let mut observation = observation.clone();
    observation.timestamp = floor_to_hour(observation.timestamp);

    let window_start = observation.timestamp - chrono::Duration::hours(HISTORY_HOURS as i64);
    let window: Vec<_> =
        FeatureStore::query_range(pool, window_start, observation.timestamp)
            .await?
            .into_iter()
            .filter(|record| record.timestamp < observation.timestamp)
            .collect();
    debug!(
        window_len = window.len(),
        timestamp = %observation.timestamp,
        "computing feature record"
    );

    let record = compute_record(&observation, &window);

    match FeatureStore::append(pool, &record).await {
        Ok(()) => {
            info!(timestamp = %record.timestamp, aqi = record.aqi, "feature record stored");
            Ok(IngestOutcome::Stored)
        }
        Err(StoreError::DuplicateTimestamp { timestamp }) => {
            info!(%timestamp, "hour already stored; skipping");
            Ok(IngestOutcome::Skipped)
        }
        Err(err) => Err(err),
    }
}

fn floor_to_hour(ts: chrono::DateTime<chrono::Utc>) -> chrono::DateTime<chrono::Utc> {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use database::{create_pool, run_migrations};

    use super::*;

    async fn test_pool() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.expect("pool");
        run_migrations(&pool).await.expect("migrations");
        pool
    }

    fn observation(hours_offset: i64) -> RawObservation {
        RawObservation {
            timestamp: Utc.with_ymd_and_hms(2026, 4, 1, 0, 17, 23).unwrap()
                + Duration::hours(hours_offset),
            co: 240.0,
            no: 0.4,
            no2: 9.0,
            o3: 35.0,
            so2: 3.0,
            pm2_5: 14.0 + hours_offset as f64,
            pm10: 28.0,
            nh3: 1.0,
            temperature: 21.0,
            humidity: 58.0,
            pressure: 1011.0,
            wind_speed: 3.2,
            wind_direction: 200.0,
            precipitation: 0.0,
            dew_point: 12.5,
        }
    }

    #[tokio::test]
    async fn stores_with_hour_aligned_timestamp() {
        let pool = test_pool().await;
        let outcome = ingest_observation(&pool, &observation(0)).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Stored);

        let records = FeatureStore::all(&pool).await.unwrap();
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn duplicate_hour_is_skipped_not_failed() {
        let pool = test_pool().await;
        ingest_observation(&pool, &observation(0)).await.unwrap();

        // Same hour, different minute: at-least-once redelivery.
        let outcome = ingest_observation(&pool, &observation(0)).await.unwrap();
        assert_eq!(outcome, IngestOutcome::Skipped);
        assert_eq!(FeatureStore::count(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn later_hours_see_prior_window() {
        let pool = test_pool().await;
        for offset in 0..3 {
            ingest_observation(&pool, &observation(offset)).await.unwrap();
        }

        let records = FeatureStore::all(&pool).await.unwrap();
        // The third record's lag-1 pm2_5 is the second record's value.
        assert_eq!(records[2].features["pm2_5_lag_1"], 15.0);
        // And its change rate reflects the hour-over-hour delta.
        assert!((records[2].features["pm2_5_change_rate"] - 1.0 / 15.0).abs() < 1e-12);
    }

    #[tokio::test]
    async fn strict_deserialization_rejects_malformed_payloads() {
        // Missing field.
        let missing = serde_json::json!({"timestamp": "2026-04-01T00:00:00Z", "pm2_5": 10.0});
        assert!(serde_json::from_value::<RawObservation>(missing).is_err());

        // Unknown field.
        let mut full = serde_json::to_value(observation(0)).unwrap();
        full["surprise"] = serde_json::json!(1.0);
        assert!(serde_json::from_value::<RawObservation>(full).is_err());
    }
}

//! Shared domain types and feature computation for the AQI forecasting
//! pipeline.
//!
//! This crate is the single authority on feature semantics: the same
//! [`compute_record`] is used when ingesting a real observation and when the
//! forecaster synthesizes future rows, so train-time and serve-time features
//! can never drift apart.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod aqi;
mod engineering;

pub use engineering::{compute_record, raw_observation_from};

/// Lag offsets, in hours, applied to each column in [`LAG_COLUMNS`].
pub const LAG_HOURS: [usize; 4] = [1, 6, 12, 24];

/// Trailing window sizes, in hours, for rolling statistics.
pub const ROLLING_WINDOWS: [usize; 3] = [6, 12, 24];

/// Columns that receive lag and rolling features.
pub const LAG_COLUMNS: [&str; 5] = ["aqi", "pm2_5", "pm10", "co", "no2"];

/// Columns that receive an hour-over-hour change-rate feature.
pub const CHANGE_RATE_COLUMNS: [&str; 7] = [
    "pm2_5",
    "pm10",
    "co",
    "no2",
    "temperature",
    "humidity",
    "wind_speed",
];

/// Columns that receive a trailing 24h running-sum feature.
pub const CUMULATIVE_COLUMNS: [&str; 3] = ["precipitation", "pm2_5", "pm10"];

/// Hours of prior history needed for full lag/rolling/cumulative coverage.
/// Shorter windows fall back to the missing-value policy documented on
/// [`compute_record`].
pub const HISTORY_HOURS: usize = 24;

/// Raw hourly observation as delivered by the ingestion boundary.
///
/// Pollutant concentrations are in μg/m³ as reported by the provider;
/// weather units are metric (°C, %, hPa, m/s, degrees, mm). Deserialization
/// is strict: a payload with missing or unknown fields is rejected before it
/// reaches feature engineering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawObservation {
    pub timestamp: DateTime<Utc>,
    pub co: f64,
    pub no: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
    pub pm2_5: f64,
    pub pm10: f64,
    pub nh3: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub precipitation: f64,
    pub dew_point: f64,
}

/// One hour of raw plus derived measurements, keyed by timestamp; the unit
/// of the feature store.
///
/// `aqi` is the prediction target (US EPA index, 0–500). `features` holds
/// every named column — raw passthrough and derived — in a deterministic
/// (sorted) order. Records are immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub timestamp: DateTime<Utc>,
    pub aqi: f64,
    pub features: BTreeMap<String, f64>,
}

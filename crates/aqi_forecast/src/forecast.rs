//! Recursive 3-day forecasting engine.
//!
//! Future pollutant/weather inputs are copies of the most recent real
//! observation (the persistence assumption — explicitly not a weather
//! forecast). Each step's synthetic record is appended to an extended
//! read-only view of history before the next step, so day 2's lag features
//! may reference day 1's synthetic record.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use database::{FeatureStore, ModelRegistry};
use feature_engineering::aqi::AqiCategory;
use feature_engineering::{
    compute_record, raw_observation_from, FeatureRecord, RawObservation, HISTORY_HOURS,
};
use ml_model::{StandardScaler, TrainedRegressor};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::ForecastError;

/// Days predicted per forecast.
pub const FORECAST_HORIZON_DAYS: usize = 3;

/// Predicted values at or above this flag an alert.
pub const DEFAULT_HAZARD_THRESHOLD: f64 = 200.0;

/// Alerts escalate from warning to severe at this value.
pub const DEFAULT_SEVERE_THRESHOLD: f64 = 300.0;

/// Tunables for one forecast run.
#[derive(Debug, Clone)]
pub struct ForecastConfig {
    pub family: String,
    pub hazard_threshold: f64,
    pub severe_threshold: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            family: crate::trainer::DEFAULT_FAMILY.to_string(),
            hazard_threshold: DEFAULT_HAZARD_THRESHOLD,
            severe_threshold: DEFAULT_SEVERE_THRESHOLD,
        }
    }
}

/// One forecast day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayForecast {
    pub day: usize,
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    /// Predicted AQI, rounded to two decimals.
    pub aqi: f64,
    /// The model's unrounded output.
    pub raw_value: f64,
    pub category: AqiCategory,
}

/// Alert escalation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Severe,
}

/// A day that crossed the hazard threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDay {
    pub day: usize,
    pub date: NaiveDate,
    pub aqi: f64,
    pub category: AqiCategory,
}

/// Alert summary across the horizon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastAlert {
    pub has_alert: bool,
    pub severity: Option<AlertSeverity>,
    pub max_aqi: f64,
    pub days: Vec<AlertDay>,
    pub message: String,
}

/// The complete forecast output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastReport {
    pub family: String,
    pub model_algorithm: String,
    pub model_version: i64,
    pub days: Vec<DayForecast>,
    pub alert: ForecastAlert,
}

/// Produces the 3-day forecast from the active model and the most recent
/// stored history. Read-only: neither the store nor the registry is mutated,
/// so arbitrarily many forecasts may run concurrently.
///
/// # Errors
///
/// Returns `NoActiveModel` or `InsufficientHistory` (propagated from the
/// registry/store), `FeatureMismatch` if the artifact's contract names
/// columns feature engineering no longer produces, or a payload error if the
/// artifact fails to decode.
pub async fn forecast(
    pool: &SqlitePool,
    config: &ForecastConfig,
) -> Result<ForecastReport, ForecastError> {
    let artifact = ModelRegistry::load_active(pool, &config.family).await?;
    let history = FeatureStore::latest(pool, HISTORY_HOURS).await?;

    let model: TrainedRegressor = serde_json::from_value(artifact.model.clone())?;
    let scaler: StandardScaler = serde_json::from_value(artifact.scaler.clone())?;
    if scaler.len() != artifact.feature_names.len() {
        return Err(ForecastError::ScalerMismatch {
            expected: artifact.feature_names.len(),
            actual: scaler.len(),
        });
    }

    info!(
        family = %config.family,
        algorithm = %artifact.algorithm,
        version = artifact.version,
        history = history.len(),
        "forecasting"
    );

    let last_real = history.last().ok_or(database::StoreError::InsufficientHistory {
        available: 0,
        requested: HISTORY_HOURS,
    })?;
    let anchor = last_real.timestamp;
    let base = raw_observation_from(last_real).ok_or(ForecastError::CorruptRecord {
        timestamp: last_real.timestamp,
    })?;

    // The recursive fold: each synthesized record extends the window the
    // next day is computed against.
    let mut window = history;
    let mut days = Vec::with_capacity(FORECAST_HORIZON_DAYS);
    for day in 1..=FORECAST_HORIZON_DAYS {
        let record = synthesize_day(&base, anchor, day as i64, &window);

        let row = contract_row(&record, &artifact.feature_names)?;
        let raw_value = model.predict_row(&scaler.transform_row(&row));
        let aqi = (raw_value * 100.0).round() / 100.0;

        days.push(DayForecast {
            day,
            date: record.timestamp.date_naive(),
            timestamp: record.timestamp,
            aqi,
            raw_value,
            category: AqiCategory::from_value(aqi),
        });
        window.push(record);
    }

    let alert = build_alert(&days, config);
    Ok(ForecastReport {
        family: artifact.family,
        model_algorithm: artifact.algorithm,
        model_version: artifact.version,
        days,
        alert,
    })
}

/// Computes the synthetic feature record for `anchor + day` days: raw inputs
/// persist from the last real observation, derived features come from the
/// shared engineering path over the extended window.
fn synthesize_day(
    base: &RawObservation,
    anchor: DateTime<Utc>,
    day: i64,
    window: &[FeatureRecord],
) -> FeatureRecord {
    let mut observation = base.clone();
    observation.timestamp = anchor + Duration::days(day);
    compute_record(&observation, window)
}

/// Selects exactly the contracted columns, in contract order.
fn contract_row(
    record: &FeatureRecord,
    feature_names: &[String],
) -> Result<Vec<f64>, ForecastError> {
    let mut row = Vec::with_capacity(feature_names.len());
    let mut missing = Vec::new();
    for name in feature_names {
        match record.features.get(name) {
            Some(value) => row.push(*value),
            None => missing.push(name.clone()),
        }
    }
    if !missing.is_empty() {
        return Err(ForecastError::FeatureMismatch { missing });
    }
    Ok(row)
}

fn build_alert(days: &[DayForecast], config: &ForecastConfig) -> ForecastAlert {
    let max_aqi = days.iter().map(|d| d.aqi).fold(0.0_f64, f64::max);
    let alert_days: Vec<AlertDay> = days
        .iter()
        .filter(|d| d.aqi >= config.hazard_threshold)
        .map(|d| AlertDay {
            day: d.day,
            date: d.date,
            aqi: d.aqi,
            category: d.category,
        })
        .collect();

    if alert_days.is_empty() {
        return ForecastAlert {
            has_alert: false,
            severity: None,
            max_aqi,
            days: alert_days,
            message: format!(
                "No hazardous AQI levels predicted for the next {FORECAST_HORIZON_DAYS} days"
            ),
        };
    }

    let (severity, message) = if max_aqi >= config.severe_threshold {
        (
            AlertSeverity::Severe,
            "SEVERE ALERT: Very Unhealthy/Hazardous AQI levels predicted".to_string(),
        )
    } else {
        (
            AlertSeverity::Warning,
            "ALERT: Unhealthy AQI levels predicted".to_string(),
        )
    };

    ForecastAlert {
        has_alert: true,
        severity: Some(severity),
        max_aqi,
        days: alert_days,
        message,
    }
}

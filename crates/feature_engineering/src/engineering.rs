//! Derivation of a [`FeatureRecord`] from a raw observation and its trailing
//! window of prior records.

use std::collections::BTreeMap;

use chrono::{Datelike, Timelike};

use crate::aqi::epa_aqi;
use crate::{
    FeatureRecord, RawObservation, CHANGE_RATE_COLUMNS, CUMULATIVE_COLUMNS, LAG_COLUMNS,
    LAG_HOURS, ROLLING_WINDOWS,
};

/// Raw columns carried verbatim into the feature map, in schema order.
const RAW_COLUMNS: [&str; 15] = [
    "co",
    "no",
    "no2",
    "o3",
    "so2",
    "pm2_5",
    "pm10",
    "nh3",
    "temperature",
    "humidity",
    "pressure",
    "wind_speed",
    "wind_direction",
    "precipitation",
    "dew_point",
];

/// Computes the full feature record for one observation.
///
/// `prior_window` is the ordered (ascending) sequence of records strictly
/// preceding the observation, at most [`crate::HISTORY_HOURS`] of which are
/// consulted. The function is deterministic and side-effect free; it is the
/// shared path for both ingestion and forecast synthesis.
///
/// Missing-value policy for short windows:
/// - a lag that reaches beyond the available history is filled with the mean
///   of the available values of that column (window plus current value);
/// - rolling statistics aggregate however many trailing values exist
///   (at minimum the current value); a standard deviation over fewer than
///   two values is 0.0;
/// - a change rate with no predecessor, or a zero predecessor, is 0.0.
///
/// No produced value is ever NaN or infinite.
pub fn compute_record(obs: &RawObservation, prior_window: &[FeatureRecord]) -> FeatureRecord {
    let aqi = epa_aqi(obs);
    let mut features = BTreeMap::new();

    for (name, value) in raw_columns(obs) {
        features.insert(name.to_string(), finite(value));
    }

    insert_temporal(&mut features, obs);

    for col in LAG_COLUMNS {
        let series = column_series(col, obs, aqi, prior_window);
        for lag in LAG_HOURS {
            features.insert(format!("{col}_lag_{lag}"), lag_value(&series, lag));
        }
        for window in ROLLING_WINDOWS {
            let tail = trailing(&series, window);
            features.insert(format!("{col}_rolling_mean_{window}h"), mean(tail));
            features.insert(format!("{col}_rolling_std_{window}h"), sample_std(tail));
            features.insert(format!("{col}_rolling_min_{window}h"), min(tail));
            features.insert(format!("{col}_rolling_max_{window}h"), max(tail));
        }
    }

    for col in CHANGE_RATE_COLUMNS {
        let series = column_series(col, obs, aqi, prior_window);
        features.insert(format!("{col}_change_rate"), change_rate(&series));
    }

    for col in CUMULATIVE_COLUMNS {
        let series = column_series(col, obs, aqi, prior_window);
        let tail = trailing(&series, crate::HISTORY_HOURS);
        features.insert(format!("{col}_cumsum_24h"), finite(tail.iter().sum()));
    }

    // Interaction and polynomial terms.
    features.insert(
        "temp_humidity_interaction".to_string(),
        finite(obs.temperature * obs.humidity),
    );
    features.insert(
        "wind_pm2_5_interaction".to_string(),
        finite(obs.wind_speed * obs.pm2_5),
    );
    features.insert(
        "wind_temp_interaction".to_string(),
        finite(obs.wind_speed * obs.temperature),
    );
    features.insert(
        "humidity_pm2_5_interaction".to_string(),
        finite(obs.humidity * obs.pm2_5),
    );
    features.insert(
        "temperature_squared".to_string(),
        finite(obs.temperature * obs.temperature),
    );
    features.insert("pm2_5_squared".to_string(), finite(obs.pm2_5 * obs.pm2_5));

    // Alert flags (EPA-scale thresholds).
    features.insert(
        "high_pollution_alert".to_string(),
        f64::from(u8::from(aqi > 150.0)),
    );
    features.insert(
        "rain_alert".to_string(),
        f64::from(u8::from(obs.precipitation > 0.0)),
    );
    features.insert(
        "high_pm2_5_alert".to_string(),
        f64::from(u8::from(obs.pm2_5 > 15.0)),
    );
    features.insert(
        "high_temp_alert".to_string(),
        f64::from(u8::from(obs.temperature > 35.0)),
    );

    FeatureRecord {
        timestamp: obs.timestamp,
        aqi,
        features,
    }
}

/// Reconstructs the raw observation embedded in a stored record, or `None`
/// if any raw column is absent (a record written by an older engineering
/// revision).
pub fn raw_observation_from(record: &FeatureRecord) -> Option<RawObservation> {
    let get = |name: &str| record.features.get(name).copied();
    Some(RawObservation {
        timestamp: record.timestamp,
        co: get("co")?,
        no: get("no")?,
        no2: get("no2")?,
        o3: get("o3")?,
        so2: get("so2")?,
        pm2_5: get("pm2_5")?,
        pm10: get("pm10")?,
        nh3: get("nh3")?,
        temperature: get("temperature")?,
        humidity: get("humidity")?,
        pressure: get("pressure")?,
        wind_speed: get("wind_speed")?,
        wind_direction: get("wind_direction")?,
        precipitation: get("precipitation")?,
        dew_point: get("dew_point")?,
    })
}

fn raw_columns(obs: &RawObservation) -> [(&'static str, f64); 15] {
    [
        ("co", obs.co),
        ("no", obs.no),
        ("no2", obs.no2),
        ("o3", obs.o3),
        ("so2", obs.so2),
        ("pm2_5", obs.pm2_5),
        ("pm10", obs.pm10),
        ("nh3", obs.nh3),
        ("temperature", obs.temperature),
        ("humidity", obs.humidity),
        ("pressure", obs.pressure),
        ("wind_speed", obs.wind_speed),
        ("wind_direction", obs.wind_direction),
        ("precipitation", obs.precipitation),
        ("dew_point", obs.dew_point),
    ]
}

fn insert_temporal(features: &mut BTreeMap<String, f64>, obs: &RawObservation) {
    let ts = obs.timestamp;
    let month = ts.month();
    let hour = ts.hour();
    let weekday = ts.weekday().num_days_from_monday();

    features.insert("year".to_string(), f64::from(ts.year()));
    features.insert("month".to_string(), f64::from(month));
    features.insert("day".to_string(), f64::from(ts.day()));
    features.insert("hour".to_string(), f64::from(hour));
    features.insert("weekday".to_string(), f64::from(weekday));
    features.insert(
        "is_weekend".to_string(),
        f64::from(u8::from(weekday >= 5)),
    );

    let season = match month {
        12 | 1 | 2 => 1.0,
        3..=5 => 2.0,
        6..=8 => 3.0,
        _ => 4.0,
    };
    features.insert("season".to_string(), season);

    let time_of_day = match hour {
        0..=5 => 0.0,
        6..=11 => 1.0,
        12..=17 => 2.0,
        _ => 3.0,
    };
    features.insert("time_of_day".to_string(), time_of_day);
}

/// The chronological value series for one column: prior-window values (where
/// present) followed by the current observation's value. At most the last
/// [`crate::HISTORY_HOURS`] prior records contribute.
fn column_series(
    col: &str,
    obs: &RawObservation,
    current_aqi: f64,
    prior_window: &[FeatureRecord],
) -> Vec<f64> {
    let start = prior_window.len().saturating_sub(crate::HISTORY_HOURS);
    let mut series: Vec<f64> = prior_window[start..]
        .iter()
        .filter_map(|record| {
            if col == "aqi" {
                Some(record.aqi)
            } else {
                record.features.get(col).copied()
            }
        })
        .collect();
    series.push(current_value(col, obs, current_aqi));
    series
}

fn current_value(col: &str, obs: &RawObservation, current_aqi: f64) -> f64 {
    if col == "aqi" {
        return current_aqi;
    }
    raw_columns(obs)
        .iter()
        .find(|(name, _)| *name == col)
        .map_or(0.0, |(_, value)| *value)
}

/// Value `lag` steps before the series end, or the series mean when the
/// history is too short (the documented mean-substitution policy).
fn lag_value(series: &[f64], lag: usize) -> f64 {
    if series.len() > lag {
        series[series.len() - 1 - lag]
    } else {
        mean(series)
    }
}

fn trailing(series: &[f64], window: usize) -> &[f64] {
    &series[series.len().saturating_sub(window)..]
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    finite(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation; 0.0 for fewer than two values.
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    finite(variance.sqrt())
}

fn min(values: &[f64]) -> f64 {
    finite(values.iter().copied().fold(f64::INFINITY, f64::min))
}

fn max(values: &[f64]) -> f64 {
    finite(values.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

/// Fractional change of the last value vs. its predecessor.
fn change_rate(series: &[f64]) -> f64 {
    if series.len() < 2 {
        return 0.0;
    }
    let current = series[series.len() - 1];
    let previous = series[series.len() - 2];
    if previous == 0.0 {
        return 0.0;
    }
    finite((current - previous) / previous)
}

fn finite(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

//! US EPA Air Quality Index calculation and category bands.
//!
//! Converts pollutant concentrations to the EPA AQI (0–500 scale) using the
//! published breakpoint tables. The overall index is the worst per-pollutant
//! sub-index.

use serde::{Deserialize, Serialize};

use crate::RawObservation;

/// Breakpoint row: (concentration low, concentration high, index low, index high).
type Breakpoint = (f64, f64, f64, f64);

const PM25_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 12.0, 0.0, 50.0),
    (12.1, 35.4, 51.0, 100.0),
    (35.5, 55.4, 101.0, 150.0),
    (55.5, 150.4, 151.0, 200.0),
    (150.5, 250.4, 201.0, 300.0),
    (250.5, 350.4, 301.0, 400.0),
    (350.5, 500.4, 401.0, 500.0),
];

const PM10_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 54.0, 0.0, 50.0),
    (55.0, 154.0, 51.0, 100.0),
    (155.0, 254.0, 101.0, 150.0),
    (255.0, 354.0, 151.0, 200.0),
    (355.0, 424.0, 201.0, 300.0),
    (425.0, 504.0, 301.0, 400.0),
    (505.0, 604.0, 401.0, 500.0),
];

/// O3 8-hour breakpoints (ppb). The EPA table stops at 200 ppb.
const O3_BREAKPOINTS: [Breakpoint; 5] = [
    (0.0, 54.0, 0.0, 50.0),
    (55.0, 70.0, 51.0, 100.0),
    (71.0, 85.0, 101.0, 150.0),
    (86.0, 105.0, 151.0, 200.0),
    (106.0, 200.0, 201.0, 300.0),
];

const NO2_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 53.0, 0.0, 50.0),
    (54.0, 100.0, 51.0, 100.0),
    (101.0, 360.0, 101.0, 150.0),
    (361.0, 649.0, 151.0, 200.0),
    (650.0, 1249.0, 201.0, 300.0),
    (1250.0, 1649.0, 301.0, 400.0),
    (1650.0, 2049.0, 401.0, 500.0),
];

const SO2_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 35.0, 0.0, 50.0),
    (36.0, 75.0, 51.0, 100.0),
    (76.0, 185.0, 101.0, 150.0),
    (186.0, 304.0, 151.0, 200.0),
    (305.0, 604.0, 201.0, 300.0),
    (605.0, 804.0, 301.0, 400.0),
    (805.0, 1004.0, 401.0, 500.0),
];

const CO_BREAKPOINTS: [Breakpoint; 7] = [
    (0.0, 4.4, 0.0, 50.0),
    (4.5, 9.4, 51.0, 100.0),
    (9.5, 12.4, 101.0, 150.0),
    (12.5, 15.4, 151.0, 200.0),
    (15.5, 30.4, 201.0, 300.0),
    (30.5, 40.4, 301.0, 400.0),
    (40.5, 50.4, 401.0, 500.0),
];

/// Linear interpolation within a breakpoint table, rounded to one decimal.
fn interpolate(value: f64, table: &[Breakpoint], overflow: f64) -> Option<f64> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    for &(c_low, c_high, i_low, i_high) in table {
        if value >= c_low && value <= c_high {
            let index = ((i_high - i_low) / (c_high - c_low)) * (value - c_low) + i_low;
            return Some((index * 10.0).round() / 10.0);
        }
    }
    // Above the highest breakpoint the table's ceiling applies.
    let &(_, top, ..) = table.last()?;
    (value > top).then_some(overflow)
}

/// AQI sub-index for PM2.5 (μg/m³).
pub fn pm2_5_sub_index(pm2_5: f64) -> Option<f64> {
    interpolate(pm2_5, &PM25_BREAKPOINTS, 500.0)
}

/// AQI sub-index for PM10 (μg/m³).
pub fn pm10_sub_index(pm10: f64) -> Option<f64> {
    interpolate(pm10, &PM10_BREAKPOINTS, 500.0)
}

/// AQI sub-index for O3 (ppb).
pub fn o3_sub_index(o3_ppb: f64) -> Option<f64> {
    interpolate(o3_ppb, &O3_BREAKPOINTS, 300.0)
}

/// AQI sub-index for NO2 (ppb).
pub fn no2_sub_index(no2_ppb: f64) -> Option<f64> {
    interpolate(no2_ppb, &NO2_BREAKPOINTS, 500.0)
}

/// AQI sub-index for SO2 (ppb).
pub fn so2_sub_index(so2_ppb: f64) -> Option<f64> {
    interpolate(so2_ppb, &SO2_BREAKPOINTS, 500.0)
}

/// AQI sub-index for CO (ppm).
pub fn co_sub_index(co_ppm: f64) -> Option<f64> {
    interpolate(co_ppm, &CO_BREAKPOINTS, 500.0)
}

/// Converts μg/m³ to ppb at 25 °C and 1 atm via the ideal-gas molar volume.
pub fn ug_to_ppb(ug_m3: f64, molecular_weight: f64) -> f64 {
    const TEMP_K: f64 = 298.15;
    const PRESSURE_KPA: f64 = 101.325;
    let molar_volume = (8.314 * TEMP_K) / PRESSURE_KPA; // L/mol
    (ug_m3 / molecular_weight) * molar_volume
}

/// Overall EPA AQI for an observation: the worst sub-index across the
/// pollutants present (values ≤ 0 are treated as not measured), rounded to
/// one decimal. Returns 0.0 if nothing is measured.
pub fn epa_aqi(obs: &RawObservation) -> f64 {
    let mut sub_indices = Vec::with_capacity(6);

    if obs.pm2_5 > 0.0 {
        sub_indices.extend(pm2_5_sub_index(obs.pm2_5));
    }
    if obs.pm10 > 0.0 {
        sub_indices.extend(pm10_sub_index(obs.pm10));
    }
    if obs.o3 > 0.0 {
        sub_indices.extend(o3_sub_index(ug_to_ppb(obs.o3, 48.0)));
    }
    if obs.no2 > 0.0 {
        sub_indices.extend(no2_sub_index(ug_to_ppb(obs.no2, 46.0)));
    }
    if obs.so2 > 0.0 {
        sub_indices.extend(so2_sub_index(ug_to_ppb(obs.so2, 64.0)));
    }
    if obs.co > 0.0 {
        // CO is indexed in ppm.
        let co_ppm = (obs.co / 28.0) * 24.45 / 1000.0;
        sub_indices.extend(co_sub_index(co_ppm));
    }

    let worst = sub_indices.into_iter().fold(0.0_f64, f64::max);
    (worst * 10.0).round() / 10.0
}

/// The six fixed AQI bands, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display)]
pub enum AqiCategory {
    #[strum(to_string = "Good")]
    Good,
    #[strum(to_string = "Moderate")]
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    #[strum(to_string = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    #[strum(to_string = "Unhealthy")]
    Unhealthy,
    #[serde(rename = "Very Unhealthy")]
    #[strum(to_string = "Very Unhealthy")]
    VeryUnhealthy,
    #[strum(to_string = "Hazardous")]
    Hazardous,
}

impl AqiCategory {
    /// Classifies an AQI value into its band.
    pub fn from_value(aqi: f64) -> Self {
        if aqi <= 50.0 {
            Self::Good
        } else if aqi <= 100.0 {
            Self::Moderate
        } else if aqi <= 150.0 {
            Self::UnhealthyForSensitiveGroups
        } else if aqi <= 200.0 {
            Self::Unhealthy
        } else if aqi <= 300.0 {
            Self::VeryUnhealthy
        } else {
            Self::Hazardous
        }
    }

    /// Short health guidance for the band.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Good => "Air quality is satisfactory",
            Self::Moderate => "Air quality is acceptable",
            Self::UnhealthyForSensitiveGroups => {
                "Sensitive groups may experience health effects"
            }
            Self::Unhealthy => "Everyone may begin to experience health effects",
            Self::VeryUnhealthy => {
                "Health alert: everyone may experience serious effects"
            }
            Self::Hazardous => "Health warning of emergency conditions",
        }
    }
}

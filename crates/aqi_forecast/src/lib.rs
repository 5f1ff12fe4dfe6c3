//! AQI Forecast
//!
//! A machine learning pipeline that forecasts the air quality index for a
//! fixed location three days ahead from hourly weather and pollution
//! observations.

pub mod commands;
pub mod error;
pub mod forecast;
pub mod ingest;
pub mod trainer;

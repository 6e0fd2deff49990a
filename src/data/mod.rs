//! Core data models for weatherdash
//!
//! This module contains the types returned by the weather backend: the current
//! conditions snapshot, hourly entries and daily forecast entries.

pub mod backend;

pub use backend::{BackendClient, CityReport, FetchError, RequestScope};

use serde::{Deserialize, Serialize};

/// Number of hourly entries kept from the `/hourly` endpoint
pub const HOURLY_WINDOW: usize = 24;

/// Current conditions for one city at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// City name as resolved by the backend
    pub city: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Free-text weather description (e.g. "light rain")
    pub description: String,
    /// Relative humidity percentage
    pub humidity: f64,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Latitude coordinate
    pub lat: f64,
    /// Longitude coordinate
    pub lon: f64,
    /// Offset from UTC in seconds (east positive)
    pub timezone: i32,
}

/// A single hour of weather, as returned by `/hourly` and `/hourly_forecast`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Timestamp label in "YYYY-MM-DD HH:MM" form
    pub time: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Free-text weather description
    pub description: String,
    /// OpenWeatherMap icon code (e.g. "10n")
    pub icon: String,
}

impl HourlyEntry {
    /// Date part of the timestamp label
    pub fn date_label(&self) -> &str {
        self.time.split(' ').next().unwrap_or_default()
    }

    /// Clock part of the timestamp label, or the whole label if it has no space
    pub fn clock_label(&self) -> &str {
        self.time.split(' ').nth(1).unwrap_or(&self.time)
    }

    /// Hour of the timestamp label, if it parses
    pub fn hour(&self) -> Option<u8> {
        self.clock_label().split(':').next()?.parse().ok()
    }
}

/// One day of the multi-day forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    /// Date key in YYYY-MM-DD form
    pub date: String,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Free-text weather description
    pub description: String,
}

/// Error payload the backend sends with failure statuses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    pub error: Option<String>,
    pub details: Option<String>,
}

/// Drops forecast days whose date already appeared earlier in the sequence.
///
/// Returns the number of entries removed.
pub fn dedup_forecast(days: &mut Vec<ForecastDay>) -> usize {
    let before = days.len();
    let mut seen = std::collections::HashSet::new();
    days.retain(|day| seen.insert(day.date.clone()));
    before - days.len()
}

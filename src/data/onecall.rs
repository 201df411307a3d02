//! Typed view over a One Call payload
//!
//! The client hands back the One Call response untouched. This module picks out
//! the parts the CLI shows: current conditions and government weather alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WeatherError;

/// Base URL for condition icons
const ICON_BASE_URL: &str = "http://openweathermap.org/img/wn";

/// Current conditions from the `current` section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentConditions {
    /// Observation time
    #[serde(rename = "dt", with = "chrono::serde::ts_seconds")]
    pub observed_at: DateTime<Utc>,
    /// Temperature in the requested units
    pub temp: f64,
    /// Feels-like temperature in the requested units
    pub feels_like: f64,
    /// Relative humidity percentage (0-100)
    pub humidity: u8,
    /// Wind speed in the requested units
    #[serde(default)]
    pub wind_speed: f64,
    /// Condition entries; the first one is the primary condition
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
}

/// One entry of the `weather` array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConditionEntry {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl CurrentConditions {
    /// Human-readable description of the primary condition
    pub fn description(&self) -> Option<&str> {
        self.weather.first().map(|w| w.description.as_str())
    }

    /// URL of the primary condition icon at 2x resolution
    pub fn icon_url(&self) -> Option<String> {
        self.weather
            .first()
            .map(|w| format!("{}/{}@2x.png", ICON_BASE_URL, w.icon))
    }
}

/// A government weather alert
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherAlert {
    /// Issuing agency
    #[serde(default)]
    pub sender_name: String,
    /// Alert event name
    pub event: String,
    /// Start of the alert
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    /// End of the alert
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end: DateTime<Utc>,
    /// Full alert text
    #[serde(default)]
    pub description: String,
}

/// The parts of a One Call response shown to users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneCallSummary {
    /// IANA timezone name of the location
    #[serde(default)]
    pub timezone: String,
    /// Current conditions; absent when `current` was excluded
    #[serde(default)]
    pub current: Option<CurrentConditions>,
    /// Active alerts; empty when the API reports none
    #[serde(default)]
    pub alerts: Vec<WeatherAlert>,
}

impl OneCallSummary {
    /// Projects a raw One Call response
    ///
    /// # Returns
    /// * `Ok(OneCallSummary)` - The typed view
    /// * `Err(WeatherError::Parse)` - If a present section is malformed
    pub fn from_response(response: &Value) -> Result<Self, WeatherError> {
        Ok(Self::deserialize(response)?)
    }
}

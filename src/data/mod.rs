//! Core data models for the OpenWeatherMap connection
//!
//! This module contains the request, location and option types shared by the
//! client, the One Call view and the CLI.

pub mod client;
pub mod onecall;
pub mod transport;

pub use client::{
    CachedWeatherClient, WeatherError, DEFAULT_GEO_FRESHNESS, DEFAULT_ONE_CALL_FRESHNESS,
    DEFAULT_QUERY_FRESHNESS,
};
pub use onecall::{CurrentConditions, OneCallSummary, WeatherAlert};
pub use transport::{HttpTransport, Transport, TransportError};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A logical OpenWeatherMap request
///
/// All four fields together form the cache identity. The freshness window is
/// supplied separately on each call and never takes part in equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryRequest {
    /// API family path segment, e.g. `geo` or `data`
    pub api_family: String,
    /// API version path segment, e.g. `1.0`
    pub api_version: String,
    /// Endpoint path segment, e.g. `direct`
    pub endpoint: String,
    /// Already-encoded query string without the leading `?`
    pub query: String,
}

impl QueryRequest {
    pub fn new(
        api_family: impl Into<String>,
        api_version: impl Into<String>,
        endpoint: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            api_family: api_family.into(),
            api_version: api_version.into(),
            endpoint: endpoint.into(),
            query: query.into(),
        }
    }

    /// Substitutes the request into the URL template
    ///
    /// `{base_url}/{api_family}/{api_version}/{endpoint}?{query}&appid={api_key}`.
    /// Field contents are not validated or escaped.
    pub fn url(&self, base_url: &str, api_key: &str) -> String {
        format!(
            "{}/{}/{}/{}?{}&appid={}",
            base_url.trim_end_matches('/'),
            self.api_family,
            self.api_version,
            self.endpoint,
            self.query,
            api_key
        )
    }
}

impl fmt::Display for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}?{}",
            self.api_family, self.api_version, self.endpoint, self.query
        )
    }
}

/// A geocoded location, taken from the first geocoding match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Name of the matched location
    #[serde(default)]
    pub name: String,
    /// Latitude coordinate
    #[serde(rename = "lat")]
    pub latitude: f64,
    /// Longitude coordinate
    #[serde(rename = "lon")]
    pub longitude: f64,
    /// ISO 3166 country code
    #[serde(rename = "country")]
    pub country_code: String,
    /// State or region, when the API provides one
    #[serde(default)]
    pub state: Option<String>,
    /// Location name keyed by language code
    #[serde(default)]
    pub local_names: BTreeMap<String, String>,
}

impl GeoCoordinate {
    /// Localized name for a language code, if known
    pub fn local_name(&self, lang: &str) -> Option<&str> {
        self.local_names.get(lang).map(String::as_str)
    }
}

/// Units of measurement for One Call responses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Celsius, metres per second
    #[default]
    Metric,
    /// Fahrenheit, miles per hour
    Imperial,
    /// Kelvin, metres per second
    Standard,
}

impl Units {
    /// Value sent as the `units` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
            Units::Standard => "standard",
        }
    }

    /// Parses a units name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "metric" => Some(Units::Metric),
            "imperial" => Some(Units::Imperial),
            "standard" => Some(Units::Standard),
            _ => None,
        }
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
            Units::Standard => "K",
        }
    }

    pub fn wind_speed_label(&self) -> &'static str {
        match self {
            Units::Imperial => "mph",
            Units::Metric | Units::Standard => "m/s",
        }
    }
}

/// Sections of the One Call payload that can be left out
///
/// Ordering follows declaration order, which is also the order used when the
/// set is joined into the `exclude` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcludeSection {
    Current,
    Minutely,
    Hourly,
    Daily,
    Alerts,
}

impl ExcludeSection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExcludeSection::Current => "current",
            ExcludeSection::Minutely => "minutely",
            ExcludeSection::Hourly => "hourly",
            ExcludeSection::Daily => "daily",
            ExcludeSection::Alerts => "alerts",
        }
    }

    /// Parses a section name (case-insensitive)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "current" => Some(ExcludeSection::Current),
            "minutely" => Some(ExcludeSection::Minutely),
            "hourly" => Some(ExcludeSection::Hourly),
            "daily" => Some(ExcludeSection::Daily),
            "alerts" => Some(ExcludeSection::Alerts),
            _ => None,
        }
    }
}

/// Options for a One Call request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneCallOptions {
    /// Units of measurement
    pub units: Units,
    /// Sections to leave out of the payload
    pub exclude: BTreeSet<ExcludeSection>,
    /// Freshness window for the One Call query itself
    pub freshness: Duration,
}

impl Default for OneCallOptions {
    fn default() -> Self {
        Self {
            units: Units::default(),
            exclude: BTreeSet::new(),
            freshness: DEFAULT_ONE_CALL_FRESHNESS,
        }
    }
}

impl OneCallOptions {
    /// Query string for a coordinate, e.g. `lat=48.85&lon=2.35&units=metric`
    pub fn query_for(&self, latitude: f64, longitude: f64) -> String {
        let mut query = format!("lat={}&lon={}", latitude, longitude);
        if !self.exclude.is_empty() {
            let sections: Vec<&str> = self.exclude.iter().map(ExcludeSection::as_str).collect();
            query.push_str("&exclude=");
            query.push_str(&sections.join(","));
        }
        query.push_str("&units=");
        query.push_str(self.units.as_str());
        query
    }
}

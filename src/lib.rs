//! owm-connect library
//!
//! A cached connection to the OpenWeatherMap API: URL templating, HTTP GET,
//! JSON decoding and time-windowed memoization, plus geocoding and One Call
//! helpers. The `owm` binary is a thin demo on top of this crate.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;

pub use config::{ApiKey, ConfigError, Settings};
pub use data::{
    CachedWeatherClient, ExcludeSection, GeoCoordinate, OneCallOptions, OneCallSummary,
    QueryRequest, Units, WeatherError,
};

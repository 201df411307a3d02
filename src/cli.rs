//! Command-line interface for the `owm` demo binary
//!
//! This module handles parsing of CLI arguments using clap, turns the weather
//! options into a `OneCallOptions`, and formats results for the terminal.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use clap::{Parser, Subcommand};
use thiserror::Error;

use crate::config::API_KEY_ENV;
use crate::data::{
    ExcludeSection, GeoCoordinate, OneCallOptions, OneCallSummary, Units, DEFAULT_GEO_FRESHNESS,
    DEFAULT_ONE_CALL_FRESHNESS, DEFAULT_QUERY_FRESHNESS,
};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified units name is not recognized
    #[error("Invalid units: '{0}'. Valid units: metric, imperial, standard")]
    InvalidUnits(String),

    /// The specified section name is not recognized
    #[error("Invalid exclude section: '{0}'. Valid sections: current, minutely, hourly, daily, alerts")]
    InvalidExcludeSection(String),
}

/// owm - cached OpenWeatherMap lookups
#[derive(Parser, Debug)]
#[command(name = "owm")]
#[command(about = "Cached OpenWeatherMap lookups: geocoding and One Call weather")]
#[command(version)]
pub struct Cli {
    /// OpenWeatherMap API key (overrides secrets.toml)
    #[arg(long, env = API_KEY_ENV, hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Path to a secrets.toml with a [connections.openweathermap] section
    #[arg(long, value_name = "PATH", global = true)]
    pub secrets: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Call any endpoint: http://api.openweathermap.org/{family}/{version}/{endpoint}?{query}
    ///
    /// Example:
    ///   owm query geo 1.0 direct "q=London&limit=1"
    Query {
        /// API family, e.g. geo or data
        api_family: String,
        /// API version, e.g. 1.0
        api_version: String,
        /// Endpoint, e.g. direct
        endpoint: String,
        /// Encoded query string, e.g. q=London&limit=1
        query: String,
        /// Freshness window in seconds
        #[arg(long, default_value_t = DEFAULT_QUERY_FRESHNESS.as_secs())]
        ttl: u64,
    },

    /// Resolve a city name to coordinates
    Coords {
        city: String,
        /// Also show the name in this language (e.g. fr)
        #[arg(long, value_name = "CODE")]
        lang: Option<String>,
        /// Freshness window in seconds
        #[arg(long, default_value_t = DEFAULT_GEO_FRESHNESS.as_secs())]
        ttl: u64,
    },

    /// Show current weather and alerts for one or more cities
    ///
    /// Examples:
    ///   owm weather Paris
    ///   owm weather Paris London --units imperial --exclude minutely,hourly
    Weather {
        #[arg(required = true)]
        cities: Vec<String>,
        /// Units: metric, imperial or standard
        #[arg(long, default_value = "metric")]
        units: String,
        /// Comma-separated sections to leave out: current, minutely, hourly, daily, alerts
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
        /// Freshness window in seconds for the One Call request
        #[arg(long, default_value_t = DEFAULT_ONE_CALL_FRESHNESS.as_secs())]
        ttl: u64,
        /// Print the raw One Call response instead of a summary
        #[arg(long)]
        json: bool,
    },
}

/// Parses a units argument into a Units value
pub fn parse_units_arg(s: &str) -> Result<Units, CliError> {
    Units::from_str(s).ok_or_else(|| CliError::InvalidUnits(s.to_string()))
}

/// Parses a single exclude argument into an ExcludeSection
pub fn parse_exclude_arg(s: &str) -> Result<ExcludeSection, CliError> {
    ExcludeSection::from_str(s).ok_or_else(|| CliError::InvalidExcludeSection(s.to_string()))
}

/// Builds One Call options from the `weather` arguments
///
/// # Returns
/// * `Ok(OneCallOptions)` with the parsed units, exclusions and window
/// * `Err(CliError)` if any units or section name is unknown
pub fn one_call_options(
    units: &str,
    exclude: &[String],
    ttl_secs: u64,
) -> Result<OneCallOptions, CliError> {
    let units = parse_units_arg(units)?;
    let exclude = exclude
        .iter()
        .filter(|s| !s.trim().is_empty())
        .map(|s| parse_exclude_arg(s))
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(OneCallOptions {
        units,
        exclude,
        freshness: Duration::from_secs(ttl_secs),
    })
}

/// OpenStreetMap link centred on a location
pub fn map_url(geo: &GeoCoordinate) -> String {
    format!(
        "https://www.openstreetmap.org/?mlat={lat}&mlon={lon}#map=11/{lat}/{lon}",
        lat = geo.latitude,
        lon = geo.longitude
    )
}

/// Formats a geocoding result
pub fn render_coordinates(geo: &GeoCoordinate, lang: Option<&str>) -> String {
    let mut out = String::new();
    let place = match &geo.state {
        Some(state) => format!("{}, {} ({})", geo.name, state, geo.country_code),
        None => format!("{} ({})", geo.name, geo.country_code),
    };
    let _ = writeln!(out, "{}", place);
    let _ = writeln!(out, "  lat {}, lon {}", geo.latitude, geo.longitude);
    if let Some(lang) = lang {
        match geo.local_name(lang) {
            Some(name) => {
                let _ = writeln!(out, "  {}: {}", lang, name);
            }
            None => {
                let _ = writeln!(out, "  {}: (no local name)", lang);
            }
        }
    }
    out
}

/// Formats current conditions, a map link and alerts for a city
pub fn render_weather(
    city: &str,
    geo: &GeoCoordinate,
    summary: &OneCallSummary,
    units: Units,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Current weather for {} ({})", city, geo.country_code);

    match &summary.current {
        Some(current) => {
            let _ = writeln!(
                out,
                "  Temperature  {:.1} {} (feels like {:.1} {})",
                current.temp,
                units.temperature_label(),
                current.feels_like,
                units.temperature_label()
            );
            let _ = writeln!(out, "  Humidity     {}%", current.humidity);
            let _ = writeln!(
                out,
                "  Wind         {:.1} {}",
                current.wind_speed,
                units.wind_speed_label()
            );
            if let Some(description) = current.description() {
                let _ = writeln!(out, "  Conditions   {}", description);
            }
            if let Some(icon) = current.icon_url() {
                let _ = writeln!(out, "  Icon         {}", icon);
            }
        }
        None => {
            let _ = writeln!(out, "  (current conditions excluded)");
        }
    }
    let _ = writeln!(out, "  Map          {}", map_url(geo));

    if !summary.alerts.is_empty() {
        let _ = writeln!(out, "  Alerts:");
        for alert in &summary.alerts {
            let _ = writeln!(out, "  ! {}", alert.event);
            let _ = writeln!(
                out,
                "    From {} to {}",
                alert.start.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                alert.end.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
            if !alert.sender_name.is_empty() {
                let _ = writeln!(out, "    Issued by {}", alert.sender_name);
            }
            for line in alert.description.lines().filter(|l| !l.trim().is_empty()) {
                let _ = writeln!(out, "    {}", line.trim());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{CurrentConditions, WeatherAlert};
    use clap::CommandFactory;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn paris() -> GeoCoordinate {
        GeoCoordinate {
            name: "Paris".to_string(),
            latitude: 48.85,
            longitude: 2.35,
            country_code: "FR".to_string(),
            state: Some("Ile-de-France".to_string()),
            local_names: BTreeMap::from([("fr".to_string(), "Paris".to_string())]),
        }
    }

    #[test]
    fn test_parse_units_arg() {
        assert_eq!(parse_units_arg("metric").unwrap(), Units::Metric);
        assert_eq!(parse_units_arg("imperial").unwrap(), Units::Imperial);
        assert_eq!(parse_units_arg("standard").unwrap(), Units::Standard);
    }

    #[test]
    fn test_parse_units_arg_invalid() {
        let err = parse_units_arg("metrics").unwrap_err();
        assert!(err.to_string().contains("Invalid units"));
        assert!(err.to_string().contains("metrics"));
    }

    #[test]
    fn test_parse_exclude_arg_invalid() {
        let err = parse_exclude_arg("weekly").unwrap_err();
        assert!(err.to_string().contains("weekly"));
    }

    #[test]
    fn test_one_call_options_defaults() {
        let options = one_call_options("metric", &[], 900).unwrap();
        assert_eq!(options, OneCallOptions::default());
    }

    #[test]
    fn test_one_call_options_with_exclusions() {
        let exclude = vec!["hourly".to_string(), "minutely".to_string(), "hourly".to_string()];
        let options = one_call_options("imperial", &exclude, 60).unwrap();

        assert_eq!(options.units, Units::Imperial);
        assert_eq!(
            options.exclude.into_iter().collect::<Vec<_>>(),
            vec![ExcludeSection::Minutely, ExcludeSection::Hourly]
        );
        assert_eq!(options.freshness, Duration::from_secs(60));
    }

    #[test]
    fn test_one_call_options_rejects_unknown_section() {
        let exclude = vec!["daily".to_string(), "weekly".to_string()];
        assert!(matches!(
            one_call_options("metric", &exclude, 900),
            Err(CliError::InvalidExcludeSection(s)) if s == "weekly"
        ));
    }

    #[test]
    fn test_cli_parse_weather() {
        let cli = Cli::parse_from([
            "owm",
            "weather",
            "Paris",
            "London",
            "--exclude",
            "minutely,hourly",
        ]);
        match cli.command {
            Command::Weather {
                cities,
                units,
                exclude,
                ttl,
                json,
            } => {
                assert_eq!(cities, vec!["Paris", "London"]);
                assert_eq!(units, "metric");
                assert_eq!(exclude, vec!["minutely", "hourly"]);
                assert_eq!(ttl, DEFAULT_ONE_CALL_FRESHNESS.as_secs());
                assert!(!json);
            }
            other => panic!("Expected weather command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_parse_query() {
        let cli = Cli::parse_from(["owm", "query", "geo", "1.0", "direct", "q=London&limit=1"]);
        match cli.command {
            Command::Query {
                api_family,
                api_version,
                endpoint,
                query,
                ttl,
            } => {
                assert_eq!(api_family, "geo");
                assert_eq!(api_version, "1.0");
                assert_eq!(endpoint, "direct");
                assert_eq!(query, "q=London&limit=1");
                assert_eq!(ttl, DEFAULT_QUERY_FRESHNESS.as_secs());
            }
            other => panic!("Expected query command, got {:?}", other),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::parse_from([
            "owm",
            "coords",
            "Paris",
            "--api-key",
            "XYZ",
            "--timeout",
            "5",
        ]);
        assert_eq!(cli.api_key.as_deref(), Some("XYZ"));
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_coords_ttl_defaults_to_geocoding_window() {
        let cli = Cli::parse_from(["owm", "coords", "Paris"]);
        match cli.command {
            Command::Coords { ttl, .. } => assert_eq!(ttl, DEFAULT_GEO_FRESHNESS.as_secs()),
            other => panic!("Expected coords command, got {:?}", other),
        }
    }

    #[test]
    fn test_api_key_flag_reads_env_var() {
        let command = Cli::command();
        let api_key = command
            .get_arguments()
            .find(|arg| arg.get_id() == "api_key")
            .expect("api_key argument should exist");

        assert_eq!(
            api_key.get_env().and_then(|env| env.to_str()),
            Some(API_KEY_ENV)
        );
    }

    #[test]
    fn test_map_url() {
        assert_eq!(
            map_url(&paris()),
            "https://www.openstreetmap.org/?mlat=48.85&mlon=2.35#map=11/48.85/2.35"
        );
    }

    #[test]
    fn test_render_coordinates_with_lang() {
        let out = render_coordinates(&paris(), Some("fr"));
        assert!(out.contains("Paris, Ile-de-France (FR)"));
        assert!(out.contains("lat 48.85, lon 2.35"));
        assert!(out.contains("fr: Paris"));

        let out = render_coordinates(&paris(), Some("ja"));
        assert!(out.contains("ja: (no local name)"));
    }

    #[test]
    fn test_render_weather_with_alert() {
        let summary = OneCallSummary {
            timezone: "Europe/Paris".to_string(),
            current: Some(CurrentConditions {
                observed_at: Utc.timestamp_opt(1721052000, 0).unwrap(),
                temp: 22.46,
                feels_like: 22.1,
                humidity: 55,
                wind_speed: 3.6,
                weather: Vec::new(),
            }),
            alerts: vec![WeatherAlert {
                sender_name: "METEO-FRANCE".to_string(),
                event: "Thunderstorm warning".to_string(),
                start: Utc.timestamp_opt(1721044800, 0).unwrap(),
                end: Utc.timestamp_opt(1721131200, 0).unwrap(),
                description: "Local storms.\n\nStay indoors.".to_string(),
            }],
        };

        let out = render_weather("Paris", &paris(), &summary, Units::Metric);

        assert!(out.contains("Current weather for Paris (FR)"));
        assert!(out.contains("22.5 °C"));
        assert!(out.contains("Humidity     55%"));
        assert!(out.contains("3.6 m/s"));
        assert!(out.contains("! Thunderstorm warning"));
        assert!(out.contains("Issued by METEO-FRANCE"));
        assert!(out.contains("    Stay indoors."));
        assert!(out.contains("openstreetmap.org"));
    }

    #[test]
    fn test_render_weather_without_current() {
        let summary = OneCallSummary {
            timezone: "UTC".to_string(),
            current: None,
            alerts: Vec::new(),
        };

        let out = render_weather("Paris", &paris(), &summary, Units::Imperial);

        assert!(out.contains("(current conditions excluded)"));
        assert!(!out.contains("Alerts:"));
    }
}

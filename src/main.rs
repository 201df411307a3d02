//! owm - cached OpenWeatherMap lookups from the terminal
//!
//! Resolves cities to coordinates and shows current conditions and weather
//! alerts from the One Call API, reusing cached responses where they are fresh.

use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use owm_connect::cli::{one_call_options, render_coordinates, render_weather, Cli, Command};
use owm_connect::data::{OneCallOptions, DEFAULT_GEO_FRESHNESS};
use owm_connect::{CachedWeatherClient, OneCallSummary, QueryRequest, Settings};

/// Sends log output to stderr, filtered by `RUST_LOG` (default `warn`)
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    // Reject bad arguments before reading secrets or touching the network
    let one_call = match &cli.command {
        Command::Weather {
            units,
            exclude,
            ttl,
            ..
        } => Some(one_call_options(units, exclude, *ttl)?),
        _ => None,
    };

    let mut settings = Settings::resolve(cli.api_key.clone(), cli.secrets.as_deref())?;
    if let Some(secs) = cli.timeout {
        settings = settings.with_timeout(Duration::from_secs(secs));
    }
    let client = CachedWeatherClient::from_settings(&settings)?;

    match cli.command {
        Command::Query {
            api_family,
            api_version,
            endpoint,
            query,
            ttl,
        } => {
            let request = QueryRequest::new(api_family, api_version, endpoint, query);
            let response = client.query(&request, Duration::from_secs(ttl)).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Coords { city, lang, ttl } => {
            match client.get_coordinates(&city, Duration::from_secs(ttl)).await? {
                Some(geo) => print!("{}", render_coordinates(&geo, lang.as_deref())),
                None => return Err(format!("City name not found: {}", city).into()),
            }
        }
        Command::Weather { cities, json, .. } => {
            let options = one_call.unwrap_or_default();
            show_weather(&client, &cities, &options, json).await?;
        }
    }

    debug!(entries = client.cached_entries(), "finished");
    Ok(())
}

/// Prints weather for each city; unknown cities are reported and skipped
async fn show_weather(
    client: &CachedWeatherClient,
    cities: &[String],
    options: &OneCallOptions,
    json: bool,
) -> Result<(), Box<dyn Error>> {
    for city in cities {
        let Some(geo) = client.get_coordinates(city, DEFAULT_GEO_FRESHNESS).await? else {
            println!("{}: city name not found", city);
            continue;
        };

        let response = client.get_one_call(city, options).await?;
        if json {
            println!("{}", serde_json::to_string_pretty(&response)?);
            continue;
        }

        let summary = OneCallSummary::from_response(&response)?;
        println!("{}", render_weather(city, &geo, &summary, options.units));
    }
    Ok(())
}

//! Cached OpenWeatherMap client
//!
//! `CachedWeatherClient` turns a logical request into a URL, fetches it through a
//! `Transport`, decodes the JSON body into a `serde_json::Value` and memoizes the
//! result. Each call states how old a cached result it is willing to accept.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::transport::{redact_api_key, HttpTransport, Transport, TransportError};
use super::{GeoCoordinate, OneCallOptions, QueryRequest};
use crate::cache::ResponseCache;
use crate::config::{ApiKey, ConfigError, Settings, DEFAULT_BASE_URL};

/// Default freshness window for `query`
pub const DEFAULT_QUERY_FRESHNESS: Duration = Duration::from_secs(600);

/// Default freshness window for geocoding lookups
pub const DEFAULT_GEO_FRESHNESS: Duration = Duration::from_secs(3600);

/// Default freshness window for One Call requests
pub const DEFAULT_ONE_CALL_FRESHNESS: Duration = Duration::from_secs(900);

/// Errors that can occur when talking to OpenWeatherMap
#[derive(Debug, Error)]
pub enum WeatherError {
    /// Client could not be configured
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Network failure, timeout or non-2xx status
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Response body is not valid JSON, or lacks expected fields
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Response is valid JSON but not of the expected shape
    #[error("Unexpected response payload: {0}")]
    UnexpectedPayload(String),

    /// Geocoding returned no match for the location
    #[error("Location not found: {0}")]
    LocationNotFound(String),
}

/// Cached connection to the OpenWeatherMap API
///
/// Cloning is cheap; clones share the transport and the response cache.
#[derive(Clone)]
pub struct CachedWeatherClient {
    transport: Arc<dyn Transport>,
    api_key: ApiKey,
    base_url: String,
    cache: ResponseCache<QueryRequest, Value>,
}

impl fmt::Debug for CachedWeatherClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedWeatherClient")
            .field("api_key", &self.api_key)
            .field("base_url", &self.base_url)
            .field("cached_entries", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl CachedWeatherClient {
    /// Creates a client against the public API using the given transport
    pub fn new(api_key: ApiKey, transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            cache: ResponseCache::new(),
        }
    }

    /// Creates a client with an HTTP transport configured from `settings`
    pub fn from_settings(settings: &Settings) -> Result<Self, WeatherError> {
        let transport = HttpTransport::new(settings.timeout)?;
        Ok(Self::new(settings.api_key.clone(), Arc::new(transport))
            .with_base_url(settings.base_url.clone()))
    }

    /// Overrides the scheme and host used in the URL template
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Calls `{family}/{version}/{endpoint}?{query}` with the key appended
    ///
    /// # Arguments
    /// * `request` - The logical request; also the cache key
    /// * `freshness` - Maximum age of a cached result that may be returned
    ///
    /// # Returns
    /// * `Ok(Value)` - The decoded response, possibly from cache
    /// * `Err(WeatherError)` - If the request fails or the body is not JSON
    pub async fn query(
        &self,
        request: &QueryRequest,
        freshness: Duration,
    ) -> Result<Value, WeatherError> {
        if let Some(cached) = self.cache.read(request) {
            if cached.is_fresh(freshness) {
                debug!(%request, age_ms = cached.age().num_milliseconds(), "cache hit");
                return Ok(cached.data);
            }
        }

        let url = request.url(&self.base_url, self.api_key.expose());
        debug!(url = %redact_api_key(&url), "cache miss, fetching");

        let body = self.transport.get(&url).await?;
        let value: Value = serde_json::from_str(&body)?;

        self.cache.write(request.clone(), value.clone());
        Ok(value)
    }

    /// Resolves a location name to coordinates with the geocoding API
    ///
    /// Returns `Ok(None)` when the API finds no match. Transport and parse
    /// failures are returned as errors.
    pub async fn get_coordinates(
        &self,
        city: &str,
        freshness: Duration,
    ) -> Result<Option<GeoCoordinate>, WeatherError> {
        let request = QueryRequest::new("geo", "1.0", "direct", format!("q={}", city));
        let response = self.query(&request, freshness).await?;

        let matches = response.as_array().ok_or_else(|| {
            WeatherError::UnexpectedPayload(format!(
                "geocoding response for '{}' is not a list",
                city
            ))
        })?;

        match matches.first() {
            Some(first) => Ok(Some(serde_json::from_value(first.clone())?)),
            None => Ok(None),
        }
    }

    /// Fetches current, forecast and alert data for a location by name
    ///
    /// The location is geocoded with `DEFAULT_GEO_FRESHNESS`; `options.freshness`
    /// only applies to the One Call request. The payload is returned as is.
    pub async fn get_one_call(
        &self,
        city: &str,
        options: &OneCallOptions,
    ) -> Result<Value, WeatherError> {
        let location = self
            .get_coordinates(city, DEFAULT_GEO_FRESHNESS)
            .await?
            .ok_or_else(|| WeatherError::LocationNotFound(city.to_string()))?;

        let request = QueryRequest::new(
            "data",
            "3.0",
            "onecall",
            options.query_for(location.latitude, location.longitude),
        );
        self.query(&request, options.freshness).await
    }

    /// Number of cached responses, fresh or stale
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    /// Forgets every cached response
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

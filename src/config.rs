//! Connection settings and API key handling
//!
//! The API key is resolved from an explicit value (CLI flag or the
//! `OPEN_WEATHER_API_KEY` environment variable) first, then from a
//! `secrets.toml` file laid out like this:
//!
//! ```toml
//! [connections.openweathermap]
//! OPEN_WEATHER_API_KEY = "your-key"
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use directories::ProjectDirs;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Default base URL for the OpenWeatherMap API
pub const DEFAULT_BASE_URL: &str = "http://api.openweathermap.org";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Name of the environment variable holding the API key
pub const API_KEY_ENV: &str = "OPEN_WEATHER_API_KEY";

/// Errors that can occur while resolving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key was found in any source
    #[error("OpenWeatherMap API key is missing (set {}, pass --api-key, or add it to secrets.toml)", API_KEY_ENV)]
    MissingApiKey,

    /// The secrets file could not be read
    #[error("Failed to read secrets file {path}: {source}")]
    ReadSecrets {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The secrets file is not valid TOML for our layout
    #[error("Invalid secrets file {path}: {source}")]
    InvalidSecrets {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Opaque OpenWeatherMap credential
///
/// The key is never shown by `Debug`; use `expose` only where it must be sent.
#[derive(Clone)]
pub struct ApiKey(Arc<SecretString>);

impl ApiKey {
    /// Wraps a key, rejecting empty or blank values
    pub fn new(key: impl Into<String>) -> Result<Self, ConfigError> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(Self(Arc::new(SecretString::from(key))))
    }

    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Layout of `secrets.toml`
#[derive(Debug, Default, Deserialize)]
struct SecretsFile {
    #[serde(default)]
    connections: Connections,
}

#[derive(Debug, Default, Deserialize)]
struct Connections {
    #[serde(default)]
    openweathermap: Option<OpenWeatherSection>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenWeatherSection {
    #[serde(rename = "OPEN_WEATHER_API_KEY")]
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

/// Resolved settings for a `CachedWeatherClient`
#[derive(Debug, Clone)]
pub struct Settings {
    /// Credential appended to every request as `appid`
    pub api_key: ApiKey,
    /// Scheme and host, e.g. `http://api.openweathermap.org`
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Settings {
    /// Settings with default base URL and timeout
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Default location of `secrets.toml` in the platform config directory
    ///
    /// Uses `~/.config/owm-connect/secrets.toml` on Linux. Returns `None` when
    /// no home directory can be determined.
    pub fn default_secrets_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "owm-connect")?;
        Some(project_dirs.config_dir().join("secrets.toml"))
    }

    /// Resolves settings from an explicit key and an optional secrets file
    ///
    /// # Arguments
    /// * `explicit_key` - Key from the CLI or environment; wins over the file
    /// * `secrets_path` - Explicit secrets file; when `None` the default path is
    ///   used if it exists and parses
    ///
    /// # Returns
    /// * `Ok(Settings)` when a non-empty key was found
    /// * `Err(ConfigError)` when no key is available or an explicit file is unreadable
    pub fn resolve(
        explicit_key: Option<String>,
        secrets_path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        Self::resolve_with_default(explicit_key, secrets_path, Self::default_secrets_path())
    }

    /// Like `resolve`, with the fallback secrets location passed in
    ///
    /// A fallback file that cannot be read or parsed is logged and skipped; only
    /// an explicitly named file is a hard error.
    fn resolve_with_default(
        explicit_key: Option<String>,
        secrets_path: Option<&Path>,
        default_path: Option<PathBuf>,
    ) -> Result<Self, ConfigError> {
        let section = match secrets_path {
            Some(path) => load_section(path)?,
            None => match default_path {
                Some(path) if path.exists() => match load_section(&path) {
                    Ok(section) => section,
                    Err(err) => {
                        warn!(error = %err, "ignoring default secrets file");
                        None
                    }
                },
                _ => None,
            },
        }
        .unwrap_or_default();

        let key = explicit_key
            .filter(|k| !k.trim().is_empty())
            .or(section.api_key)
            .ok_or(ConfigError::MissingApiKey)?;

        let mut settings = Self::new(ApiKey::new(key)?);
        if let Some(base_url) = section.base_url {
            settings.base_url = base_url;
        }
        if let Some(secs) = section.timeout_secs {
            settings.timeout = Duration::from_secs(secs);
        }
        Ok(settings)
    }

    /// Overrides the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Reads the `[connections.openweathermap]` section of a secrets file
fn load_section(path: &Path) -> Result<Option<OpenWeatherSection>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadSecrets {
        path: path.to_path_buf(),
        source,
    })?;
    let file: SecretsFile = toml::from_str(&content).map_err(|source| ConfigError::InvalidSecrets {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(file.connections.openweathermap)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_secrets(contents: &str) -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("secrets.toml");
        fs::write(&path, contents).expect("Failed to write secrets");
        (temp_dir, path)
    }

    #[test]
    fn test_api_key_rejects_blank() {
        assert!(matches!(ApiKey::new(""), Err(ConfigError::MissingApiKey)));
        assert!(matches!(ApiKey::new("   "), Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_api_key_debug_is_redacted() {
        let key = ApiKey::new("super-secret").unwrap();
        let debug = format!("{:?}", key);
        assert!(!debug.contains("super-secret"));
        assert_eq!(key.expose(), "super-secret");
    }

    #[test]
    fn test_resolve_reads_key_from_secrets_file() {
        let (_dir, path) = write_secrets(
            r#"
[connections.openweathermap]
OPEN_WEATHER_API_KEY = "file-key"
"#,
        );

        let settings = Settings::resolve(None, Some(&path)).unwrap();

        assert_eq!(settings.api_key.expose(), "file-key");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_explicit_key_wins_over_file() {
        let (_dir, path) = write_secrets(
            r#"
[connections.openweathermap]
OPEN_WEATHER_API_KEY = "file-key"
"#,
        );

        let settings = Settings::resolve(Some("cli-key".to_string()), Some(&path)).unwrap();

        assert_eq!(settings.api_key.expose(), "cli-key");
    }

    #[test]
    fn test_optional_overrides_from_file() {
        let (_dir, path) = write_secrets(
            r#"
[connections.openweathermap]
OPEN_WEATHER_API_KEY = "file-key"
base_url = "http://localhost:8080"
timeout_secs = 5
"#,
        );

        let settings = Settings::resolve(None, Some(&path)).unwrap();

        assert_eq!(settings.base_url, "http://localhost:8080");
        assert_eq!(settings.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let (_dir, path) = write_secrets("[connections.openweathermap]\n");

        let result = Settings::resolve(None, Some(&path));

        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_blank_explicit_key_falls_back_to_file() {
        let (_dir, path) = write_secrets(
            r#"
[connections.openweathermap]
OPEN_WEATHER_API_KEY = "file-key"
"#,
        );

        let settings = Settings::resolve(Some("  ".to_string()), Some(&path)).unwrap();

        assert_eq!(settings.api_key.expose(), "file-key");
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.toml");

        let result = Settings::resolve(Some("key".to_string()), Some(&path));

        assert!(matches!(result, Err(ConfigError::ReadSecrets { .. })));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let (_dir, path) = write_secrets("this is = = not toml");

        let result = Settings::resolve(None, Some(&path));

        assert!(matches!(result, Err(ConfigError::InvalidSecrets { .. })));
    }

    #[test]
    fn test_missing_key_message_names_env_var() {
        assert!(ConfigError::MissingApiKey.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_malformed_default_file_is_skipped_for_explicit_key() {
        let (_dir, path) = write_secrets("this is = = not toml");

        let settings =
            Settings::resolve_with_default(Some("cli-key".to_string()), None, Some(path)).unwrap();

        assert_eq!(settings.api_key.expose(), "cli-key");
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_default_file_without_key_reports_missing_key() {
        let (_dir, path) = write_secrets("this is = = not toml");

        let result = Settings::resolve_with_default(None, None, Some(path));

        assert!(matches!(result, Err(ConfigError::MissingApiKey)));
    }

    #[test]
    fn test_default_file_supplies_key() {
        let (_dir, path) = write_secrets(
            r#"
[connections.openweathermap]
OPEN_WEATHER_API_KEY = "default-key"
"#,
        );

        let settings = Settings::resolve_with_default(None, None, Some(path)).unwrap();

        assert_eq!(settings.api_key.expose(), "default-key");
    }

    #[test]
    fn test_absent_default_file_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.toml");

        let settings =
            Settings::resolve_with_default(Some("cli-key".to_string()), None, Some(path)).unwrap();

        assert_eq!(settings.api_key.expose(), "cli-key");
    }

    #[test]
    fn test_default_secrets_path_names_project() {
        if let Some(path) = Settings::default_secrets_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("owm-connect"));
            assert!(path_str.ends_with("secrets.toml"));
        }
        // Test passes if no home directory is available (e.g., in CI)
    }
}

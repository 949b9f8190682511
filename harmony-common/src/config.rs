//! Configuration loading and secret resolution
//!
//! Bootstrap configuration comes from a TOML file. The two upstream secrets
//! (client id and client secret) are resolved with this priority:
//! 1. Environment variables (`HARMONY_CLIENT_ID`, `HARMONY_CLIENT_SECRET`)
//! 2. TOML config file
//!
//! A missing TOML file is not fatal: a warning is logged and built-in
//! defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const CLIENT_ID_ENV: &str = "HARMONY_CLIENT_ID";
pub const CLIENT_SECRET_ENV: &str = "HARMONY_CLIENT_SECRET";

const DEFAULT_ARTISTS: [&str; 30] = [
    "The Weeknd",
    "Taylor Swift",
    "Bad Bunny",
    "Ed Sheeran",
    "Ariana Grande",
    "Billie Eilish",
    "Drake",
    "Justin Bieber",
    "Eminem",
    "BTS",
    "Rihanna",
    "Shakira",
    "SZA",
    "Kanye West",
    "Travis Scott",
    "Dua Lipa",
    "Calvin Harris",
    "Kendrick Lamar",
    "Maroon 5",
    "Adele",
    "Lana Del Rey",
    "Imagine Dragons",
    "Karol G",
    "Linkin Park",
    "Katy Perry",
    "Marshmello",
    "Future",
    "J Balvin",
    "Sia",
    "Miley Cyrus",
];

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Upstream client id (prefer the environment variable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// Upstream client secret (prefer the environment variable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Base URL of the token issuer (`/api/token` is appended)
    #[serde(default = "default_accounts_base_url")]
    pub accounts_base_url: String,

    /// Base URL of the catalog API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Country code sent with top-tracks lookups
    #[serde(default = "default_market")]
    pub market: String,

    /// Per-request timeout for upstream calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Width of the per-run fetch pool
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Lifetime of cached artist records
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Artists shown on the dashboard when none are requested explicitly
    #[serde(default = "default_artists")]
    pub artists: Vec<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            accounts_base_url: default_accounts_base_url(),
            api_base_url: default_api_base_url(),
            market: default_market(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrency: default_concurrency(),
            cache_ttl_secs: default_cache_ttl_secs(),
            artists: default_artists(),
            logging: LoggingConfig::default(),
        }
    }
}

impl TomlConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Reject values that would make the service unusable
    pub fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            return Err(Error::Config("concurrency must be at least 1".to_string()));
        }
        if self.request_timeout_secs == 0 {
            return Err(Error::Config(
                "request_timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(Error::Config("cache_ttl_secs must be at least 1".to_string()));
        }
        if self.market.trim().is_empty() {
            return Err(Error::Config("market must not be empty".to_string()));
        }
        Ok(())
    }
}

fn default_accounts_base_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_market() -> String {
    "US".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_concurrency() -> usize {
    5
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_artists() -> Vec<String> {
    DEFAULT_ARTISTS.iter().map(|s| s.to_string()).collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Client id/secret pair used for the client-credentials grant
#[derive(Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Default config file location: `<config_dir>/harmony/harmony.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("harmony").join("harmony.toml"))
}

/// Load TOML config, falling back to defaults when the file is absent
///
/// A file that exists but cannot be parsed is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    match read_toml_config(path)? {
        Some(config) => Ok(config),
        None => {
            warn_config_missing(path);
            Ok(TomlConfig::default())
        }
    }
}

/// Read and validate the TOML config, returning `None` if the file is absent
///
/// Does not log the missing-file case, so callers that set up logging from
/// the loaded config can report it once a subscriber is installed.
pub fn read_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;
    config.validate()?;

    info!("Loaded configuration from {}", path.display());
    Ok(Some(config))
}

pub fn warn_config_missing(path: &Path) {
    warn!(
        "Config file not found at {}, using built-in defaults",
        path.display()
    );
}

/// Write config to disk, creating parent directories as needed
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Resolve the client id/secret pair (environment first, then TOML)
pub fn resolve_client_credentials(toml_config: &TomlConfig) -> Result<ClientCredentials> {
    let client_id = resolve_secret(CLIENT_ID_ENV, toml_config.client_id.as_deref())
        .ok_or_else(|| missing_secret("client id", CLIENT_ID_ENV, "client_id"))?;
    let client_secret = resolve_secret(CLIENT_SECRET_ENV, toml_config.client_secret.as_deref())
        .ok_or_else(|| missing_secret("client secret", CLIENT_SECRET_ENV, "client_secret"))?;

    Ok(ClientCredentials {
        client_id,
        client_secret,
    })
}

fn resolve_secret(env_name: &str, toml_value: Option<&str>) -> Option<String> {
    if let Ok(value) = std::env::var(env_name) {
        if is_valid_secret(&value) {
            info!("{} loaded from environment", env_name);
            return Some(value);
        }
        warn!("{} is set but blank, ignoring", env_name);
    }

    toml_value
        .filter(|v| is_valid_secret(v))
        .map(|v| v.to_string())
}

fn missing_secret(what: &str, env_name: &str, toml_key: &str) -> Error {
    Error::Config(format!(
        "Upstream {} not configured. Set {} or `{}` in harmony.toml",
        what, env_name, toml_key
    ))
}

/// Secrets must be non-empty and not just whitespace
pub fn is_valid_secret(value: &str) -> bool {
    !value.trim().is_empty()
}

//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (ALPHAFOLD_MCP_*)
//! 2. `SSL_CERT_FILE` / `SSL_KEY_FILE` from the environment
//! 3. TOML config file (if ALPHAFOLD_MCP_CONFIG_FILE set)
//! 4. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Directory name used under the platform cache directory.
const CACHE_DIR_NAME: &str = "alphafold-mcp";

/// File name of the SQLite response cache inside the cache directory.
const CACHE_FILE_NAME: &str = "responses.sqlite";

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (ALPHAFOLD_MCP_*)
/// 2. `SSL_CERT_FILE` / `SSL_KEY_FILE`
/// 3. TOML config file (if ALPHAFOLD_MCP_CONFIG_FILE set)
/// 4. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// User-Agent string for upstream requests.
    ///
    /// Set via ALPHAFOLD_MCP_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-attempt HTTP timeout in seconds.
    ///
    /// Set via ALPHAFOLD_MCP_REQUEST_TIMEOUT_SECS environment variable.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Additional attempts after a transient network failure.
    ///
    /// Set via ALPHAFOLD_MCP_MAX_RETRIES environment variable.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base of the exponential backoff, in seconds.
    ///
    /// Set via ALPHAFOLD_MCP_BACKOFF_FACTOR environment variable.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Default cache lifetime for successful responses. Zero disables caching.
    ///
    /// Set via ALPHAFOLD_MCP_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Directory holding the response cache.
    ///
    /// Set via ALPHAFOLD_MCP_CACHE_DIR environment variable. Falls back to
    /// the platform cache directory when unset.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Client certificate (PEM) for mutual TLS.
    ///
    /// Set via ALPHAFOLD_MCP_SSL_CERT_FILE or SSL_CERT_FILE.
    #[serde(default)]
    pub ssl_cert_file: Option<PathBuf>,

    /// Client private key (PEM) for mutual TLS.
    ///
    /// Set via ALPHAFOLD_MCP_SSL_KEY_FILE or SSL_KEY_FILE.
    #[serde(default)]
    pub ssl_key_file: Option<PathBuf>,

    /// Optional delay before the first attempt of every upstream call.
    ///
    /// Set via ALPHAFOLD_MCP_RATE_LIMIT_DELAY_MS environment variable.
    #[serde(default)]
    pub rate_limit_delay_ms: Option<u64>,

    /// AlphaFold DB API base URL.
    #[serde(default = "default_alphafold_base_url")]
    pub alphafold_base_url: String,

    /// UniProtKB REST base URL.
    #[serde(default = "default_uniprot_base_url")]
    pub uniprot_base_url: String,
}

fn default_user_agent() -> String {
    "mcp-alphafold/0.1".into()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.5
}

fn default_cache_ttl_secs() -> u64 {
    86_400 // 24h
}

fn default_alphafold_base_url() -> String {
    "https://alphafold.ebi.ac.uk/api".into()
}

fn default_uniprot_base_url() -> String {
    "https://rest.uniprot.org/uniprotkb".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            request_timeout_secs: default_request_timeout_secs(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_dir: None,
            ssl_cert_file: None,
            ssl_key_file: None,
            rate_limit_delay_ms: None,
            alphafold_base_url: default_alphafold_base_url(),
            uniprot_base_url: default_uniprot_base_url(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Pre-request delay, if configured.
    pub fn rate_limit_delay(&self) -> Option<Duration> {
        self.rate_limit_delay_ms.map(Duration::from_millis)
    }

    /// Directory holding the cache database.
    ///
    /// Uses `cache_dir` when set, otherwise `<platform cache dir>/alphafold-mcp`,
    /// and finally a directory relative to the working directory.
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|base| base.join(CACHE_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(format!(".{CACHE_DIR_NAME}")))
    }

    /// Full path of the SQLite cache database.
    pub fn cache_db_path(&self) -> PathBuf {
        self.resolved_cache_dir().join(CACHE_FILE_NAME)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("ALPHAFOLD_MCP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment
            .merge(
                Env::raw()
                    .only(&["SSL_CERT_FILE", "SSL_KEY_FILE"])
                    .map(|key| key.as_str().to_lowercase().into()),
            )
            .merge(
                Env::prefixed("ALPHAFOLD_MCP_")
                    .ignore(&["CONFIG_FILE"])
                    .map(|key| key.as_str().to_lowercase().into())
                    .split("__"),
            );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },
}

impl From<ConfigError> for crate::Error {
    fn from(err: ConfigError) -> Self {
        crate::Error::Config(err.to_string())
    }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `request_timeout_secs` is 0 or exceeds 5 minutes
    /// - `max_retries` exceeds 10
    /// - `backoff_factor` is negative, non-finite, or above 60 seconds
    /// - `user_agent` is empty
    /// - either base URL is not an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.request_timeout_secs > 300 {
            return Err(ConfigError::Invalid {
                field: "request_timeout_secs".into(),
                reason: "must not exceed 5 minutes (300s)".into(),
            });
        }

        if self.max_retries > 10 {
            return Err(ConfigError::Invalid { field: "max_retries".into(), reason: "must not exceed 10".into() });
        }

        if !self.backoff_factor.is_finite() || !(0.0..=60.0).contains(&self.backoff_factor) {
            return Err(ConfigError::Invalid {
                field: "backoff_factor".into(),
                reason: "must be between 0 and 60 seconds".into(),
            });
        }

        if self.user_agent.is_empty() {
            return Err(ConfigError::Invalid { field: "user_agent".into(), reason: "must not be empty".into() });
        }

        validate_base_url("alphafold_base_url", &self.alphafold_base_url)?;
        validate_base_url("uniprot_base_url", &self.uniprot_base_url)?;

        if self.ssl_cert_file.is_some() != self.ssl_key_file.is_some() {
            tracing::warn!(
                cert_set = self.ssl_cert_file.is_some(),
                key_set = self.ssl_key_file.is_some(),
                "Only one of ssl_cert_file and ssl_key_file is set; \
                 mutual TLS requests will fail until both are provided"
            );
        }

        Ok(())
    }
}

fn validate_base_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ConfigError::Invalid { field: field.into(), reason: format!("not a valid URL: {e}") })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid { field: field.into(), reason: format!("unsupported scheme: {other}") }),
    }
}

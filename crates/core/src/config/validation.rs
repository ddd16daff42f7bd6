//! Configuration validation rules.

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

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `cache_name` is blank
    /// - `scope_url` is not an absolute http(s) URL
    /// - an asset entry is blank or does not resolve against the scope
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `max_bytes` is 0 or exceeds 100MB
    /// - `user_agent` or `notification_title` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_name.trim().is_empty() {
            return Err(invalid("cache_name", "must not be empty"));
        }

        let scope = self.scope()?;
        if !matches!(scope.scheme(), "http" | "https") {
            return Err(invalid("scope_url", "must use http or https"));
        }

        if self.assets.iter().any(|a| a.trim().is_empty()) {
            return Err(invalid("assets", "entries must not be empty"));
        }
        let urls = self.asset_urls()?;
        if let Some(url) = urls.iter().find(|u| !matches!(u.scheme(), "http" | "https")) {
            return Err(ConfigError::Invalid {
                field: "assets".into(),
                reason: format!("{url} does not use http or https"),
            });
        }

        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.max_bytes == 0 {
            return Err(invalid("max_bytes", "must be greater than 0"));
        }
        if self.max_bytes > 100 * 1024 * 1024 {
            return Err(invalid("max_bytes", "must not exceed 100MB"));
        }

        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }
        if self.notification_title.is_empty() {
            return Err(invalid("notification_title", "must not be empty"));
        }

        if self.assets.is_empty() {
            tracing::warn!("asset manifest is empty; install will not pre-populate the cache");
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

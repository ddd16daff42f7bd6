//! Agent configuration with layered loading.
//!
//! Configuration is loaded with figment from, in increasing precedence:
//!
//! 1. Built-in defaults
//! 2. TOML config file (if OFFCACHE_CONFIG_FILE set)
//! 3. Environment variables (OFFCACHE_*)
//!
//! The generation label and asset manifest are fixed for the lifetime of a
//! deployment; nothing mutates them after loading.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

mod validation;

pub use validation::ConfigError;

/// Agent configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Label of the current cache generation.
    ///
    /// Bump it on every deploy; activation deletes every other generation.
    /// Set via OFFCACHE_CACHE_NAME.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,

    /// Base URL of the app; relative manifest entries resolve against it.
    ///
    /// Set via OFFCACHE_SCOPE_URL.
    #[serde(default = "default_scope_url")]
    pub scope_url: String,

    /// Assets pre-populated at install time, in order.
    ///
    /// Set via OFFCACHE_ASSETS (TOML array syntax, e.g. `["./","./app.js"]`).
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,

    /// Path to the SQLite cache database.
    ///
    /// Set via OFFCACHE_DB_PATH.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for network requests.
    ///
    /// Set via OFFCACHE_USER_AGENT.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Network request timeout in milliseconds.
    ///
    /// Set via OFFCACHE_TIMEOUT_MS.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum response body size accepted from the network.
    ///
    /// Set via OFFCACHE_MAX_BYTES.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Title of push notifications.
    ///
    /// Set via OFFCACHE_NOTIFICATION_TITLE.
    #[serde(default = "default_notification_title")]
    pub notification_title: String,
}

fn default_cache_name() -> String {
    "coffee-counter-v1".into()
}

fn default_scope_url() -> String {
    "http://localhost:8080/".into()
}

fn default_assets() -> Vec<String> {
    vec!["./".into(), "./index.html".into(), "./manifest.json".into()]
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./offcache.sqlite")
}

fn default_user_agent() -> String {
    "offcache/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_notification_title() -> String {
    "Coffee Counter".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            scope_url: default_scope_url(),
            assets: default_assets(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            notification_title: default_notification_title(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file or environment cannot be parsed, or
    /// validation fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("OFFCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("OFFCACHE_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed scope URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `scope_url` is not an absolute URL.
    pub fn scope(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.scope_url)
            .map_err(|e| ConfigError::Invalid { field: "scope_url".into(), reason: e.to_string() })
    }

    /// Asset manifest resolved against the scope URL, in manifest order.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the scope or any entry fails to resolve.
    pub fn asset_urls(&self) -> Result<Vec<Url>, ConfigError> {
        let scope = self.scope()?;
        self.assets
            .iter()
            .map(|asset| {
                scope.join(asset).map_err(|e| ConfigError::Invalid {
                    field: "assets".into(),
                    reason: format!("{asset}: {e}"),
                })
            })
            .collect()
    }
}

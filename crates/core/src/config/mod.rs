//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PAGEFRONT_*)
//! 2. TOML config file (if PAGEFRONT_CONFIG_FILE set)
//! 3. Built-in defaults
//!
//! Per-request parameter defaults (`DEFAULT_*`) are not part of this struct;
//! see [`crate::params::env_defaults`].

use std::net::SocketAddr;
use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Which fetch collaborator serves article requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Headless Chromium (requires the `render` feature).
    #[default]
    Browser,
    /// Plain HTTP GET, no script execution.
    Http,
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PAGEFRONT_*)
/// 2. TOML config file (if PAGEFRONT_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address to bind.
    ///
    /// Set via PAGEFRONT_HOST environment variable.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    ///
    /// Set via PAGEFRONT_PORT environment variable.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory holding one JSON file per cache entry.
    ///
    /// Set via PAGEFRONT_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Directory user scripts are resolved against.
    ///
    /// Set via PAGEFRONT_USER_SCRIPTS_DIR environment variable.
    #[serde(default = "default_user_scripts_dir")]
    pub user_scripts_dir: PathBuf,

    /// Directory screenshots are written to.
    ///
    /// Set via PAGEFRONT_SCREENSHOTS_DIR environment variable.
    #[serde(default = "default_screenshots_dir")]
    pub screenshots_dir: PathBuf,

    /// Fetch collaborator: `browser` or `http`.
    ///
    /// Set via PAGEFRONT_FETCHER environment variable.
    #[serde(default)]
    pub fetcher: FetcherKind,

    /// Chrome/Chromium binary for the browser fetcher; auto-detected when unset.
    ///
    /// Set via PAGEFRONT_CHROME_PATH environment variable.
    pub chrome_path: Option<PathBuf>,

    /// Launch Chromium with `--no-sandbox` (needed in most containers).
    ///
    /// Set via PAGEFRONT_NO_SANDBOX environment variable.
    #[serde(default)]
    pub no_sandbox: bool,
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    3000
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./cache")
}

fn default_user_scripts_dir() -> PathBuf {
    PathBuf::from("./user_scripts")
}

fn default_screenshots_dir() -> PathBuf {
    PathBuf::from("./screenshots")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cache_dir: default_cache_dir(),
            user_scripts_dir: default_user_scripts_dir(),
            screenshots_dir: default_screenshots_dir(),
            fetcher: FetcherKind::default(),
            chrome_path: None,
            no_sandbox: false,
        }
    }
}

impl AppConfig {
    /// Socket address built from `host` and `port`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `host` is not an IP address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid { field: "host".into(), reason: format!("{e}") })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PAGEFRONT_`
    /// 2. TOML file from `PAGEFRONT_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PAGEFRONT_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PAGEFRONT_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into()),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

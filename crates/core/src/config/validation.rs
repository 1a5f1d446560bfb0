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

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `port` is 0
    /// - `host` is not an IP address
    /// - any directory path is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid { field: "port".into(), reason: "must be greater than 0".into() });
        }

        self.bind_addr()?;

        for (field, path) in [
            ("cache_dir", &self.cache_dir),
            ("user_scripts_dir", &self.user_scripts_dir),
            ("screenshots_dir", &self.screenshots_dir),
        ] {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid { field: field.into(), reason: "must not be empty".into() });
            }
        }

        if self.cache_dir == self.screenshots_dir {
            tracing::warn!(
                dir = %self.cache_dir.display(),
                "cache_dir and screenshots_dir are the same directory"
            );
        }

        Ok(())
    }
}

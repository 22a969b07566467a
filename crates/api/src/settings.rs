//! Server settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `SCENE_CLASSIFIER__*` environment variables
//! (e.g. `SCENE_CLASSIFIER__SERVER__BIND_ADDR=0.0.0.0:7860`).

use crate::rate_limit::RateLimitConfig;
use config::{Config, Environment, File};
use scene_classifier::ModelConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Settings file looked up in the working directory when none is given
pub const DEFAULT_SETTINGS_FILE: &str = "scene-classifier";

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,
    /// Classes shown in the ranked display
    pub top_classes: usize,
    /// Largest accepted upload
    pub max_upload_bytes: usize,
    pub rate_limit: RateLimitConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:7860".to_string(),
            top_classes: 4,
            max_upload_bytes: 10 * 1024 * 1024,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub model: ModelConfig,
    pub server: ServerConfig,
}

impl Settings {
    /// Load settings from an explicit file, or the default file if present.
    ///
    /// Call [`Settings::validate`] once command-line overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("SCENE_CLASSIFIER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Check values the server cannot start with
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.server
            .bind_addr
            .parse::<SocketAddr>()
            .map_err(|e| SettingsError::Invalid {
                field: "server.bind_addr",
                reason: e.to_string(),
            })?;

        if self.server.top_classes == 0 {
            return Err(SettingsError::Invalid {
                field: "server.top_classes",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Parsed listen address
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| SettingsError::Invalid {
                field: "server.bind_addr",
                reason: e.to_string(),
            })
    }
}

//! Configuration for the Router.
//!
//! The bind address comes from the shared settings (`API_HOST`,
//! `API_PORT`); everything else is handed to the pipeline factory.

use redline_service::{Settings, SettingsError};
use std::path::Path;

/// Router configuration
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// Pipeline settings
    pub settings: Settings,
}

impl RouterConfig {
    /// Take the bind address from `settings`
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            bind_address: settings.api_host.clone(),
            bind_port: settings.api_port,
            settings,
        }
    }

    /// Load settings from an optional TOML file, `.env` and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = Settings::load(path)?;
        settings.validate()?;
        Ok(Self::from_settings(settings))
    }

    /// Create an offline configuration for testing
    pub fn default_test_config() -> Self {
        let settings = Settings {
            api_host: "127.0.0.1".to_string(),
            ..Settings::default().offline()
        };
        Self::from_settings(settings)
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }
}

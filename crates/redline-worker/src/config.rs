//! Configuration for the queue worker

use redline_service::{Settings, SettingsError};
use std::path::Path;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// AMQP broker URL
    pub rabbitmq_url: String,

    /// Durable queue to consume
    pub queue_name: String,

    /// Consumer tag shown by the broker
    pub consumer_tag: String,

    /// Unacknowledged deliveries allowed at once
    pub prefetch: u16,

    /// Pipeline settings
    pub settings: Settings,
}

impl WorkerConfig {
    /// Take broker settings from `settings`
    pub fn from_settings(settings: Settings) -> Self {
        Self {
            rabbitmq_url: settings.rabbitmq_url.clone(),
            queue_name: settings.queue_name.clone(),
            consumer_tag: format!("redline-worker-{}", std::process::id()),
            prefetch: 1,
            settings,
        }
    }

    /// Load settings from an optional TOML file, `.env` and the environment
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let settings = Settings::load(path)?;
        settings.validate()?;
        Ok(Self::from_settings(settings))
    }
}

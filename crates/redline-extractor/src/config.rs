//! Configuration for the pipeline stages

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning shared by the parser and both agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Completion token cap per call
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Largest accepted image (MiB)
    pub max_image_size_mb: u64,

    /// Fidelity requested for images (`high`, `low`, `auto`)
    pub image_detail: String,

    /// Maximum time for a single stage call (seconds)
    pub request_timeout_secs: u64,

    /// Full text longer than this is truncated in agent prompts (characters)
    pub max_prompt_text_chars: usize,
}

impl ExtractorConfig {
    /// Get the stage timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Image cap in bytes
    pub fn max_image_bytes(&self) -> u64 {
        self.max_image_size_mb * 1024 * 1024
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        if self.max_image_size_mb == 0 {
            return Err("max_image_size_mb must be greater than 0".to_string());
        }
        if !matches!(self.image_detail.as_str(), "high" | "low" | "auto") {
            return Err(format!(
                "image_detail must be high, low or auto (got '{}')",
                self.image_detail
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than 0".to_string());
        }
        if self.max_prompt_text_chars == 0 {
            return Err("max_prompt_text_chars must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.0,
            max_image_size_mb: 20,
            image_detail: "high".to_string(),
            request_timeout_secs: 120,
            max_prompt_text_chars: 100_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_image_bytes(), 20 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_values() {
        let mut config = ExtractorConfig::default();
        config.max_tokens = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.image_detail = "ultra".into();
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml("max_tokens = 2048\n").unwrap();
        assert_eq!(parsed.max_tokens, 2048);
        assert_eq!(parsed.request_timeout_secs, 120);
    }
}

//! Provider configuration for the generation service.

use crate::error::{LlmError, Result};
use crate::generator::ModelTier;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model identifier per tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierModels {
    pub fast: String,
    pub standard: String,
    pub advanced: String,
}

impl Default for TierModels {
    fn default() -> Self {
        Self {
            fast: "claude-3-5-haiku-20241022".to_string(),
            standard: "claude-3-5-sonnet-20241022".to_string(),
            advanced: "claude-3-opus-20240229".to_string(),
        }
    }
}

impl TierModels {
    /// Resolve the configured model for a tier.
    pub fn model_for(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Fast => &self.fast,
            ModelTier::Standard => &self.standard,
            ModelTier::Advanced => &self.advanced,
        }
    }
}

/// Configuration for a remote generation provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for authentication.
    pub api_key: String,

    /// Base URL for the API, e.g. "https://api.anthropic.com".
    pub base_url: String,

    /// Model per tier.
    #[serde(default)]
    pub models: TierModels,

    /// Request timeout. Keep this below the deadline of the invoking process.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// Sampling temperature (provider default when unset).
    pub temperature: Option<f32>,
}

impl ProviderConfig {
    /// Create a new provider configuration.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            models: TierModels::default(),
            timeout: default_timeout(),
            temperature: None,
        }
    }

    /// Create configuration with the key read from an environment variable.
    pub fn from_env(env_var: &str, base_url: impl Into<String>) -> Result<Self> {
        let api_key = std::env::var(env_var)
            .map_err(|_| LlmError::Auth(format!("Environment variable: {}", env_var)))?;

        Ok(Self::new(api_key, base_url))
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the per-tier models.
    pub fn with_models(mut self, models: TierModels) -> Self {
        self.models = models;
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(120)
}

//! The generation service contract.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Capability tier of the model that serves a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Cheap, low-latency model for advisory checks.
    Fast,
    /// Balanced model for reviews.
    Standard,
    /// Strongest model for content and page generation.
    Advanced,
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Standard => write!(f, "standard"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

/// A single instruction sent to the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Free-text instruction.
    pub prompt: String,
    /// Maximum output size in tokens.
    pub max_tokens: u32,
    /// Which model tier to use.
    pub tier: ModelTier,
    /// Caller-side label used in logs (usually the stage name).
    pub label: String,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, tier: ModelTier) -> Self {
        Self {
            prompt: prompt.into(),
            max_tokens: 1024,
            tier,
            label: String::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Plain-text reply from the generation service.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResponse {
    pub text: String,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: Option<TokenUsage>,
}

impl GenerationResponse {
    /// Build a response carrying only text (useful for test doubles).
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            model: String::new(),
            stop_reason: None,
            usage: None,
        }
    }

    /// Whether the provider stopped because the output budget ran out.
    pub fn was_truncated(&self) -> bool {
        self.stop_reason.as_deref() == Some("max_tokens")
    }
}

/// Anything that can turn an instruction into text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;
}

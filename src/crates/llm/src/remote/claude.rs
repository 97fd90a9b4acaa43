//! Anthropic Claude client implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::ClaudeClient;
//! use llm::config::ProviderConfig;
//! use llm::{GenerationRequest, ModelTier, TextGenerator};
//!
//! let config = ProviderConfig::from_env("ANTHROPIC_API_KEY", "https://api.anthropic.com")?;
//! let client = ClaudeClient::new(config)?;
//!
//! let response = client
//!     .generate(GenerationRequest::new("Hello!", ModelTier::Fast))
//!     .await?;
//! ```

use crate::config::ProviderConfig;
use crate::error::{LlmError, Result};
use crate::generator::{GenerationRequest, GenerationResponse, TextGenerator, TokenUsage};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude API client.
#[derive(Clone)]
pub struct ClaudeClient {
    config: ProviderConfig,
    client: Client,
}

impl std::fmt::Debug for ClaudeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeClient")
            .field("base_url", &self.config.base_url)
            .field("models", &self.config.models)
            .finish()
    }
}

impl ClaudeClient {
    /// Create a new Claude client with the given configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Auth("Anthropic API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn build_request(&self, request: &GenerationRequest) -> ClaudeRequest {
        ClaudeRequest {
            model: self.config.models.model_for(request.tier).to_string(),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: request.prompt.clone(),
            }],
            max_tokens: request.max_tokens,
            temperature: self.config.temperature,
            stream: false,
        }
    }

    fn convert_response(claude_resp: ClaudeResponse) -> GenerationResponse {
        let text = claude_resp
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        GenerationResponse {
            text,
            model: claude_resp.model,
            stop_reason: claude_resp.stop_reason,
            usage: Some(TokenUsage {
                input_tokens: claude_resp.usage.input_tokens,
                output_tokens: claude_resp.usage.output_tokens,
            }),
        }
    }
}

#[async_trait]
impl TextGenerator for ClaudeClient {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let url = format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'));
        let req_body = self.build_request(&request);

        debug!(
            label = %request.label,
            model = %req_body.model,
            prompt_chars = request.prompt.len(),
            max_tokens = request.max_tokens,
            "Calling Claude"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&req_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(format!("{} after {:?}", request.label, self.config.timeout))
                } else {
                    LlmError::Http(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                401 | 403 => LlmError::Auth(error_text),
                429 => LlmError::RateLimited(error_text),
                code => LlmError::Rejected {
                    status: code,
                    body: error_text,
                },
            });
        }

        let claude_resp: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let converted = Self::convert_response(claude_resp);
        if converted.was_truncated() {
            warn!(label = %request.label, "Claude response hit max_tokens");
        }

        Ok(converted)
    }
}

// Claude API types
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<ClaudeMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
    model: String,
    stop_reason: Option<String>,
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: u64,
    output_tokens: u64,
}

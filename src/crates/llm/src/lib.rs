//! Text generation boundary for siteforge.
//!
//! The pipeline talks to a generation service through the [`TextGenerator`]
//! trait: a free-text instruction, an output budget and a model tier go in,
//! plain text comes back. Stage code then pulls a single JSON object out of
//! that text with [`extract_json_object`].
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::config::ProviderConfig;
//! use llm::remote::ClaudeClient;
//! use llm::{GenerationRequest, ModelTier, TextGenerator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ProviderConfig::from_env("ANTHROPIC_API_KEY", "https://api.anthropic.com")?;
//!     let client = ClaudeClient::new(config)?;
//!
//!     let request = GenerationRequest::new("Reply with {\"ok\": true}", ModelTier::Fast)
//!         .with_max_tokens(64);
//!     let response = client.generate(request).await?;
//!     let value = llm::extract_json_object(&response.text)?;
//!     println!("{}", value);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod generator;
pub mod json;

#[cfg(feature = "remote")]
pub mod remote;

// Re-export commonly used types
pub use config::{ProviderConfig, TierModels};
pub use error::{LlmError, Result};
pub use generator::{GenerationRequest, GenerationResponse, ModelTier, TextGenerator, TokenUsage};
pub use json::extract_json_object;

//! Error types for the generation boundary.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

/// Why a generation call produced nothing usable.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing, empty or refused credentials.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    /// The provider answered with a non-success status.
    #[error("Provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// The provider failed without a usable status.
    #[error("Provider error: {0}")]
    Provider(String),

    /// The reply did not contain what the caller asked for.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LlmError {
    /// Whether the same request might succeed if sent again later.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::Timeout(_) | LlmError::RateLimited(_) | LlmError::Provider(_) => true,
            LlmError::Rejected { status, .. } => *status >= 500,
            _ => false,
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, LlmError::Auth(_))
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::InvalidResponse(err.to_string())
    }
}

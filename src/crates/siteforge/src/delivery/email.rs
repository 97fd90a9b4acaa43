//! Transactional email client (Resend-compatible API).

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.resend.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email service rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Email configuration error: {0}")]
    Config(String),
}

/// One outbound message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

/// Sends one message per call and returns the provider's message id
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError>;
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Clone)]
pub struct ResendMailer {
    config: ResendConfig,
    client: Client,
}

impl std::fmt::Debug for ResendMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResendMailer")
            .field("base_url", &self.config.base_url)
            .finish()
    }
}

impl ResendMailer {
    pub fn new(config: ResendConfig) -> Result<Self, EmailError> {
        if config.api_key.trim().is_empty() {
            return Err(EmailError::Config("email API key is empty".to_string()));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/emails", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Mailer for ResendMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError> {
        debug!(to = ?message.to, subject = %message.subject, "Sending email");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body: tooling::logging::truncate_for_log(&body, 500),
            });
        }

        // A 2xx is success even if the body is not what we expect.
        let id = response
            .json::<SendResponse>()
            .await
            .ok()
            .and_then(|r| r.id)
            .unwrap_or_else(|| "unknown".to_string());
        Ok(id)
    }
}

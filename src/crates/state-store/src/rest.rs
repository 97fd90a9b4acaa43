//! Redis command protocol over HTTPS
//!
//! Each operation is one `POST` of a JSON command array to the endpoint with
//! a bearer token, e.g. `["SET", "session:abc", "{...}", "EX", "2592000"]`.
//! The backend answers `{"result": ...}` or `{"error": "..."}`.

use crate::error::{Result, StoreError};
use crate::traits::KeyValueStore;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Connection settings for a REST key-value endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestKvConfig {
    pub url: String,
    pub token: String,
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
}

impl RestKvConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            timeout: default_timeout(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

#[derive(Debug, Deserialize)]
struct CommandReply {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Store backed by a REST key-value service
#[derive(Clone)]
pub struct RestKvStore {
    config: RestKvConfig,
    client: Client,
}

impl std::fmt::Debug for RestKvStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestKvStore").field("url", &self.config.url).finish()
    }
}

impl RestKvStore {
    pub fn new(config: RestKvConfig) -> Result<Self> {
        if config.url.trim().is_empty() || config.token.trim().is_empty() {
            return Err(StoreError::Config("REST store requires url and token".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn set_command(key: &str, value: String, ttl: Option<Duration>) -> Vec<String> {
        let mut command = vec!["SET".to_string(), key.to_string(), value];
        if let Some(ttl) = ttl {
            // EX takes whole seconds and rejects zero.
            let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
            command.push("EX".to_string());
            command.push(secs.max(1).to_string());
        }
        command
    }

    async fn execute(&self, command: &[String]) -> Result<Option<Value>> {
        debug!(op = %command[0], key = %command.get(1).map(String::as_str).unwrap_or(""), "REST store command");

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.token)
            .json(command)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let reply: CommandReply = serde_json::from_str(&body).map_err(|_| {
            StoreError::Backend(format!("unexpected reply ({}): {}", status, body))
        })?;

        if let Some(error) = reply.error {
            return Err(StoreError::Backend(error));
        }
        if !status.is_success() {
            return Err(StoreError::Backend(format!("HTTP {}", status)));
        }
        Ok(reply.result)
    }
}

#[async_trait]
impl KeyValueStore for RestKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let command = vec!["GET".to_string(), key.to_string()];
        match self.execute(&command).await? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Ok(Some(other.to_string())),
        }
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let command = Self::set_command(key, value, ttl);
        match self.execute(&command).await? {
            Some(Value::String(ok)) if ok == "OK" => Ok(()),
            other => Err(StoreError::Backend(format!("SET not acknowledged: {:?}", other))),
        }
    }
}

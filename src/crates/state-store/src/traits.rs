//! The key-value contract every backend implements.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Durable string-valued key-value store.
///
/// Keys are namespaced by the caller (`session:<id>`, `credits:<identity>`).
/// A `ttl` of `None` means the value never expires.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Fetch a value; expired or missing keys are `None`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one and its expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;
}

//! In-memory store for development and testing
//!
//! Values live in a `HashMap` behind a tokio `RwLock`. Expiry uses
//! `tokio::time::Instant`, so tests running with paused time can advance
//! past a TTL deterministically. Expired entries are reported absent and
//! dropped on the next write.

use crate::error::Result;
use crate::traits::KeyValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Process-local key-value store.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.read().await.values().filter(|e| e.is_live(now)).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Live keys starting with `prefix`, sorted
    pub async fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(k, e)| k.starts_with(prefix) && e.is_live(now))
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remaining time to live for a key, `None` when missing or permanent
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.read().await;
        let entry = entries.get(key).filter(|e| e.is_live(now))?;
        entry.expires_at.map(|at| at.duration_since(now))
    }

    /// Clear everything (useful for testing)
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|e| e.is_live(now))
            .map(|e| e.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.is_live(now));
        entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|d| now + d),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = InMemoryStore::new();
        store.set("session:1", "state".to_string(), None).await.unwrap();

        assert_eq!(store.get("session:1").await.unwrap().as_deref(), Some("state"));
        assert!(store.get("session:2").await.unwrap().is_none());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value_and_ttl() {
        let store = InMemoryStore::new();
        store
            .set("credits:a@b.c", "1".to_string(), Some(Duration::from_secs(5)))
            .await
            .unwrap();
        store.set("credits:a@b.c", "2".to_string(), None).await.unwrap();

        assert_eq!(store.get("credits:a@b.c").await.unwrap().as_deref(), Some("2"));
        assert!(store.ttl("credits:a@b.c").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let store = InMemoryStore::new();
        store
            .set("session:x", "v".to_string(), Some(Duration::from_secs(60)))
            .await
            .unwrap();
        store.set("credits:y", "c".to_string(), None).await.unwrap();

        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(store.get("session:x").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(store.get("session:x").await.unwrap().is_none());
        assert!(store.get("credits:y").await.unwrap().is_some());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_keys_with_prefix() {
        let store = InMemoryStore::new();
        store.set("session:b", "1".into(), None).await.unwrap();
        store.set("session:a", "1".into(), None).await.unwrap();
        store.set("credits:z", "1".into(), None).await.unwrap();

        assert_eq!(store.keys_with_prefix("session:").await, vec!["session:a", "session:b"]);
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let store = InMemoryStore::new();
        let other = store.clone();
        store.set("k", "v".into(), None).await.unwrap();
        assert_eq!(other.get("k").await.unwrap().as_deref(), Some("v"));

        other.clear().await;
        assert!(store.is_empty().await);
    }
}

//! Typed persistence over a raw key-value store
//!
//! Two record kinds live in two key namespaces:
//!
//! - `session:<id>`: [`ExecutionState`], expires after [`SESSION_TTL`]
//! - `credits:<identity>`: [`CreditRecord`], never expires

use crate::credits::CreditRecord;
use crate::error::Result;
use crate::state::ExecutionState;
use state_store::KeyValueStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Retention window for execution state
pub const SESSION_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

pub fn session_key(session_id: &str) -> String {
    format!("session:{}", session_id)
}

pub fn credits_key(identity: &str) -> String {
    format!("credits:{}", identity)
}

#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}

impl StateStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub async fn save_execution(&self, state: &ExecutionState) -> Result<()> {
        let key = session_key(&state.session_id);
        let value = serde_json::to_string(state)?;
        debug!(key = %key, bytes = value.len(), "Saving execution state");
        self.backend.set(&key, value, Some(SESSION_TTL)).await?;
        Ok(())
    }

    pub async fn load_execution(&self, session_id: &str) -> Result<Option<ExecutionState>> {
        match self.backend.get(&session_key(session_id)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn load_credits(&self, identity: &str) -> Result<Option<CreditRecord>> {
        match self.backend.get(&credits_key(identity)).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub async fn save_credits(&self, record: &CreditRecord) -> Result<()> {
        let value = serde_json::to_string(record)?;
        self.backend.set(&credits_key(&record.identity), value, None).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::IntakeSubmission;
    use state_store::InMemoryStore;

    #[tokio::test]
    async fn test_execution_round_trip_with_ttl() {
        let backend = InMemoryStore::new();
        let store = StateStore::new(Arc::new(backend.clone()));
        let state = ExecutionState::new(IntakeSubmission::default(), "brief", 0);

        store.save_execution(&state).await.unwrap();

        let key = session_key(&state.session_id);
        assert!(backend.ttl(&key).await.is_some());
        let loaded = store.load_execution(&state.session_id).await.unwrap().unwrap();
        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn test_credits_never_expire() {
        let backend = InMemoryStore::new();
        let store = StateStore::new(Arc::new(backend.clone()));
        let record = CreditRecord::new("a@b.example", 3, "starter");

        store.save_credits(&record).await.unwrap();

        assert!(backend.ttl("credits:a@b.example").await.is_none());
        assert_eq!(store.load_credits("a@b.example").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn test_missing_session() {
        let store = StateStore::new(Arc::new(InMemoryStore::new()));
        assert!(store.load_execution("nope").await.unwrap().is_none());
    }
}

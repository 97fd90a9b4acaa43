//! Shared setup for engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use siteforge::credits::CreditPolicy;
use siteforge::delivery::Notifier;
use siteforge::testing::{fixtures, RecordingMailer, ScriptedDeployer, ScriptedGenerator};
use siteforge::{Engine, Environment, StageId, StateStore};
use state_store::{InMemoryStore, KeyValueStore};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const LEAD_INBOX: &str = "leads@siteforge.example";

/// Every collaborator of one engine, kept for assertions
pub struct Harness {
    pub engine: Engine,
    pub generator: ScriptedGenerator,
    pub deployer: ScriptedDeployer,
    pub mailer: RecordingMailer,
    pub backend: RecordingStore,
}

/// Engine with scripted collaborators over an in-memory store
pub fn harness(generator: ScriptedGenerator, deployer: ScriptedDeployer) -> Harness {
    harness_with_mailer(generator, deployer, RecordingMailer::new())
}

pub fn harness_with_mailer(
    generator: ScriptedGenerator,
    deployer: ScriptedDeployer,
    mailer: RecordingMailer,
) -> Harness {
    let backend = RecordingStore::default();
    let env = Environment::new(Arc::new(generator.clone()), Arc::new(deployer.clone()))
        .with_notifier(Notifier::new(
            Arc::new(mailer.clone()),
            "Siteforge <hello@siteforge.dev>",
            Some(LEAD_INBOX.to_string()),
        ))
        .with_store(StateStore::new(Arc::new(backend.clone())))
        .with_credit_policy(CreditPolicy::default());

    Harness {
        engine: Engine::new(env),
        generator,
        deployer,
        mailer,
        backend,
    }
}

/// Replies for a run that is approved on the first pass and builds a page
/// scoring `site_score` in build review
pub fn publishing_script(site_score: f64) -> ScriptedGenerator {
    ScriptedGenerator::new()
        .reply_json(StageId::IntakeAssessment, fixtures::assessment())
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(4))
        .reply_json(StageId::QualityReview, fixtures::review(8.0))
        .reply_json(StageId::PageBuild, fixtures::page())
        .reply_json(StageId::BuildReview, fixtures::site_review(site_score))
}

/// In-memory backend that also records every key written
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    writes: Arc<Mutex<Vec<String>>>,
}

impl RecordingStore {
    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    pub fn writes_with_prefix(&self, prefix: &str) -> usize {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|key| key.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> state_store::Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> state_store::Result<()> {
        self.writes.lock().unwrap().push(key.to_string());
        self.inner.set(key, value, ttl).await
    }
}

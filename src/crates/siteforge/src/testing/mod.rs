//! Test infrastructure for siteforge
//!
//! Scripted stand-ins for every external collaborator so a whole run can be
//! driven without network access or a deploy CLI:
//! - [`ScriptedGenerator`]: queued replies per stage label
//! - [`ScriptedDeployer`]: canned deploy result, counts calls
//! - [`RecordingMailer`]: records messages, can fail per recipient
//! - [`fixtures`]: sample submissions and stage replies

use crate::delivery::email::{EmailError, EmailMessage, Mailer};
use crate::deploy::{derive_slug, DeployError, Deployment, SiteDeployer};
use crate::graph::StageId;
use async_trait::async_trait;
use llm::{GenerationRequest, GenerationResponse, LlmError, TextGenerator};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

enum Reply {
    Text(String),
    Fail(String),
}

/// Generator that answers from per-stage queues
///
/// Requests are matched on their label, which the stage library sets to the
/// stage name. An empty queue answers with an error.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    replies: Arc<Mutex<HashMap<String, VecDeque<Reply>>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a raw text reply for `stage`
    pub fn reply(self, stage: StageId, text: impl Into<String>) -> Self {
        lock(&self.replies)
            .entry(stage.as_str().to_string())
            .or_default()
            .push_back(Reply::Text(text.into()));
        self
    }

    /// Queue a JSON reply for `stage`
    pub fn reply_json(self, stage: StageId, value: serde_json::Value) -> Self {
        self.reply(stage, value.to_string())
    }

    /// Queue a provider failure for `stage`
    pub fn fail(self, stage: StageId, message: impl Into<String>) -> Self {
        lock(&self.replies)
            .entry(stage.as_str().to_string())
            .or_default()
            .push_back(Reply::Fail(message.into()));
        self
    }

    /// Every request received, in order
    pub fn calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).clone()
    }

    pub fn calls_for(&self, stage: StageId) -> usize {
        lock(&self.calls).iter().filter(|r| r.label == stage.as_str()).count()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> llm::Result<GenerationResponse> {
        let label = request.label.clone();
        lock(&self.calls).push(request);

        let reply = lock(&self.replies).get_mut(&label).and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Text(text)) => Ok(GenerationResponse::text(text)),
            Some(Reply::Fail(message)) => Err(LlmError::Provider(message)),
            None => Err(LlmError::Provider(format!("no scripted reply for {}", label))),
        }
    }
}

/// Deployer returning a fixed outcome
#[derive(Clone)]
pub struct ScriptedDeployer {
    credentials: bool,
    failure: Option<String>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDeployer {
    /// Deploys succeed with a URL derived from the display name
    pub fn succeeding() -> Self {
        Self {
            credentials: true,
            failure: None,
            calls: Arc::default(),
        }
    }

    /// Deploys fail as if the CLI exited non-zero
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            credentials: true,
            failure: Some(message.into()),
            calls: Arc::default(),
        }
    }

    /// No credentials configured
    pub fn without_credentials() -> Self {
        Self {
            credentials: false,
            failure: None,
            calls: Arc::default(),
        }
    }

    /// Display names passed to `deploy`
    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl SiteDeployer for ScriptedDeployer {
    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn deploy(&self, display_name: &str, _html: &str) -> Result<Deployment, DeployError> {
        lock(&self.calls).push(display_name.to_string());
        if let Some(message) = &self.failure {
            return Err(DeployError::CommandFailed {
                status: "exit status: 1".to_string(),
                output: message.clone(),
            });
        }
        let slug = derive_slug(display_name);
        Ok(Deployment {
            url: format!("https://{}.pages.dev", slug),
            project_slug: slug,
            deployment_id: "d3adb33f".to_string(),
        })
    }
}

/// Mailer that records every message
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
    failing_recipients: Arc<Mutex<Vec<String>>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sends to `recipient` fail
    pub fn fail_for(self, recipient: impl Into<String>) -> Self {
        lock(&self.failing_recipients).push(recipient.into());
        self
    }

    /// Successfully sent messages
    pub fn sent(&self) -> Vec<EmailMessage> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<String, EmailError> {
        let fails = {
            let failing = lock(&self.failing_recipients);
            message.to.iter().any(|to| failing.contains(to))
        };
        if fails {
            return Err(EmailError::Rejected {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        let mut sent = lock(&self.sent);
        sent.push(message.clone());
        Ok(format!("email-{}", sent.len()))
    }
}

/// Sample submissions and stage replies
pub mod fixtures {
    use crate::submission::IntakeSubmission;
    use serde_json::{json, Value};

    pub const CONTACT_EMAIL: &str = "ana@harborbakery.example";

    /// A complete, eligible submission
    pub fn submission() -> IntakeSubmission {
        IntakeSubmission {
            business_name: "Harbor Bakery".to_string(),
            contact_name: Some("Ana Ruiz".to_string()),
            email: Some(CONTACT_EMAIL.to_string()),
            phone: Some("555-0100".to_string()),
            industry: Some("Food & beverage".to_string()),
            location: Some("Portland, ME".to_string()),
            description: "Neighbourhood sourdough bakery with a small café".to_string(),
            services: vec!["Bread".to_string(), "Pastries".to_string(), "Catering".to_string()],
            target_audience: Some("Locals and weekend visitors".to_string()),
            unique_value: Some("48-hour fermented dough".to_string()),
            goals: vec!["More catering orders".to_string()],
            style: Some("warm".to_string()),
            ..Default::default()
        }
    }

    pub fn assessment() -> Value {
        json!({
            "completeness": 8,
            "clarity": 8,
            "specificity": 7,
            "missing_elements": ["opening hours"],
            "strengths": ["clear differentiator"],
            "summary": "A clear brief for a local bakery."
        })
    }

    /// Enhanced copy with `sections` structured sections
    pub fn enhancement(sections: usize) -> Value {
        let kinds = ["hero", "services", "about", "catering", "contact"];
        let sections: Vec<Value> = (0..sections)
            .map(|i| {
                json!({
                    "kind": kinds[i % kinds.len()],
                    "headline": format!("Headline {}", i + 1),
                    "subheadline": format!("Subheadline {}", i + 1),
                    "body": "Body copy."
                })
            })
            .collect();
        json!({
            "tagline": "Slow bread, fast mornings",
            "summary": "Harbor Bakery bakes sourdough daily.",
            "sections": sections,
            "call_to_action": "Order catering",
            "seo": {"title": "Harbor Bakery | Portland sourdough", "description": "Fresh sourdough daily."},
            "tone": "warm"
        })
    }

    /// Quality review whose four sub-scores all equal `score`
    pub fn review(score: f64) -> Value {
        json!({
            "clarity": score,
            "persuasiveness": score,
            "completeness": score,
            "brand_alignment": score,
            "feedback": "Make the catering offer more concrete.",
            "improvements": ["Mention minimum order size"]
        })
    }

    pub fn page() -> Value {
        json!({"html": "<!DOCTYPE html><html lang=\"en\"><head><title>Harbor Bakery</title></head><body><h1>Slow bread, fast mornings</h1></body></html>"})
    }

    /// Build review whose four sub-scores all equal `score`
    pub fn site_review(score: f64) -> Value {
        json!({
            "design": score,
            "content": score,
            "technical": score,
            "accessibility": score,
            "issues": []
        })
    }
}

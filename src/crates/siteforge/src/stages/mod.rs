//! Stage prompt/parse library
//!
//! Every generation-backed stage has the same two phases: build an
//! instruction from the context slots it depends on, then decode the reply
//! into a typed output. Derived scores are always recomputed from the
//! sub-scores; a `score` field sent back by the model is never read.
//!
//! A stage returns a [`StageResult`] carrying both its output and the edge
//! it selected, so routing never has to be inferred elsewhere.

pub mod build;
pub mod enhance;
pub mod intake;
pub mod review;
pub mod site_review;

use crate::delivery::DeliveryReport;
use crate::deploy::DeployOutcome;
use crate::error::{Result, SiteforgeError};
use crate::gate::Eligibility;
use crate::graph::{Edge, StageId};
use llm::{GenerationRequest, LlmError, TextGenerator};
use serde_json::{Map, Value};
use tracing::{debug, warn};

pub use build::BuildOutcome;
pub use enhance::{EnhancedBrief, Section, SeoMetadata};
pub use intake::IntakeAssessment;
pub use review::QualityReview;
pub use site_review::{SiteReview, SiteReviewOutcome};

/// Typed output of one stage, tagged by the stage that produced it
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    Assessment(IntakeAssessment),
    Enhancement(EnhancedBrief),
    Review(QualityReview),
    Eligibility(Eligibility),
    Build(BuildOutcome),
    SiteReview(SiteReviewOutcome),
    Deploy(DeployOutcome),
    Delivery(DeliveryReport),
}

impl StageOutput {
    /// Stage whose context slot this output fills
    pub fn stage(&self) -> StageId {
        match self {
            Self::Assessment(_) => StageId::IntakeAssessment,
            Self::Enhancement(_) => StageId::EnhancementGeneration,
            Self::Review(_) => StageId::QualityReview,
            Self::Eligibility(_) => StageId::EligibilityGate,
            Self::Build(_) => StageId::PageBuild,
            Self::SiteReview(_) => StageId::BuildReview,
            Self::Deploy(_) => StageId::Deploy,
            Self::Delivery(_) => StageId::Delivery,
        }
    }
}

/// What a stage handler hands back to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    pub output: StageOutput,
    pub edge: Edge,
}

impl StageResult {
    pub fn new(output: StageOutput, edge: Edge) -> Self {
        Self { output, edge }
    }
}

/// Upper bound of every sub-score
pub const MAX_SCORE: f64 = 10.0;

/// Clamp a sub-score into 0..=10; NaN counts as 0
pub fn clamp_score(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, MAX_SCORE)
    }
}

/// Mean of the sub-scores, rounded to one decimal
pub fn mean_score(parts: &[f64]) -> f64 {
    if parts.is_empty() {
        return 0.0;
    }
    let mean = parts.iter().sum::<f64>() / parts.len() as f64;
    (mean * 10.0).round() / 10.0
}

/// Send one request for `stage` and decode the JSON object in the reply
pub(crate) async fn generate_json(
    generator: &dyn TextGenerator,
    stage: StageId,
    prompt: String,
    max_tokens: u32,
) -> std::result::Result<Map<String, Value>, LlmError> {
    debug!(stage = %stage, prompt_chars = prompt.len(), max_tokens, "Sending generation request");

    let request = GenerationRequest::new(prompt, stage.model_tier())
        .with_max_tokens(max_tokens)
        .with_label(stage.as_str());
    let response = generator.generate(request).await?;

    if response.was_truncated() {
        warn!(stage = %stage, "Generation hit its output budget; reply may be incomplete");
    }

    match llm::extract_json_object(&response.text)? {
        Value::Object(map) => Ok(map),
        _ => Err(LlmError::InvalidResponse("response JSON is not an object".to_string())),
    }
}

/// Same as [`generate_json`] with errors attributed to `stage`
pub(crate) async fn generate_json_or_fail(
    generator: &dyn TextGenerator,
    stage: StageId,
    prompt: String,
    max_tokens: u32,
) -> Result<Map<String, Value>> {
    generate_json(generator, stage, prompt, max_tokens).await.map_err(|e| {
        warn!(stage = %stage, transient = e.is_transient(), error = %e, "Generation failed");
        SiteforgeError::generation(stage, e)
    })
}

/// Read a sub-score; numbers and numeric strings are accepted.
pub(crate) fn sub_score(obj: &Map<String, Value>, key: &str) -> std::result::Result<f64, LlmError> {
    let value = match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .map(clamp_score)
        .ok_or_else(|| LlmError::InvalidResponse(format!("missing or non-numeric \"{}\"", key)))
}

pub(crate) fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// Array of strings; non-string and blank entries are dropped.
pub(crate) fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

//! Build review
//!
//! Scores the generated document. A low score or a failed review call both
//! route to delivery; nothing is retried.

use super::{generate_json, mean_score, string_list, sub_score, EnhancedBrief};
use super::{StageOutput, StageResult};
use crate::graph::{Edge, StageId};
use llm::{LlmError, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const MAX_TOKENS: u32 = 1024;

/// Minimum score to publish the page
pub const PASS_THRESHOLD: f64 = 7.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteReview {
    pub design: f64,
    pub content: f64,
    pub technical: f64,
    pub accessibility: f64,
    pub score: f64,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SiteReviewOutcome {
    Reviewed(SiteReview),
    Errored { reason: String },
}

impl SiteReviewOutcome {
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Reviewed(review) => Some(review.score),
            Self::Errored { .. } => None,
        }
    }
}

pub fn route(outcome: &SiteReviewOutcome) -> Edge {
    match outcome.score() {
        Some(score) if score >= PASS_THRESHOLD => Edge::SiteApproved,
        _ => Edge::SiteRejected,
    }
}

pub fn build_prompt(html: &str, copy: &EnhancedBrief) -> String {
    format!(
        r#"You are reviewing a generated one-page website before it is published.

The page should present this tagline: "{tagline}" and a call to action: "{cta}".

DOCUMENT:
{html}

Score the page from 0 to 10 on:
- design: layout, hierarchy and visual consistency
- content: the copy is complete, correct and free of placeholder text
- technical: valid, self-contained HTML that renders on mobile
- accessibility: contrast, alt text, landmarks and heading order

Reply with a single JSON object and nothing else:
{{
  "design": <0-10>,
  "content": <0-10>,
  "technical": <0-10>,
  "accessibility": <0-10>,
  "issues": ["<problem>", "..."]
}}"#,
        tagline = copy.tagline,
        cta = copy.call_to_action,
    )
}

pub fn parse(obj: &Map<String, Value>) -> std::result::Result<SiteReview, LlmError> {
    let design = sub_score(obj, "design")?;
    let content = sub_score(obj, "content")?;
    let technical = sub_score(obj, "technical")?;
    let accessibility = sub_score(obj, "accessibility")?;

    Ok(SiteReview {
        design,
        content,
        technical,
        accessibility,
        score: mean_score(&[design, content, technical, accessibility]),
        issues: string_list(obj, "issues"),
    })
}

pub async fn run(generator: &dyn TextGenerator, html: &str, copy: &EnhancedBrief) -> StageResult {
    let stage = StageId::BuildReview;
    let reviewed = generate_json(generator, stage, build_prompt(html, copy), MAX_TOKENS)
        .await
        .and_then(|obj| parse(&obj));
    let outcome = match reviewed {
        Ok(review) => SiteReviewOutcome::Reviewed(review),
        Err(e) => {
            warn!(stage = %stage, error = %e, "Build review call failed; the page will not be published");
            SiteReviewOutcome::Errored { reason: e.to_string() }
        }
    };

    let edge = route(&outcome);
    StageResult::new(StageOutput::SiteReview(outcome), edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route() {
        let passing = parse(
            json!({"design": 8, "content": 7, "technical": 7, "accessibility": 6})
                .as_object()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(passing.score, 7.0);
        assert_eq!(route(&SiteReviewOutcome::Reviewed(passing)), Edge::SiteApproved);

        let failing = parse(
            json!({"design": 6, "content": 7, "technical": 7, "accessibility": 6, "score": 10})
                .as_object()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(route(&SiteReviewOutcome::Reviewed(failing)), Edge::SiteRejected);

        let errored = SiteReviewOutcome::Errored { reason: "timeout".into() };
        assert_eq!(route(&errored), Edge::SiteRejected);
    }
}

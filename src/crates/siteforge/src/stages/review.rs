//! Quality review of the enhanced brief, plus the revision-loop routing.

use super::{generate_json_or_fail, mean_score, string_list, sub_score, text_field, EnhancedBrief};
use super::{StageOutput, StageResult};
use crate::error::{Result, SiteforgeError};
use crate::graph::{Edge, StageId};
use llm::{LlmError, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MAX_TOKENS: u32 = 1024;

/// Minimum score that approves a draft on its own merits
pub const PASS_THRESHOLD: f64 = 7.0;

/// Total generation attempts before the review stops asking for revisions
pub const MAX_GENERATION_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReview {
    pub clarity: f64,
    pub persuasiveness: f64,
    pub completeness: f64,
    pub brand_alignment: f64,
    /// Mean of the four sub-scores
    pub score: f64,
    pub feedback: String,
    pub improvements: Vec<String>,
}

/// Pick the outgoing edge from the score and the attempts used so far.
pub fn route(score: f64, generation_attempts: u32) -> Edge {
    if score >= PASS_THRESHOLD {
        Edge::Approved
    } else if generation_attempts < MAX_GENERATION_ATTEMPTS {
        Edge::Revise
    } else {
        Edge::MaxAttempts
    }
}

pub fn build_prompt(brief: &str, draft: &EnhancedBrief) -> String {
    let draft_json = serde_json::to_string_pretty(draft).unwrap_or_else(|_| format!("{:?}", draft));
    format!(
        r#"You are an exacting editor reviewing website copy written from a client brief.

ORIGINAL BRIEF:
{brief}

DRAFT COPY (JSON):
{draft_json}

Score the draft from 0 to 10 on:
- clarity: is every section easy to read and unambiguous?
- persuasiveness: would a visitor take the call to action?
- completeness: does the copy cover everything the brief asks for?
- brand_alignment: does the tone fit the business described?

Reply with a single JSON object and nothing else:
{{
  "clarity": <0-10>,
  "persuasiveness": <0-10>,
  "completeness": <0-10>,
  "brand_alignment": <0-10>,
  "feedback": "<what to change, in two or three sentences>",
  "improvements": ["<specific change>", "..."]
}}"#
    )
}

pub fn parse(obj: &Map<String, Value>) -> std::result::Result<QualityReview, LlmError> {
    let clarity = sub_score(obj, "clarity")?;
    let persuasiveness = sub_score(obj, "persuasiveness")?;
    let completeness = sub_score(obj, "completeness")?;
    let brand_alignment = sub_score(obj, "brand_alignment")?;

    Ok(QualityReview {
        clarity,
        persuasiveness,
        completeness,
        brand_alignment,
        score: mean_score(&[clarity, persuasiveness, completeness, brand_alignment]),
        feedback: text_field(obj, "feedback"),
        improvements: string_list(obj, "improvements"),
    })
}

/// Review the current draft. Generation and parse failures fail the run.
pub async fn run(
    generator: &dyn TextGenerator,
    brief: &str,
    draft: &EnhancedBrief,
    generation_attempts: u32,
) -> Result<StageResult> {
    let stage = StageId::QualityReview;
    let obj = generate_json_or_fail(generator, stage, build_prompt(brief, draft), MAX_TOKENS).await?;
    let review = parse(&obj).map_err(|e| SiteforgeError::generation(stage, e))?;
    let edge = route(review.score, generation_attempts);

    Ok(StageResult::new(StageOutput::Review(review), edge))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_route_approves_at_threshold() {
        assert_eq!(route(7.0, 1), Edge::Approved);
        assert_eq!(route(9.5, 2), Edge::Approved);
    }

    #[test]
    fn test_route_revises_once() {
        assert_eq!(route(6.9, 1), Edge::Revise);
        assert_eq!(route(6.9, 2), Edge::MaxAttempts);
        assert_eq!(route(0.0, 3), Edge::MaxAttempts);
    }

    #[test]
    fn test_parse_ignores_reported_score() {
        let value = json!({
            "clarity": 6,
            "persuasiveness": 6,
            "completeness": 7,
            "brand_alignment": 6,
            "score": 9.9,
            "feedback": "Needs specifics",
            "improvements": ["Add prices"]
        });
        let review = parse(value.as_object().unwrap()).unwrap();

        assert_eq!(review.score, 6.3);
        assert_eq!(route(review.score, 1), Edge::Revise);
        assert_eq!(review.improvements, vec!["Add prices"]);
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        let value = json!({
            "clarity": 15,
            "persuasiveness": 15,
            "completeness": 15,
            "brand_alignment": -4
        });
        let review = parse(value.as_object().unwrap()).unwrap();
        assert_eq!(review.clarity, 10.0);
        assert_eq!(review.brand_alignment, 0.0);
        assert_eq!(review.score, 7.5);
    }
}

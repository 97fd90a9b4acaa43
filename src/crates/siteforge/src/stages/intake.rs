//! Intake assessment
//!
//! Advisory read of the raw brief. Its sub-scores and missing elements only
//! feed the enhancement prompt; the stage always advances.

use super::{generate_json_or_fail, mean_score, string_list, sub_score, text_field};
use super::{StageOutput, StageResult};
use crate::error::{Result, SiteforgeError};
use crate::graph::{Edge, StageId};
use llm::{LlmError, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const MAX_TOKENS: u32 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeAssessment {
    pub completeness: f64,
    pub clarity: f64,
    pub specificity: f64,
    /// Mean of the three sub-scores
    pub score: f64,
    pub missing_elements: Vec<String>,
    pub strengths: Vec<String>,
    pub summary: String,
}

pub fn build_prompt(brief: &str) -> String {
    format!(
        r#"You are reviewing a small-business website brief before a copywriter works on it.

BRIEF:
{brief}

Rate the brief from 0 to 10 on:
- completeness: does it cover what the business does, who it serves and what it wants from a website?
- clarity: is it easy to understand?
- specificity: does it contain concrete details (services, places, differentiators) rather than generic claims?

List the important elements that are missing and the strengths worth keeping.

Reply with a single JSON object and nothing else:
{{
  "completeness": <0-10>,
  "clarity": <0-10>,
  "specificity": <0-10>,
  "missing_elements": ["..."],
  "strengths": ["..."],
  "summary": "<one or two sentences>"
}}"#
    )
}

pub fn parse(obj: &Map<String, Value>) -> std::result::Result<IntakeAssessment, LlmError> {
    let completeness = sub_score(obj, "completeness")?;
    let clarity = sub_score(obj, "clarity")?;
    let specificity = sub_score(obj, "specificity")?;

    Ok(IntakeAssessment {
        completeness,
        clarity,
        specificity,
        score: mean_score(&[completeness, clarity, specificity]),
        missing_elements: string_list(obj, "missing_elements"),
        strengths: string_list(obj, "strengths"),
        summary: text_field(obj, "summary"),
    })
}

/// Assess the brief. Generation and parse failures fail the run.
pub async fn run(generator: &dyn TextGenerator, brief: &str) -> Result<StageResult> {
    let stage = StageId::IntakeAssessment;
    let obj = generate_json_or_fail(generator, stage, build_prompt(brief), MAX_TOKENS).await?;
    let assessment = parse(&obj).map_err(|e| SiteforgeError::generation(stage, e))?;

    Ok(StageResult::new(StageOutput::Assessment(assessment), Edge::Assessed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_recomputes_score() {
        let value = json!({
            "completeness": 6,
            "clarity": 8,
            "specificity": 7,
            "score": 10,
            "missing_elements": ["opening hours"],
            "strengths": ["clear services"],
            "summary": "Solid brief."
        });
        let assessment = parse(value.as_object().unwrap()).unwrap();

        assert_eq!(assessment.score, 7.0);
        assert_eq!(assessment.missing_elements, vec!["opening hours"]);
        assert_eq!(assessment.summary, "Solid brief.");
    }

    #[test]
    fn test_parse_requires_sub_scores() {
        let value = json!({"completeness": 6, "clarity": 8});
        assert!(parse(value.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_prompt_embeds_brief() {
        let prompt = build_prompt("Business name: Harbor Bakery");
        assert!(prompt.contains("Business name: Harbor Bakery"));
        assert!(prompt.contains("\"specificity\""));
    }
}

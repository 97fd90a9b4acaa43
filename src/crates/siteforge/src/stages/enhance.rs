//! Enhancement generation
//!
//! Turns the brief into structured website copy. On a revision pass the
//! previous draft and the reviewer's critique are injected into the prompt.

use super::{generate_json_or_fail, text_field, IntakeAssessment, QualityReview};
use super::{StageOutput, StageResult};
use crate::error::{Result, SiteforgeError};
use crate::graph::{Edge, StageId};
use llm::{LlmError, TextGenerator};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write as _;

pub const MAX_TOKENS: u32 = 4096;

/// One block of the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// hero, services, about, testimonials, contact, ...
    pub kind: String,
    pub headline: String,
    pub subheadline: String,
    pub body: String,
}

impl Section {
    /// A section counts toward the gate only with both headings filled in.
    pub fn is_structured(&self) -> bool {
        !self.headline.trim().is_empty() && !self.subheadline.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SeoMetadata {
    pub title: String,
    pub description: String,
}

/// Structured copy produced for the site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnhancedBrief {
    pub tagline: String,
    pub summary: String,
    pub sections: Vec<Section>,
    pub call_to_action: String,
    pub seo: SeoMetadata,
    pub tone: String,
}

impl EnhancedBrief {
    pub fn structured_sections(&self) -> usize {
        self.sections.iter().filter(|s| s.is_structured()).count()
    }
}

/// Inputs to one generation attempt
pub struct EnhanceInput<'a> {
    pub brief: &'a str,
    pub assessment: &'a IntakeAssessment,
    /// Previous draft and its critique when this is a revision pass
    pub revision_of: Option<(&'a EnhancedBrief, &'a QualityReview)>,
}

pub fn build_prompt(input: &EnhanceInput<'_>) -> String {
    let mut prompt = String::from(
        "You are a conversion copywriter writing a one-page website for a small business.\n\n",
    );
    let _ = writeln!(prompt, "BRIEF:\n{}\n", input.brief);

    let assessment = input.assessment;
    let _ = writeln!(
        prompt,
        "INTAKE ASSESSMENT (score {:.1}/10): {}",
        assessment.score, assessment.summary
    );
    if !assessment.missing_elements.is_empty() {
        let _ = writeln!(
            prompt,
            "The brief is missing: {}. Fill these gaps with plausible, modest wording; never invent awards, prices or statistics.",
            assessment.missing_elements.join("; ")
        );
    }
    if !assessment.strengths.is_empty() {
        let _ = writeln!(prompt, "Keep these strengths: {}.", assessment.strengths.join("; "));
    }

    if let Some((draft, review)) = input.revision_of {
        let _ = writeln!(
            prompt,
            "\nREVISION REQUEST: the previous draft scored {:.1}/10.\nReviewer feedback: {}",
            review.score, review.feedback
        );
        for improvement in &review.improvements {
            let _ = writeln!(prompt, "- {}", improvement);
        }
        let _ = writeln!(prompt, "Previous tagline: {}", draft.tagline);
        let _ = writeln!(prompt, "Address every point above in the new draft.");
    }

    prompt.push_str(
        r#"
Write at least four sections (hero, services, about, contact). Every section needs a headline and a subheadline.

Reply with a single JSON object and nothing else:
{
  "tagline": "...",
  "summary": "...",
  "sections": [
    {"kind": "hero", "headline": "...", "subheadline": "...", "body": "..."}
  ],
  "call_to_action": "...",
  "seo": {"title": "...", "description": "..."},
  "tone": "..."
}"#,
    );
    prompt
}

fn parse_section(value: &Value) -> Option<Section> {
    let obj = value.as_object()?;
    Some(Section {
        kind: text_field(obj, "kind"),
        headline: text_field(obj, "headline"),
        subheadline: text_field(obj, "subheadline"),
        body: text_field(obj, "body"),
    })
}

pub fn parse(obj: &Map<String, Value>) -> std::result::Result<EnhancedBrief, LlmError> {
    let sections = obj
        .get("sections")
        .and_then(Value::as_array)
        .ok_or_else(|| LlmError::InvalidResponse("missing \"sections\" array".to_string()))?
        .iter()
        .filter_map(parse_section)
        .collect();

    let seo = obj
        .get("seo")
        .and_then(Value::as_object)
        .map(|seo| SeoMetadata {
            title: text_field(seo, "title"),
            description: text_field(seo, "description"),
        })
        .unwrap_or_default();

    Ok(EnhancedBrief {
        tagline: text_field(obj, "tagline"),
        summary: text_field(obj, "summary"),
        sections,
        call_to_action: text_field(obj, "call_to_action"),
        seo,
        tone: text_field(obj, "tone"),
    })
}

/// Generate one draft. Generation and parse failures fail the run.
pub async fn run(generator: &dyn TextGenerator, input: EnhanceInput<'_>) -> Result<StageResult> {
    let stage = StageId::EnhancementGeneration;
    let obj = generate_json_or_fail(generator, stage, build_prompt(&input), MAX_TOKENS).await?;
    let brief = parse(&obj).map_err(|e| SiteforgeError::generation(stage, e))?;

    Ok(StageResult::new(StageOutput::Enhancement(brief), Edge::Generated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assessment() -> IntakeAssessment {
        IntakeAssessment {
            completeness: 5.0,
            clarity: 7.0,
            specificity: 6.0,
            score: 6.0,
            missing_elements: vec!["service area".into()],
            strengths: vec![],
            summary: "Usable.".into(),
        }
    }

    #[test]
    fn test_parse_sections_and_seo() {
        let value = json!({
            "tagline": "Fresh every morning",
            "sections": [
                {"kind": "hero", "headline": "Bread", "subheadline": "Baked daily", "body": "..."},
                {"kind": "about", "headline": "Us", "subheadline": ""},
                "not a section"
            ],
            "seo": {"title": "Harbor Bakery", "description": "Sourdough"}
        });
        let brief = parse(value.as_object().unwrap()).unwrap();

        assert_eq!(brief.sections.len(), 2);
        assert_eq!(brief.structured_sections(), 1);
        assert_eq!(brief.seo.title, "Harbor Bakery");
        assert_eq!(brief.call_to_action, "");
    }

    #[test]
    fn test_parse_requires_sections() {
        let value = json!({"tagline": "x"});
        assert!(parse(value.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_first_pass_prompt_has_no_revision_block() {
        let a = assessment();
        let prompt = build_prompt(&EnhanceInput {
            brief: "Business name: Harbor Bakery",
            assessment: &a,
            revision_of: None,
        });
        assert!(prompt.contains("service area"));
        assert!(!prompt.contains("REVISION REQUEST"));
    }

    #[test]
    fn test_revision_prompt_injects_critique() {
        let a = assessment();
        let draft = EnhancedBrief {
            tagline: "Old tagline".into(),
            summary: String::new(),
            sections: vec![],
            call_to_action: String::new(),
            seo: SeoMetadata::default(),
            tone: String::new(),
        };
        let review = QualityReview {
            clarity: 5.0,
            persuasiveness: 5.0,
            completeness: 5.0,
            brand_alignment: 5.0,
            score: 5.0,
            feedback: "Too generic".into(),
            improvements: vec!["Name the neighbourhood".into()],
        };
        let prompt = build_prompt(&EnhanceInput {
            brief: "b",
            assessment: &a,
            revision_of: Some((&draft, &review)),
        });

        assert!(prompt.contains("REVISION REQUEST"));
        assert!(prompt.contains("Too generic"));
        assert!(prompt.contains("- Name the neighbourhood"));
        assert!(prompt.contains("Old tagline"));
    }
}

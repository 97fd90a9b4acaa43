//! Page build
//!
//! Generates the complete single-page HTML document. Any failure here
//! degrades to delivery instead of failing the run; there is no retry.

use super::{generate_json, text_field, EnhancedBrief};
use super::{StageOutput, StageResult};
use crate::graph::{Edge, StageId};
use crate::submission::IntakeSubmission;
use llm::TextGenerator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::Write as _;
use tracing::warn;

pub const MAX_TOKENS: u32 = 16000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildOutcome {
    Built { html: String },
    Failed { reason: String },
}

impl BuildOutcome {
    pub fn html(&self) -> Option<&str> {
        match self {
            Self::Built { html } => Some(html),
            Self::Failed { .. } => None,
        }
    }
}

/// Whether `html` carries a document root marker
pub fn has_document_root(html: &str) -> bool {
    let lower = html.to_ascii_lowercase();
    lower.contains("<!doctype html") || lower.contains("<html")
}

fn design_direction(submission: &IntakeSubmission) -> String {
    if let Some(colors) = submission.custom_colors.as_ref().filter(|c| c.is_valid()) {
        let mut direction = format!(
            "Use the client's colors: primary {}, secondary {}",
            colors.primary, colors.secondary
        );
        if let Some(accent) = &colors.accent {
            let _ = write!(direction, ", accent {}", accent);
        }
        direction.push('.');
        return direction;
    }
    match submission.recognized_style() {
        Some(style) => format!("Use a {} visual style with a palette that suits it.", style),
        None => "Use a clean, professional visual style.".to_string(),
    }
}

pub fn build_prompt(submission: &IntakeSubmission, copy: &EnhancedBrief) -> String {
    let copy_json = serde_json::to_string_pretty(copy).unwrap_or_else(|_| format!("{:?}", copy));
    format!(
        r#"You are a front-end developer building a single-page marketing site for "{name}".

{direction}

Use exactly this copy (JSON):
{copy_json}

Requirements:
- One self-contained HTML5 document starting with <!DOCTYPE html>.
- Inline CSS only, no external scripts, responsive down to 360px wide.
- Semantic landmarks (header, main, section, footer), alt text on images, sufficient color contrast.
- Use the SEO title and description in <title> and <meta name="description">.

Reply with a single JSON object and nothing else:
{{"html": "<the full document>"}}"#,
        name = submission.display_name(),
        direction = design_direction(submission),
    )
}

/// Extract the document from the reply, rejecting anything without a root.
pub fn parse(obj: &Map<String, Value>) -> Result<String, String> {
    let html = text_field(obj, "html");
    if html.is_empty() {
        return Err("response has no \"html\" field".to_string());
    }
    if !has_document_root(&html) {
        return Err("generated document has no <html> root".to_string());
    }
    Ok(html)
}

pub async fn run(
    generator: &dyn TextGenerator,
    submission: &IntakeSubmission,
    copy: &EnhancedBrief,
) -> StageResult {
    let stage = StageId::PageBuild;
    let outcome = match generate_json(generator, stage, build_prompt(submission, copy), MAX_TOKENS).await {
        Ok(obj) => match parse(&obj) {
            Ok(html) => BuildOutcome::Built { html },
            Err(reason) => BuildOutcome::Failed { reason },
        },
        Err(e) => BuildOutcome::Failed {
            reason: format!("generation failed: {}", e),
        },
    };

    let edge = match &outcome {
        BuildOutcome::Built { .. } => Edge::Built,
        BuildOutcome::Failed { reason } => {
            warn!(stage = %stage, reason = %reason, "Page build failed; continuing to delivery");
            Edge::BuildFailed
        }
    };
    StageResult::new(StageOutput::Build(outcome), edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submission::CustomColors;
    use serde_json::json;

    #[test]
    fn test_document_root_is_case_insensitive() {
        assert!(has_document_root("<!DOCTYPE html><html></html>"));
        assert!(has_document_root("  <HTML lang=\"en\">"));
        assert!(!has_document_root("<div>just a fragment</div>"));
    }

    #[test]
    fn test_parse_rejects_fragment() {
        let fragment = json!({"html": "<section>Hi</section>"});
        assert!(parse(fragment.as_object().unwrap()).is_err());

        let missing = json!({"page": "<!doctype html>"});
        assert!(parse(missing.as_object().unwrap()).is_err());

        let ok = json!({"html": "<!doctype html><html><body>Hi</body></html>"});
        assert!(parse(ok.as_object().unwrap()).is_ok());
    }

    #[test]
    fn test_design_direction_prefers_valid_custom_colors() {
        let submission = IntakeSubmission {
            style: Some("bold".into()),
            custom_colors: Some(CustomColors {
                primary: "#112233".into(),
                secondary: "#fff".into(),
                accent: None,
            }),
            ..Default::default()
        };
        assert!(design_direction(&submission).contains("#112233"));

        let submission = IntakeSubmission {
            style: Some("bold".into()),
            ..Default::default()
        };
        assert!(design_direction(&submission).contains("bold"));
    }
}

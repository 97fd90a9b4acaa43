//! Procedural eligibility gate
//!
//! Decides whether a submission is worth attempting a build for. Every
//! criterion is evaluated, and every failure contributes a reason. The gate
//! is lenient on purpose: the build review is the real quality check.

use crate::graph::Edge;
use crate::stages::{EnhancedBrief, QualityReview, StageOutput, StageResult};
use crate::submission::IntakeSubmission;
use serde::{Deserialize, Serialize};

/// Structured sections needed for a buildable page
pub const MIN_SECTIONS: usize = 3;

/// Quality review score needed to attempt a build
pub const MIN_REVIEW_SCORE: f64 = 6.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Eligibility {
    pub qualifies: bool,
    pub reasons: Vec<String>,
}

pub fn evaluate(
    submission: &IntakeSubmission,
    copy: &EnhancedBrief,
    review: &QualityReview,
) -> Eligibility {
    let mut reasons = Vec::new();

    let sections = copy.structured_sections();
    if sections < MIN_SECTIONS {
        reasons.push(format!(
            "Only {} section(s) with a headline and subheadline; at least {} are needed",
            sections, MIN_SECTIONS
        ));
    }

    if review.score < MIN_REVIEW_SCORE {
        reasons.push(format!(
            "Quality review score {:.1} is below {:.1}",
            review.score, MIN_REVIEW_SCORE
        ));
    }

    let has_valid_colors = submission
        .custom_colors
        .as_ref()
        .map_or(false, |colors| colors.is_valid());
    if submission.recognized_style().is_none() && !has_valid_colors {
        reasons.push("No recognized style and no valid custom colors".to_string());
    }

    if submission.display_name().is_empty() {
        reasons.push("Business name is empty".to_string());
    }

    if reasons.is_empty() {
        Eligibility {
            qualifies: true,
            reasons: vec![format!(
                "{} structured sections, review score {:.1}, design direction resolved",
                sections, review.score
            )],
        }
    } else {
        Eligibility {
            qualifies: false,
            reasons,
        }
    }
}

pub fn run(submission: &IntakeSubmission, copy: &EnhancedBrief, review: &QualityReview) -> StageResult {
    let eligibility = evaluate(submission, copy, review);
    let edge = if eligibility.qualifies {
        Edge::Qualified
    } else {
        Edge::Disqualified
    };
    StageResult::new(StageOutput::Eligibility(eligibility), edge)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::{Section, SeoMetadata};
    use crate::submission::CustomColors;

    fn section(headline: &str, subheadline: &str) -> Section {
        Section {
            kind: "about".into(),
            headline: headline.into(),
            subheadline: subheadline.into(),
            body: String::new(),
        }
    }

    fn copy(sections: Vec<Section>) -> EnhancedBrief {
        EnhancedBrief {
            tagline: "t".into(),
            summary: "s".into(),
            sections,
            call_to_action: "Call us".into(),
            seo: SeoMetadata::default(),
            tone: "warm".into(),
        }
    }

    fn review(score: f64) -> QualityReview {
        QualityReview {
            clarity: score,
            persuasiveness: score,
            completeness: score,
            brand_alignment: score,
            score,
            feedback: String::new(),
            improvements: vec![],
        }
    }

    fn submission() -> IntakeSubmission {
        IntakeSubmission {
            business_name: "Harbor Bakery".into(),
            style: Some("warm".into()),
            ..Default::default()
        }
    }

    fn three_sections() -> Vec<Section> {
        vec![section("a", "b"), section("c", "d"), section("e", "f")]
    }

    #[test]
    fn test_all_criteria_pass() {
        let result = evaluate(&submission(), &copy(three_sections()), &review(6.0));
        assert!(result.qualifies);
        assert_eq!(result.reasons.len(), 1);
    }

    #[test]
    fn test_sections_missing_subheadline_do_not_count() {
        let sections = vec![section("a", "b"), section("c", "d"), section("e", "  ")];
        let result = evaluate(&submission(), &copy(sections), &review(8.0));
        assert!(!result.qualifies);
        assert!(result.reasons[0].contains("Only 2 section(s)"));
    }

    #[test]
    fn test_reasons_accumulate() {
        let sub = IntakeSubmission {
            business_name: "   ".into(),
            style: Some("vaporwave".into()),
            ..Default::default()
        };
        let result = evaluate(&sub, &copy(vec![]), &review(5.9));

        assert!(!result.qualifies);
        assert_eq!(result.reasons.len(), 4);
    }

    #[test]
    fn test_custom_colors_substitute_for_style() {
        let sub = IntakeSubmission {
            business_name: "Harbor Bakery".into(),
            style: None,
            custom_colors: Some(CustomColors {
                primary: "#000".into(),
                secondary: "#ffffff".into(),
                accent: None,
            }),
            ..Default::default()
        };
        assert!(evaluate(&sub, &copy(three_sections()), &review(7.0)).qualifies);

        let sub = IntakeSubmission {
            custom_colors: Some(CustomColors {
                primary: "black".into(),
                secondary: "#ffffff".into(),
                accent: None,
            }),
            ..sub
        };
        assert!(!evaluate(&sub, &copy(three_sections()), &review(7.0)).qualifies);
    }

    #[test]
    fn test_run_selects_edge() {
        assert_eq!(
            run(&submission(), &copy(three_sections()), &review(9.0)).edge,
            Edge::Qualified
        );
        assert_eq!(
            run(&submission(), &copy(vec![]), &review(9.0)).edge,
            Edge::Disqualified
        );
    }
}

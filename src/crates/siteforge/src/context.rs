//! Session context
//!
//! The accumulator threaded through a run: the submission, its plain-text
//! brief, one optional slot per stage and two counters. Stage handlers never
//! see the whole context; the engine hands each one only the slots it
//! declares, fetched through the `require_*` accessors, which fail with
//! [`SiteforgeError::MissingSlot`] instead of reading an empty slot.

use crate::delivery::DeliveryReport;
use crate::deploy::DeployOutcome;
use crate::error::{Result, SiteforgeError};
use crate::gate::Eligibility;
use crate::graph::StageId;
use crate::stages::{
    BuildOutcome, EnhancedBrief, IntakeAssessment, QualityReview, SiteReviewOutcome, StageOutput,
};
use crate::submission::IntakeSubmission;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionContext {
    pub submission: IntakeSubmission,
    pub brief: String,
    /// 0 for a first submission, >0 for a paid revision
    pub revision: u32,
    /// Enhancement attempts so far in this run
    pub generation_attempts: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<IntakeAssessment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enhancement: Option<EnhancedBrief>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_review: Option<QualityReview>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eligibility: Option<Eligibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_review: Option<SiteReviewOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeployOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery: Option<DeliveryReport>,
}

fn required<'a, T>(slot: &'a Option<T>, stage: StageId, name: &'static str) -> Result<&'a T> {
    slot.as_ref()
        .ok_or(SiteforgeError::MissingSlot { stage, slot: name })
}

impl SessionContext {
    pub fn new(submission: IntakeSubmission, brief: impl Into<String>, revision: u32) -> Self {
        Self {
            submission,
            brief: brief.into(),
            revision,
            generation_attempts: 0,
            assessment: None,
            enhancement: None,
            quality_review: None,
            eligibility: None,
            build: None,
            site_review: None,
            deployment: None,
            delivery: None,
        }
    }

    pub fn is_revision(&self) -> bool {
        self.revision > 0
    }

    /// Store a stage output in the slot that stage owns
    ///
    /// Enhancement outputs also bump the attempt counter, so the count
    /// always equals the number of drafts produced.
    pub fn apply(&mut self, output: StageOutput) {
        match output {
            StageOutput::Assessment(v) => self.assessment = Some(v),
            StageOutput::Enhancement(v) => {
                self.generation_attempts += 1;
                self.enhancement = Some(v);
            }
            StageOutput::Review(v) => self.quality_review = Some(v),
            StageOutput::Eligibility(v) => self.eligibility = Some(v),
            StageOutput::Build(v) => self.build = Some(v),
            StageOutput::SiteReview(v) => self.site_review = Some(v),
            StageOutput::Deploy(v) => self.deployment = Some(v),
            StageOutput::Delivery(v) => self.delivery = Some(v),
        }
    }

    pub fn require_assessment(&self, stage: StageId) -> Result<&IntakeAssessment> {
        required(&self.assessment, stage, "intake_assessment")
    }

    pub fn require_enhancement(&self, stage: StageId) -> Result<&EnhancedBrief> {
        required(&self.enhancement, stage, "enhancement_generation")
    }

    pub fn require_quality_review(&self, stage: StageId) -> Result<&QualityReview> {
        required(&self.quality_review, stage, "quality_review")
    }

    /// The built document; a failed build counts as an empty slot.
    pub fn require_html(&self, stage: StageId) -> Result<&str> {
        required(&self.build, stage, "page_build")?
            .html()
            .ok_or(SiteforgeError::MissingSlot { stage, slot: "page_build" })
    }

    pub fn site_url(&self) -> Option<&str> {
        self.deployment.as_ref().and_then(DeployOutcome::site_url)
    }

    pub fn quality_score(&self) -> Option<f64> {
        self.quality_review.as_ref().map(|r| r.score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::SeoMetadata;

    fn brief() -> EnhancedBrief {
        EnhancedBrief {
            tagline: "t".into(),
            summary: String::new(),
            sections: vec![],
            call_to_action: String::new(),
            seo: SeoMetadata::default(),
            tone: String::new(),
        }
    }

    #[test]
    fn test_apply_counts_generation_attempts() {
        let mut ctx = SessionContext::new(IntakeSubmission::default(), "brief", 0);
        ctx.apply(StageOutput::Enhancement(brief()));
        ctx.apply(StageOutput::Enhancement(brief()));
        assert_eq!(ctx.generation_attempts, 2);
        assert!(ctx.enhancement.is_some());
    }

    #[test]
    fn test_missing_slot_is_an_error() {
        let ctx = SessionContext::new(IntakeSubmission::default(), "brief", 0);
        let err = ctx.require_enhancement(StageId::QualityReview).unwrap_err();
        assert!(matches!(
            err,
            SiteforgeError::MissingSlot {
                stage: StageId::QualityReview,
                slot: "enhancement_generation"
            }
        ));
    }

    #[test]
    fn test_failed_build_has_no_html() {
        let mut ctx = SessionContext::new(IntakeSubmission::default(), "brief", 0);
        ctx.apply(StageOutput::Build(BuildOutcome::Failed { reason: "x".into() }));
        assert!(ctx.require_html(StageId::BuildReview).is_err());

        ctx.apply(StageOutput::Build(BuildOutcome::Built { html: "<html>".into() }));
        assert_eq!(ctx.require_html(StageId::BuildReview).unwrap(), "<html>");
    }
}

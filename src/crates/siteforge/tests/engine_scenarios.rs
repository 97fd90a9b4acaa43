//! End-to-end runs of the stage graph with scripted collaborators

mod common;

use common::{harness, harness_with_mailer, publishing_script, LEAD_INBOX};
use siteforge::credits::CreditRecord;
use siteforge::graph::replay_path;
use siteforge::stages::{intake, StageOutput};
use siteforge::testing::{fixtures, RecordingMailer, ScriptedDeployer, ScriptedGenerator};
use siteforge::{Edge, RunStatus, SiteforgeError, StageId, StateStore, TransitionRecord};
use std::sync::Arc;

use Edge::*;

#[tokio::test]
async fn test_eligible_submission_is_published_and_notified() {
    let h = harness(publishing_script(8.5), ScriptedDeployer::succeeding());

    let summary = h
        .engine
        .execute(fixtures::submission(), fixtures::submission().format_brief(), 0)
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(
        summary.edges(),
        vec![Assessed, Generated, Approved, Qualified, Built, SiteApproved, Deployed, Done]
    );
    assert_eq!(summary.site_url.as_deref(), Some("https://harbor-bakery.pages.dev"));
    assert_eq!(summary.quality_score, Some(8.0));
    assert_eq!(summary.credits_remaining, Some(3));
    assert_eq!(h.deployer.calls(), vec!["Harbor Bakery".to_string()]);

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().any(|m| m.to == vec![LEAD_INBOX.to_string()]));
    assert!(sent.iter().any(|m| m.to == vec![fixtures::CONTACT_EMAIL.to_string()]));
    assert!(sent.iter().all(|m| m.html.contains("https://harbor-bakery.pages.dev")));
}

#[tokio::test]
async fn test_first_pass_approval_counts_one_attempt() {
    let h = harness(publishing_script(8.0), ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();
    let state = h.engine.load(&summary.session_id).await.unwrap();

    assert_eq!(state.context.generation_attempts, 1);
    assert_eq!(h.generator.calls_for(StageId::EnhancementGeneration), 1);
    assert_eq!(h.generator.calls_for(StageId::QualityReview), 1);
}

#[tokio::test]
async fn test_thin_copy_is_disqualified_without_building() {
    let generator = ScriptedGenerator::new()
        .reply_json(StageId::IntakeAssessment, fixtures::assessment())
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(2))
        .reply_json(StageId::QualityReview, fixtures::review(8.0));
    let h = harness(generator, ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.edges(), vec![Assessed, Generated, Approved, Disqualified, Done]);
    assert_eq!(summary.site_url, None);
    assert_eq!(h.generator.calls_for(StageId::PageBuild), 0);
    assert!(h.deployer.calls().is_empty());

    let state = h.engine.load(&summary.session_id).await.unwrap();
    let eligibility = state.context.eligibility.unwrap();
    assert!(!eligibility.qualifies);
    assert!(eligibility.reasons.iter().any(|r| r.contains("section")));
    assert!(state.context.build.is_none());
}

#[tokio::test]
async fn test_deploy_failure_routes_to_delivery() {
    let h = harness(publishing_script(9.0), ScriptedDeployer::failing("Authentication error [code: 10000]"));

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    let edges = summary.edges();
    let failed_at = edges.iter().position(|e| *e == DeployFailed).unwrap();
    assert_eq!(edges[failed_at + 1], Done);
    assert_eq!(edges.len(), failed_at + 2);
    assert_eq!(summary.site_url, None);

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| !m.html.contains("pages.dev")));
}

#[tokio::test]
async fn test_missing_deploy_credentials_skips_publish() {
    let h = harness(publishing_script(9.0), ScriptedDeployer::without_credentials());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    assert_eq!(summary.edges().last(), Some(&Done));
    assert!(summary.edges().contains(&DeployFailed));
    assert!(h.deployer.calls().is_empty());
}

#[tokio::test]
async fn test_rejected_build_is_not_deployed() {
    let h = harness(publishing_script(5.0), ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    assert_eq!(
        summary.edges(),
        vec![Assessed, Generated, Approved, Qualified, Built, SiteRejected, Done]
    );
    assert!(h.deployer.calls().is_empty());
    assert_eq!(summary.site_url, None);
}

#[tokio::test]
async fn test_build_failure_degrades_to_delivery() {
    let generator = ScriptedGenerator::new()
        .reply_json(StageId::IntakeAssessment, fixtures::assessment())
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(4))
        .reply_json(StageId::QualityReview, fixtures::review(8.0))
        .reply(StageId::PageBuild, "I could not produce a page this time.");
    let h = harness(generator, ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.edges(), vec![Assessed, Generated, Approved, Qualified, BuildFailed, Done]);
    assert_eq!(h.generator.calls_for(StageId::BuildReview), 0);
}

#[tokio::test]
async fn test_revision_with_exhausted_credits_still_delivers() {
    let h = harness(publishing_script(8.0), ScriptedDeployer::succeeding());
    let store = StateStore::new(Arc::new(h.backend.clone()));
    let mut record = CreditRecord::new(fixtures::CONTACT_EMAIL, 3, "starter");
    record.used = 3;
    store.save_credits(&record).await.unwrap();

    let summary = h.engine.execute(fixtures::submission(), "brief", 2).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.credits_remaining, Some(0));
    assert_eq!(h.mailer.sent().len(), 2);

    let stored = store.load_credits(fixtures::CONTACT_EMAIL).await.unwrap().unwrap();
    assert_eq!(stored.used, 3);
}

#[tokio::test]
async fn test_revision_deducts_one_credit() {
    let h = harness(publishing_script(8.0), ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 1).await.unwrap();

    assert_eq!(summary.credits_remaining, Some(2));
    let store = StateStore::new(Arc::new(h.backend.clone()));
    let stored = store.load_credits(fixtures::CONTACT_EMAIL).await.unwrap().unwrap();
    assert_eq!(stored.used, 1);
}

#[tokio::test]
async fn test_one_failed_email_does_not_block_the_other() {
    let mailer = RecordingMailer::new().fail_for(LEAD_INBOX);
    let h = harness_with_mailer(publishing_script(8.0), ScriptedDeployer::succeeding(), mailer);

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);

    let sent = h.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec![fixtures::CONTACT_EMAIL.to_string()]);

    let state = h.engine.load(&summary.session_id).await.unwrap();
    let report = state.context.delivery.unwrap();
    assert!(!report.lead_notice.is_sent());
    assert!(report.lead_notice.was_attempted());
    assert!(report.confirmation.is_sent());
}

#[tokio::test]
async fn test_low_scores_revise_once_then_stop() {
    let generator = ScriptedGenerator::new()
        .reply_json(StageId::IntakeAssessment, fixtures::assessment())
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(4))
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(4))
        .reply_json(StageId::QualityReview, fixtures::review(5.0))
        .reply_json(StageId::QualityReview, fixtures::review(5.0));
    let h = harness(generator, ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    assert_eq!(
        summary.edges(),
        vec![Assessed, Generated, Revise, Generated, MaxAttempts, Disqualified, Done]
    );
    assert_eq!(h.generator.calls_for(StageId::EnhancementGeneration), 2);

    let enhancement_prompts: Vec<String> = h
        .generator
        .calls()
        .into_iter()
        .filter(|r| r.label == StageId::EnhancementGeneration.as_str())
        .map(|r| r.prompt)
        .collect();
    assert!(!enhancement_prompts[0].contains("REVISION REQUEST"));
    assert!(enhancement_prompts[1].contains("REVISION REQUEST"));
    assert!(enhancement_prompts[1].contains("Mention minimum order size"));
}

#[tokio::test]
async fn test_revision_that_passes_goes_on_to_build() {
    let generator = ScriptedGenerator::new()
        .reply_json(StageId::IntakeAssessment, fixtures::assessment())
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(4))
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(5))
        .reply_json(StageId::QualityReview, fixtures::review(6.0))
        .reply_json(StageId::QualityReview, fixtures::review(7.5))
        .reply_json(StageId::PageBuild, fixtures::page())
        .reply_json(StageId::BuildReview, fixtures::site_review(8.0));
    let h = harness(generator, ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    assert_eq!(
        summary.edges(),
        vec![Assessed, Generated, Revise, Generated, Approved, Qualified, Built, SiteApproved, Deployed, Done]
    );
    assert_eq!(summary.quality_score, Some(7.5));
    assert_eq!(summary.enhancement.unwrap().sections.len(), 5);
}

#[tokio::test]
async fn test_generation_failure_fails_run_with_partial_history() {
    let generator = ScriptedGenerator::new()
        .reply_json(StageId::IntakeAssessment, fixtures::assessment())
        .fail(StageId::EnhancementGeneration, "overloaded");
    let h = harness(generator, ScriptedDeployer::succeeding());

    let failure = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap_err();

    assert!(matches!(
        failure.error,
        SiteforgeError::Generation {
            stage: StageId::EnhancementGeneration,
            ..
        }
    ));
    assert_eq!(failure.transitions.len(), 1);
    assert_eq!(failure.transitions[0].edge, Assessed);
    assert!(h.mailer.sent().is_empty());

    let state = h.engine.load(&failure.session_id).await.unwrap();
    assert_eq!(state.status, RunStatus::Failed);
    assert_eq!(state.current_stage, StageId::EnhancementGeneration);
    assert!(state.error.unwrap().contains("overloaded"));
}

#[tokio::test]
async fn test_failed_run_is_not_resumable() {
    let generator = ScriptedGenerator::new().fail(StageId::IntakeAssessment, "boom");
    let h = harness(generator, ScriptedDeployer::succeeding());

    let failure = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap_err();
    let resumed = h.engine.resume(&failure.session_id).await.unwrap_err();

    assert!(matches!(resumed.error, SiteforgeError::NotResumable { .. }));
    assert_eq!(h.generator.calls_for(StageId::IntakeAssessment), 1);
}

#[tokio::test]
async fn test_completed_run_resumes_to_same_summary() {
    let h = harness(publishing_script(8.0), ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();
    let calls_before = h.generator.calls().len();

    let resumed = h.engine.resume(&summary.session_id).await.unwrap();

    assert_eq!(resumed, summary);
    assert_eq!(h.generator.calls().len(), calls_before);
    assert_eq!(h.mailer.sent().len(), 2);
}

#[tokio::test]
async fn test_resume_continues_from_persisted_stage() {
    let generator = ScriptedGenerator::new()
        .reply_json(StageId::EnhancementGeneration, fixtures::enhancement(4))
        .reply_json(StageId::QualityReview, fixtures::review(8.0))
        .reply_json(StageId::PageBuild, fixtures::page())
        .reply_json(StageId::BuildReview, fixtures::site_review(8.0));
    let h = harness(generator, ScriptedDeployer::succeeding());

    let mut state = h.engine.submit(fixtures::submission(), "brief", 0).await;
    let assessment = intake::parse(fixtures::assessment().as_object().unwrap()).unwrap();
    state.context.apply(StageOutput::Assessment(assessment));
    state.transitions.push(TransitionRecord::new(Assessed, 12));
    state.current_stage = StageId::EnhancementGeneration;
    StateStore::new(Arc::new(h.backend.clone()))
        .save_execution(&state)
        .await
        .unwrap();

    let summary = h.engine.resume(&state.session_id).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.edges().first(), Some(&Assessed));
    assert_eq!(summary.edges().last(), Some(&Done));
    assert_eq!(h.generator.calls_for(StageId::IntakeAssessment), 0);
}

#[tokio::test]
async fn test_unknown_session_is_not_found() {
    let h = harness(ScriptedGenerator::new(), ScriptedDeployer::succeeding());

    let failure = h.engine.resume("no-such-session").await.unwrap_err();
    assert!(matches!(failure.error, SiteforgeError::NotFound(_)));
    assert!(failure.transitions.is_empty());
}

#[tokio::test]
async fn test_state_is_persisted_after_every_step() {
    let h = harness(publishing_script(8.0), ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();

    // one write on submit, one per transition
    assert_eq!(h.backend.writes_with_prefix("session:"), 1 + summary.transitions.len());
    let ttl = h
        .backend
        .inner()
        .ttl(&format!("session:{}", summary.session_id))
        .await
        .unwrap();
    assert!(ttl > std::time::Duration::from_secs(29 * 24 * 60 * 60));
}

#[tokio::test]
async fn test_history_replays_as_a_connected_path() {
    let h = harness(publishing_script(8.0), ScriptedDeployer::succeeding());

    let summary = h.engine.execute(fixtures::submission(), "brief", 0).await.unwrap();
    let path = replay_path(&summary.transitions).unwrap();

    assert_eq!(path.first(), Some(&StageId::IntakeAssessment));
    assert_eq!(path.last(), Some(&StageId::Delivery));
    assert_eq!(path.len(), summary.transitions.len());
    for (record, stage) in summary.transitions.iter().zip(&path) {
        assert_eq!(record.from, *stage);
    }
}

#[tokio::test]
async fn test_step_cap_fails_the_run() {
    let h = harness(publishing_script(8.0), ScriptedDeployer::succeeding());
    let engine = siteforge::Engine::new(h.engine.environment().clone()).with_max_steps(3);

    let failure = engine.execute(fixtures::submission(), "brief", 0).await.unwrap_err();

    assert!(matches!(failure.error, SiteforgeError::StepLimit(3)));
    assert_eq!(failure.transitions.len(), 3);
}

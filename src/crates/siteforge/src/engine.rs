//! Graph Execution Engine
//!
//! Drives a run through the fixed stage graph:
//! 1. Execute the current stage against the slots it depends on
//! 2. Store its output in the context slot it owns
//! 3. Follow the edge it selected and append a transition record
//! 4. Persist the state (awaited) before the next stage starts
//!
//! Reaching delivery's `done` edge completes the run. Any error escaping a
//! stage marks the run failed, is persisted on a best-effort basis, and is
//! returned with the partial history. The engine never retries a run; the
//! only loop is the revision edge chosen by quality review.

use crate::delivery;
use crate::deploy;
use crate::environment::Environment;
use crate::error::{Result, SiteforgeError};
use crate::gate;
use crate::graph::{StageId, TransitionRecord};
use crate::stages::{self, enhance::EnhanceInput, StageResult};
use crate::state::{ExecutionState, RunStatus, RunSummary};
use crate::submission::IntakeSubmission;
use std::time::Instant;
use thiserror::Error;
use tooling::logging::format_duration;
use tracing::{debug, error, info, warn};

/// Safety cap on stage executions per run
pub const MAX_STEPS: usize = 16;

/// A run that ended in an error, with whatever history it accumulated
#[derive(Debug, Error)]
#[error("Run {session_id} failed: {error}")]
pub struct RunFailure {
    pub session_id: String,
    #[source]
    pub error: SiteforgeError,
    pub transitions: Vec<TransitionRecord>,
}

impl RunFailure {
    fn new(state: &ExecutionState, error: SiteforgeError) -> Self {
        Self {
            session_id: state.session_id.clone(),
            error,
            transitions: state.transitions.clone(),
        }
    }

    fn without_state(session_id: &str, error: SiteforgeError) -> Self {
        Self {
            session_id: session_id.to_string(),
            error,
            transitions: Vec::new(),
        }
    }
}

pub struct Engine {
    env: Environment,
    max_steps: usize,
}

impl Engine {
    pub fn new(env: Environment) -> Self {
        Self {
            env,
            max_steps: MAX_STEPS,
        }
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Create the execution state for a submission and persist it
    pub async fn submit(&self, submission: IntakeSubmission, brief: impl Into<String>, revision: u32) -> ExecutionState {
        let state = ExecutionState::new(submission, brief, revision);
        info!(
            session_id = %state.session_id,
            business = %state.context.submission.display_name(),
            revision,
            "Submission accepted"
        );
        self.persist(&state).await;
        state
    }

    /// Submit and run to completion
    pub async fn execute(
        &self,
        submission: IntakeSubmission,
        brief: impl Into<String>,
        revision: u32,
    ) -> std::result::Result<RunSummary, RunFailure> {
        let state = self.submit(submission, brief, revision).await;
        self.run(state).await
    }

    /// Load a persisted run
    pub async fn load(&self, session_id: &str) -> Result<ExecutionState> {
        let store = self
            .env
            .store
            .as_ref()
            .ok_or_else(|| SiteforgeError::Config("no durable store configured".to_string()))?;
        store
            .load_execution(session_id)
            .await?
            .ok_or_else(|| SiteforgeError::NotFound(format!("session {}", session_id)))
    }

    /// Continue a persisted run from the stage it stopped at
    ///
    /// Completed runs return their stored summary without executing
    /// anything; failed runs are not resumable.
    pub async fn resume(&self, session_id: &str) -> std::result::Result<RunSummary, RunFailure> {
        let state = self
            .load(session_id)
            .await
            .map_err(|e| RunFailure::without_state(session_id, e))?;
        info!(session_id = %session_id, stage = %state.current_stage, status = %state.status, "Resuming run");
        self.run(state).await
    }

    /// Drive `state` to a terminal status
    pub async fn run(&self, mut state: ExecutionState) -> std::result::Result<RunSummary, RunFailure> {
        match state.status {
            RunStatus::Completed => return Ok(state.summary()),
            RunStatus::Failed => {
                let reason = state.error.clone().unwrap_or_else(|| "run previously failed".to_string());
                let error = SiteforgeError::NotResumable {
                    session_id: state.session_id.clone(),
                    reason,
                };
                return Err(RunFailure::new(&state, error));
            }
            RunStatus::Running => {}
        }

        match self.drive(&mut state).await {
            Ok(()) => {
                info!(
                    session_id = %state.session_id,
                    steps = state.transitions.len(),
                    site_url = state.context.site_url().unwrap_or("-"),
                    "Run completed"
                );
                Ok(state.summary())
            }
            Err(e) => {
                error!(session_id = %state.session_id, stage = %state.current_stage, error = %e, "Run failed");
                state.mark_failed(e.to_string());
                self.persist(&state).await;
                Err(RunFailure::new(&state, e))
            }
        }
    }

    async fn drive(&self, state: &mut ExecutionState) -> Result<()> {
        let mut steps = 0;

        while state.status == RunStatus::Running {
            if steps >= self.max_steps {
                return Err(SiteforgeError::StepLimit(self.max_steps));
            }
            steps += 1;

            let stage = state.current_stage;
            info!(session_id = %state.session_id, stage = %stage, "Executing stage");
            let started = Instant::now();

            let StageResult { output, edge } = self.execute_stage(stage, state).await?;

            if edge.source() != stage || output.stage() != stage {
                return Err(SiteforgeError::InvalidTransition {
                    stage,
                    edge,
                    owner: edge.source(),
                });
            }

            state.context.apply(output);
            let elapsed = started.elapsed();
            let record = TransitionRecord::new(edge, elapsed.as_millis() as u64);
            let next = record.to;
            state.transitions.push(record);

            info!(
                session_id = %state.session_id,
                from = %stage,
                edge = %edge,
                to = next.map(|s| s.as_str()).unwrap_or("exit"),
                elapsed = %format_duration(elapsed),
                "Transition"
            );

            match next {
                Some(next) => {
                    state.current_stage = next;
                    state.touch();
                }
                None => state.mark_completed(),
            }
            self.persist(state).await;
        }

        Ok(())
    }

    async fn execute_stage(&self, stage: StageId, state: &ExecutionState) -> Result<StageResult> {
        let ctx = &state.context;
        let generator = self.env.generator.as_ref();

        match stage {
            StageId::IntakeAssessment => stages::intake::run(generator, &ctx.brief).await,
            StageId::EnhancementGeneration => {
                let assessment = ctx.require_assessment(stage)?;
                let revision_of = ctx.enhancement.as_ref().zip(ctx.quality_review.as_ref());
                let input = EnhanceInput {
                    brief: &ctx.brief,
                    assessment,
                    revision_of,
                };
                stages::enhance::run(generator, input).await
            }
            StageId::QualityReview => {
                let draft = ctx.require_enhancement(stage)?;
                stages::review::run(generator, &ctx.brief, draft, ctx.generation_attempts).await
            }
            StageId::EligibilityGate => Ok(gate::run(
                &ctx.submission,
                ctx.require_enhancement(stage)?,
                ctx.require_quality_review(stage)?,
            )),
            StageId::PageBuild => {
                let copy = ctx.require_enhancement(stage)?;
                Ok(stages::build::run(generator, &ctx.submission, copy).await)
            }
            StageId::BuildReview => {
                let html = ctx.require_html(stage)?;
                let copy = ctx.require_enhancement(stage)?;
                Ok(stages::site_review::run(generator, html, copy).await)
            }
            StageId::Deploy => {
                let html = ctx.require_html(stage)?;
                Ok(deploy::run(self.env.deployer.as_ref(), &ctx.submission, html).await)
            }
            StageId::Delivery => {
                let ledger = self.env.ledger();
                Ok(delivery::run(&state.session_id, ctx, ledger.as_ref(), &self.env.notifier).await)
            }
        }
    }

    /// Write state to the store if one is configured; failures are logged
    async fn persist(&self, state: &ExecutionState) {
        let Some(store) = &self.env.store else {
            return;
        };
        match store.save_execution(state).await {
            Ok(()) => debug!(session_id = %state.session_id, stage = %state.current_stage, "State persisted"),
            Err(e) => warn!(session_id = %state.session_id, error = %e, "Failed to persist state"),
        }
    }
}

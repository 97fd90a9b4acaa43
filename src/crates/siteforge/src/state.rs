//! Execution state and run summaries
//!
//! [`ExecutionState`] is the unit of persistence: everything needed to
//! inspect a run or continue it after a crash.

use crate::context::SessionContext;
use crate::graph::{StageId, TransitionRecord};
use crate::stages::EnhancedBrief;
use crate::submission::IntakeSubmission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionState {
    pub session_id: String,
    pub current_stage: StageId,
    pub context: SessionContext,
    pub transitions: Vec<TransitionRecord>,
    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecutionState {
    /// Fresh state for a new submission, positioned at the entry stage
    pub fn new(submission: IntakeSubmission, brief: impl Into<String>, revision: u32) -> Self {
        let now = Utc::now();
        Self {
            session_id: Uuid::new_v4().to_string(),
            current_stage: StageId::START,
            context: SessionContext::new(submission, brief, revision),
            transitions: Vec::new(),
            status: RunStatus::Running,
            created_at: now,
            updated_at: now,
            error: None,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn mark_completed(&mut self) {
        self.status = RunStatus::Completed;
        self.touch();
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.error = Some(error.into());
        self.touch();
    }

    pub fn summary(&self) -> RunSummary {
        let ctx = &self.context;
        RunSummary {
            session_id: self.session_id.clone(),
            status: self.status,
            enhancement: ctx.enhancement.clone(),
            quality_score: ctx.quality_score(),
            credits_remaining: ctx.delivery.as_ref().and_then(|d| d.credits_remaining),
            site_url: ctx.site_url().map(str::to_string),
            transitions: self.transitions.clone(),
        }
    }
}

/// What the caller gets back from a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub session_id: String,
    pub status: RunStatus,
    pub enhancement: Option<EnhancedBrief>,
    pub quality_score: Option<f64>,
    pub credits_remaining: Option<u32>,
    pub site_url: Option<String>,
    pub transitions: Vec<TransitionRecord>,
}

impl RunSummary {
    /// Edge labels in the order they fired
    pub fn edges(&self) -> Vec<crate::graph::Edge> {
        self.transitions.iter().map(|t| t.edge).collect()
    }
}

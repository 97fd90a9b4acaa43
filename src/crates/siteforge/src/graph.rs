//! Fixed stage graph
//!
//! Vertices are [`StageId`]s and every [`Edge`] names exactly one source
//! stage and one destination. Routing is therefore a function of the edge a
//! stage emits; the engine never decides a destination on its own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One vertex of the eight-node graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    IntakeAssessment,
    EnhancementGeneration,
    QualityReview,
    EligibilityGate,
    PageBuild,
    BuildReview,
    Deploy,
    Delivery,
}

impl StageId {
    /// Every stage, in the order a full successful run visits them
    pub const ALL: [StageId; 8] = [
        StageId::IntakeAssessment,
        StageId::EnhancementGeneration,
        StageId::QualityReview,
        StageId::EligibilityGate,
        StageId::PageBuild,
        StageId::BuildReview,
        StageId::Deploy,
        StageId::Delivery,
    ];

    /// Entry vertex of every run
    pub const START: StageId = StageId::IntakeAssessment;

    /// Terminal vertex
    pub const TERMINAL: StageId = StageId::Delivery;

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::IntakeAssessment => "intake_assessment",
            StageId::EnhancementGeneration => "enhancement_generation",
            StageId::QualityReview => "quality_review",
            StageId::EligibilityGate => "eligibility_gate",
            StageId::PageBuild => "page_build",
            StageId::BuildReview => "build_review",
            StageId::Deploy => "deploy",
            StageId::Delivery => "delivery",
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Self::TERMINAL
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Named transition selected by a stage's result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Assessed,
    Generated,
    Approved,
    Revise,
    MaxAttempts,
    Qualified,
    Disqualified,
    Built,
    BuildFailed,
    SiteApproved,
    SiteRejected,
    Deployed,
    DeployFailed,
    Done,
}

impl Edge {
    pub const ALL: [Edge; 14] = [
        Edge::Assessed,
        Edge::Generated,
        Edge::Approved,
        Edge::Revise,
        Edge::MaxAttempts,
        Edge::Qualified,
        Edge::Disqualified,
        Edge::Built,
        Edge::BuildFailed,
        Edge::SiteApproved,
        Edge::SiteRejected,
        Edge::Deployed,
        Edge::DeployFailed,
        Edge::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Edge::Assessed => "assessed",
            Edge::Generated => "generated",
            Edge::Approved => "approved",
            Edge::Revise => "revise",
            Edge::MaxAttempts => "max_attempts",
            Edge::Qualified => "qualified",
            Edge::Disqualified => "disqualified",
            Edge::Built => "built",
            Edge::BuildFailed => "build_failed",
            Edge::SiteApproved => "site_approved",
            Edge::SiteRejected => "site_rejected",
            Edge::Deployed => "deployed",
            Edge::DeployFailed => "deploy_failed",
            Edge::Done => "done",
        }
    }

    /// Stage that is allowed to emit this edge
    pub fn source(&self) -> StageId {
        match self {
            Edge::Assessed => StageId::IntakeAssessment,
            Edge::Generated => StageId::EnhancementGeneration,
            Edge::Approved | Edge::Revise | Edge::MaxAttempts => StageId::QualityReview,
            Edge::Qualified | Edge::Disqualified => StageId::EligibilityGate,
            Edge::Built | Edge::BuildFailed => StageId::PageBuild,
            Edge::SiteApproved | Edge::SiteRejected => StageId::BuildReview,
            Edge::Deployed | Edge::DeployFailed => StageId::Deploy,
            Edge::Done => StageId::Delivery,
        }
    }

    /// Stage the edge leads to; `None` means the run exits the graph
    pub fn destination(&self) -> Option<StageId> {
        match self {
            Edge::Assessed | Edge::Revise => Some(StageId::EnhancementGeneration),
            Edge::Generated => Some(StageId::QualityReview),
            Edge::Approved | Edge::MaxAttempts => Some(StageId::EligibilityGate),
            Edge::Qualified => Some(StageId::PageBuild),
            Edge::Built => Some(StageId::BuildReview),
            Edge::SiteApproved => Some(StageId::Deploy),
            Edge::Disqualified
            | Edge::BuildFailed
            | Edge::SiteRejected
            | Edge::Deployed
            | Edge::DeployFailed => Some(StageId::Delivery),
            Edge::Done => None,
        }
    }

    /// Edges that route around the build/deploy branch
    pub fn is_degrading(&self) -> bool {
        matches!(
            self,
            Edge::Disqualified | Edge::BuildFailed | Edge::SiteRejected | Edge::DeployFailed
        )
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Immutable audit entry for one executed stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: StageId,
    /// `None` for the exit transition out of delivery
    pub to: Option<StageId>,
    pub edge: Edge,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: u64,
}

impl TransitionRecord {
    pub fn new(edge: Edge, duration_ms: u64) -> Self {
        Self {
            from: edge.source(),
            to: edge.destination(),
            edge,
            timestamp: Utc::now(),
            duration_ms,
        }
    }
}

/// Reasons a recorded history is not a walk of the graph
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("History is empty")]
    Empty,

    #[error("Record {index} does not start at {expected}, found {found}")]
    Discontinuous {
        index: usize,
        expected: StageId,
        found: StageId,
    },

    #[error("Record {index} claims {from} -> {to:?} via {edge}, which the graph does not allow")]
    UnknownEdge {
        index: usize,
        from: StageId,
        to: Option<StageId>,
        edge: Edge,
    },

    #[error("Record {index} continues after the run exited")]
    AfterExit { index: usize },
}

/// Check that `records` form a contiguous walk from the entry stage and
/// return every stage visited, in order.
///
/// A history that has not reached `done` yet is accepted; it describes a
/// run that is still in progress or failed mid-graph.
pub fn replay_path(records: &[TransitionRecord]) -> Result<Vec<StageId>, PathError> {
    if records.is_empty() {
        return Err(PathError::Empty);
    }

    let mut visited = Vec::with_capacity(records.len() + 1);
    let mut position = Some(StageId::START);

    for (index, record) in records.iter().enumerate() {
        let expected = position.ok_or(PathError::AfterExit { index })?;
        if record.from != expected {
            return Err(PathError::Discontinuous {
                index,
                expected,
                found: record.from,
            });
        }
        if record.edge.source() != record.from || record.edge.destination() != record.to {
            return Err(PathError::UnknownEdge {
                index,
                from: record.from,
                to: record.to,
                edge: record.edge,
            });
        }
        visited.push(record.from);
        position = record.to;
    }

    Ok(visited)
}

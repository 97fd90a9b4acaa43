//! Error types for siteforge
//!
//! Provides a unified error type for everything that can abort a run.
//! Degrading failures (build, build review, deploy) and non-fatal ones
//! (notifications, credit deduction) have their own component error types
//! and never reach this enum from inside the engine loop.

use crate::graph::{Edge, StageId};
use thiserror::Error;

/// Result type alias for siteforge operations
pub type Result<T> = std::result::Result<T, SiteforgeError>;

/// Main error type for siteforge operations
#[derive(Debug, Error)]
pub enum SiteforgeError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generation service call failed or returned unusable output
    #[error("Generation failed in {stage}: {source}")]
    Generation {
        stage: StageId,
        #[source]
        source: llm::LlmError,
    },

    /// A stage ran before a slot it depends on was populated
    #[error("Stage {stage} requires the {slot} slot, which is empty")]
    MissingSlot { stage: StageId, slot: &'static str },

    /// A stage produced an edge that does not leave it
    #[error("Stage {stage} emitted edge {edge}, which belongs to {owner}")]
    InvalidTransition {
        stage: StageId,
        edge: Edge,
        owner: StageId,
    },

    /// The engine exceeded its step cap without reaching delivery
    #[error("Run exceeded {0} steps without reaching delivery")]
    StepLimit(usize),

    /// Persisted session cannot be continued
    #[error("Session {session_id} cannot be resumed: {reason}")]
    NotResumable { session_id: String, reason: String },

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] state_store::StoreError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl SiteforgeError {
    /// Wrap a generation error with the stage it happened in
    pub fn generation(stage: StageId, source: llm::LlmError) -> Self {
        Self::Generation { stage, source }
    }
}

impl From<tooling::ToolingError> for SiteforgeError {
    fn from(err: tooling::ToolingError) -> Self {
        Self::Config(err.to_string())
    }
}

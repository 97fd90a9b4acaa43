//! Model tier routing
//!
//! A static classification of stage identifiers into generation model tiers.
//! The table is a compile-time constant so two runs with the same inputs
//! always ask the same models.
//!
//! ```text
//! intake_assessment       -> fast
//! enhancement_generation  -> advanced
//! quality_review          -> standard
//! page_build              -> advanced
//! build_review            -> standard
//! (anything else)         -> standard
//! ```

use crate::graph::StageId;
use llm::ModelTier;

/// Tier used for stages missing from [`TIER_TABLE`]
pub const DEFAULT_TIER: ModelTier = ModelTier::Standard;

/// Stage name to model tier
pub const TIER_TABLE: &[(&str, ModelTier)] = &[
    ("intake_assessment", ModelTier::Fast),
    ("enhancement_generation", ModelTier::Advanced),
    ("quality_review", ModelTier::Standard),
    ("page_build", ModelTier::Advanced),
    ("build_review", ModelTier::Standard),
];

/// Look up the model tier for a stage name
pub fn route(stage: &str) -> ModelTier {
    TIER_TABLE
        .iter()
        .find(|(name, _)| *name == stage)
        .map(|(_, tier)| *tier)
        .unwrap_or(DEFAULT_TIER)
}

impl StageId {
    /// Model tier this stage generates with
    pub fn model_tier(&self) -> ModelTier {
        route(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_entries() {
        assert_eq!(route("intake_assessment"), ModelTier::Fast);
        assert_eq!(route("enhancement_generation"), ModelTier::Advanced);
        assert_eq!(route("quality_review"), ModelTier::Standard);
        assert_eq!(route("page_build"), ModelTier::Advanced);
        assert_eq!(route("build_review"), ModelTier::Standard);
    }

    #[test]
    fn test_unknown_stage_uses_default() {
        assert_eq!(route("deploy"), DEFAULT_TIER);
        assert_eq!(route(""), DEFAULT_TIER);
        assert_eq!(route("INTAKE_ASSESSMENT"), DEFAULT_TIER);
    }

    #[test]
    fn test_stage_id_agrees_with_table() {
        for stage in StageId::ALL {
            assert_eq!(stage.model_tier(), route(stage.as_str()));
        }
    }
}

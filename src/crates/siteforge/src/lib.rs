//! # Siteforge
//!
//! Turns a structured client intake submission into either a generated,
//! deployed single-page website plus notification emails, or a
//! notification-only delivery. No structurally valid submission is ever
//! dropped silently.
//!
//! ## The graph
//!
//! ```text
//! intake_assessment ─assessed─> enhancement_generation ─generated─> quality_review
//!                                      ^                                │
//!                                      └──────────── revise ────────────┤
//!                                                    approved / max_attempts
//!                                                                       v
//! delivery <─disqualified─ eligibility_gate ─qualified─> page_build ─built─> build_review
//!    ^  ^                                                   │                 │
//!    │  └────────────────── build_failed ───────────────────┘                 │ site_approved
//!    │  <──────────────────────────── site_rejected ──────────────────────────┤
//!    │                                                                         v
//!    └──────────────────────── deployed / deploy_failed ────────────────── deploy
//! ```
//!
//! Failures in the first three stages fail the run. Failures in build,
//! build review and deploy only route around the publishing branch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use siteforge::config::ConfigLoader;
//! use siteforge::{Engine, Environment, IntakeSubmission};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ConfigLoader::new().load().await?;
//! let engine = Engine::new(Environment::from_config(&config)?);
//!
//! let submission: IntakeSubmission = serde_json::from_str(r#"{"businessName": "Harbor Bakery"}"#)?;
//! let brief = submission.format_brief();
//! let summary = engine.execute(submission, brief, 0).await?;
//! println!("{:?}", summary.site_url);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod credits;
pub mod delivery;
pub mod deploy;
pub mod engine;
pub mod environment;
pub mod gate;
pub mod graph;
pub mod router;
pub mod stages;
pub mod state;
pub mod store;
pub mod submission;
pub mod testing;

mod error;

pub use context::SessionContext;
pub use engine::{Engine, RunFailure};
pub use environment::Environment;
pub use graph::{Edge, StageId, TransitionRecord};
pub use state::{ExecutionState, RunStatus, RunSummary};
pub use store::StateStore;
pub use submission::IntakeSubmission;

pub use error::{Result, SiteforgeError};

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

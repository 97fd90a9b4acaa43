//! Command handlers for the siteforge binary

use crate::deploy::derive_slug;
use crate::engine::{Engine, RunFailure};
use crate::error::{Result, SiteforgeError};
use crate::graph::TransitionRecord;
use crate::state::{ExecutionState, RunStatus, RunSummary};
use crate::store::StateStore;
use crate::submission::IntakeSubmission;
use colored::Colorize;
use std::path::Path;
use std::str::FromStr;

/// How command results are printed on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = SiteforgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(SiteforgeError::Config(format!(
                "Unknown output format '{}'. Available: text, json",
                other
            ))),
        }
    }
}

/// Read a submission JSON file and the optional raw brief next to it
pub async fn read_submission(path: &Path, brief: Option<&Path>) -> Result<(IntakeSubmission, String)> {
    let raw = tokio::fs::read_to_string(path).await?;
    let submission: IntakeSubmission = serde_json::from_str(&raw)?;
    let brief = match brief {
        Some(brief_path) => tokio::fs::read_to_string(brief_path).await?,
        None => submission.format_brief(),
    };
    Ok((submission, brief))
}

/// Handle `siteforge run`
pub async fn handle_run(
    engine: &Engine,
    submission: IntakeSubmission,
    brief: String,
    revision: u32,
    format: OutputFormat,
) -> Result<()> {
    let outcome = engine.execute(submission, brief, revision).await;
    report(outcome, format)
}

/// Handle `siteforge resume`
pub async fn handle_resume(engine: &Engine, session_id: &str, format: OutputFormat) -> Result<()> {
    let outcome = engine.resume(session_id).await;
    report(outcome, format)
}

/// Handle `siteforge show`
pub async fn handle_show(store: &StateStore, session_id: &str, format: OutputFormat) -> Result<()> {
    let state = store
        .load_execution(session_id)
        .await?
        .ok_or_else(|| SiteforgeError::NotFound(format!("session {}", session_id)))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&state)?),
        OutputFormat::Text => print_state(&state),
    }
    Ok(())
}

/// Handle `siteforge slug`
pub fn handle_slug(name: &str) {
    println!("{}", derive_slug(name));
}

fn report(outcome: std::result::Result<RunSummary, RunFailure>, format: OutputFormat) -> Result<()> {
    match outcome {
        Ok(summary) => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
                OutputFormat::Text => print_summary(&summary),
            }
            Ok(())
        }
        Err(failure) => {
            eprintln!("{} {}", "✗ Run failed:".red().bold(), failure.error);
            eprintln!("  Session: {}", failure.session_id);
            if !failure.transitions.is_empty() {
                eprintln!("  Path:    {}", path_line(&failure.transitions));
            }
            Err(failure.error)
        }
    }
}

fn print_summary(summary: &RunSummary) {
    let headline = match &summary.site_url {
        Some(_) => "✓ Site published".green().bold(),
        None => "✓ Brief delivered".yellow().bold(),
    };
    println!("{}", headline);
    println!("  Session: {}", summary.session_id);
    if let Some(url) = &summary.site_url {
        println!("  URL:     {}", url.cyan());
    }
    if let Some(score) = summary.quality_score {
        println!("  Score:   {:.1}/10", score);
    }
    if let Some(credits) = summary.credits_remaining {
        println!("  Credits: {}", credits);
    }
    if let Some(copy) = &summary.enhancement {
        println!("  Tagline: {}", copy.tagline);
    }
    println!("  Path:    {}", path_line(&summary.transitions));
}

fn print_state(state: &ExecutionState) {
    let status = match state.status {
        RunStatus::Completed => state.status.to_string().green(),
        RunStatus::Running => state.status.to_string().yellow(),
        RunStatus::Failed => state.status.to_string().red(),
    };
    println!("Session {}", state.session_id.bold());
    println!("  Business: {}", state.context.submission.display_name());
    println!("  Status:   {}", status);
    println!("  Stage:    {}", state.current_stage);
    println!("  Attempts: {}", state.context.generation_attempts);
    println!("  Created:  {}", state.created_at.to_rfc3339());
    println!("  Updated:  {}", state.updated_at.to_rfc3339());
    if let Some(error) = &state.error {
        println!("  Error:    {}", error.red());
    }
    println!();
    println!("{:<24} {:<16} {:<24} {:>8}", "From", "Edge", "To", "ms");
    println!("{}", "-".repeat(75));
    for record in &state.transitions {
        let edge = format!("{:<16}", record.edge);
        let edge = if record.edge.is_degrading() { edge.yellow() } else { edge.normal() };
        println!(
            "{:<24} {} {:<24} {:>8}",
            record.from,
            edge,
            record.to.map(|s| s.as_str()).unwrap_or("exit"),
            record.duration_ms
        );
    }
}

fn path_line(transitions: &[TransitionRecord]) -> String {
    transitions
        .iter()
        .map(|t| t.edge.as_str())
        .collect::<Vec<_>>()
        .join(" → ")
}

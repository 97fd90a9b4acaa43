//! Deploy client
//!
//! Publishes a generated document to Cloudflare Pages by running the
//! `wrangler` CLI once. The client owns slug derivation, a scratch
//! directory that is removed on every exit path, a hard timeout, and URL
//! extraction from the CLI's combined output.
//!
//! Credentials are only ever passed through the child's environment.

use crate::graph::{Edge, StageId};
use crate::stages::{StageOutput, StageResult};
use crate::submission::IntakeSubmission;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tooling::async_utils::timeout::{with_timeout, TimeoutError};
use tooling::logging::{redact_secrets, truncate_for_log};
use tracing::{debug, info, warn};

/// Longest slug the hosting target accepts for a project name
pub const SLUG_MAX_LEN: usize = 58;

/// Slug used when a display name has no usable characters
pub const SLUG_FALLBACK: &str = "site";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_BRANCH: &str = "main";

const OUTPUT_LOG_LIMIT: usize = 2000;

/// Derive the hosting project name from a display name
///
/// ```rust
/// use siteforge::deploy::derive_slug;
///
/// assert_eq!(derive_slug("Harbor Bakery & Café!"), "harbor-bakery-caf");
/// assert_eq!(derive_slug("!!!"), "site");
/// ```
pub fn derive_slug(display_name: &str) -> String {
    let lowered = display_name.to_lowercase();
    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    // Only ASCII remains, so byte truncation is safe.
    slug.truncate(SLUG_MAX_LEN);
    let slug = slug.trim_end_matches('-');

    if slug.is_empty() {
        SLUG_FALLBACK.to_string()
    } else {
        slug.to_string()
    }
}

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Deploy credentials are not configured")]
    MissingCredentials,

    #[error("Failed to prepare deploy directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to start deploy command `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Deploy command timed out after {0:?}")]
    Timeout(Duration),

    #[error("Deploy command exited with {status}: {output}")]
    CommandFailed { status: String, output: String },

    #[error("Deploy output did not contain a pages.dev URL: {0}")]
    NoUrl(String),
}

/// A published site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    /// Stable production URL
    pub url: String,
    pub project_slug: String,
    pub deployment_id: String,
}

/// Deploy stage slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DeployOutcome {
    Deployed(Deployment),
    /// Not attempted (no credentials)
    Skipped { reason: String },
    Failed { reason: String },
}

impl DeployOutcome {
    pub fn site_url(&self) -> Option<&str> {
        match self {
            Self::Deployed(deployment) => Some(&deployment.url),
            _ => None,
        }
    }
}

/// Publishes a document under a name
#[async_trait]
pub trait SiteDeployer: Send + Sync {
    /// Whether a deploy can be attempted at all
    fn has_credentials(&self) -> bool;

    async fn deploy(&self, display_name: &str, html: &str) -> Result<Deployment, DeployError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployCredentials {
    pub api_token: String,
    pub account_id: String,
}

#[derive(Debug, Clone)]
pub struct WranglerConfig {
    /// Program and leading arguments, e.g. `["npx", "wrangler"]`
    pub command: Vec<String>,
    pub branch: String,
    pub timeout: Duration,
    pub credentials: Option<DeployCredentials>,
}

impl Default for WranglerConfig {
    fn default() -> Self {
        Self {
            command: vec!["wrangler".to_string()],
            branch: DEFAULT_BRANCH.to_string(),
            timeout: DEFAULT_TIMEOUT,
            credentials: None,
        }
    }
}

fn pages_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https://[a-z0-9.-]+\.pages\.dev").expect("pages.dev pattern must compile"))
}

/// Find the deployment in CLI output
///
/// The stable URL is always `https://<slug>.pages.dev`; the deployment id is
/// the extra leading label of a preview URL such as
/// `https://3f2a91c0.<slug>.pages.dev`.
pub fn extract_deployment(output: &str, slug: &str) -> Option<Deployment> {
    let project_host = format!("{}.pages.dev", slug);
    let mut found_any = false;
    let mut deployment_id = None;

    for m in pages_url_pattern().find_iter(output) {
        found_any = true;
        let host = m.as_str().trim_start_matches("https://");
        if let Some(prefix) = host.strip_suffix(&project_host) {
            if let Some(id) = prefix.strip_suffix('.').filter(|id| !id.is_empty() && !id.contains('.')) {
                deployment_id = Some(id.to_string());
                break;
            }
        }
    }

    found_any.then(|| Deployment {
        url: format!("https://{}", project_host),
        project_slug: slug.to_string(),
        deployment_id: deployment_id.unwrap_or_else(|| "unknown".to_string()),
    })
}

/// `wrangler pages deploy` runner
pub struct WranglerDeployer {
    config: WranglerConfig,
}

impl WranglerDeployer {
    pub fn new(config: WranglerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WranglerConfig {
        &self.config
    }
}

#[async_trait]
impl SiteDeployer for WranglerDeployer {
    fn has_credentials(&self) -> bool {
        self.config.credentials.is_some()
    }

    async fn deploy(&self, display_name: &str, html: &str) -> Result<Deployment, DeployError> {
        let credentials = self
            .config
            .credentials
            .as_ref()
            .ok_or(DeployError::MissingCredentials)?;
        let (program, leading_args) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| DeployError::Spawn {
                command: String::new(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty deploy command"),
            })?;

        let slug = derive_slug(display_name);

        // Removed when `scratch` drops, whichever way this function returns.
        let scratch = tempfile::Builder::new().prefix("siteforge-deploy-").tempdir()?;
        tokio::fs::write(scratch.path().join("index.html"), html).await?;

        let mut command = Command::new(program);
        command
            .args(leading_args)
            .arg("pages")
            .arg("deploy")
            .arg(scratch.path())
            .arg("--project-name")
            .arg(&slug)
            .arg("--branch")
            .arg(&self.config.branch)
            .arg("--commit-dirty=true")
            .env("CLOUDFLARE_API_TOKEN", &credentials.api_token)
            .env("CLOUDFLARE_ACCOUNT_ID", &credentials.account_id)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(slug = %slug, "Deploying site");
        let started = std::time::Instant::now();

        let output = with_timeout(self.config.timeout, command.output())
            .await
            .map_err(|e| match e {
                TimeoutError::Timeout(after) => DeployError::Timeout(after),
                TimeoutError::OperationFailed(source) => DeployError::Spawn {
                    command: self.config.command.join(" "),
                    source,
                },
            })?;

        let combined = format!(
            "{}\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        let combined = redact_secrets(&combined);
        debug!(
            slug = %slug,
            elapsed = %tooling::logging::format_duration(started.elapsed()),
            output = %truncate_for_log(&combined, OUTPUT_LOG_LIMIT),
            "Deploy command finished"
        );

        if !output.status.success() {
            return Err(DeployError::CommandFailed {
                status: output.status.to_string(),
                output: truncate_for_log(combined.trim(), OUTPUT_LOG_LIMIT),
            });
        }

        extract_deployment(&combined, &slug)
            .ok_or_else(|| DeployError::NoUrl(truncate_for_log(combined.trim(), OUTPUT_LOG_LIMIT)))
    }
}

/// Deploy stage: one attempt, never retried
pub async fn run(deployer: &dyn SiteDeployer, submission: &IntakeSubmission, html: &str) -> StageResult {
    let stage = StageId::Deploy;

    if !deployer.has_credentials() {
        warn!(stage = %stage, "Deploy credentials missing; skipping deploy");
        let outcome = DeployOutcome::Skipped {
            reason: DeployError::MissingCredentials.to_string(),
        };
        return StageResult::new(StageOutput::Deploy(outcome), Edge::DeployFailed);
    }

    match deployer.deploy(submission.display_name(), html).await {
        Ok(deployment) => {
            info!(stage = %stage, url = %deployment.url, "Site deployed");
            StageResult::new(StageOutput::Deploy(DeployOutcome::Deployed(deployment)), Edge::Deployed)
        }
        Err(e) => {
            warn!(stage = %stage, error = %e, "Deploy failed; continuing to delivery");
            let outcome = DeployOutcome::Failed { reason: e.to_string() };
            StageResult::new(StageOutput::Deploy(outcome), Edge::DeployFailed)
        }
    }
}

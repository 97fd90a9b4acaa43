//! Configuration schema for siteforge

use llm::TierModels;
use serde::{Deserialize, Serialize};
use tooling::config::fill_from_env;

/// Main siteforge configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SiteforgeConfig {
    /// Generation service
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Site publishing
    #[serde(default)]
    pub deploy: DeployConfig,

    /// Outbound notifications
    #[serde(default)]
    pub email: EmailConfig,

    /// Durable key-value store
    #[serde(default)]
    pub store: StoreConfig,

    /// Revision credits
    #[serde(default)]
    pub credits: CreditsConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One config file; only the sections it contains override earlier layers.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ConfigFile {
    pub generation: Option<GenerationConfig>,
    pub deploy: Option<DeployConfig>,
    pub email: Option<EmailConfig>,
    pub store: Option<StoreConfig>,
    pub credits: Option<CreditsConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    /// API key (supports `${VAR}`; falls back to ANTHROPIC_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Model per tier
    #[serde(default)]
    pub models: TierModels,

    /// Per-call timeout; keep below the caller's own deadline
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_generation_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_generation_base_url(),
            models: TierModels::default(),
            timeout_secs: default_generation_timeout(),
            temperature: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeployConfig {
    /// Cloudflare API token (falls back to CLOUDFLARE_API_TOKEN)
    #[serde(default)]
    pub api_token: Option<String>,

    /// Cloudflare account id (falls back to CLOUDFLARE_ACCOUNT_ID)
    #[serde(default)]
    pub account_id: Option<String>,

    /// Program and leading arguments used to invoke wrangler
    #[serde(default = "default_deploy_command")]
    pub command: Vec<String>,

    #[serde(default = "default_deploy_branch")]
    pub branch: String,

    #[serde(default = "default_deploy_timeout")]
    pub timeout_secs: u64,
}

fn default_deploy_command() -> Vec<String> {
    vec!["wrangler".to_string()]
}

fn default_deploy_branch() -> String {
    crate::deploy::DEFAULT_BRANCH.to_string()
}

fn default_deploy_timeout() -> u64 {
    crate::deploy::DEFAULT_TIMEOUT.as_secs()
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            account_id: None,
            command: default_deploy_command(),
            branch: default_deploy_branch(),
            timeout_secs: default_deploy_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailConfig {
    /// Email API key (falls back to RESEND_API_KEY)
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_email_base_url")]
    pub base_url: String,

    #[serde(default = "default_email_from")]
    pub from: String,

    /// Where internal lead notices go (falls back to LEAD_NOTIFICATION_EMAIL)
    #[serde(default)]
    pub lead_inbox: Option<String>,
}

fn default_email_base_url() -> String {
    crate::delivery::email::DEFAULT_BASE_URL.to_string()
}

fn default_email_from() -> String {
    "Siteforge <hello@siteforge.dev>".to_string()
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_email_base_url(),
            from: default_email_from(),
            lead_inbox: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// REST endpoint (falls back to KV_REST_API_URL)
    #[serde(default)]
    pub url: Option<String>,

    /// Bearer token (falls back to KV_REST_API_TOKEN)
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_timeout() -> u64 {
    10
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreditsConfig {
    #[serde(default = "default_initial_credits")]
    pub initial_credits: u32,

    #[serde(default = "default_plan")]
    pub plan: String,
}

fn default_initial_credits() -> u32 {
    crate::credits::DEFAULT_INITIAL_CREDITS
}

fn default_plan() -> String {
    crate::credits::DEFAULT_PLAN.to_string()
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            initial_credits: default_initial_credits(),
            plan: default_plan(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "compact", "pretty", "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// Expand a whole-value `${VAR}` reference; `None` if the variable is unset
fn expand_env_var(value: &str) -> Option<String> {
    match value.strip_prefix("${").and_then(|v| v.strip_suffix('}')) {
        Some(name) => std::env::var(name).ok().filter(|v| !v.is_empty()),
        None => Some(value.to_string()),
    }
}

fn expand_optional(slot: &mut Option<String>) {
    if let Some(value) = slot.take() {
        *slot = expand_env_var(&value);
    }
}

fn expand_required(value: &mut String) {
    if let Some(expanded) = expand_env_var(value) {
        *value = expanded;
    }
}

impl SiteforgeConfig {
    /// Overlay the sections present in `file`
    pub fn merge(&mut self, file: ConfigFile) {
        if let Some(section) = file.generation {
            self.generation = section;
        }
        if let Some(section) = file.deploy {
            self.deploy = section;
        }
        if let Some(section) = file.email {
            self.email = section;
        }
        if let Some(section) = file.store {
            self.store = section;
        }
        if let Some(section) = file.credits {
            self.credits = section;
        }
        if let Some(section) = file.logging {
            self.logging = section;
        }
    }

    /// Resolve `${VAR}` references in secret and URL fields
    ///
    /// An optional field whose variable is unset becomes empty, so the
    /// well-known environment variable can still fill it.
    pub fn resolve_env_vars(&mut self) {
        expand_optional(&mut self.generation.api_key);
        expand_required(&mut self.generation.base_url);
        expand_optional(&mut self.deploy.api_token);
        expand_optional(&mut self.deploy.account_id);
        expand_optional(&mut self.email.api_key);
        expand_required(&mut self.email.base_url);
        expand_required(&mut self.email.from);
        expand_optional(&mut self.email.lead_inbox);
        expand_optional(&mut self.store.url);
        expand_optional(&mut self.store.token);
    }

    /// Fill unset secrets from their well-known environment variables
    pub fn apply_env(&mut self) -> tooling::Result<()> {
        fill_from_env(&mut self.generation.api_key, "ANTHROPIC_API_KEY")?;
        fill_from_env(&mut self.deploy.api_token, "CLOUDFLARE_API_TOKEN")?;
        fill_from_env(&mut self.deploy.account_id, "CLOUDFLARE_ACCOUNT_ID")?;
        fill_from_env(&mut self.email.api_key, "RESEND_API_KEY")?;
        fill_from_env(&mut self.email.lead_inbox, "LEAD_NOTIFICATION_EMAIL")?;
        fill_from_env(&mut self.store.url, "KV_REST_API_URL")?;
        fill_from_env(&mut self.store.token, "KV_REST_API_TOKEN")?;
        Ok(())
    }
}

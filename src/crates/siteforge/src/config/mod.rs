//! Configuration management
//!
//! Handles loading configuration from:
//! - User-level config: ~/.siteforge/siteforge.toml
//! - Project-level config: ./.siteforge/siteforge.toml
//! - Well-known environment variables for secrets
//!
//! Project-level config takes precedence over user-level config.

mod loader;
mod schema;

pub use loader::ConfigLoader;
pub use schema::{
    ConfigFile, CreditsConfig, DeployConfig, EmailConfig, GenerationConfig, LoggingConfig, SiteforgeConfig,
    StoreConfig,
};

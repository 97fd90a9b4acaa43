//! Configuration loader with dual-location support
//!
//! Loads configuration from:
//! 1. Default values
//! 2. User-level config: ~/.siteforge/siteforge.toml
//! 3. Project-level config: ./.siteforge/siteforge.toml
//!
//! Later files override earlier ones section by section. After merging,
//! `${VAR}` references are expanded and unset secrets are filled from their
//! well-known environment variables.

use crate::config::schema::{ConfigFile, SiteforgeConfig};
use crate::error::{Result, SiteforgeError};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

const CONFIG_DIR: &str = ".siteforge";
const CONFIG_FILE: &str = "siteforge.toml";

pub struct ConfigLoader {
    user_config_path: Option<PathBuf>,
    project_config_path: PathBuf,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            user_config_path: dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE)),
            project_config_path: PathBuf::from(CONFIG_DIR).join(CONFIG_FILE),
        }
    }

    /// Loader reading from explicit paths
    pub fn with_paths(user: Option<PathBuf>, project: PathBuf) -> Self {
        Self {
            user_config_path: user,
            project_config_path: project,
        }
    }

    pub fn user_config_path(&self) -> Option<&Path> {
        self.user_config_path.as_deref()
    }

    pub fn project_config_path(&self) -> &Path {
        &self.project_config_path
    }

    /// Load configuration from both locations with project taking precedence
    ///
    /// A missing file is skipped; a file that exists but does not parse is
    /// an error.
    pub async fn load(&self) -> Result<SiteforgeConfig> {
        let mut config = SiteforgeConfig::default();

        if let Some(user_path) = &self.user_config_path {
            if let Some(file) = Self::load_from_path(user_path).await? {
                debug!(path = %user_path.display(), "Loaded user-level config");
                config.merge(file);
            }
        }

        if let Some(file) = Self::load_from_path(&self.project_config_path).await? {
            debug!(path = %self.project_config_path.display(), "Loaded project-level config");
            config.merge(file);
        }

        config.resolve_env_vars();
        config.apply_env()?;

        info!("Configuration loaded");
        Ok(config)
    }

    async fn load_from_path(path: &Path) -> Result<Option<ConfigFile>> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found");
            return Ok(None);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SiteforgeError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&content)
            .map(Some)
            .map_err(|e| SiteforgeError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_returns_defaults_when_no_files() {
        let dir = TempDir::new().unwrap();
        let loader = ConfigLoader::with_paths(Some(dir.path().join("missing.toml")), dir.path().join("also-missing.toml"));

        let config = loader.load().await.unwrap();
        assert_eq!(config.deploy.branch, "main");
        assert_eq!(config.credits.initial_credits, 3);
    }

    #[tokio::test]
    async fn test_project_overrides_user() {
        let dir = TempDir::new().unwrap();
        let user = write(
            &dir,
            "user.toml",
            "[credits]\ninitial_credits = 5\n\n[logging]\nlevel = \"warn\"\n",
        );
        let project = write(&dir, "project.toml", "[logging]\nlevel = \"debug\"\nformat = \"json\"\n");

        let config = ConfigLoader::with_paths(Some(user), project).load().await.unwrap();

        assert_eq!(config.credits.initial_credits, 5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let project = write(&dir, "project.toml", "[deploy\nbranch = ");

        let err = ConfigLoader::with_paths(None, project).load().await.unwrap_err();
        assert!(matches!(err, SiteforgeError::Config(_)));
    }

    #[tokio::test]
    async fn test_env_reference_in_file() {
        std::env::set_var("SITEFORGE_TEST_LOADER_INBOX", "leads@siteforge.example");
        let dir = TempDir::new().unwrap();
        let project = write(
            &dir,
            "project.toml",
            "[email]\nlead_inbox = \"${SITEFORGE_TEST_LOADER_INBOX}\"\n",
        );

        let config = ConfigLoader::with_paths(None, project).load().await.unwrap();
        assert_eq!(config.email.lead_inbox.as_deref(), Some("leads@siteforge.example"));
        std::env::remove_var("SITEFORGE_TEST_LOADER_INBOX");
    }
}

//! Shared helpers for the siteforge workspace
//!
//! # Modules
//!
//! - `config` - Environment variable loading with typed parsing
//! - `logging` - Tracing subscriber setup, duration formatting, secret redaction
//! - `async_utils` - Timeout wrapper for external calls

pub mod async_utils;
pub mod config;
pub mod logging;

use thiserror::Error;

/// Errors that can occur in the tooling crate
#[derive(Debug, Error)]
pub enum ToolingError {
    /// Environment variable present but unusable
    #[error("Environment error: {0}")]
    Env(String),

    /// Tracing subscriber could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

/// Result type for tooling operations
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }

    #[test]
    fn test_error_display() {
        let err = ToolingError::Env("KEY contains invalid UTF-8".to_string());
        assert_eq!(err.to_string(), "Environment error: KEY contains invalid UTF-8");
    }
}

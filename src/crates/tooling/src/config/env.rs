//! Environment variable loading utilities

use crate::{Result, ToolingError};
use std::env;

/// Load an environment variable as a string
///
/// Empty values are treated as absent, which matches how hosting platforms
/// expose unset secrets.
///
/// # Returns
///
/// * `Ok(Some(value))` if variable exists and is non-empty
/// * `Ok(None)` if variable doesn't exist or is empty
/// * `Err` if variable exists but has invalid UTF-8
pub fn get_env(key: &str) -> Result<Option<String>> {
    match env::var(key) {
        Ok(val) if val.trim().is_empty() => Ok(None),
        Ok(val) => Ok(Some(val)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(ToolingError::Env(format!(
            "{} contains invalid UTF-8",
            key
        ))),
    }
}

/// Fill an unset optional field from the environment
///
/// A value already present (for example from a config file) wins over the
/// environment.
pub fn fill_from_env(slot: &mut Option<String>, key: &str) -> Result<()> {
    if slot.as_deref().map_or(true, |v| v.trim().is_empty()) {
        *slot = get_env(key)?;
    }
    Ok(())
}

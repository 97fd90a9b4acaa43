//! Logging utilities
//!
//! Subscriber installation for binaries plus small helpers used when
//! formatting structured log fields.

use crate::{Result, ToolingError};
use std::str::FromStr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

/// Output format for the fmt subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ToolingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ToolingError::Logging(format!(
                "Unknown log format '{}'. Available: compact, pretty, json",
                other
            ))),
        }
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence over `level` when set. Logs go to stderr so
/// that machine-readable command output on stdout stays clean.
pub fn init_tracing(level: &str, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ToolingError::Logging(e.to_string()))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|e| ToolingError::Logging(e.to_string()))
}

/// Compact stderr subscriber active for the current thread until the guard drops
///
/// Used while the configuration that decides the real subscriber is still
/// being loaded.
pub fn bootstrap_tracing(level: &str) -> Result<tracing::subscriber::DefaultGuard> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| ToolingError::Logging(e.to_string()))?;

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .compact()
        .finish();
    Ok(tracing::subscriber::set_default(subscriber))
}

/// Format duration in human-readable form
///
/// ```rust
/// use tooling::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
/// ```
pub fn format_duration(duration: std::time::Duration) -> String {
    let micros = duration.as_micros();

    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{}ms", micros / 1000)
    } else if micros < 60_000_000 {
        format!("{:.2}s", micros as f64 / 1_000_000.0)
    } else {
        let seconds = micros / 1_000_000;
        format!("{}m{}s", seconds / 60, seconds % 60)
    }
}

fn redaction_patterns() -> &'static [(regex::Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(regex::Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            (r"(?i)(authorization|auth)\s*:\s*bearer\s+\S+", "$1: Bearer [REDACTED]"),
            (r"(?i)\b([A-Z0-9_]*(?:TOKEN|SECRET|API_KEY|PASSWORD))=\S+", "$1=[REDACTED]"),
            (r"(?i)(api[\s_-]?key|apikey|token|secret|password)\s*:\s*\S+", "$1: [REDACTED]"),
            (r"\bsk-[A-Za-z0-9_-]{8,}", "[REDACTED]"),
        ]
        .into_iter()
        .filter_map(|(pattern, replacement)| {
            regex::Regex::new(pattern).ok().map(|re| (re, replacement))
        })
        .collect()
    })
}

/// Remove credentials from text before it reaches a log line or error
///
/// ```rust
/// use tooling::logging::redact_secrets;
///
/// let out = redact_secrets("CLOUDFLARE_API_TOKEN=abc123 deploy failed");
/// assert!(out.contains("[REDACTED]"));
/// assert!(!out.contains("abc123"));
/// ```
pub fn redact_secrets(input: &str) -> String {
    redaction_patterns()
        .iter()
        .fold(input.to_string(), |acc, (re, replacement)| {
            re.replace_all(&acc, *replacement).into_owned()
        })
}

/// Truncate long text for a log field, keeping char boundaries intact
pub fn truncate_for_log(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let head: String = input.chars().take(max_chars).collect();
    format!("{}… ({} chars total)", head, input.chars().count())
}

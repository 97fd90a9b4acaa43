//! Client intake submission
//!
//! The structured payload produced by the intake form. Field-level
//! validation happens in the web layer; this type only needs to be
//! deserializable and to answer a few questions the pipeline asks of it.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Style tokens understood by the design-token table.
pub const STYLE_TOKENS: &[&str] = &[
    "modern",
    "classic",
    "bold",
    "minimal",
    "playful",
    "elegant",
    "professional",
    "warm",
];

/// Whether `token` names an entry in the design-token table
pub fn is_recognized_style(token: &str) -> bool {
    let token = token.trim().to_lowercase();
    STYLE_TOKENS.contains(&token.as_str())
}

/// Whether `value` is a `#RGB` or `#RRGGBB` hex color
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.trim().strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Colors picked by the client instead of a style token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColors {
    pub primary: String,
    pub secondary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
}

impl CustomColors {
    /// Primary and secondary must be hex colors; accent too when present.
    pub fn is_valid(&self) -> bool {
        is_hex_color(&self.primary)
            && is_hex_color(&self.secondary)
            && self.accent.as_deref().map_or(true, is_hex_color)
    }
}

/// Structured intake submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IntakeSubmission {
    pub business_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_value: Option<String>,
    #[serde(default)]
    pub goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_colors: Option<CustomColors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_website: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl IntakeSubmission {
    /// Name shown on the site, in emails and used for the deploy slug
    pub fn display_name(&self) -> &str {
        self.business_name.trim()
    }

    /// Ledger identity of the submitter (normalized contact email)
    pub fn submitter_identity(&self) -> Option<String> {
        non_empty(&self.email).map(str::to_lowercase)
    }

    /// Contact address for the confirmation email
    pub fn contact_email(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    /// Style token if it resolves in the design-token table
    pub fn recognized_style(&self) -> Option<String> {
        non_empty(&self.style)
            .filter(|s| is_recognized_style(s))
            .map(str::to_lowercase)
    }

    /// Render the plain-text brief used in every prompt
    ///
    /// The web layer normally supplies its own rendering; this one is used
    /// when only the structured submission is available.
    pub fn format_brief(&self) -> String {
        let mut out = String::new();
        let mut line = |label: &str, value: &str| {
            let _ = writeln!(out, "{}: {}", label, value);
        };

        line("Business name", self.display_name());
        if let Some(v) = non_empty(&self.industry) {
            line("Industry", v);
        }
        if let Some(v) = non_empty(&self.location) {
            line("Location", v);
        }
        if let Some(v) = non_empty(&self.contact_name) {
            line("Contact", v);
        }
        if !self.description.trim().is_empty() {
            line("Description", self.description.trim());
        }
        if !self.services.is_empty() {
            line("Services", &self.services.join(", "));
        }
        if let Some(v) = non_empty(&self.target_audience) {
            line("Target audience", v);
        }
        if let Some(v) = non_empty(&self.unique_value) {
            line("What makes them different", v);
        }
        if !self.goals.is_empty() {
            line("Website goals", &self.goals.join(", "));
        }
        if let Some(v) = non_empty(&self.style) {
            line("Preferred style", v);
        }
        if let Some(colors) = &self.custom_colors {
            let mut palette = format!("primary {}, secondary {}", colors.primary, colors.secondary);
            if let Some(accent) = &colors.accent {
                let _ = write!(palette, ", accent {}", accent);
            }
            line("Custom colors", &palette);
        }
        if let Some(v) = non_empty(&self.existing_website) {
            line("Existing website", v);
        }
        if let Some(v) = non_empty(&self.additional_notes) {
            line("Additional notes", v);
        }
        out
    }
}

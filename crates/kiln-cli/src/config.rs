//! CLI configuration via environment variables

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Default to JSON output (KILN_JSON=1)
    pub default_json: bool,
    /// Disable colored output (KILN_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Profile used when no flag selects one (KILN_PROFILE)
    pub default_profile: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            default_json: env::var("KILN_JSON")
                .map(|v| is_truthy(&v))
                .unwrap_or(false),
            no_color: env::var("KILN_NO_COLOR").is_ok() || env::var("NO_COLOR").is_ok(),
            default_profile: env::var("KILN_PROFILE")
                .ok()
                .filter(|p| !p.trim().is_empty()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "json"
    )
}

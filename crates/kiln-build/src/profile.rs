//! Build profile management
//!
//! Provides the built-in `dev` and `release` profiles plus custom profiles
//! declared under `[profile.<name>]`. A profile is data layered over the
//! toolchain settings; it never renders flags itself.

use crate::error::{BuildError, BuildResult};
use crate::toolchain::ToolchainSettings;
use kiln_config::{ProfileOverrides, ProjectConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Build profile
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Development profile (default)
    #[default]
    Dev,
    /// Release profile (optimized, no debug info, no sanitizer)
    Release,
    /// Profile declared in kiln.toml
    Custom(String),
}

impl Profile {
    /// Get profile name
    pub fn name(&self) -> &str {
        match self {
            Self::Dev => "dev",
            Self::Release => "release",
            Self::Custom(name) => name,
        }
    }

    /// Check if this is a built-in profile
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::Dev | Self::Release)
    }

    /// Get default configuration for this profile
    pub fn default_config(&self) -> ProfileConfig {
        match self {
            Self::Release => ProfileConfig {
                name: "release".to_string(),
                debug_info: Some(false),
                sanitizer: SanitizerSetting::Disabled,
                optimize: true,
                parallel: false,
                fail_fast: false,
                cflags: Vec::new(),
            },
            other => ProfileConfig {
                name: other.name().to_string(),
                debug_info: None,
                sanitizer: SanitizerSetting::Inherit,
                optimize: false,
                parallel: false,
                fail_fast: false,
                cflags: Vec::new(),
            },
        }
    }
}

impl FromStr for Profile {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(BuildError::InvalidProfile {
                profile: s.to_string(),
                reason: "profile name cannot be empty".to_string(),
            });
        }
        // Built-in names match in any case; custom names are kept as declared
        Ok(match name.to_lowercase().as_str() {
            "dev" => Self::Dev,
            "release" => Self::Release,
            _ => Self::Custom(name.to_string()),
        })
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a profile does to the configured sanitizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SanitizerSetting {
    /// Keep whatever the toolchain section says
    Inherit,
    /// Never pass a sanitizer flag
    Disabled,
    /// Pass this sanitizer
    Enabled(String),
}

impl SanitizerSetting {
    /// Parse a configured value; `"none"` and `""` disable the sanitizer
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" | "none" => Self::Disabled,
            name => Self::Enabled(name.to_string()),
        }
    }
}

/// Resolved profile configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile name
    pub name: String,
    /// Debug info override (`None` keeps the toolchain setting)
    pub debug_info: Option<bool>,
    /// Sanitizer override
    pub sanitizer: SanitizerSetting,
    /// Pass the optimisation flag
    pub optimize: bool,
    /// Compile independent sources in parallel
    pub parallel: bool,
    /// Stop issuing steps after the first failure
    pub fail_fast: bool,
    /// Extra compile flags appended after the toolchain's
    pub cflags: Vec<String>,
}

impl ProfileConfig {
    /// Create from profile with defaults
    pub fn from_profile(profile: &Profile) -> Self {
        profile.default_config()
    }

    /// Merge `[profile.<name>]` overrides into this configuration
    pub fn merge_with_overrides(&mut self, overrides: &ProfileOverrides) {
        if let Some(debug) = overrides.debug_info {
            self.debug_info = Some(debug);
        }
        if let Some(sanitizer) = &overrides.sanitizer {
            self.sanitizer = SanitizerSetting::parse(sanitizer);
        }
        if let Some(optimize) = overrides.optimize {
            self.optimize = optimize;
        }
        if let Some(parallel) = overrides.parallel {
            self.parallel = parallel;
        }
        if let Some(fail_fast) = overrides.fail_fast {
            self.fail_fast = fail_fast;
        }
        self.cflags.extend(overrides.cflags.iter().cloned());
    }

    /// Layer this profile over toolchain settings
    pub fn apply(&self, mut settings: ToolchainSettings) -> ToolchainSettings {
        if let Some(debug) = self.debug_info {
            settings.debug_info = debug;
        }
        match &self.sanitizer {
            SanitizerSetting::Inherit => {}
            SanitizerSetting::Disabled => settings.sanitizer = None,
            SanitizerSetting::Enabled(name) => settings.sanitizer = Some(name.clone()),
        }
        settings.optimize = self.optimize;
        settings.cflags.extend(self.cflags.iter().cloned());
        settings
    }
}

/// Profile manager - resolves built-in and declared profiles
pub struct ProfileManager {
    profiles: BTreeMap<String, ProfileConfig>,
}

impl ProfileManager {
    /// Create a manager holding only the built-in profiles
    pub fn new() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("dev".to_string(), Profile::Dev.default_config());
        profiles.insert("release".to_string(), Profile::Release.default_config());
        Self { profiles }
    }

    /// Load every `[profile.<name>]` table of a project
    ///
    /// Declaring `dev` or `release` overrides the built-in. `inherits` chains are
    /// followed to any depth; a cycle is an error.
    pub fn load_from_project(&mut self, project: &ProjectConfig) -> BuildResult<()> {
        for name in project.profile.keys() {
            let mut chain = Vec::new();
            let config = resolve(name, &project.profile, &mut chain)?;
            let key = name.parse::<Profile>()?.name().to_string();
            self.profiles.insert(key, config);
        }
        Ok(())
    }

    /// Get profile configuration
    pub fn get(&self, profile: &Profile) -> BuildResult<ProfileConfig> {
        let name = profile.name();
        self.profiles
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::ProfileNotFound(name.to_string()))
    }

    /// Check if profile exists
    pub fn has_profile(&self, name: &str) -> bool {
        self.profiles.contains_key(name)
    }

    /// List all available profiles, sorted
    pub fn list_profiles(&self) -> Vec<String> {
        self.profiles.keys().cloned().collect()
    }
}

impl Default for ProfileManager {
    fn default() -> Self {
        Self::new()
    }
}

fn resolve(
    name: &str,
    declared: &BTreeMap<String, ProfileOverrides>,
    chain: &mut Vec<String>,
) -> BuildResult<ProfileConfig> {
    if chain.iter().any(|seen| seen == name) {
        chain.push(name.to_string());
        return Err(BuildError::InvalidProfile {
            profile: chain[0].clone(),
            reason: format!("inheritance cycle: {}", chain.join(" -> ")),
        });
    }

    let profile: Profile = name.parse()?;
    let Some(overrides) = declared.get(name) else {
        return if profile.is_builtin() {
            Ok(profile.default_config())
        } else {
            Err(BuildError::ProfileNotFound(name.to_string()))
        };
    };

    chain.push(name.to_string());
    let mut config = match &overrides.inherits {
        Some(base) => resolve(base, declared, chain)?,
        None => profile.default_config(),
    };
    chain.pop();

    config.name = profile.name().to_string();
    config.merge_with_overrides(overrides);
    Ok(config)
}

//! Project Configuration (kiln.toml)
//!
//! Handles project-level configuration stored in `kiln.toml` at the project root.
//! Every field is optional except `project.name`; missing values are filled in
//! from host defaults when the build configuration is resolved.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Project configuration from kiln.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Project metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectInfo>,

    /// Source and output directory layout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutConfig>,

    /// Accepted source languages
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<SourcesConfig>,

    /// Platform marker filter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<PlatformConfig>,

    /// Compiler and linker settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolchainConfig>,

    /// Per-profile overrides (`[profile.release]`, `[profile.asan]`, ...)
    #[serde(default)]
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profile: BTreeMap<String, ProfileOverrides>,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProjectInfo {
    /// Project name
    pub name: String,

    /// Project description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Directory layout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Shared source roots, walked recursively (default: ["lib", "third-party"])
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_roots: Option<Vec<PathBuf>>,

    /// Binary source root, one executable per entry (default: "bin")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary_root: Option<PathBuf>,

    /// Output directory for objects and executables (default: "build")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,

    /// Include-search directories for every compile (default: the library roots)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_dirs: Option<Vec<PathBuf>>,
}

/// Accepted language families
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    /// Language names: "c", "c++" (aliases "cxx", "cpp")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
}

/// Platform marker configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct PlatformConfig {
    /// Marker values recognised in file names (`foo.<marker>.cc`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markers: Option<Vec<String>>,

    /// Markers that belong to the active target
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<Vec<String>>,
}

/// Toolchain configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ToolchainConfig {
    /// Command-line dialect: "gnu" or "msvc"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,

    /// Compiler driver, used for both compiling and linking
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    /// Language standard for C++ sources (e.g. "c++20")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<String>,

    /// Language standard for C sources (e.g. "c11")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub c_std: Option<String>,

    /// Emit debug information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<bool>,

    /// Enable C++ exception handling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exceptions: Option<bool>,

    /// Sanitizer passed at link time ("address", or "none")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitizer: Option<String>,

    /// Runtime library excluded at link time (msvc `/NODEFAULTLIB:`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_default_lib: Option<String>,

    /// Extra compile flags
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cflags: Vec<String>,

    /// External libraries in link order
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub libraries: Vec<String>,
}

/// Profile overrides from `[profile.<name>]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProfileOverrides {
    /// Emit debug information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_info: Option<bool>,

    /// Sanitizer ("none" disables)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sanitizer: Option<String>,

    /// Pass the optimisation flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize: Option<bool>,

    /// Compile independent sources in parallel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,

    /// Stop at the first failing step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fail_fast: Option<bool>,

    /// Extra compile flags appended after the toolchain's
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cflags: Vec<String>,

    /// Base profile to inherit from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inherits: Option<String>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        Self::parse(&content, path)
    }

    /// Parse and validate configuration text; `origin` is used in error messages
    pub fn parse(content: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
            file: origin.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(project) = &self.project {
            if project.name.trim().is_empty() {
                return Err(invalid("project.name", "name cannot be empty"));
            }
        }

        if let Some(languages) = self.sources.as_ref().and_then(|s| s.languages.as_ref()) {
            if languages.is_empty() {
                return Err(invalid(
                    "sources.languages",
                    "at least one language is required",
                ));
            }
            for language in languages {
                if !is_valid_language(language) {
                    return Err(invalid(
                        "sources.languages",
                        format!("unknown language '{}'", language),
                    ));
                }
            }
        }

        if let Some(platform) = &self.platform {
            if let (Some(markers), Some(active)) = (&platform.markers, &platform.active) {
                if let Some(unknown) = active.iter().find(|a| !markers.contains(a)) {
                    return Err(invalid(
                        "platform.active",
                        format!("'{}' is not listed in platform.markers", unknown),
                    ));
                }
            }
        }

        if let Some(toolchain) = &self.toolchain {
            if let Some(flavor) = &toolchain.flavor {
                if !is_valid_flavor(flavor) {
                    return Err(invalid(
                        "toolchain.flavor",
                        format!("must be 'gnu' or 'msvc', got '{}'", flavor),
                    ));
                }
            }
            if toolchain.compiler.as_deref().is_some_and(|c| c.trim().is_empty()) {
                return Err(invalid("toolchain.compiler", "compiler cannot be empty"));
            }
        }

        if let Some(layout) = &self.layout {
            if let Some(build_dir) = &layout.build_dir {
                let clashes_library = layout
                    .library_roots
                    .iter()
                    .flatten()
                    .any(|root| root == build_dir);
                if clashes_library || layout.binary_root.as_ref() == Some(build_dir) {
                    return Err(invalid(
                        "layout.build_dir",
                        "build directory cannot be a source root",
                    ));
                }
            }
        }

        for (name, overrides) in &self.profile {
            if let Some(base) = &overrides.inherits {
                if base == name {
                    return Err(invalid(
                        format!("profile.{}.inherits", name),
                        "a profile cannot inherit from itself",
                    ));
                }
            }
        }

        Ok(())
    }

    /// Get the project name, if present
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|p| p.name.as_str())
    }

    /// Get the toolchain section, if present
    pub fn toolchain(&self) -> Option<&ToolchainConfig> {
        self.toolchain.as_ref()
    }

    /// Get the overrides declared for a profile
    pub fn profile_overrides(&self, name: &str) -> Option<&ProfileOverrides> {
        self.profile.get(name)
    }
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Check if a language name is recognised
pub fn is_valid_language(language: &str) -> bool {
    matches!(
        language.to_ascii_lowercase().as_str(),
        "c" | "c++" | "cxx" | "cpp"
    )
}

/// Check if a toolchain flavor is recognised
pub fn is_valid_flavor(flavor: &str) -> bool {
    matches!(flavor, "gnu" | "msvc")
}

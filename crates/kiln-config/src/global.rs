//! Global Configuration (~/.kiln/config.toml)
//!
//! Handles user-level configuration stored in `~/.kiln/config.toml`. Only the
//! toolchain defaults live here; everything else belongs to the project.

use crate::project::is_valid_flavor;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.kiln/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Toolchain defaults
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<GlobalToolchainConfig>,
}

/// Toolchain defaults shared by every project of this user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalToolchainConfig {
    /// Default compiler driver
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compiler: Option<String>,

    /// Default command-line dialect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flavor: Option<String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(flavor) = self.toolchain.as_ref().and_then(|t| t.flavor.as_ref()) {
            if !is_valid_flavor(flavor) {
                return Err(ConfigError::InvalidValue {
                    field: "toolchain.flavor".to_string(),
                    reason: format!("must be 'gnu' or 'msvc', got '{}'", flavor),
                });
            }
        }
        Ok(())
    }

    /// Get the global config file path (~/.kiln/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".kiln").join("config.toml"))
    }

    /// Default compiler, if configured
    pub fn default_compiler(&self) -> Option<&str> {
        self.toolchain.as_ref().and_then(|t| t.compiler.as_deref())
    }

    /// Default flavor, if configured
    pub fn default_flavor(&self) -> Option<&str> {
        self.toolchain.as_ref().and_then(|t| t.flavor.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_global_config() {
        let toml = r#"
[toolchain]
compiler = "g++-13"
flavor = "gnu"
"#;

        let config: GlobalConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_compiler(), Some("g++-13"));
        assert_eq!(config.default_flavor(), Some("gnu"));
    }

    #[test]
    fn test_empty_global_config() {
        let config: GlobalConfig = toml::from_str("").unwrap();
        assert_eq!(config.default_compiler(), None);
    }

    #[test]
    fn test_invalid_flavor() {
        let config = GlobalConfig {
            toolchain: Some(GlobalToolchainConfig {
                compiler: None,
                flavor: Some("watcom".to_string()),
            }),
        };
        assert!(config.validate().is_err());
    }
}

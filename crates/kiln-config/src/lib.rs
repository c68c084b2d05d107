//! Kiln Configuration System
//!
//! Provides configuration management for kiln projects including:
//! - Project configuration (kiln.toml)
//! - Global user configuration (~/.kiln/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.kiln/config.toml)
//! 2. Project config (./kiln.toml)
//! 3. Environment variables (KILN_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use kiln_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project configuration file
pub const PROJECT_FILE: &str = "kiln.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{
    LayoutConfig, PlatformConfig, ProfileOverrides, ProjectConfig, ProjectInfo, SourcesConfig,
    ToolchainConfig,
};

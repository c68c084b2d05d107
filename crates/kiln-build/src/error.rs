/// Build system error types
use kiln_config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

pub type BuildResult<T> = Result<T, BuildError>;

/// Errors that abort a build.
///
/// A compiler or linker exiting non-zero is not an error here: it is recorded as a
/// failed step in the build report and the build keeps going.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Cannot read source root {path}: {reason}")]
    Discovery { path: PathBuf, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Invalid profile '{profile}': {reason}")]
    InvalidProfile { profile: String, reason: String },

    #[error("Unknown language '{0}'")]
    UnknownLanguage(String),

    #[error("Two binaries are both named '{name}': {first} and {second}")]
    DuplicateTarget {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Failed to start '{program}': {error}")]
    ToolchainSpawn {
        program: String,
        error: std::io::Error,
    },

    #[error("I/O error at {path}: {error}")]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Create a discovery error for an unreadable root
    pub fn discovery(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Discovery {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }

    /// Create a spawn error for a toolchain program
    pub fn spawn(program: impl Into<String>, error: std::io::Error) -> Self {
        Self::ToolchainSpawn {
            program: program.into(),
            error,
        }
    }
}

//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::{LayoutConfig, ProjectConfig, ToolchainConfig};
use crate::{ConfigError, ConfigResult, PROJECT_FILE};
use std::env;
use std::path::{Component, Path, PathBuf};

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.kiln/config.toml) - lowest priority
/// 2. Project config (./kiln.toml) - overrides global
/// 3. Environment variables (KILN_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where kiln.toml was found)
    pub project_root: PathBuf,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.kiln/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find kiln.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project_config) = self.find_project_config(start_dir)?;

        let global_config = self.load_global_config().unwrap_or_default();
        let project_config = self.apply_env_overrides(project_config);

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project_config = ProjectConfig::load_from_file(config_path)?;
        let global_config = self.load_global_config().unwrap_or_default();
        let project_config = self.apply_env_overrides(project_config);

        let project_root = config_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Config {
            project: project_config,
            global: global_config,
            project_root,
        })
    }

    /// Find project configuration by walking up directory tree
    ///
    /// A relative `start_dir` is resolved against the current directory first,
    /// so the walk can climb above it.
    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(PathBuf, ProjectConfig)> {
        let mut current = absolute(start_dir)?;

        loop {
            let config_path = current.join(PROJECT_FILE);

            if config_path.exists() {
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((current, project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Err(ConfigError::NotFound(start_dir.join(PROJECT_FILE))),
            }
        }
    }

    /// Load global configuration
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        // Global config is optional
        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply environment variable overrides to project config
    ///
    /// Recognised variables: KILN_COMPILER, KILN_SANITIZER, KILN_BUILD_DIR
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ProjectConfig {
        if let Ok(compiler) = env::var("KILN_COMPILER") {
            if !compiler.trim().is_empty() {
                toolchain_mut(&mut config).compiler = Some(compiler);
            }
        }

        if let Ok(sanitizer) = env::var("KILN_SANITIZER") {
            toolchain_mut(&mut config).sanitizer = Some(sanitizer);
        }

        if let Ok(build_dir) = env::var("KILN_BUILD_DIR") {
            if !build_dir.is_empty() {
                config
                    .layout
                    .get_or_insert_with(LayoutConfig::default)
                    .build_dir = Some(PathBuf::from(build_dir));
            }
        }

        config
    }
}

fn absolute(path: &Path) -> ConfigResult<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };
    Ok(joined
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect())
}

fn toolchain_mut(config: &mut ProjectConfig) -> &mut ToolchainConfig {
    config.toolchain.get_or_insert_with(ToolchainConfig::default)
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Get the project root directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Get the project name, falling back to the root directory name
    pub fn project_name(&self) -> String {
        self.project
            .project_name()
            .map(str::to_string)
            .or_else(|| {
                self.project_root
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| "project".to_string())
    }

    /// Effective compiler (project > global), if either sets one
    pub fn compiler(&self) -> Option<&str> {
        self.project
            .toolchain()
            .and_then(|t| t.compiler.as_deref())
            .or_else(|| self.global.default_compiler())
    }

    /// Effective flavor (project > global), if either sets one
    pub fn flavor(&self) -> Option<&str> {
        self.project
            .toolchain()
            .and_then(|t| t.flavor.as_deref())
            .or_else(|| self.global.default_flavor())
    }
}

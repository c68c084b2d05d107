pub mod build;
pub mod clean;
pub mod plan;
pub mod sources;

use anyhow::{Context, Result};
use kiln_build::{BuildConfiguration, Profile};
use kiln_config::ConfigLoader;
use std::path::{Path, PathBuf};

/// Options shared by every command that needs a resolved project
#[derive(Debug, Default, Clone)]
pub struct ProjectArgs {
    /// Project directory (defaults to current directory)
    pub project_dir: Option<PathBuf>,
    /// Build profile name
    pub profile: Option<String>,
    /// Shorthand for the release profile
    pub release: bool,
    /// Profile from the environment, used when no flag selects one
    pub default_profile: Option<String>,
}

/// Determine build profile from arguments
///
/// `--release` wins over `--profile`, which wins over `KILN_PROFILE`.
pub fn determine_profile(args: &ProjectArgs) -> Result<Profile> {
    if args.release {
        return Ok(Profile::Release);
    }
    match args.profile.as_ref().or(args.default_profile.as_ref()) {
        Some(name) => name
            .parse::<Profile>()
            .with_context(|| format!("Invalid profile '{}'", name)),
        None => Ok(Profile::Dev),
    }
}

/// Load kiln.toml (searching upward) and resolve it for the selected profile
pub fn load_configuration(args: &ProjectArgs) -> Result<BuildConfiguration> {
    let start = args
        .project_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let profile = determine_profile(args)?;

    let config = ConfigLoader::new()
        .load_from_directory(&start)
        .with_context(|| format!("Failed to load kiln.toml from {}", display(&start)))?;

    BuildConfiguration::resolve(&config, &profile)
        .with_context(|| format!("Failed to resolve profile '{}'", profile))
}

fn display(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determine_profile_default() {
        let profile = determine_profile(&ProjectArgs::default()).unwrap();
        assert_eq!(profile, Profile::Dev);
    }

    #[test]
    fn test_determine_profile_release_priority() {
        let args = ProjectArgs {
            release: true,
            profile: Some("asan".to_string()),
            ..Default::default()
        };
        assert_eq!(determine_profile(&args).unwrap(), Profile::Release);
    }

    #[test]
    fn test_flag_beats_environment() {
        let args = ProjectArgs {
            profile: Some("asan".to_string()),
            default_profile: Some("release".to_string()),
            ..Default::default()
        };
        assert_eq!(
            determine_profile(&args).unwrap(),
            Profile::Custom("asan".to_string())
        );
    }

    #[test]
    fn test_environment_profile_used() {
        let args = ProjectArgs {
            default_profile: Some("release".to_string()),
            ..Default::default()
        };
        assert_eq!(determine_profile(&args).unwrap(), Profile::Release);
    }
}

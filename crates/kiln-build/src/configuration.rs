//! Resolved build configuration
//!
//! [`BuildConfiguration`] is built once per invocation, either resolved from the
//! loaded `kiln.toml` and a profile or assembled with the `with_*` builders, and
//! is then shared by reference with every stage of the build.

use crate::discovery::SourceFilter;
use crate::error::{BuildError, BuildResult};
use crate::language::LanguageSet;
use crate::platform::{PlatformFilter, DEFAULT_MARKERS};
use crate::profile::{Profile, ProfileManager, SanitizerSetting};
use crate::toolchain::{Flavor, ToolchainSettings};
use kiln_config::{Config, ConfigError};
use std::env;
use std::path::{Path, PathBuf};

/// Default shared source roots, in link order
pub const DEFAULT_LIBRARY_ROOTS: [&str; 2] = ["lib", "third-party"];
/// Default binary root
pub const DEFAULT_BINARY_ROOT: &str = "bin";
/// Default artifact directory
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Everything a build needs to know, fully resolved
#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    /// Project name
    pub project_name: String,
    /// Directory every relative path below is resolved against
    pub project_root: PathBuf,
    /// Shared source roots, walked recursively in this order
    pub library_roots: Vec<PathBuf>,
    /// Root whose immediate entries are binaries
    pub binary_root: PathBuf,
    /// Flat artifact directory
    pub build_dir: PathBuf,
    /// Include directories passed to every compile
    pub include_dirs: Vec<PathBuf>,
    /// Suffix and platform filter
    pub filter: SourceFilter,
    /// Compiler and linker settings, profile already applied
    pub toolchain: ToolchainSettings,
    /// Compile independent sources in parallel
    pub parallel: bool,
    /// Stop issuing steps after the first failure
    pub fail_fast: bool,
    /// Name of the profile this configuration was resolved for
    pub profile: String,
}

impl BuildConfiguration {
    /// Default layout for a project rooted at `project_root`
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let library_roots: Vec<PathBuf> =
            DEFAULT_LIBRARY_ROOTS.iter().map(PathBuf::from).collect();
        let project_name = project_root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "project".to_string());

        Self {
            project_name,
            project_root,
            include_dirs: library_roots.clone(),
            library_roots,
            binary_root: PathBuf::from(DEFAULT_BINARY_ROOT),
            build_dir: PathBuf::from(DEFAULT_BUILD_DIR),
            filter: SourceFilter::default(),
            toolchain: ToolchainSettings::default(),
            parallel: false,
            fail_fast: false,
            profile: Profile::Dev.name().to_string(),
        }
    }

    /// Resolve a configuration from a loaded project and a profile
    pub fn resolve(config: &Config, profile: &Profile) -> BuildResult<Self> {
        let project = &config.project;

        let mut profiles = ProfileManager::new();
        profiles.load_from_project(project)?;
        let profile_config = profiles.get(profile)?;

        let mut resolved = Self::new(config.project_root());
        resolved.project_name = config.project_name();
        resolved.profile = profile.name().to_string();

        if let Some(layout) = &project.layout {
            if let Some(roots) = &layout.library_roots {
                resolved.library_roots = roots.clone();
                resolved.include_dirs = roots.clone();
            }
            if let Some(root) = &layout.binary_root {
                resolved.binary_root = root.clone();
            }
            if let Some(dir) = &layout.build_dir {
                resolved.build_dir = dir.clone();
            }
            if let Some(includes) = &layout.include_dirs {
                resolved.include_dirs = includes.clone();
            }
        }

        let languages = match project.sources.as_ref().and_then(|s| s.languages.as_ref()) {
            Some(names) => LanguageSet::from_names(names.as_slice())?,
            None => LanguageSet::all(),
        };
        let platform = match &project.platform {
            Some(p) if p.markers.is_some() || p.active.is_some() => {
                let markers = p
                    .markers
                    .clone()
                    .unwrap_or_else(|| DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect());
                let active = p
                    .active
                    .clone()
                    .unwrap_or_else(|| PlatformFilter::host().active().to_vec());
                PlatformFilter::new(markers, active)
            }
            _ => PlatformFilter::host(),
        };
        resolved.filter = SourceFilter::new(languages, platform);

        resolved.toolchain = profile_config.apply(resolve_toolchain(config)?);
        resolved.parallel = profile_config.parallel;
        resolved.fail_fast = profile_config.fail_fast;

        resolved.validate()?;
        Ok(resolved)
    }

    pub fn with_library_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.library_roots = roots;
        self
    }

    pub fn with_binary_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.binary_root = root.into();
        self
    }

    pub fn with_build_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.build_dir = dir.into();
        self
    }

    pub fn with_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.include_dirs = dirs;
        self
    }

    pub fn with_filter(mut self, filter: SourceFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_toolchain(mut self, toolchain: ToolchainSettings) -> Self {
        self.toolchain = toolchain;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Reject layouts where artifacts would be written into a source root
    pub fn validate(&self) -> BuildResult<()> {
        let roots = self
            .library_roots
            .iter()
            .chain(std::iter::once(&self.binary_root));
        for root in roots {
            if same_path(root, &self.build_dir) {
                return Err(BuildError::InvalidLayout(format!(
                    "build directory '{}' is also a source root",
                    self.build_dir.display()
                )));
            }
        }
        Ok(())
    }

    /// Extension of object artifacts for the configured flavor
    pub fn object_extension(&self) -> &'static str {
        self.toolchain.flavor.object_extension()
    }

    /// Executable path for a link unit name
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.build_dir
            .join(format!("{}{}", name, self.toolchain.flavor.executable_suffix()))
    }

    /// Build directory resolved against the project root
    pub fn absolute_build_dir(&self) -> PathBuf {
        self.project_root.join(&self.build_dir)
    }
}

fn resolve_toolchain(config: &Config) -> BuildResult<ToolchainSettings> {
    let flavor = match config.flavor() {
        Some(name) => Flavor::from_name(name).ok_or_else(|| {
            BuildError::Config(ConfigError::InvalidValue {
                field: "toolchain.flavor".to_string(),
                reason: format!("must be 'gnu' or 'msvc', got '{}'", name),
            })
        })?,
        None => Flavor::host(),
    };

    let mut settings = ToolchainSettings::for_flavor(flavor);
    match config.compiler() {
        Some(compiler) => settings.compiler = compiler.to_string(),
        None if flavor == Flavor::Gnu => {
            if let Some(cxx) = env::var("CXX").ok().filter(|c| !c.trim().is_empty()) {
                settings.compiler = cxx;
            }
        }
        None => {}
    }

    if let Some(toolchain) = config.project.toolchain() {
        if let Some(std) = &toolchain.std {
            settings.std = Some(std.clone());
        }
        if let Some(c_std) = &toolchain.c_std {
            settings.c_std = Some(c_std.clone());
        }
        if let Some(debug) = toolchain.debug_info {
            settings.debug_info = debug;
        }
        if let Some(exceptions) = toolchain.exceptions {
            settings.exceptions = exceptions;
        }
        if let Some(sanitizer) = &toolchain.sanitizer {
            settings.sanitizer = match SanitizerSetting::parse(sanitizer) {
                SanitizerSetting::Enabled(name) => Some(name),
                _ => None,
            };
        }
        if let Some(lib) = &toolchain.no_default_lib {
            settings.no_default_lib = Some(lib.clone());
        }
        settings.cflags = toolchain.cflags.clone();
        settings.libraries = toolchain.libraries.clone();
    }

    Ok(settings)
}

fn same_path(a: &Path, b: &Path) -> bool {
    a.components().eq(b.components())
}

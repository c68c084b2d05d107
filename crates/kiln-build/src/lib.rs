//! Kiln build orchestration
//!
//! Builds native C and C++ projects laid out as library roots plus a binary
//! root:
//! - Source discovery with language and platform-marker filtering
//! - Collision-free flattening of source paths into object paths
//! - One link unit per binary file or binary directory, each linking every
//!   library object
//! - gnu and msvc command lines, run through a [`ToolchainInvoker`]
//! - Build profiles (dev, release, custom)

pub mod artifact;
pub mod assembler;
pub mod builder;
pub mod configuration;
pub mod discovery;
pub mod error;
pub mod language;
pub mod output;
pub mod planner;
pub mod platform;
pub mod profile;
pub mod targets;
pub mod toolchain;

// Re-export main types
pub use artifact::{flatten_source_path, object_path, ArtifactMap, Collision};
pub use assembler::{BuildPlan, Phase, PlannedCommand};
pub use builder::{BuildReport, BuildStats, Builder, StepOutcome};
pub use configuration::BuildConfiguration;
pub use discovery::{
    discover, discover_library, enumerate_binaries, BinaryEntry, SourceFile, SourceFilter,
};
pub use error::{BuildError, BuildResult};
pub use language::{Language, LanguageSet};
pub use output::{OutputMode, Reporter};
pub use planner::{CompilationPlanner, CompileStep};
pub use platform::PlatformFilter;
pub use profile::{Profile, ProfileConfig, ProfileManager, SanitizerSetting};
pub use targets::{LinkUnit, UnitKind};
pub use toolchain::{
    Flavor, Invocation, ProcessInvoker, StepStatus, ToolchainInvoker, ToolchainSettings,
};

// Re-export kiln-config types for convenience
pub use kiln_config::{Config, ConfigLoader};

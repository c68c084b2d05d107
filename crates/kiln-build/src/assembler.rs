//! Binary assembly: link units from discovered sources
//!
//! Every binary links its own objects followed by every library object. Library
//! sources are compiled once and shared by all units.

use crate::artifact::Collision;
use crate::configuration::BuildConfiguration;
use crate::discovery::{discover_library, enumerate_binaries, BinaryEntry, SourceFile};
use crate::error::{BuildError, BuildResult};
use crate::output::LIBRARY_TARGET;
use crate::planner::{CompilationPlanner, CompileStep};
use crate::targets::{LinkUnit, UnitKind};
use crate::toolchain::{Invocation, ToolchainSettings};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// The complete, ordered work of one build
#[derive(Debug, Clone, Serialize)]
pub struct BuildPlan {
    /// Library compile steps, in discovery order
    pub library: Vec<CompileStep>,
    /// Link units, sorted by binary root entry name
    pub units: Vec<LinkUnit>,
    /// Flattened names that needed disambiguation
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub collisions: Vec<Collision>,
}

/// Which phase a planned command belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Compile,
    Link,
}

/// One rendered command of a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedCommand {
    pub phase: Phase,
    /// `lib` for library compiles, the unit name otherwise
    pub target: String,
    /// Source compiled, or executable linked
    pub path: PathBuf,
    pub invocation: Invocation,
}

impl BuildPlan {
    /// Discover sources and plan every compile and link of the configured project
    pub fn create(config: &BuildConfiguration) -> BuildResult<Self> {
        let library = discover_library(
            &config.project_root,
            &config.library_roots,
            &config.filter,
        )?;
        let binaries = enumerate_binaries(&config.project_root, &config.binary_root, &config.filter)?;

        Self::assemble(config, library, binaries)
    }

    /// Plan already-discovered sources
    pub fn assemble(
        config: &BuildConfiguration,
        library: Vec<SourceFile>,
        binaries: Vec<BinaryEntry>,
    ) -> BuildResult<Self> {
        check_overlap(&library, &binaries)?;
        check_unique_names(&binaries)?;

        let planner = CompilationPlanner::new(
            &config.build_dir,
            config.object_extension(),
            library
                .iter()
                .chain(binaries.iter().flat_map(|b| b.sources().iter())),
        );

        let library: Vec<CompileStep> = library.iter().map(|s| planner.step(s, &[])).collect();
        let library_objects: Vec<PathBuf> = library.iter().map(|s| s.object.clone()).collect();

        let units = binaries
            .iter()
            .map(|entry| {
                let (kind, extra_includes) = match entry {
                    BinaryEntry::File { .. } => (UnitKind::File, Vec::new()),
                    BinaryEntry::Directory { dir, .. } => (UnitKind::Directory, vec![dir.clone()]),
                };

                let mut unit = LinkUnit::new(entry.name(), kind, config.output_path(entry.name()));
                unit.steps = entry
                    .sources()
                    .iter()
                    .map(|s| planner.step(s, &extra_includes))
                    .collect();
                unit.objects = unit
                    .own_objects()
                    .cloned()
                    .chain(library_objects.iter().cloned())
                    .collect();
                unit.extra_includes = extra_includes;
                unit.libraries = config.toolchain.libraries.clone();
                unit
            })
            .collect();

        Ok(Self {
            library,
            units,
            collisions: planner.artifacts().collisions().to_vec(),
        })
    }

    /// Objects of the library domain, in discovery order
    pub fn library_objects(&self) -> impl Iterator<Item = &Path> {
        self.library.iter().map(|s| s.object.as_path())
    }

    /// Link unit by executable name
    pub fn unit(&self, name: &str) -> Option<&LinkUnit> {
        self.units.iter().find(|u| u.name == name)
    }

    /// Total number of compile steps
    pub fn compile_count(&self) -> usize {
        self.library.len() + self.units.iter().map(|u| u.steps.len()).sum::<usize>()
    }

    /// Render every command in execution order without running anything
    pub fn commands(
        &self,
        toolchain: &ToolchainSettings,
        include_dirs: &[PathBuf],
    ) -> Vec<PlannedCommand> {
        let mut commands: Vec<PlannedCommand> = self
            .library
            .iter()
            .map(|step| PlannedCommand {
                phase: Phase::Compile,
                target: LIBRARY_TARGET.to_string(),
                path: step.source.path.clone(),
                invocation: toolchain.compile_invocation(step, include_dirs),
            })
            .collect();

        for unit in &self.units {
            commands.extend(unit.steps.iter().map(|step| PlannedCommand {
                phase: Phase::Compile,
                target: unit.name.clone(),
                path: step.source.path.clone(),
                invocation: toolchain.compile_invocation(step, include_dirs),
            }));
            commands.push(PlannedCommand {
                phase: Phase::Link,
                target: unit.name.clone(),
                path: unit.output.clone(),
                invocation: toolchain.link_invocation(unit),
            });
        }

        commands
    }
}

fn check_overlap(library: &[SourceFile], binaries: &[BinaryEntry]) -> BuildResult<()> {
    let shared: BTreeSet<&Path> = library.iter().map(|s| s.path.as_path()).collect();
    for entry in binaries {
        if let Some(source) = entry.sources().iter().find(|s| shared.contains(s.path.as_path())) {
            return Err(BuildError::InvalidLayout(format!(
                "'{}' belongs to both a library root and binary '{}'",
                source.path.display(),
                entry.name()
            )));
        }
    }
    Ok(())
}

fn check_unique_names(binaries: &[BinaryEntry]) -> BuildResult<()> {
    let mut seen: BTreeMap<&str, &Path> = BTreeMap::new();
    for entry in binaries {
        if let Some(first) = seen.insert(entry.name(), entry.path()) {
            return Err(BuildError::DuplicateTarget {
                name: entry.name().to_string(),
                first: first.to_path_buf(),
                second: entry.path().to_path_buf(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::toolchain::Flavor;
    use pretty_assertions::assert_eq;

    fn config() -> BuildConfiguration {
        BuildConfiguration::new("/work/demo")
            .with_toolchain(ToolchainSettings::for_flavor(Flavor::Gnu).with_libraries(vec![
                "-lz".to_string(),
                "-lm".to_string(),
            ]))
    }

    fn src(path: &str) -> SourceFile {
        SourceFile::new(path, Language::Cxx)
    }

    #[test]
    fn test_units_link_own_then_library_objects() {
        let plan = BuildPlan::assemble(
            &config(),
            vec![src("lib/a.cc"), src("lib/b.cc")],
            vec![BinaryEntry::File {
                name: "x".into(),
                source: src("bin/x.cc"),
            }],
        )
        .unwrap();

        let x = plan.unit("x").unwrap();
        assert_eq!(
            x.objects,
            vec![
                PathBuf::from("build/bin-x.cc.o"),
                PathBuf::from("build/lib-a.cc.o"),
                PathBuf::from("build/lib-b.cc.o"),
            ]
        );
        assert_eq!(x.libraries, vec!["-lz", "-lm"]);
        assert_eq!(x.output, PathBuf::from("build/x"));
        assert_eq!(plan.compile_count(), 3);
    }

    #[test]
    fn test_directory_unit_gets_extra_include() {
        let plan = BuildPlan::assemble(
            &config(),
            vec![src("lib/a.cc")],
            vec![BinaryEntry::Directory {
                name: "y".into(),
                dir: PathBuf::from("bin/y"),
                sources: vec![src("bin/y/z.cc")],
            }],
        )
        .unwrap();

        let y = plan.unit("y").unwrap();
        assert_eq!(y.kind, UnitKind::Directory);
        assert_eq!(y.extra_includes, vec![PathBuf::from("bin/y")]);
        assert_eq!(y.steps[0].extra_includes, vec![PathBuf::from("bin/y")]);
        assert!(plan.library[0].extra_includes.is_empty());
    }

    #[test]
    fn test_duplicate_binary_names() {
        let err = BuildPlan::assemble(
            &config(),
            vec![],
            vec![
                BinaryEntry::File {
                    name: "x".into(),
                    source: src("bin/x.cc"),
                },
                BinaryEntry::Directory {
                    name: "x".into(),
                    dir: PathBuf::from("bin/x"),
                    sources: vec![src("bin/x/main.cc")],
                },
            ],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::DuplicateTarget { name, .. } if name == "x"));
    }

    #[test]
    fn test_source_in_both_domains() {
        let err = BuildPlan::assemble(
            &config(),
            vec![src("src/bin/x.cc")],
            vec![BinaryEntry::File {
                name: "x".into(),
                source: src("src/bin/x.cc"),
            }],
        )
        .unwrap_err();
        assert!(matches!(err, BuildError::InvalidLayout(_)));
    }

    #[test]
    fn test_commands_in_execution_order() {
        let plan = BuildPlan::assemble(
            &config(),
            vec![src("lib/a.cc")],
            vec![BinaryEntry::File {
                name: "x".into(),
                source: src("bin/x.cc"),
            }],
        )
        .unwrap();
        let commands = plan.commands(&config().toolchain, &[PathBuf::from("lib")]);

        let phases: Vec<_> = commands.iter().map(|c| (c.phase, c.target.as_str())).collect();
        assert_eq!(
            phases,
            vec![
                (Phase::Compile, "lib"),
                (Phase::Compile, "x"),
                (Phase::Link, "x")
            ]
        );
    }
}

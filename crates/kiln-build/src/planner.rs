//! Compilation planning: one compile step per source

use crate::artifact::{object_path, ArtifactMap};
use crate::discovery::SourceFile;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A single compiler invocation: one source in, one object out
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileStep {
    /// Source being compiled
    pub source: SourceFile,
    /// Object artifact written by the compiler
    pub object: PathBuf,
    /// Include directories beyond the global ones (binary-local headers)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_includes: Vec<PathBuf>,
}

impl CompileStep {
    pub fn new(source: SourceFile, object: impl Into<PathBuf>) -> Self {
        Self {
            source,
            object: object.into(),
            extra_includes: Vec::new(),
        }
    }

    pub fn with_extra_includes(mut self, includes: Vec<PathBuf>) -> Self {
        self.extra_includes = includes;
        self
    }
}

/// Derives compile steps from sources using a collision-free artifact map
pub struct CompilationPlanner {
    build_dir: PathBuf,
    extension: String,
    artifacts: ArtifactMap,
}

impl CompilationPlanner {
    /// Plan objects for every source that will be compiled in this build
    pub fn new<'a>(
        build_dir: &Path,
        extension: &str,
        sources: impl IntoIterator<Item = &'a SourceFile>,
    ) -> Self {
        let artifacts = ArtifactMap::plan(
            build_dir,
            extension,
            sources.into_iter().map(|s| s.path.as_path()),
        );
        Self {
            build_dir: build_dir.to_path_buf(),
            extension: extension.to_string(),
            artifacts,
        }
    }

    /// Object artifact for a source
    pub fn object_for(&self, source: &SourceFile) -> PathBuf {
        self.artifacts
            .object_for(&source.path)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| object_path(&self.build_dir, &source.path, &self.extension))
    }

    /// Compile step for a source, with optional binary-local include directories
    pub fn step(&self, source: &SourceFile, extra_includes: &[PathBuf]) -> CompileStep {
        CompileStep::new(source.clone(), self.object_for(source))
            .with_extra_includes(extra_includes.to_vec())
    }

    /// The underlying artifact map
    pub fn artifacts(&self) -> &ArtifactMap {
        &self.artifacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;

    #[test]
    fn test_step_uses_planned_object() {
        let a = SourceFile::new("lib/a.cc", Language::Cxx);
        let planner = CompilationPlanner::new(Path::new("build"), "o", [&a]);

        let step = planner.step(&a, &[]);
        assert_eq!(step.object, PathBuf::from("build/lib-a.cc.o"));
        assert!(step.extra_includes.is_empty());
    }

    #[test]
    fn test_step_is_deterministic() {
        let a = SourceFile::new("bin/tool/main.cc", Language::Cxx);
        let planner = CompilationPlanner::new(Path::new("build"), "o", [&a]);
        assert_eq!(planner.step(&a, &[]), planner.step(&a, &[]));
    }

    #[test]
    fn test_unplanned_source_falls_back_to_plain_name() {
        let planner = CompilationPlanner::new(Path::new("out"), "obj", std::iter::empty());
        let b = SourceFile::new("lib/b.c", Language::C);
        assert_eq!(planner.object_for(&b), PathBuf::from("out/lib-b.c.obj"));
    }

    #[test]
    fn test_extra_includes_recorded() {
        let z = SourceFile::new("bin/y/z.cc", Language::Cxx);
        let planner = CompilationPlanner::new(Path::new("build"), "o", [&z]);
        let step = planner.step(&z, &[PathBuf::from("bin/y")]);
        assert_eq!(step.extra_includes, vec![PathBuf::from("bin/y")]);
    }
}

//! Shared helpers for kiln-build integration tests

#![allow(dead_code)]

use kiln_build::{
    BuildConfiguration, BuildResult, Flavor, Invocation, LinkUnit, SourceFile, StepStatus,
    ToolchainInvoker, ToolchainSettings,
};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// One call received by [`RecordingInvoker`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Compile(PathBuf, Invocation),
    Link(String, Invocation),
}

/// Records every invocation instead of running it; chosen steps fail
#[derive(Default)]
pub struct RecordingInvoker {
    calls: Mutex<Vec<Call>>,
    failing_sources: BTreeSet<PathBuf>,
    failing_units: BTreeSet<String>,
}

impl RecordingInvoker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_compile(mut self, source: &str) -> Self {
        self.failing_sources.insert(PathBuf::from(source));
        self
    }

    pub fn failing_link(mut self, unit: &str) -> Self {
        self.failing_units.insert(unit.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn compiled(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Compile(path, _) => Some(path),
                Call::Link(..) => None,
            })
            .collect()
    }

    pub fn linked(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Link(name, _) => Some(name),
                Call::Compile(..) => None,
            })
            .collect()
    }
}

impl ToolchainInvoker for RecordingInvoker {
    fn compile(&self, source: &SourceFile, invocation: &Invocation) -> BuildResult<StepStatus> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Compile(source.path.clone(), invocation.clone()));
        if self.failing_sources.contains(&source.path) {
            Ok(StepStatus::Failed { code: Some(1) })
        } else {
            Ok(StepStatus::Succeeded)
        }
    }

    fn link(&self, unit: &LinkUnit, invocation: &Invocation) -> BuildResult<StepStatus> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Link(unit.name.clone(), invocation.clone()));
        if self.failing_units.contains(&unit.name) {
            Ok(StepStatus::Failed { code: Some(1) })
        } else {
            Ok(StepStatus::Succeeded)
        }
    }
}

/// Create an empty file (and its parents) under `root`
pub fn touch(root: &Path, rel: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, "").unwrap();
}

/// Create a project tree with the given files
pub fn project(files: &[&str]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for file in files {
        touch(temp.path(), file);
    }
    temp
}

/// gnu configuration rooted at `root`, using only `lib` as library root
pub fn gnu_config(root: &Path) -> BuildConfiguration {
    BuildConfiguration::new(root)
        .with_library_roots(vec![PathBuf::from("lib")])
        .with_include_dirs(vec![PathBuf::from("lib")])
        .with_toolchain(ToolchainSettings::for_flavor(Flavor::Gnu).with_compiler("c++"))
}

/// Relative paths with `/` separators, for platform-independent comparisons
pub fn slash_paths<'a>(paths: impl IntoIterator<Item = &'a Path>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| {
            p.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .collect()
}

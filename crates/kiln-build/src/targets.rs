/// Link units and build artifacts
use crate::planner::CompileStep;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// How a link unit was declared in the binary root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    /// `bin/<name>.cc`
    File,
    /// `bin/<name>/`
    Directory,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Everything needed to produce one executable
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkUnit {
    /// Executable name
    pub name: String,
    /// Declaration kind
    pub kind: UnitKind,
    /// Compile steps for the binary's own sources
    pub steps: Vec<CompileStep>,
    /// Include directories visible only to this binary's sources
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_includes: Vec<PathBuf>,
    /// Own objects followed by every library object
    pub objects: Vec<PathBuf>,
    /// External libraries in link order
    pub libraries: Vec<String>,
    /// Executable written by the linker
    pub output: PathBuf,
}

impl LinkUnit {
    /// Create a unit with no sources yet
    pub fn new(name: impl Into<String>, kind: UnitKind, output: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            steps: Vec::new(),
            extra_includes: Vec::new(),
            objects: Vec::new(),
            libraries: Vec::new(),
            output: output.into(),
        }
    }

    /// Objects compiled from this unit's own sources
    pub fn own_objects(&self) -> impl Iterator<Item = &PathBuf> {
        self.steps.iter().map(|s| &s.object)
    }

    /// Number of objects passed to the linker
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Validate the unit before linking
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("Link unit name cannot be empty".to_string());
        }

        if self.objects.is_empty() {
            return Err(format!("Link unit '{}' has no objects", self.name));
        }

        Ok(())
    }
}

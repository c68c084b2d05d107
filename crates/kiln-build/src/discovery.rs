//! Source discovery
//!
//! Walks the library roots recursively and enumerates the binary root one level
//! deep. Traversal is sorted by file name at every level so the same tree always
//! yields the same source order, and therefore the same link lines.

use crate::error::{BuildError, BuildResult};
use crate::language::{Language, LanguageSet};
use crate::platform::PlatformFilter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One compilation unit accepted by the suffix and platform filters
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceFile {
    /// Path relative to the project root
    pub path: PathBuf,
    /// Language inferred from the suffix
    pub language: Language,
    /// Platform marker, when the file is platform-specific
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, language: Language) -> Self {
        Self {
            path: path.into(),
            language,
            platform: None,
        }
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }
}

/// Suffix and platform rules applied to every file name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceFilter {
    pub languages: LanguageSet,
    pub platform: PlatformFilter,
}

impl SourceFilter {
    pub fn new(languages: LanguageSet, platform: PlatformFilter) -> Self {
        Self {
            languages,
            platform,
        }
    }

    /// Classify a file; `None` when it is not a candidate
    pub fn classify(&self, path: &Path) -> Option<SourceFile> {
        let file_name = path.file_name()?.to_str()?;
        let language = self.languages.classify(file_name)?;
        if !self.platform.accepts(file_name) {
            return None;
        }

        let source = SourceFile::new(path, language);
        Some(match self.platform.marker_of(file_name) {
            Some(marker) => source.with_platform(marker),
            None => source,
        })
    }
}

/// One immediate entry of the binary root
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BinaryEntry {
    /// A single source file that is a whole program
    File { name: String, source: SourceFile },
    /// A directory whose sources, recursively, form one program
    Directory {
        name: String,
        dir: PathBuf,
        sources: Vec<SourceFile>,
    },
}

impl BinaryEntry {
    /// Executable name
    pub fn name(&self) -> &str {
        match self {
            Self::File { name, .. } | Self::Directory { name, .. } => name,
        }
    }

    /// Path of the entry relative to the project root
    pub fn path(&self) -> &Path {
        match self {
            Self::File { source, .. } => &source.path,
            Self::Directory { dir, .. } => dir,
        }
    }

    /// Sources owned by this binary
    pub fn sources(&self) -> &[SourceFile] {
        match self {
            Self::File { source, .. } => std::slice::from_ref(source),
            Self::Directory { sources, .. } => sources,
        }
    }
}

/// Recursively discover the sources under `root` (relative to `project_root`)
pub fn discover(
    project_root: &Path,
    root: &Path,
    filter: &SourceFilter,
) -> BuildResult<Vec<SourceFile>> {
    let absolute = project_root.join(root);
    ensure_directory(&absolute)?;

    let mut sources = Vec::new();
    for entry in WalkDir::new(&absolute)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| absolute.clone());
            BuildError::discovery(path, e)
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = match entry.path().strip_prefix(&absolute) {
            Ok(rest) => root.join(rest),
            Err(_) => continue,
        };

        if let Some(source) = filter.classify(&relative) {
            sources.push(source);
        }
    }

    Ok(sources)
}

/// Discover the shared sources of every library root, roots in configured order
pub fn discover_library(
    project_root: &Path,
    roots: &[PathBuf],
    filter: &SourceFilter,
) -> BuildResult<Vec<SourceFile>> {
    let mut sources = Vec::new();
    for root in roots {
        sources.extend(discover(project_root, root, filter)?);
    }
    Ok(sources)
}

/// Enumerate the immediate entries of the binary root, sorted by name
///
/// A regular file accepted by the filter is a one-file binary named after the
/// file minus its language extension. A directory is a binary named after the
/// directory. Anything else is ignored.
pub fn enumerate_binaries(
    project_root: &Path,
    binary_root: &Path,
    filter: &SourceFilter,
) -> BuildResult<Vec<BinaryEntry>> {
    let absolute = project_root.join(binary_root);
    ensure_directory(&absolute)?;

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(&absolute).map_err(|e| BuildError::discovery(&absolute, e))? {
        let entry = entry.map_err(|e| BuildError::discovery(&absolute, e))?;
        if let Ok(name) = entry.file_name().into_string() {
            names.push(name);
        }
    }
    names.sort();

    let mut entries = Vec::new();
    for name in names {
        let relative = binary_root.join(&name);
        let full = absolute.join(&name);

        if full.is_dir() {
            let sources = discover(project_root, &relative, filter)?;
            entries.push(BinaryEntry::Directory {
                name,
                dir: relative,
                sources,
            });
        } else if full.is_file() {
            let Some(source) = filter.classify(&relative) else {
                continue;
            };
            let Some(stem) = filter.languages.strip_extension(&name) else {
                continue;
            };
            entries.push(BinaryEntry::File {
                name: stem.to_string(),
                source,
            });
        }
    }

    Ok(entries)
}

fn ensure_directory(path: &Path) -> BuildResult<()> {
    let metadata = fs::metadata(path).map_err(|e| BuildError::discovery(path, e))?;
    if !metadata.is_dir() {
        return Err(BuildError::discovery(path, "not a directory"));
    }
    Ok(())
}

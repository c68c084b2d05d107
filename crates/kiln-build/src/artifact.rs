//! Source path to object artifact mapping
//!
//! Every object lands flat in the build directory. Its name is the source path
//! with separators and commas replaced by `-`, plus the object extension:
//! `lib/gfx/mesh.cc` becomes `build/lib-gfx-mesh.cc.o`.
//!
//! The flattening is lossy: `lib/a-b.cc` and `lib/a/b.cc` both flatten to
//! `lib-a-b.cc`. [`ArtifactMap::plan`] detects such groups and gives each member a
//! short digest of its original path, so planned objects are always distinct.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Character that replaces separators in flattened names
pub const FLATTEN_CHAR: char = '-';

/// Hex digits of the digest used for the first disambiguation attempt
const SHORT_DIGEST_LEN: usize = 8;

/// Flatten a source path into a single file name component
pub fn flatten_source_path(path: &Path) -> String {
    path.to_string_lossy()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ',' => FLATTEN_CHAR,
            other => other,
        })
        .collect()
}

/// Object path for a source, ignoring any collision with other sources
pub fn object_path(build_dir: &Path, source: &Path, extension: &str) -> PathBuf {
    build_dir.join(format!("{}.{}", flatten_source_path(source), extension))
}

/// Sources whose flattened names coincide
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collision {
    pub flattened: String,
    pub sources: Vec<PathBuf>,
}

/// Collision-free object assignment for a whole set of sources
#[derive(Debug, Clone, Default)]
pub struct ArtifactMap {
    objects: BTreeMap<PathBuf, PathBuf>,
    collisions: Vec<Collision>,
}

impl ArtifactMap {
    /// Assign an object path to every distinct source
    ///
    /// The result depends only on the set of sources, not on their order.
    pub fn plan<'a>(
        build_dir: &Path,
        extension: &str,
        sources: impl IntoIterator<Item = &'a Path>,
    ) -> Self {
        let sources: BTreeSet<&Path> = sources.into_iter().collect();

        // 0 = plain name, 1 = short digest, 2 = full digest
        let mut levels: BTreeMap<&Path, u8> = sources.iter().map(|s| (*s, 0)).collect();
        let mut collisions = Vec::new();

        loop {
            let mut by_name: BTreeMap<String, Vec<&Path>> = BTreeMap::new();
            for (source, level) in &levels {
                by_name
                    .entry(file_name(source, extension, *level))
                    .or_default()
                    .push(*source);
            }

            let mut bumped = false;
            for group in by_name.values().filter(|g| g.len() > 1) {
                if group.iter().all(|s| levels[s] == 0) {
                    collisions.push(Collision {
                        flattened: flatten_source_path(group[0]),
                        sources: group.iter().map(|s| s.to_path_buf()).collect(),
                    });
                }
                for source in group {
                    if let Some(level) = levels.get_mut(source) {
                        if *level < 2 {
                            *level += 1;
                            bumped = true;
                        }
                    }
                }
            }

            if !bumped {
                break;
            }
        }

        let objects = levels
            .into_iter()
            .map(|(source, level)| {
                (
                    source.to_path_buf(),
                    build_dir.join(file_name(source, extension, level)),
                )
            })
            .collect();

        Self {
            objects,
            collisions,
        }
    }

    /// Object path assigned to a source
    pub fn object_for(&self, source: &Path) -> Option<&Path> {
        self.objects.get(source).map(PathBuf::as_path)
    }

    /// Groups of sources that needed disambiguation
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Iterate `(source, object)` pairs in source order
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.objects
            .iter()
            .map(|(s, o)| (s.as_path(), o.as_path()))
    }
}

fn file_name(source: &Path, extension: &str, level: u8) -> String {
    let flattened = flatten_source_path(source);
    match level {
        0 => format!("{}.{}", flattened, extension),
        1 => format!(
            "{}.{}.{}",
            flattened,
            &path_digest(source)[..SHORT_DIGEST_LEN],
            extension
        ),
        _ => format!("{}.{}.{}", flattened, path_digest(source), extension),
    }
}

fn path_digest(path: &Path) -> String {
    let digest = Sha256::digest(path.to_string_lossy().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

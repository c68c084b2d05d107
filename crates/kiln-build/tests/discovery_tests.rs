//! Source discovery against synthetic trees

mod common;

use common::{project, slash_paths};
use kiln_build::{
    discover, discover_library, enumerate_binaries, BinaryEntry, BuildError, Language,
    LanguageSet, PlatformFilter, SourceFilter,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::path::{Path, PathBuf};

const TREE: &[&str] = &[
    "lib/a.cc",
    "lib/a.good.cc",
    "lib/io.posix.cc",
    "lib/win.windows.cc",
    "lib/notes.txt",
    "lib/a.h",
    "lib/sub/b.c",
    "lib/sub/b.cpp",
];

fn filter(active: &[&str]) -> SourceFilter {
    SourceFilter::new(
        LanguageSet::all(),
        PlatformFilter::new(["posix", "windows"], active.iter().copied()),
    )
}

fn discovered(filter: &SourceFilter) -> Vec<String> {
    let temp = project(TREE);
    let sources = discover(temp.path(), Path::new("lib"), filter).unwrap();
    slash_paths(sources.iter().map(|s| s.path.as_path()))
}

#[rstest]
#[case::target_is_marker_platform(
    &["posix"],
    &["lib/a.cc", "lib/a.good.cc", "lib/io.posix.cc", "lib/sub/b.c"]
)]
#[case::target_is_other_platform(
    &["windows"],
    &["lib/a.cc", "lib/a.good.cc", "lib/sub/b.c", "lib/win.windows.cc"]
)]
#[case::no_active_marker(&[], &["lib/a.cc", "lib/a.good.cc", "lib/sub/b.c"])]
fn test_discovery_per_platform(#[case] active: &[&str], #[case] expected: &[&str]) {
    assert_eq!(discovered(&filter(active)), expected);
}

#[test]
fn test_language_family_is_configurable() {
    let cxx_only = SourceFilter::new(
        LanguageSet::new([Language::Cxx]),
        PlatformFilter::new(["posix"], ["posix"]),
    );
    assert_eq!(
        discovered(&cxx_only),
        vec!["lib/a.cc", "lib/a.good.cc", "lib/io.posix.cc"]
    );

    let c_only = SourceFilter::new(LanguageSet::new([Language::C]), PlatformFilter::none());
    assert_eq!(discovered(&c_only), vec!["lib/sub/b.c"]);
}

#[test]
fn test_discovery_is_repeatable() {
    let f = filter(&["posix"]);
    assert_eq!(discovered(&f), discovered(&f));
}

#[test]
fn test_library_roots_in_configured_order() {
    let temp = project(&["lib/z.cc", "third-party/a.cc"]);
    let roots = vec![PathBuf::from("third-party"), PathBuf::from("lib")];
    let sources = discover_library(temp.path(), &roots, &filter(&[])).unwrap();

    assert_eq!(
        slash_paths(sources.iter().map(|s| s.path.as_path())),
        vec!["third-party/a.cc", "lib/z.cc"]
    );
}

#[test]
fn test_missing_library_root_is_fatal() {
    let temp = project(&["lib/a.cc"]);
    let roots = vec![PathBuf::from("lib"), PathBuf::from("third-party")];
    let err = discover_library(temp.path(), &roots, &filter(&[])).unwrap_err();
    assert!(matches!(err, BuildError::Discovery { .. }));
}

#[test]
fn test_binary_root_entries() {
    let temp = project(&[
        "bin/x.cc",
        "bin/y/z.cc",
        "bin/y/ui/w.cc",
        "bin/y/notes.md",
        "bin/readme.txt",
        "bin/net.windows.cc",
    ]);
    let entries = enumerate_binaries(temp.path(), Path::new("bin"), &filter(&["posix"])).unwrap();

    let names: Vec<_> = entries.iter().map(|e| e.name()).collect();
    assert_eq!(names, vec!["x", "y"]);

    match &entries[1] {
        BinaryEntry::Directory { dir, sources, .. } => {
            assert_eq!(slash_paths([dir.as_path()]), vec!["bin/y"]);
            assert_eq!(
                slash_paths(sources.iter().map(|s| s.path.as_path())),
                vec!["bin/y/ui/w.cc", "bin/y/z.cc"]
            );
        }
        other => panic!("expected a directory entry, got {:?}", other),
    }
}

#[test]
fn test_empty_binary_directory_is_still_an_entry() {
    let temp = project(&["bin/empty/readme.md"]);
    let entries = enumerate_binaries(temp.path(), Path::new("bin"), &filter(&[])).unwrap();
    assert_eq!(entries.len(), 1);
    assert!(entries[0].sources().is_empty());
}

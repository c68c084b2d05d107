//! Planning: object mapping, binary grouping and the library invariant

mod common;

use common::{gnu_config, project, slash_paths};
use kiln_build::{
    flatten_source_path, object_path, ArtifactMap, BuildPlan, Builder, LanguageSet, OutputMode,
    PlatformFilter, SourceFilter, UnitKind,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

fn file_names<'a>(paths: impl IntoIterator<Item = &'a PathBuf>) -> Vec<String> {
    paths
        .into_iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

fn non_posix() -> SourceFilter {
    SourceFilter::new(LanguageSet::all(), PlatformFilter::for_os("windows"))
}

#[test]
fn test_object_path_is_deterministic() {
    let source = Path::new("lib/gfx/mesh.cc");
    assert_eq!(
        object_path(Path::new("build"), source, "obj"),
        object_path(Path::new("build"), source, "obj")
    );
    assert_eq!(
        object_path(Path::new("build"), source, "obj"),
        PathBuf::from("build").join("lib-gfx-mesh.cc.obj")
    );
}

#[test]
fn test_binary_grouping() {
    let temp = project(&["lib/a.cc", "lib/b.cc", "bin/x.cc", "bin/y/p/one.cc", "bin/y/q/two.cc"]);
    let config = gnu_config(temp.path());
    let plan = BuildPlan::create(&config).unwrap();
    let shared = plan.library.len();

    assert_eq!(plan.units.len(), 2);

    let x = plan.unit("x").unwrap();
    assert_eq!(x.kind, UnitKind::File);
    assert_eq!(x.object_count(), 1 + shared);
    assert!(x.extra_includes.is_empty());
    assert!(x.steps.iter().all(|s| s.extra_includes.is_empty()));

    let y = plan.unit("y").unwrap();
    assert_eq!(y.kind, UnitKind::Directory);
    assert_eq!(y.object_count(), 2 + shared);
    assert_eq!(slash_paths(y.extra_includes.iter().map(|p| p.as_path())), vec!["bin/y"]);
    assert!(y.steps.iter().all(|s| s.extra_includes == y.extra_includes));

    assert!(plan.library.iter().all(|s| s.extra_includes.is_empty()));
}

#[test]
fn test_every_unit_links_whole_library() {
    let temp = project(&[
        "lib/a.cc",
        "lib/deep/er/b.c",
        "bin/one.cc",
        "bin/two.c",
        "bin/three/main.cc",
    ]);
    let config = gnu_config(temp.path());
    let plan = BuildPlan::create(&config).unwrap();
    let library: BTreeSet<&Path> = plan.library_objects().collect();

    assert_eq!(library.len(), 2);
    for unit in &plan.units {
        let objects: BTreeSet<&Path> = unit.objects.iter().map(|p| p.as_path()).collect();
        assert!(objects.is_superset(&library), "unit {} misses library objects", unit.name);

        let own: Vec<&PathBuf> = unit.own_objects().collect();
        let head: Vec<&PathBuf> = unit.objects.iter().take(own.len()).collect();
        assert_eq!(own, head, "own objects must come first");
    }
}

#[test]
fn test_end_to_end_scenario() {
    let temp = project(&["lib/a.good.cc", "lib/b.posix.cc", "bin/x.cc", "bin/y/z.cc"]);
    let config = gnu_config(temp.path()).with_filter(non_posix());
    let plan = BuildPlan::create(&config).unwrap();

    assert_eq!(
        slash_paths(plan.library.iter().map(|s| s.source.path.as_path())),
        vec!["lib/a.good.cc"]
    );

    let x = plan.unit("x").unwrap();
    assert_eq!(file_names(&x.objects), vec!["bin-x.cc.o", "lib-a.good.cc.o"]);
    let y = plan.unit("y").unwrap();
    assert_eq!(file_names(&y.objects), vec!["bin-y-z.cc.o", "lib-a.good.cc.o"]);

    let invoker = common::RecordingInvoker::new();
    let report = Builder::new(&config)
        .with_output(OutputMode::Quiet)
        .build(&invoker)
        .unwrap();

    assert!(report.succeeded());
    assert_eq!(invoker.linked(), vec!["x", "y"]);
    let executables: Vec<PathBuf> = report.executables().map(Path::to_path_buf).collect();
    assert_eq!(file_names(&executables), vec!["x", "y"]);
}

#[test]
fn test_plain_flattening_collides() {
    let a = flatten_source_path(Path::new("lib/a-b.cc"));
    let b = flatten_source_path(Path::new("lib/a/b.cc"));
    let c = flatten_source_path(Path::new("lib/a,b.cc"));
    assert_eq!(a, b);
    assert_eq!(b, c);
}

#[test]
fn test_colliding_sources_get_distinct_objects_in_plan() {
    let temp = project(&["lib/a-b.cc", "lib/a/b.cc", "bin/x.cc"]);
    let config = gnu_config(temp.path());
    let plan = BuildPlan::create(&config).unwrap();

    assert_eq!(plan.collisions.len(), 1);
    let objects: BTreeSet<_> = plan.library_objects().collect();
    assert_eq!(objects.len(), 2);
}

fn segment() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["a", "b", "a-b", "a,b", "-", "b,", "a.b"]).prop_map(String::from)
}

fn source_path() -> impl Strategy<Value = PathBuf> {
    prop::collection::vec(segment(), 1..4)
        .prop_map(|segments| PathBuf::from(format!("lib/{}.cc", segments.join("/"))))
}

proptest! {
    #[test]
    fn prop_planned_objects_are_distinct(sources in prop::collection::vec(source_path(), 1..16)) {
        let map = ArtifactMap::plan(Path::new("build"), "o", sources.iter().map(|p| p.as_path()));
        let distinct_sources: BTreeSet<&PathBuf> = sources.iter().collect();
        let objects: BTreeSet<&Path> = map.iter().map(|(_, object)| object).collect();

        prop_assert_eq!(map.len(), distinct_sources.len());
        prop_assert_eq!(objects.len(), distinct_sources.len());
    }

    #[test]
    fn prop_plan_is_a_function_of_the_source_set(sources in prop::collection::vec(source_path(), 1..12)) {
        let forward = ArtifactMap::plan(Path::new("build"), "o", sources.iter().map(|p| p.as_path()));
        let backward = ArtifactMap::plan(Path::new("build"), "o", sources.iter().rev().map(|p| p.as_path()));

        for source in &sources {
            prop_assert_eq!(forward.object_for(source), backward.object_for(source));
        }
    }

    #[test]
    fn prop_collisions_only_reported_for_equal_flattenings(sources in prop::collection::vec(source_path(), 1..12)) {
        let map = ArtifactMap::plan(Path::new("build"), "o", sources.iter().map(|p| p.as_path()));
        for collision in map.collisions() {
            prop_assert!(collision.sources.len() > 1);
            for source in &collision.sources {
                prop_assert_eq!(flatten_source_path(source), collision.flattened.clone());
            }
        }
    }
}

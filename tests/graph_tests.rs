//! Unit tests for target graph structures.

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use linkrun::ast::{LinkagePolicy, TargetKind};
use linkrun::graph::{
    BuildContext, LinkEdge, LinkageConfig, Target, TargetGraph, TestCase,
};
use linkrun::{linkage, manifest};
use rstest::rstest;
use test_support::manifest_yaml;

fn shared_lib(name: &str, out_dir: &str) -> Target {
    Target {
        name: name.to_owned(),
        kind: TargetKind::SharedLibrary,
        sources: vec![Utf8PathBuf::from(format!("{name}.c"))],
        links: Vec::new(),
        out_dir: Utf8PathBuf::from(out_dir),
    }
}

#[rstest]
fn artifact_path_joins_output_dir_and_name() {
    let lib = shared_lib("lib1", "build/lib1");
    assert_eq!(lib.artifact_path(), Utf8PathBuf::from("build/lib1/lib1"));
}

#[rstest]
fn graph_is_queryable_by_target_and_test_name() {
    let lib = shared_lib("lib1", "build/lib1");
    let test = TestCase {
        name: "smoke".to_owned(),
        target: "lib1".to_owned(),
        env: IndexMap::new(),
    };
    let graph = TargetGraph {
        targets: IndexMap::from([("lib1".to_owned(), lib)]),
        tests: vec![test],
        linkage: LinkageConfig {
            policy: LinkagePolicy::Embed,
            search_path_var: linkage::SEARCH_PATH_VAR.to_owned(),
        },
    };
    assert!(graph.get("lib1").is_some());
    assert!(graph.get("ghost").is_none());
    assert!(graph.get_test("smoke").is_some());
    assert!(graph.get_test("ghost").is_none());
}

#[rstest]
fn link_edges_carry_their_runtime_flag() {
    let edge = LinkEdge {
        target: "lib1".to_owned(),
        runtime: true,
    };
    assert!(edge.runtime);
    assert!(TargetKind::SharedLibrary.needs_runtime_lookup());
    assert!(!TargetKind::StaticLibrary.needs_runtime_lookup());
    assert!(!TargetKind::Executable.needs_runtime_lookup());
}

#[rstest]
fn search_path_variable_defaults_to_the_platform() {
    let yaml = manifest_yaml("targets:\n  - name: lib1\n    kind: shared-library\n    sources: lib1.c\n");
    let parsed = manifest::from_str_named(&yaml, "fixture").expect("parse");
    let graph = TargetGraph::from_manifest(&parsed, &BuildContext::new("build".into()))
        .expect("graph");
    assert_eq!(graph.linkage.search_path_var, linkage::SEARCH_PATH_VAR);
}

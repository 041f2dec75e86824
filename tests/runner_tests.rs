//! Behavioural tests for test invocation and command dispatch.
//!
//! These tests scaffold a `Linkfile` plus fake build artifacts in a
//! temporary tree and drive [`runner::run`] directly.

use std::fs;
use std::path::{Path, PathBuf};

use linkrun::ast::LinkagePolicy;
use linkrun::cli::{Cli, Commands, TestArgs};
use linkrun::graph::{BuildContext, TargetGraph};
use linkrun::runner::{self, RunnerError};
use rstest::rstest;
use tempfile::TempDir;
use test_support::manifest_yaml;

fn cli_in(dir: &Path, command: Commands) -> Cli {
    Cli {
        file: PathBuf::from("Linkfile"),
        directory: Some(dir.to_path_buf()),
        build_dir: PathBuf::from("build"),
        jobs: None,
        runtime_lookup: None,
        verbose: false,
        command: Some(command),
    }
}

fn run_all(dir: &Path) -> anyhow::Result<()> {
    runner::run(&cli_in(dir, Commands::Test(TestArgs { tests: Vec::new() })))
}

fn scaffold(body: &str) -> (TempDir, PathBuf) {
    let temp = TempDir::new().expect("temp dir");
    let manifest_path = temp.path().join("Linkfile");
    fs::write(&manifest_path, manifest_yaml(body)).expect("write Linkfile");
    let root = temp.path().to_path_buf();
    (temp, root)
}

const SINGLE_TEST: &str = concat!(
    "targets:\n",
    "  - name: prog\n",
    "    kind: executable\n",
    "    sources: main.c\n",
    "tests:\n",
    "  - name: smoke\n",
    "    target: prog\n",
);

#[rstest]
fn missing_manifest_aborts_the_run() {
    let temp = TempDir::new().expect("temp dir");
    let err = run_all(temp.path()).expect_err("run should fail");
    let runner_err = err.downcast_ref::<RunnerError>().expect("runner error");
    assert!(matches!(runner_err, RunnerError::ManifestNotFound { .. }));
}

#[rstest]
fn unknown_test_name_aborts_the_run() {
    let (_temp, root) = scaffold(SINGLE_TEST);
    let cli = cli_in(
        &root,
        Commands::Test(TestArgs {
            tests: vec!["ghost".to_owned()],
        }),
    );
    let err = runner::run(&cli).expect_err("run should fail");
    let runner_err = err.downcast_ref::<RunnerError>().expect("runner error");
    assert!(matches!(runner_err, RunnerError::UnknownTest { .. }));
}

#[rstest]
fn missing_artifact_fails_the_test_case() {
    let (_temp, root) = scaffold(SINGLE_TEST);
    let err = run_all(&root).expect_err("run should fail");
    assert!(err.to_string().contains("1 of 1"));
}

#[cfg(unix)]
mod unix {
    use super::*;
    use camino::Utf8Path;
    use test_support::write_script;

    fn utf8_root(root: &Path) -> &Utf8Path {
        Utf8Path::from_path(root).expect("utf8 root")
    }

    #[rstest]
    #[case(0, true)]
    #[case(1, false)]
    fn exit_code_decides_the_outcome(#[case] code: i32, #[case] succeeds: bool) {
        let (_temp, root) = scaffold(SINGLE_TEST);
        write_script(
            utf8_root(&root),
            "build/prog/prog",
            &format!("#!/bin/sh\nexit {code}\n"),
        )
        .expect("artifact");
        assert_eq!(run_all(&root).is_ok(), succeeds);
    }

    #[rstest]
    fn sibling_tests_still_run_after_a_missing_artifact() {
        let body = concat!(
            "targets:\n",
            "  - name: broken\n",
            "    kind: executable\n",
            "    sources: broken.c\n",
            "  - name: healthy\n",
            "    kind: executable\n",
            "    sources: healthy.c\n",
            "tests:\n",
            "  - name: first\n",
            "    target: broken\n",
            "  - name: second\n",
            "    target: healthy\n",
        );
        let (_temp, root) = scaffold(body);
        let marker = root.join("second-ran");
        write_script(
            utf8_root(&root),
            "build/healthy/healthy",
            &format!("#!/bin/sh\ntouch {}\nexit 0\n", marker.display()),
        )
        .expect("artifact");

        let err = run_all(&root).expect_err("run should fail");
        assert!(err.to_string().contains("1 of 2"));
        assert!(marker.exists(), "healthy test should have run");
    }

    #[rstest]
    fn declared_env_reaches_the_child_process() {
        let body = concat!(
            "targets:\n",
            "  - name: lib1\n",
            "    kind: shared-library\n",
            "    sources: lib1.c\n",
            "  - name: lib2\n",
            "    kind: shared-library\n",
            "    sources: lib2.c\n",
            "  - name: prog\n",
            "    kind: executable\n",
            "    sources: main.c\n",
            "    links: lib1\n",
            "tests:\n",
            "  - name: runtime-lookup\n",
            "    target: prog\n",
            "    env:\n",
            "      LD_LIBRARY_PATH: ${outdir:lib2}\n",
        );
        let (_temp, root) = scaffold(body);
        let lib2_dir = root.join("build").join("lib2");
        write_script(
            utf8_root(&root),
            "build/prog/prog",
            &format!(
                "#!/bin/sh\n[ \"$LD_LIBRARY_PATH\" = \"{}\" ] || exit 1\nexit 0\n",
                lib2_dir.display(),
            ),
        )
        .expect("artifact");

        run_all(&root).expect("run should pass");
    }

    #[rstest]
    fn external_policy_supplies_linked_directories() {
        let body = concat!(
            "linkage:\n",
            "  policy: external\n",
            "  search_path_var: LD_LIBRARY_PATH\n",
            "targets:\n",
            "  - name: lib1\n",
            "    kind: shared-library\n",
            "    sources: lib1.c\n",
            "  - name: prog\n",
            "    kind: executable\n",
            "    sources: main.c\n",
            "    links: lib1\n",
            "tests:\n",
            "  - name: lookup\n",
            "    target: prog\n",
        );
        let (_temp, root) = scaffold(body);
        let lib1_dir = root.join("build").join("lib1");
        write_script(
            utf8_root(&root),
            "build/prog/prog",
            &format!(
                concat!(
                    "#!/bin/sh\n",
                    "case \"$LD_LIBRARY_PATH\" in\n",
                    "  \"{}\"*) exit 0 ;;\n",
                    "esac\n",
                    "exit 1\n",
                ),
                lib1_dir.display(),
            ),
        )
        .expect("artifact");

        run_all(&root).expect("run should pass");
    }

    #[rstest]
    fn parallel_workers_complete_every_case() {
        let body = concat!(
            "targets:\n",
            "  - name: prog\n",
            "    kind: executable\n",
            "    sources: main.c\n",
            "tests:\n",
            "  - name: one\n",
            "    target: prog\n",
            "  - name: two\n",
            "    target: prog\n",
            "  - name: three\n",
            "    target: prog\n",
        );
        let (_temp, root) = scaffold(body);
        write_script(utf8_root(&root), "build/prog/prog", "#!/bin/sh\nexit 0\n")
            .expect("artifact");

        let mut cli = cli_in(&root, Commands::Test(TestArgs { tests: Vec::new() }));
        cli.jobs = Some(2);
        runner::run(&cli).expect("run should pass");
    }
}

#[rstest]
fn plan_command_writes_invocation_specs() {
    let (_temp, root) = scaffold(SINGLE_TEST);
    let cli = cli_in(
        &root,
        Commands::Plan {
            file: PathBuf::from("plan.json"),
        },
    );
    runner::run(&cli).expect("plan should succeed");

    let raw = fs::read_to_string(root.join("plan.json")).expect("read plan");
    let specs: serde_json::Value = serde_json::from_str(&raw).expect("parse plan");
    let spec = specs.get(0).expect("one spec");
    assert_eq!(spec.get("test").and_then(|v| v.as_str()), Some("smoke"));
    assert_eq!(spec.get("target").and_then(|v| v.as_str()), Some("prog"));
    let executable = spec
        .get("executable")
        .and_then(|v| v.as_str())
        .expect("executable path");
    assert!(executable.ends_with("build/prog/prog"));
    assert!(spec.get("environment").is_some());
}

#[rstest]
fn invocation_specs_expose_executable_and_environment() {
    let yaml = manifest_yaml(concat!(
        "targets:\n",
        "  - name: lib1\n",
        "    kind: shared-library\n",
        "    sources: lib1.c\n",
        "  - name: prog\n",
        "    kind: executable\n",
        "    sources: main.c\n",
        "    links: lib1\n",
        "tests:\n",
        "  - name: smoke\n",
        "    target: prog\n",
        "    env:\n",
        "      FIXTURE_FLAG: on\n",
    ));
    let parsed = linkrun::manifest::from_str_named(&yaml, "fixture").expect("parse");
    let context = BuildContext::new("build".into());
    let graph = TargetGraph::from_manifest(&parsed, &context).expect("graph");

    let specs = runner::invocation_specs(&graph, LinkagePolicy::Embed);
    assert_eq!(specs.len(), 1);
    assert_eq!(specs[0].executable.as_str(), "build/prog/prog");
    assert_eq!(
        specs[0].embedded_paths,
        vec![camino::Utf8PathBuf::from("build/lib1")],
    );
    assert_eq!(
        specs[0].environment.get("FIXTURE_FLAG").map(String::as_str),
        Some("on"),
    );
}

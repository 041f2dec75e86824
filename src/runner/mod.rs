//! CLI execution and test dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! loads the manifest, finalises the target graph, and dispatches the
//! requested command: running test cases, emitting the resolved invocation
//! plan, or rendering the graph.

mod environment;
mod error;
mod path_helpers;
mod process;

pub use environment::{compose_environment, compose_with};
pub use error::{InvocationError, RunnerError};

use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::ast::LinkagePolicy;
use crate::cli::{Cli, Commands, TestArgs};
use crate::graph::{BuildContext, TargetGraph, TestCase};
use crate::linkage::{self, LinkPlan};
use crate::{dot_gen, manifest};

use path_helpers::{resolve_build_dir, resolve_manifest_path, resolve_output_path};

/// A fully resolved test invocation: the executable to run, the environment
/// it runs under, and the search paths the build step would embed.
#[derive(Debug, Clone, Serialize)]
pub struct InvocationSpec {
    /// Name of the test case.
    pub test: String,
    /// Name of the target under test.
    pub target: String,
    /// Expected location of the executable artifact.
    pub executable: Utf8PathBuf,
    /// Directories the build step bakes into the binary's runtime search
    /// metadata; recorded for the plan output, never in the environment.
    pub embedded_paths: Vec<Utf8PathBuf>,
    /// Composed child environment.
    pub environment: IndexMap<String, String>,
}

/// Terminal state of a finished test case.
#[derive(Debug)]
pub enum TestOutcome {
    /// The child exited with code zero.
    Passed,
    /// The child exited with a non-zero code or was terminated by a signal.
    ExitFailure {
        /// Exit code, when one was reported.
        code: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The invocation failed before an exit status could be observed.
    Error(InvocationError),
}

/// Outcome of one test case, labelled for the summary.
#[derive(Debug)]
pub struct TestReport {
    /// Name of the test case.
    pub name: String,
    /// Terminal state.
    pub outcome: TestOutcome,
}

impl TestReport {
    /// Whether the test case reached the passing terminal state.
    #[must_use]
    pub const fn passed(&self) -> bool {
        matches!(self.outcome, TestOutcome::Passed)
    }
}

/// Execute the parsed [`Cli`] commands.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the declaration set
/// fails validation, or any executed test case fails.
pub fn run(cli: &Cli) -> Result<()> {
    let manifest_path = resolve_manifest_path(cli)?;
    if !manifest_path.as_std_path().exists() {
        return Err(RunnerError::ManifestNotFound {
            path: manifest_path,
        }
        .into());
    }

    let manifest = manifest::from_path(&manifest_path)
        .with_context(|| format!("loading Linkfile from {manifest_path}"))?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let ast_json =
            serde_json::to_string_pretty(&manifest).context("serialising manifest AST")?;
        debug!("AST:\n{ast_json}");
    }

    let context = BuildContext::new(resolve_build_dir(cli)?);
    let graph = TargetGraph::from_manifest(&manifest, &context)
        .context("validating target declarations")?;
    let policy = cli.runtime_lookup.unwrap_or(graph.linkage.policy);

    let command = cli
        .command
        .clone()
        .unwrap_or(Commands::Test(TestArgs { tests: Vec::new() }));
    match command {
        Commands::Test(args) => run_tests(cli, &graph, policy, &args),
        Commands::Plan { file } => {
            let specs = invocation_specs(&graph, policy);
            let json =
                serde_json::to_string_pretty(&specs).context("serialising invocation specs")?;
            if is_stdout_path(&file) {
                write_stdout(&json)?;
                write_stdout("\n")?;
            } else {
                let out_path = resolve_output_path(cli, file.as_path());
                write_text_file(out_path.as_ref(), &json)?;
            }
            Ok(())
        }
        Commands::Graph => write_stdout(&dot_gen::generate(&graph)),
    }
}

/// Resolve every declared test case into an invocation spec.
///
/// This is the interface handed to a build executor: for each test, the
/// executable path and the environment it must be spawned with.
#[must_use]
pub fn invocation_specs(graph: &TargetGraph, policy: LinkagePolicy) -> Vec<InvocationSpec> {
    graph
        .tests
        .iter()
        .filter_map(|test| spec_for(graph, test, policy))
        .collect()
}

fn spec_for(graph: &TargetGraph, test: &TestCase, policy: LinkagePolicy) -> Option<InvocationSpec> {
    let Some(target) = graph.get(&test.target) else {
        debug_assert!(false, "finalised graph must resolve every test target");
        return None;
    };
    let plan = linkage::resolve(graph, target, policy);
    let environment = compose_environment(test, &plan, &graph.linkage.search_path_var);
    let LinkPlan { embedded, .. } = plan;
    Some(InvocationSpec {
        test: test.name.clone(),
        target: target.name.clone(),
        executable: target.artifact_path(),
        embedded_paths: embedded,
        environment,
    })
}

/// Run the selected test cases and print a summary line per case.
///
/// Invocation failures are scoped to their test case; the remaining cases
/// still run. The whole command fails when any case fails.
fn run_tests(
    cli: &Cli,
    graph: &TargetGraph,
    policy: LinkagePolicy,
    args: &TestArgs,
) -> Result<()> {
    let selected = select_tests(graph, &args.tests)?;
    if selected.is_empty() {
        write_stdout("no test cases declared\n")?;
        return Ok(());
    }

    let specs: Vec<InvocationSpec> = selected
        .iter()
        .filter_map(|test| spec_for(graph, test, policy))
        .collect();
    let jobs = cli.jobs.unwrap_or(1).min(specs.len()).max(1);
    info!(cases = specs.len(), jobs, "running test cases");

    let reports = execute_all(&specs, jobs);
    let mut failed = 0usize;
    for report in &reports {
        write_stdout(&format_report(report))?;
        if !report.passed() {
            failed += 1;
        }
    }
    write_stdout(&format!(
        "{} passed, {failed} failed\n",
        reports.len() - failed,
    ))?;

    if failed > 0 {
        bail!("{failed} of {} test cases failed", reports.len());
    }
    Ok(())
}

fn select_tests<'a>(
    graph: &'a TargetGraph,
    names: &[String],
) -> Result<Vec<&'a TestCase>, RunnerError> {
    if names.is_empty() {
        return Ok(graph.tests.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            graph
                .get_test(name)
                .ok_or_else(|| RunnerError::UnknownTest { name: name.clone() })
        })
        .collect()
}

/// Run the specs on `jobs` worker threads, pulling work from a shared
/// cursor. Reports are returned in spec order regardless of completion
/// order.
fn execute_all(specs: &[InvocationSpec], jobs: usize) -> Vec<TestReport> {
    let cursor = AtomicUsize::new(0);
    let reports: Mutex<Vec<(usize, TestReport)>> = Mutex::new(Vec::with_capacity(specs.len()));

    thread::scope(|scope| {
        for _ in 0..jobs {
            scope.spawn(|| {
                loop {
                    let idx = cursor.fetch_add(1, Ordering::SeqCst);
                    let Some(spec) = specs.get(idx) else { break };
                    let report = execute_one(spec);
                    match reports.lock() {
                        Ok(mut guard) => guard.push((idx, report)),
                        Err(poisoned) => poisoned.into_inner().push((idx, report)),
                    }
                }
            });
        }
    });

    let mut collected = reports
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    collected.sort_by_key(|(idx, _)| *idx);
    collected.into_iter().map(|(_, report)| report).collect()
}

fn execute_one(spec: &InvocationSpec) -> TestReport {
    let outcome = match process::invoke(spec) {
        Ok(output) if output.status.success() => TestOutcome::Passed,
        Ok(output) => TestOutcome::ExitFailure {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        },
        Err(err) => TestOutcome::Error(err),
    };
    TestReport {
        name: spec.test.clone(),
        outcome,
    }
}

fn format_report(report: &TestReport) -> String {
    match &report.outcome {
        TestOutcome::Passed => format!("PASS {}\n", report.name),
        TestOutcome::ExitFailure {
            code,
            stdout,
            stderr,
        } => {
            let mut text = match code {
                Some(value) => format!("FAIL {} (exit code {value})\n", report.name),
                None => format!("FAIL {} (terminated by signal)\n", report.name),
            };
            append_stream(&mut text, "stdout", stdout);
            append_stream(&mut text, "stderr", stderr);
            text
        }
        TestOutcome::Error(err) => format!("FAIL {} ({err})\n", report.name),
    }
}

fn append_stream(text: &mut String, stream_name: &str, content: &str) {
    if content.is_empty() {
        return;
    }
    text.push_str("  ");
    text.push_str(stream_name);
    text.push_str(":\n");
    for line in content.lines() {
        text.push_str("    ");
        text.push_str(line);
        text.push('\n');
    }
}

/// Return `true` when `path` is the CLI sentinel indicating "write to
/// stdout".
#[must_use]
fn is_stdout_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn write_text_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("writing plan to {}", path.display()))?;
    info!("Wrote plan to {}", path.display());
    Ok(())
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn write_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    match stdout.write_all(text.as_bytes()) {
        Ok(()) => {}
        Err(err) if is_broken_pipe(&err) => return Ok(()),
        Err(err) => return Err(err).context("writing to stdout"),
    }
    match stdout.flush() {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err).context("flushing stdout"),
    }
}

//! Error types for the runner module.

use std::io;

use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised during command execution that abort the whole run.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The manifest file does not exist at the expected path.
    #[error("no Linkfile found at {path}")]
    #[diagnostic(
        code(linkrun::runner::manifest_not_found),
        help("pass --file to point at a manifest, or -C to change directory")
    )]
    ManifestNotFound {
        /// The path that was attempted.
        path: Utf8PathBuf,
    },

    /// A test case named on the command line is not declared.
    #[error("no test case named {name}")]
    #[diagnostic(code(linkrun::runner::unknown_test))]
    UnknownTest {
        /// The undeclared name.
        name: String,
    },
}

/// Errors scoped to a single test invocation.
///
/// These fail the affected test case only; sibling test runs continue.
#[derive(Debug, Error, Diagnostic)]
pub enum InvocationError {
    /// The target's expected output artifact does not exist.
    #[error("output artifact {path} for target {target} does not exist")]
    #[diagnostic(
        code(linkrun::runner::missing_output),
        help("run the build step that produces the artifact first")
    )]
    MissingOutput {
        /// The target under test.
        target: String,
        /// The expected artifact location.
        path: Utf8PathBuf,
    },

    /// The OS failed to exec the target binary.
    #[error("failed to spawn {program}")]
    #[diagnostic(code(linkrun::runner::spawn))]
    Spawn {
        /// The binary that failed to start.
        program: Utf8PathBuf,
        /// Underlying OS failure.
        #[source]
        source: io::Error,
    },

    /// The child started but its streams or exit status were lost.
    #[error("failed to capture output from {program}")]
    #[diagnostic(code(linkrun::runner::stream))]
    Stream {
        /// The binary whose output could not be captured.
        program: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

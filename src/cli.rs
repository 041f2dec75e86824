//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::ast::LinkagePolicy;

/// Maximum number of parallel test processes accepted by the CLI.
const MAX_JOBS: usize = 64;

fn parse_jobs(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("{s} is not a valid number"))?;
    if (1..=MAX_JOBS).contains(&value) {
        Ok(value)
    } else {
        Err(format!("jobs must be between 1 and {MAX_JOBS}"))
    }
}

/// A declarative build-graph resolver and runtime library path test harness.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the Linkfile manifest to use.
    #[arg(short, long, value_name = "FILE", default_value = "Linkfile")]
    pub file: PathBuf,

    /// Change to this directory before doing anything.
    #[arg(short = 'C', long, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Root directory for build outputs.
    #[arg(long, value_name = "DIR", default_value = "build")]
    pub build_dir: PathBuf,

    /// Set the number of test processes run in parallel.
    #[arg(short, long, value_name = "N", value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Override the manifest's runtime lookup policy.
    #[arg(long, value_name = "POLICY", value_enum)]
    pub runtime_lookup: Option<LinkagePolicy>,

    /// Enable verbose logging output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `test` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Parse command-line arguments, providing `test` as the default command.
    #[must_use]
    pub fn parse_with_default() -> Self {
        Self::parse().with_default_command()
    }

    /// Parse the provided arguments, applying the default command when needed.
    ///
    /// # Panics
    ///
    /// Panics if argument parsing fails.
    #[must_use]
    pub fn parse_from_with_default<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args)
            .unwrap_or_else(|e| panic!("CLI parsing failed: {e}"))
            .with_default_command()
    }

    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Test(TestArgs { tests: Vec::new() }));
        }
        self
    }
}

/// Arguments accepted by the `test` command.
#[derive(Debug, Args, PartialEq, Eq, Clone)]
pub struct TestArgs {
    /// A list of specific test cases to run; all of them when empty.
    pub tests: Vec<String>,
}

/// Available top-level commands for linkrun.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Run declared test cases (all of them if none are given) `default`.
    Test(TestArgs),

    /// Write the resolved test invocation specs as JSON.
    Plan {
        /// Output path for the plan.
        ///
        /// Use `-` to write to stdout.
        #[arg(value_name = "FILE", default_value = "-")]
        file: PathBuf,
    },

    /// Display the target graph in DOT format for visualization.
    Graph,
}

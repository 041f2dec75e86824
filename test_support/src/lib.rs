//! Test utilities for linkrun behavioural tests.
//!
//! This crate provides helpers for writing fake build artifacts, scaffolding
//! `Linkfile` fixtures, and temporarily adjusting the process environment.

pub mod env_var_guard;
pub mod exec;
pub mod manifest;

pub use env_var_guard::EnvVarGuard;
pub use exec::{make_executable, write_exec, write_script};
pub use manifest::manifest_yaml;

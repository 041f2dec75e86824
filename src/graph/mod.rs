//! Target graph structures.
//!
//! This module defines the validated build graph produced from a parsed
//! `Linkfile`. Construction resolves link references, assigns each target a
//! deterministic output directory, expands placeholders in test environment
//! values, and rejects cyclic or dangling dependency declarations. The
//! finalised graph is immutable and safe to share read-only between threads.
//!
//! # Examples
//!
//! ```
//! use camino::Utf8PathBuf;
//! use linkrun::graph::{BuildContext, TargetGraph};
//! use linkrun::manifest;
//!
//! let yaml = "linkrun_version: \"1.0.0\"\ntargets:\n  - name: lib1\n    kind: shared-library\n    sources: lib1.c";
//! let manifest = manifest::from_str_named(yaml, "example").expect("parse");
//! let context = BuildContext::new(Utf8PathBuf::from("build"));
//! let graph = TargetGraph::from_manifest(&manifest, &context).expect("graph");
//! assert!(graph.get("lib1").is_some());
//! ```

mod cycle;
mod env_interpolate;
mod from_manifest;
mod target;

pub use target::{BuildContext, GraphError, LinkEdge, LinkageConfig, Target, TargetGraph, TestCase};

//! Runtime-linkage metadata propagation.
//!
//! Given a finalised [`TargetGraph`] and an executable target, this module
//! computes the transitive set of shared-library output directories the
//! dynamic loader must be able to reach when the target runs. Directories
//! are discovered depth-first following link edges in declaration order and
//! recorded once each, on first discovery, so generated path lists are
//! deterministic across runs.
//!
//! The [`LinkagePolicy`](crate::ast::LinkagePolicy) decides how a discovered
//! directory is made reachable: embedded in the binary's own runtime search
//! metadata, or supplied externally through the loader's search-path
//! environment variable.

use std::collections::HashSet;

use camino::Utf8PathBuf;

use crate::ast::LinkagePolicy;
use crate::graph::{Target, TargetGraph};

/// Platform default for the loader search-path environment variable.
#[cfg(target_os = "macos")]
pub const SEARCH_PATH_VAR: &str = "DYLD_LIBRARY_PATH";
/// Platform default for the loader search-path environment variable.
#[cfg(windows)]
pub const SEARCH_PATH_VAR: &str = "PATH";
/// Platform default for the loader search-path environment variable.
#[cfg(all(not(windows), not(target_os = "macos")))]
pub const SEARCH_PATH_VAR: &str = "LD_LIBRARY_PATH";

/// Runtime search paths required by one target, split by resolution route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPlan {
    /// Directories baked into the binary's own runtime search metadata.
    pub embedded: Vec<Utf8PathBuf>,
    /// Directories the caller must supply via the loader's search-path
    /// environment variable.
    pub external: Vec<Utf8PathBuf>,
}

impl LinkPlan {
    /// Whether the target needs no runtime search paths at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.embedded.is_empty() && self.external.is_empty()
    }
}

/// Compute the runtime search paths for `target` under `policy`.
///
/// Traversal recurses through every link edge, since a static library's own
/// shared dependencies still need runtime resolution, but only runtime
/// (shared) edges contribute a directory.
#[must_use]
pub fn resolve(graph: &TargetGraph, target: &Target, policy: LinkagePolicy) -> LinkPlan {
    let mut seen = HashSet::new();
    let mut dirs = Vec::new();
    collect_runtime_dirs(graph, target, &mut seen, &mut dirs);

    match policy {
        LinkagePolicy::Embed => LinkPlan {
            embedded: dirs,
            external: Vec::new(),
        },
        LinkagePolicy::External => LinkPlan {
            embedded: Vec::new(),
            external: dirs,
        },
    }
}

fn collect_runtime_dirs(
    graph: &TargetGraph,
    target: &Target,
    seen: &mut HashSet<String>,
    dirs: &mut Vec<Utf8PathBuf>,
) {
    for edge in &target.links {
        if !seen.insert(edge.target.clone()) {
            continue;
        }
        let Some(dep) = graph.get(&edge.target) else {
            debug_assert!(false, "finalised graph must not contain dangling links");
            continue;
        };
        if edge.runtime && !dirs.contains(&dep.out_dir) {
            dirs.push(dep.out_dir.clone());
        }
        collect_runtime_dirs(graph, dep, seen, dirs);
    }
}

//! Core types for the validated target graph.

use camino::Utf8PathBuf;
use indexmap::IndexMap;
use miette::Diagnostic;
use thiserror::Error;

use crate::ast::{LinkagePolicy, TargetKind};

/// Build-wide configuration passed explicitly into graph construction.
///
/// Holding the build root in a value rather than process-global state keeps
/// multiple independent graphs usable side by side in one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Root directory beneath which every target's output directory lives.
    pub build_dir: Utf8PathBuf,
}

impl BuildContext {
    /// Create a context rooted at `build_dir`.
    #[must_use]
    pub const fn new(build_dir: Utf8PathBuf) -> Self {
        Self { build_dir }
    }
}

/// A link from a consuming target to a produced target.
///
/// The `runtime` flag records whether the dependency's output path must be
/// resolvable when the consumer runs; it is derived from the linked target's
/// kind when the graph is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdge {
    /// Name of the linked target.
    pub target: String,
    /// Whether the linked artifact is looked up by the loader at runtime.
    pub runtime: bool,
}

/// A finalised build target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Unique target name; also the artifact file name.
    pub name: String,
    /// Artifact kind.
    pub kind: TargetKind,
    /// Source files owned by the target.
    pub sources: Vec<Utf8PathBuf>,
    /// Outgoing link edges, in declaration order.
    pub links: Vec<LinkEdge>,
    /// Output directory assigned at graph-finalise time.
    pub out_dir: Utf8PathBuf,
}

impl Target {
    /// Expected location of the produced artifact.
    ///
    /// Platform artifact naming (`lib` prefixes, `.so`/`.dylib` suffixes) is
    /// the linker's concern; the graph tracks artifacts under their target
    /// name.
    #[must_use]
    pub fn artifact_path(&self) -> Utf8PathBuf {
        self.out_dir.join(&self.name)
    }
}

/// A finalised test case.
///
/// Environment overrides are fully resolved: placeholders were expanded when
/// the graph was built, and the map is immutable from then on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Unique test name.
    pub name: String,
    /// Name of the executable target under test.
    pub target: String,
    /// Resolved environment overrides; an override wins on key collision.
    pub env: IndexMap<String, String>,
}

/// Graph-wide linkage configuration carried over from the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageConfig {
    /// Default resolution route for discovered runtime search paths.
    pub policy: LinkagePolicy,
    /// Loader search-path variable used for externally supplied paths.
    pub search_path_var: String,
}

/// The validated, immutable target graph.
///
/// Targets and tests are stored in declaration order; targets are queryable
/// by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetGraph {
    /// Finalised targets keyed by name.
    pub targets: IndexMap<String, Target>,
    /// Finalised test cases in declaration order.
    pub tests: Vec<TestCase>,
    /// Linkage configuration resolved from the manifest.
    pub linkage: LinkageConfig,
}

impl TargetGraph {
    /// Look up a target by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Target> {
        self.targets.get(name)
    }

    /// Look up a test case by name.
    #[must_use]
    pub fn get_test(&self, name: &str) -> Option<&TestCase> {
        self.tests.iter().find(|t| t.name == name)
    }
}

/// Errors raised while validating a declaration set into a [`TargetGraph`].
///
/// All of these abort the whole build; no partial graph is usable.
#[derive(Debug, Error, Diagnostic)]
pub enum GraphError {
    /// Following link edges revisited a target already on the current path.
    #[error("circular dependency detected: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(linkrun::graph::circular_dependency),
        help("break the cycle by removing one of the listed links")
    )]
    CircularDependency {
        /// The offending cycle, canonicalised so the smallest name leads and
        /// the first target is repeated at the end.
        cycle: Vec<String>,
    },

    /// A link referenced a target that was never declared.
    #[error("target {dependent} links against unknown target {dependency}")]
    #[diagnostic(code(linkrun::graph::unknown_target))]
    UnknownTarget {
        /// The target whose link list contains the dangling reference.
        dependent: String,
        /// The undeclared name.
        dependency: String,
    },

    /// A test referenced a target that was never declared.
    #[error("test {test} runs unknown target {target}")]
    #[diagnostic(code(linkrun::graph::unknown_test_target))]
    UnknownTestTarget {
        /// The test with the dangling reference.
        test: String,
        /// The undeclared name.
        target: String,
    },

    /// Two target declarations share a name.
    #[error("duplicate target name {name}")]
    #[diagnostic(
        code(linkrun::graph::duplicate_target),
        help("target names key the graph and must be unique")
    )]
    DuplicateTarget {
        /// The repeated name.
        name: String,
    },

    /// Two test declarations share a name.
    #[error("duplicate test name {name}")]
    #[diagnostic(code(linkrun::graph::duplicate_test))]
    DuplicateTest {
        /// The repeated name.
        name: String,
    },

    /// A test environment value contained an unusable placeholder.
    #[error("test {test}, variable {variable}: {problem}")]
    #[diagnostic(
        code(linkrun::graph::invalid_placeholder),
        help("supported placeholders are ${{builddir}} and ${{outdir:NAME}}")
    )]
    InvalidPlaceholder {
        /// The test declaring the value.
        test: String,
        /// The environment variable whose value failed to expand.
        variable: String,
        /// Description of the failure.
        problem: String,
    },
}

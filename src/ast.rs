//! Linkfile Abstract Syntax Tree structures.
//!
//! This module defines the data structures used to represent a parsed
//! `Linkfile`: the declarative list of build targets and test cases consumed
//! by the graph builder. They are deserialised with `serde-saphyr`.
//!
//! The following example shows how to parse a minimal manifest string:
//!
//! ```rust
//! use linkrun::ast::{LinkManifest, TargetKind};
//!
//! let yaml = "linkrun_version: \"1.0.0\"\ntargets:\n  - name: lib1\n    kind: shared-library\n    sources: lib1.c";
//! let manifest: LinkManifest = serde_saphyr::from_str(yaml).expect("parse");
//! assert_eq!(manifest.targets[0].kind, TargetKind::SharedLibrary);
//! ```

use clap::ValueEnum;
use indexmap::IndexMap;
use semver::Version;
use serde::{Deserialize, Serialize};

/// Top-level manifest structure parsed from a `Linkfile`.
///
/// Each field mirrors a key in the YAML manifest. Optional collections default
/// to empty to simplify deserialisation.
///
/// ```yaml
/// linkrun_version: "1.0.0"
/// targets:
///   - name: prog
///     kind: executable
///     sources: main.c
/// tests:
///   - name: smoke
///     target: prog
/// ```
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkManifest {
    /// Semantic version of the manifest format.
    pub linkrun_version: Version,

    /// Runtime-linkage resolution settings shared by every target.
    #[serde(default)]
    pub linkage: LinkageSettings,

    /// Declared build targets, in declaration order.
    pub targets: Vec<TargetDecl>,

    /// Declared test cases. Each names the target it executes.
    #[serde(default)]
    pub tests: Vec<TestDecl>,
}

/// Manifest-level configuration for runtime library resolution.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LinkageSettings {
    /// Whether discovered runtime search paths are embedded in the binary's
    /// own metadata or left for the caller to supply via the environment.
    #[serde(default)]
    pub policy: LinkagePolicy,

    /// Name of the loader search-path environment variable. When omitted the
    /// platform default is used.
    #[serde(default)]
    pub search_path_var: Option<String>,
}

/// Resolution route for runtime library search paths.
///
/// The declaration surface does not fix a policy; this is a graph-wide
/// configuration knob declared in the manifest and overridable on the command
/// line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LinkagePolicy {
    /// Bake discovered directories into the binary's runtime search metadata.
    #[default]
    Embed,
    /// Leave discovered directories for the caller to supply through the
    /// loader's search-path environment variable.
    External,
}

/// A single build target declaration.
///
/// Targets describe a produced artifact (library or executable), the source
/// files it owns, and the targets it links against, in link order.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
    /// Unique target name; also the artifact file name.
    pub name: String,

    /// What kind of artifact the target produces.
    pub kind: TargetKind,

    /// Source files owned by the target.
    #[serde(default)]
    pub sources: StringOrList,

    /// Targets linked into this one, in declaration order.
    #[serde(default)]
    pub links: StringOrList,

    /// Output subdirectory beneath the build root. Defaults to the target
    /// name, keeping output locations deterministic per declaration.
    #[serde(default)]
    pub dir: Option<String>,
}

/// Artifact kind produced by a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetKind {
    /// A runnable program.
    Executable,
    /// A library resolved by the dynamic loader at process start.
    SharedLibrary,
    /// A library absorbed into its consumers at link time.
    StaticLibrary,
}

impl TargetKind {
    /// Whether artifacts of this kind must be resolvable at runtime.
    #[must_use]
    pub const fn needs_runtime_lookup(self) -> bool {
        matches!(self, Self::SharedLibrary)
    }
}

/// A single test case declaration.
///
/// A test runs one executable target under an environment assembled from the
/// inherited process environment plus the declared overrides. Override values
/// may use `${builddir}` and `${outdir:NAME}` placeholders, which are
/// expanded when the graph is finalised.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TestDecl {
    /// Unique test name used in summaries and CLI selection.
    pub name: String,

    /// Name of the target to execute.
    pub target: String,

    /// Environment overrides applied on top of the inherited environment.
    /// Keys are unique; an override wins on collision.
    #[serde(default)]
    pub env: IndexMap<String, String>,
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// It mirrors YAML syntax where a scalar or sequence is allowed. Empty values
/// deserialize to `StringOrList::Empty`.
///
/// ```yaml
/// # Scalar
/// sources: main.c
/// # Sequence
/// links:
///   - lib1
///   - lib2
/// ```
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(untagged)]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl StringOrList {
    /// Borrow the declared items as a slice in declaration order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Empty => &[],
            Self::String(s) => std::slice::from_ref(s),
            Self::List(v) => v.as_slice(),
        }
    }

    /// Iterate over the declared items as string slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.as_slice().iter().map(String::as_str)
    }

    /// Whether no items were declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

//! Manifest loading helpers.
//!
//! This module reads a `Linkfile` from disk or memory and deserialises it
//! into the [`LinkManifest`] AST. Parsing is a single YAML pass; there is no
//! template preprocessing, so the input must be valid YAML on its own.
//! Placeholders inside test environment values are left untouched here and
//! expanded later, when the target graph is finalised.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use miette::Diagnostic;
use thiserror::Error;

use crate::ast::LinkManifest;

/// Errors raised while loading a `Linkfile`.
#[derive(Debug, Error, Diagnostic)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("failed to read Linkfile at {path}")]
    #[diagnostic(code(linkrun::manifest::read))]
    Read {
        /// The path that was attempted.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },

    /// The manifest file was not valid YAML for the declared schema.
    #[error("failed to parse Linkfile {name}")]
    #[diagnostic(
        code(linkrun::manifest::parse),
        help("check the YAML structure against the Linkfile schema")
    )]
    Parse {
        /// Name used for the manifest in diagnostics.
        name: String,
        /// Underlying YAML parse failure.
        #[source]
        source: serde_saphyr::Error,
    },
}

/// Parse a manifest from a YAML string.
///
/// The `name` is used in diagnostics only; pass the originating path or a
/// fixture label.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] if the YAML does not match the schema.
pub fn from_str_named(yaml: &str, name: &str) -> Result<LinkManifest, ManifestError> {
    serde_saphyr::from_str(yaml).map_err(|source| ManifestError::Parse {
        name: name.to_owned(),
        source,
    })
}

/// Load and parse a manifest from `path`.
///
/// # Errors
///
/// Returns [`ManifestError::Read`] if the file cannot be read and
/// [`ManifestError::Parse`] if its contents do not match the schema.
pub fn from_path(path: &Utf8Path) -> Result<LinkManifest, ManifestError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_owned(),
        source,
    })?;
    tracing::debug!(path = %path, bytes = yaml.len(), "read Linkfile");
    from_str_named(&yaml, path.as_str())
}

//! Path resolution helpers for the runner module.
//!
//! Centralises manifest, build-directory, and output path logic so the main
//! runner module stays focused on command dispatch.

use std::borrow::Cow;
use std::path::Path;

use anyhow::{Result, anyhow};
use camino::Utf8PathBuf;

use crate::cli::Cli;

/// Determine the manifest path respecting the CLI's directory option.
///
/// # Errors
///
/// Returns an error when the CLI `file` or `directory` paths are not valid
/// UTF-8.
pub(super) fn resolve_manifest_path(cli: &Cli) -> Result<Utf8PathBuf> {
    let file = to_utf8(&cli.file, "manifest path")?;
    let resolved = match &cli.directory {
        Some(dir) => to_utf8(dir, "working directory")?.join(&file),
        None => file,
    };
    if resolved.file_name().is_none() {
        return Err(anyhow!("manifest path {resolved} has no file name"));
    }
    Ok(resolved)
}

/// Determine the build output root respecting the CLI's directory option.
///
/// A relative `--build-dir` is taken relative to `-C/--directory` when one
/// is given, mirroring how the manifest path resolves.
///
/// # Errors
///
/// Returns an error when the CLI `build-dir` or `directory` paths are not
/// valid UTF-8.
pub(super) fn resolve_build_dir(cli: &Cli) -> Result<Utf8PathBuf> {
    let build_dir = to_utf8(&cli.build_dir, "build directory")?;
    match &cli.directory {
        Some(dir) if build_dir.is_relative() => {
            Ok(to_utf8(dir, "working directory")?.join(build_dir))
        }
        _ => Ok(build_dir),
    }
}

/// Resolve an output path relative to the CLI working directory.
///
/// The `-C/--directory` option behaves like a working directory change for
/// any filesystem paths supplied on the command line. When `path` is
/// relative and a directory has been configured, the returned path is
/// `directory/path`.
#[must_use]
pub(super) fn resolve_output_path<'a>(cli: &Cli, path: &'a Path) -> Cow<'a, Path> {
    if path.is_relative() {
        cli.directory
            .as_ref()
            .map_or_else(|| Cow::Borrowed(path), |dir| Cow::Owned(dir.join(path)))
    } else {
        Cow::Borrowed(path)
    }
}

fn to_utf8(path: &Path, what: &str) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.to_path_buf())
        .map_err(|p| anyhow!("{what} {} is not valid UTF-8", p.display()))
}

//! Helpers for creating executable stubs in tests.
//!
//! These utilities write tiny shell scripts and mark them executable so
//! tests can exercise artifact invocation without running a real build.
//! Callers own the containing directory's lifetime to keep the stub on disk.
//!
//! # Examples
//!
//! ```rust
//! use camino::Utf8Path;
//! use tempfile::TempDir;
//! use test_support::write_exec;
//!
//! let temp = TempDir::new().expect("tempdir");
//! let root = Utf8Path::from_path(temp.path()).expect("utf8 path");
//! let path = write_exec(root, "prog").expect("stub executable");
//! assert!(path.exists());
//! ```

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Write a minimal executable file named `name` inside `root`.
pub fn write_exec(root: &Utf8Path, name: &str) -> Result<Utf8PathBuf> {
    write_script(root, name, "#!/bin/sh\nexit 0\n")
}

/// Write an executable script with the given `body`, creating parent
/// directories as needed.
pub fn write_script(root: &Utf8Path, name: &str, body: &str) -> Result<Utf8PathBuf> {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent.as_std_path())
            .with_context(|| format!("create script directory {parent}"))?;
    }
    fs::write(path.as_std_path(), body).with_context(|| format!("write script {name}"))?;
    make_executable(&path)?;
    Ok(path)
}

/// Mark an existing file as executable on Unix; no-op elsewhere.
pub fn make_executable(path: &Utf8Path) -> Result<()> {
    #[cfg(unix)]
    {
        let mut perms = fs::metadata(path.as_std_path())
            .context("stat script")?
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(path.as_std_path(), perms).context("chmod script")?;
    }

    #[cfg(not(unix))]
    let _ = path;

    Ok(())
}

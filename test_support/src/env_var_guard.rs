//! Guard for temporarily modifying environment variables in tests.
//!
//! `std::env::set_var` and `remove_var` are `unsafe` in Rust 2024 because
//! they mutate process-global state. Run tests that use this guard under
//! `#[serial]` so mutations never race across threads. The guard restores
//! the previous value on drop.
//!
//! # Examples
//!
//! ```rust
//! use test_support::env_var_guard::EnvVarGuard;
//!
//! let guard = EnvVarGuard::set("LINKRUN_TEST_MARKER", "bar");
//! assert_eq!(std::env::var("LINKRUN_TEST_MARKER").unwrap(), "bar");
//! drop(guard);
//! assert!(std::env::var("LINKRUN_TEST_MARKER").is_err());
//! ```

use std::{borrow::Cow, ffi::OsString};

/// RAII guard that resets an environment variable to its previous value on
/// drop.
#[derive(Debug)]
pub struct EnvVarGuard {
    name: Cow<'static, str>,
    prev: Option<OsString>,
}

impl EnvVarGuard {
    /// Set `name` to `val`, returning a guard that restores the prior value.
    ///
    /// Callers must serialise tests that touch the environment (for example
    /// with `#[serial]`).
    #[must_use]
    pub fn set(name: impl Into<Cow<'static, str>>, val: &str) -> Self {
        let name = name.into();
        let prev = std::env::var_os(&*name);
        // SAFETY: callers serialise mutations of the process environment.
        unsafe { std::env::set_var(&*name, val) };
        Self { name, prev }
    }

    /// Remove `name`, returning a guard that restores the prior value.
    #[must_use]
    pub fn remove(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        let prev = std::env::var_os(&*name);
        // SAFETY: callers serialise mutations of the process environment.
        unsafe { std::env::remove_var(&*name) };
        Self { name, prev }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        // SAFETY: callers serialise mutations while the prior value is
        // restored.
        unsafe {
            if let Some(ref v) = self.prev {
                std::env::set_var(&*self.name, v);
            } else {
                std::env::remove_var(&*self.name);
            }
        }
    }
}

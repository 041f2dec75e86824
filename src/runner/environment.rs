//! Test environment composition.
//!
//! A test's child environment is assembled in three layers: the inherited
//! process environment, then any externally supplied runtime search paths
//! prepended to the loader's search-path variable, then the test case's
//! declared overrides. An override wins on key collision.

use indexmap::IndexMap;
use itertools::Itertools;

use crate::graph::TestCase;
use crate::linkage::LinkPlan;

#[cfg(windows)]
const PATH_LIST_SEPARATOR: &str = ";";
#[cfg(not(windows))]
const PATH_LIST_SEPARATOR: &str = ":";

/// Compose the full child environment for `test` from the current process
/// environment.
///
/// Environment entries that are not valid UTF-8 are skipped; composed
/// environments are serialised into the plan output and must stay textual.
#[must_use]
pub fn compose_environment(
    test: &TestCase,
    plan: &LinkPlan,
    search_path_var: &str,
) -> IndexMap<String, String> {
    let inherited = std::env::vars_os().filter_map(|(key, value)| {
        match (key.into_string(), value.into_string()) {
            (Ok(k), Ok(v)) => Some((k, v)),
            _ => {
                tracing::debug!("skipping non-UTF-8 environment entry");
                None
            }
        }
    });
    compose_with(inherited, test, plan, search_path_var)
}

/// Compose a child environment from an explicit inherited set.
///
/// Split out from [`compose_environment`] so composition stays testable
/// without touching the process environment.
#[must_use]
pub fn compose_with(
    inherited: impl IntoIterator<Item = (String, String)>,
    test: &TestCase,
    plan: &LinkPlan,
    search_path_var: &str,
) -> IndexMap<String, String> {
    let mut env: IndexMap<String, String> = inherited.into_iter().collect();

    if !plan.external.is_empty() {
        let joined = plan
            .external
            .iter()
            .map(|p| p.as_str())
            .join(PATH_LIST_SEPARATOR);
        let value = match env.get(search_path_var) {
            Some(existing) if !existing.is_empty() => {
                format!("{joined}{PATH_LIST_SEPARATOR}{existing}")
            }
            _ => joined,
        };
        env.insert(search_path_var.to_owned(), value);
    }

    for (key, value) in &test.env {
        env.insert(key.clone(), value.clone());
    }
    env
}

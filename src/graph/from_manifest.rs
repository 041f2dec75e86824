//! Manifest-to-graph conversion helpers.

use camino::Utf8PathBuf;
use indexmap::IndexMap;

use crate::ast::{LinkManifest, LinkageSettings, TargetDecl, TestDecl};
use crate::linkage;

use super::{
    cycle,
    env_interpolate::expand_env_value,
    target::{BuildContext, GraphError, LinkEdge, LinkageConfig, Target, TargetGraph, TestCase},
};

impl TargetGraph {
    /// Validate a declaration set into a finalised [`TargetGraph`].
    ///
    /// Output directories are assigned here, derived from each target's
    /// declaration, so downstream path computation is reproducible. Link
    /// edges record whether their dependency needs runtime lookup, and test
    /// environment placeholders are expanded against the assigned
    /// directories.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError`] when a declaration set repeats a name, links
    /// or tests against an undeclared target, contains a dependency cycle,
    /// or declares an unusable environment placeholder.
    pub fn from_manifest(
        manifest: &LinkManifest,
        context: &BuildContext,
    ) -> Result<Self, GraphError> {
        let mut targets = IndexMap::new();
        collect_targets(manifest, context, &mut targets)?;
        resolve_links(manifest, &mut targets)?;
        let tests = resolve_tests(manifest, context, &targets)?;

        let graph = Self {
            targets,
            tests,
            linkage: resolve_linkage(&manifest.linkage),
        };
        graph.detect_cycles()?;
        Ok(graph)
    }

    fn detect_cycles(&self) -> Result<(), GraphError> {
        if let Some(found) = cycle::find_cycle(&self.targets) {
            return Err(GraphError::CircularDependency { cycle: found });
        }
        Ok(())
    }
}

/// First pass: register every declared target under its assigned output
/// directory, leaving link edges empty until all names are known.
fn collect_targets(
    manifest: &LinkManifest,
    context: &BuildContext,
    targets: &mut IndexMap<String, Target>,
) -> Result<(), GraphError> {
    for decl in &manifest.targets {
        if targets.contains_key(&decl.name) {
            return Err(GraphError::DuplicateTarget {
                name: decl.name.clone(),
            });
        }
        let target = Target {
            name: decl.name.clone(),
            kind: decl.kind,
            sources: decl.sources.iter().map(Utf8PathBuf::from).collect(),
            links: Vec::new(),
            out_dir: output_dir(context, decl),
        };
        targets.insert(decl.name.clone(), target);
    }
    Ok(())
}

/// Second pass: resolve declared link names into edges, deriving the
/// runtime flag from each dependency's kind.
fn resolve_links(
    manifest: &LinkManifest,
    targets: &mut IndexMap<String, Target>,
) -> Result<(), GraphError> {
    let mut resolved: Vec<(String, Vec<LinkEdge>)> = Vec::with_capacity(manifest.targets.len());
    for decl in &manifest.targets {
        let mut edges = Vec::with_capacity(decl.links.as_slice().len());
        for dependency in decl.links.iter() {
            let Some(dep) = targets.get(dependency) else {
                return Err(GraphError::UnknownTarget {
                    dependent: decl.name.clone(),
                    dependency: dependency.to_owned(),
                });
            };
            edges.push(LinkEdge {
                target: dep.name.clone(),
                runtime: dep.kind.needs_runtime_lookup(),
            });
        }
        resolved.push((decl.name.clone(), edges));
    }
    for (name, edges) in resolved {
        if let Some(target) = targets.get_mut(&name) {
            target.links = edges;
        }
    }
    Ok(())
}

/// Resolve test declarations: check uniqueness and target references, then
/// expand environment placeholders so the finalised cases are immutable.
fn resolve_tests(
    manifest: &LinkManifest,
    context: &BuildContext,
    targets: &IndexMap<String, Target>,
) -> Result<Vec<TestCase>, GraphError> {
    let mut tests = Vec::with_capacity(manifest.tests.len());
    for decl in &manifest.tests {
        if manifest.tests.iter().filter(|t| t.name == decl.name).count() > 1 {
            return Err(GraphError::DuplicateTest {
                name: decl.name.clone(),
            });
        }
        if !targets.contains_key(&decl.target) {
            return Err(GraphError::UnknownTestTarget {
                test: decl.name.clone(),
                target: decl.target.clone(),
            });
        }
        tests.push(TestCase {
            name: decl.name.clone(),
            target: decl.target.clone(),
            env: resolve_env(decl, context, targets)?,
        });
    }
    Ok(tests)
}

fn resolve_env(
    decl: &TestDecl,
    context: &BuildContext,
    targets: &IndexMap<String, Target>,
) -> Result<IndexMap<String, String>, GraphError> {
    let mut env = IndexMap::with_capacity(decl.env.len());
    for (variable, value) in &decl.env {
        let expanded = expand_env_value(value, &context.build_dir, targets).map_err(|issue| {
            GraphError::InvalidPlaceholder {
                test: decl.name.clone(),
                variable: variable.clone(),
                problem: issue.to_string(),
            }
        })?;
        env.insert(variable.clone(), expanded);
    }
    Ok(env)
}

/// Deterministic output directory for a declaration: the build root joined
/// with the declared subdirectory, defaulting to the target name.
fn output_dir(context: &BuildContext, decl: &TargetDecl) -> Utf8PathBuf {
    context
        .build_dir
        .join(decl.dir.as_deref().unwrap_or(&decl.name))
}

fn resolve_linkage(settings: &LinkageSettings) -> LinkageConfig {
    LinkageConfig {
        policy: settings.policy,
        search_path_var: settings
            .search_path_var
            .clone()
            .unwrap_or_else(|| linkage::SEARCH_PATH_VAR.to_owned()),
    }
}

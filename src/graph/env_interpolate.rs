//! Placeholder expansion for test environment values.
//!
//! Test declarations may reference build output locations before those
//! locations exist: `${builddir}` expands to the build root and
//! `${outdir:NAME}` to the named target's output directory. Expansion runs
//! once, after output directories are assigned and before the graph is
//! finalised, so test cases carry fully resolved values.

use camino::Utf8Path;
use indexmap::IndexMap;
use thiserror::Error;

use super::Target;

/// A placeholder the expander could not resolve.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PlaceholderIssue {
    /// A `${` with no closing brace.
    #[error("unterminated placeholder")]
    Unterminated,
    /// A placeholder key other than `builddir` or `outdir`.
    #[error("unsupported placeholder ${{{0}}}")]
    UnknownKey(String),
    /// An `${outdir:NAME}` naming an undeclared target.
    #[error("placeholder refers to unknown target {0}")]
    UnknownTarget(String),
}

/// Expand `${builddir}` and `${outdir:NAME}` placeholders in `template`.
///
/// Text outside placeholders passes through unchanged, including bare `$`
/// characters that do not open a `${...}` token.
pub(crate) fn expand_env_value(
    template: &str,
    build_dir: &Utf8Path,
    targets: &IndexMap<String, Target>,
) -> Result<String, PlaceholderIssue> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::with_capacity(template.len());
    let mut i = 0;
    while let Some(&ch) = chars.get(i) {
        if ch != '$' || !matches!(chars.get(i + 1), Some('{')) {
            out.push(ch);
            i += 1;
            continue;
        }

        let mut j = i + 2;
        let mut token = String::new();
        loop {
            match chars.get(j) {
                Some('}') => break,
                Some(&c) => {
                    token.push(c);
                    j += 1;
                }
                None => return Err(PlaceholderIssue::Unterminated),
            }
        }
        out.push_str(&substitute(&token, build_dir, targets)?);
        i = j + 1;
    }
    Ok(out)
}

fn substitute(
    token: &str,
    build_dir: &Utf8Path,
    targets: &IndexMap<String, Target>,
) -> Result<String, PlaceholderIssue> {
    if token == "builddir" {
        return Ok(build_dir.to_string());
    }
    if let Some(name) = token.strip_prefix("outdir:") {
        return targets
            .get(name)
            .map(|target| target.out_dir.to_string())
            .ok_or_else(|| PlaceholderIssue::UnknownTarget(name.to_owned()));
    }
    Err(PlaceholderIssue::UnknownKey(token.to_owned()))
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;
    use crate::ast::TargetKind;

    fn targets_with(name: &str, out_dir: &str) -> IndexMap<String, Target> {
        let target = Target {
            name: name.to_owned(),
            kind: TargetKind::SharedLibrary,
            sources: Vec::new(),
            links: Vec::new(),
            out_dir: Utf8PathBuf::from(out_dir),
        };
        IndexMap::from([(name.to_owned(), target)])
    }

    #[test]
    fn expand_replaces_builddir_and_outdir() {
        let targets = targets_with("lib2", "build/lib2");
        let expanded = expand_env_value(
            "${builddir}:${outdir:lib2}",
            Utf8Path::new("build"),
            &targets,
        )
        .expect("expand");
        assert_eq!(expanded, "build:build/lib2");
    }

    #[test]
    fn expand_passes_plain_text_through() {
        let targets = IndexMap::new();
        let expanded =
            expand_env_value("$HOME/bin:literal", Utf8Path::new("build"), &targets).expect("expand");
        assert_eq!(expanded, "$HOME/bin:literal");
    }

    #[test]
    fn expand_rejects_unknown_target() {
        let targets = IndexMap::new();
        let err = expand_env_value("${outdir:ghost}", Utf8Path::new("build"), &targets)
            .expect_err("should fail");
        assert_eq!(err, PlaceholderIssue::UnknownTarget("ghost".to_owned()));
    }

    #[test]
    fn expand_rejects_unterminated_placeholder() {
        let targets = IndexMap::new();
        let err = expand_env_value("${builddir", Utf8Path::new("build"), &targets)
            .expect_err("should fail");
        assert_eq!(err, PlaceholderIssue::Unterminated);
    }

    #[test]
    fn expand_rejects_unknown_key() {
        let targets = IndexMap::new();
        let err = expand_env_value("${objdir:lib2}", Utf8Path::new("build"), &targets)
            .expect_err("should fail");
        assert_eq!(err, PlaceholderIssue::UnknownKey("objdir:lib2".to_owned()));
    }
}

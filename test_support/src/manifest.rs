//! Helpers for constructing manifest fixtures in tests.

/// Prefix the provided manifest body with the standard Linkfile version
/// header.
pub fn manifest_yaml(body: &str) -> String {
    format!("linkrun_version: 1.0.0\n{body}")
}

//! Command: print manifest paths.
use std::path::PathBuf;

use super::Session;

/// Paths of the manifests in scope, PRIMARY first.
#[must_use]
pub fn paths(session: &Session) -> Vec<PathBuf> {
    session
        .scope
        .manifests()
        .iter()
        .map(|m| m.path.clone())
        .collect()
}

/// Print one path per line to stdout, unstyled, for use in scripts.
#[allow(clippy::print_stdout)]
pub fn run(session: &Session) {
    for path in paths(session) {
        println!("{}", path.display());
    }
}

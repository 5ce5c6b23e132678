//! Command: install everything the scope declares.
use anyhow::{Result, bail};

use super::Session;

/// Apply PRIMARY and each selected auxiliary with `brew bundle install`.
///
/// Manifests that do not exist are skipped.  A failing manifest is warned
/// about and the rest still run.
///
/// # Errors
///
/// Returns an error if the package manager is missing or any manifest
/// failed to install.
pub fn run(session: &Session) -> Result<()> {
    let pm = session.pm();
    pm.ensure_available()?;

    let mut failed = Vec::new();
    for manifest in session.scope.manifests() {
        if !manifest.path.is_file() {
            session
                .log
                .debug(&format!("{} does not exist, skipping", manifest.id));
            continue;
        }
        session.log.stage(&format!("Installing from {}", manifest.id));
        match pm.bundle_install(&manifest.path) {
            Ok(()) => session.log.success(&format!("{} installed", manifest.id)),
            Err(e) => {
                session.log.warn(&format!("{e:#}"));
                failed.push(manifest.id.to_string());
            }
        }
    }
    if !failed.is_empty() {
        bail!("install failed for {}", failed.join(", "));
    }
    Ok(())
}

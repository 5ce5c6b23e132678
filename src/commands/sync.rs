//! Command: install what is declared, then clean up what is not.
use anyhow::Result;

use super::{Session, cleanup, install};

/// [`install::run`] followed by [`cleanup::run`].  Cleanup is skipped if
/// the install step fails.
///
/// # Errors
///
/// Returns the first error from either step.
pub fn run(session: &Session, force: bool) -> Result<()> {
    install::run(session)?;
    cleanup::run(session, force)
}

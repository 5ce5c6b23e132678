//! Command: compact listing of what the scope declares.
use anyhow::Result;

use super::Session;
use crate::logging::utils::terminal_columns;
use crate::reconcile::provenance;
use crate::render;

/// Log the declared lines in scope grouped by kind, wrapped to the terminal.
///
/// Reads manifests only; the package manager is not consulted.
///
/// # Errors
///
/// Returns an error if a manifest cannot be read.
pub fn run(session: &Session) -> Result<()> {
    render_to(session, terminal_columns())
}

fn render_to(session: &Session, width: usize) -> Result<()> {
    let manifests = session.load_scope()?;
    let declared = provenance(&manifests);
    if declared.is_empty() {
        session.log.info("Nothing declared");
        return Ok(());
    }
    for line in render::compact(declared.keys(), width, session.style).lines() {
        session.log.info(line);
    }
    Ok(())
}

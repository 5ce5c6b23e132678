//! Command: remove a declaration, optionally uninstalling the package.
use anyhow::Result;

use super::Session;
use crate::error::BrewfileError;
use crate::manifest::{Declaration, Manifest, store};
use crate::prompt::interrupted;

/// First declaration named exactly `name`, searching every manifest
/// (PRIMARY first, then auxiliaries in discovery order) regardless of scope.
///
/// # Errors
///
/// Returns an error if a manifest cannot be read.
pub fn find(session: &Session, name: &str) -> Result<Option<(Manifest, Declaration)>> {
    for manifest in session.catalog.all() {
        if let Some(decl) = store::parse(&manifest.path)?
            .into_iter()
            .find(|d| d.name == name)
        {
            return Ok(Some((manifest.clone(), decl)));
        }
    }
    Ok(None)
}

/// Offer to uninstall and strike, strike only, or cancel.
///
/// With the uninstall choice the line is struck only after the uninstall
/// succeeds; on failure the manifest is left untouched and the uninstall
/// error is returned.
///
/// # Errors
///
/// Returns [`BrewfileError::NotFound`] if no manifest declares `name`,
/// [`BrewfileError::Uninstall`] if uninstalling fails, or an I/O error
/// from the rewrite.
pub fn run(session: &Session, name: &str) -> Result<()> {
    let pm = session.pm();
    pm.ensure_available()?;
    let log = &session.log;

    let Some((manifest, decl)) = find(session, name.trim())? else {
        return Err(BrewfileError::NotFound {
            name: name.to_string(),
        }
        .into());
    };

    log.info(&format!("{decl} is declared in {}", manifest.id));
    log.info(&format!("  (1) Uninstall and remove from {}", manifest.id));
    log.info(&format!("  (2) Remove from {} only", manifest.id));
    log.info("  (3) Cancel");
    let choice = session.prompt.ask("Enter your choice [3]: ");

    match choice.as_deref() {
        Some("1") => {
            log.stage(&format!("Uninstalling {decl}"));
            if let Err(e) = pm.uninstall(&decl) {
                log.warn(&format!("{} left unchanged", manifest.id));
                return Err(e);
            }
            strike(session, &manifest, &decl)
        }
        Some("2") => strike(session, &manifest, &decl),
        Some("3" | "") | None => {
            log.info("Cancelled");
            Ok(())
        }
        Some(other) => {
            log.warn(&format!("invalid choice '{other}', nothing changed"));
            Ok(())
        }
    }
}

fn strike(session: &Session, manifest: &Manifest, decl: &Declaration) -> Result<()> {
    if interrupted() {
        return Err(BrewfileError::Interrupted.into());
    }
    if store::strike(&manifest.path, &decl.raw_line)? {
        session
            .log
            .success(&format!("removed {decl} from {}", manifest.id));
    } else {
        session
            .log
            .warn(&format!("{decl} no longer in {}", manifest.id));
    }
    Ok(())
}

//! Command: install a package and declare it.
use anyhow::{Result, bail};

use super::Session;
use crate::error::BrewfileError;
use crate::manifest::{Declaration, store};
use crate::prompt::interrupted;

/// Install `name` and append its declaration to PRIMARY or to the
/// auxiliary named by `to`.
///
/// The conflict check is a plain substring search over the raw text of
/// every manifest, so `neovim` is refused while `neovim-qt` is declared.
///
/// # Errors
///
/// Returns [`BrewfileError::Conflict`] if the name already occurs in any
/// manifest, [`BrewfileError::Install`] if classification or installation
/// fails (no manifest is written), or an I/O error from the append.
pub fn run(session: &Session, name: &str, to: Option<&str>) -> Result<()> {
    let pm = session.pm();
    pm.ensure_available()?;

    let name = name.trim();
    if name.is_empty() || name.contains(|c: char| c == '"' || c.is_control()) {
        bail!("invalid package name '{name}'");
    }
    let target = match to {
        Some(aux) if aux.is_empty() || aux.contains(['/', '\\']) => {
            bail!("invalid Brewfile name '{aux}'")
        }
        Some(aux) => session.catalog.manifest_named(aux),
        None => session.catalog.primary().clone(),
    };

    for manifest in session.catalog.all() {
        if store::mentions(&manifest.path, name)? {
            return Err(BrewfileError::Conflict {
                name: name.to_string(),
                manifest: manifest.id.to_string(),
            }
            .into());
        }
    }

    let kind = pm.classify(name)?;
    let decl = Declaration::new(kind, name);
    session.log.stage(&format!("Installing {decl}"));
    pm.install(&decl)?;

    if interrupted() {
        return Err(BrewfileError::Interrupted.into());
    }
    store::append(&target.path, std::slice::from_ref(&decl))?;
    session
        .log
        .success(&format!("added {decl} to {}", target.id));
    Ok(())
}

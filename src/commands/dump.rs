//! Command: resync manifests from the installed state.
use anyhow::Result;
use std::collections::BTreeSet;

use super::Session;
use crate::error::BrewfileError;
use crate::manifest::{Declaration, Manifest, ManifestId, store};
use crate::prompt::interrupted;

/// Append every installed package not declared in scope, sorted, to the
/// first selected auxiliary (or PRIMARY when none is selected).
///
/// Existing lines are never moved or removed, so a second run with no
/// system change appends nothing.
///
/// # Errors
///
/// Returns an error if the probe fails, the run was interrupted, or the
/// target cannot be appended to.
pub fn append(session: &Session) -> Result<()> {
    session.pm().ensure_available()?;
    let declared: BTreeSet<Declaration> = session
        .load_scope()?
        .into_iter()
        .flat_map(|m| m.declarations)
        .collect();
    session.log.stage("Reading installed packages");
    let new: Vec<Declaration> = session
        .state
        .installed()?
        .difference(&declared)
        .cloned()
        .collect();

    let target = session
        .scope
        .auxiliaries()
        .next()
        .unwrap_or_else(|| session.catalog.primary());
    if new.is_empty() {
        session.log.success(&format!("{} is up to date", target.id));
        return Ok(());
    }
    if interrupted() {
        return Err(BrewfileError::Interrupted.into());
    }
    store::append(&target.path, &new)?;
    for decl in &new {
        session.log.debug(&format!("appended {decl}"));
    }
    session.log.success(&format!(
        "appended {} package(s) to {}",
        new.len(),
        target.id
    ));
    Ok(())
}

/// Where installed packages with no manifest home are written by
/// [`force`]: the miscellany auxiliary if selected, else the first
/// selected auxiliary, else PRIMARY.
#[must_use]
pub fn new_item_target(session: &Session) -> &Manifest {
    let misc = ManifestId::Auxiliary(session.settings.misc.clone());
    session
        .scope
        .auxiliaries()
        .find(|m| m.id == misc)
        .or_else(|| session.scope.auxiliaries().next())
        .unwrap_or_else(|| session.catalog.primary())
}

/// One manifest's rewrite.
#[derive(Debug)]
struct Plan {
    manifest: Manifest,
    lines: Vec<Declaration>,
    dropped: usize,
    added: usize,
}

/// Rewrite every manifest under the root so it holds exactly the installed
/// packages it already declared, in file order, and put the remaining
/// installed packages into [`new_item_target`].
///
/// A line declared by several manifests stays in each of them; repeats
/// inside one file collapse to the first occurrence.  All new contents are
/// staged before any file is replaced, and unchanged files are left alone.
///
/// # Errors
///
/// Returns an error if the probe fails, the run was interrupted before
/// committing, or a manifest cannot be staged or replaced.
pub fn force(session: &Session) -> Result<()> {
    session.pm().ensure_available()?;
    let manifests = session.catalog.load_all()?;
    session.log.stage("Reading installed packages");
    let installed = session.state.installed()?;

    let mut placed: BTreeSet<&Declaration> = BTreeSet::new();
    let mut plans: Vec<Plan> = manifests
        .iter()
        .map(|m| {
            let mut seen = BTreeSet::new();
            let lines: Vec<Declaration> = m
                .declarations
                .iter()
                .filter(|d| installed.contains(*d) && seen.insert(*d))
                .cloned()
                .collect();
            placed.extend(seen);
            Plan {
                manifest: Manifest {
                    id: m.id.clone(),
                    path: m.path.clone(),
                },
                dropped: m.declarations.len() - lines.len(),
                lines,
                added: 0,
            }
        })
        .collect();

    let homeless: Vec<Declaration> = installed
        .iter()
        .filter(|d| !placed.contains(d))
        .cloned()
        .collect();
    let target = new_item_target(session);
    if let Some(plan) = plans.iter_mut().find(|p| p.manifest.id == target.id) {
        plan.added = homeless.len();
        plan.lines.extend(homeless);
    }

    let mut staged = Vec::new();
    for plan in &plans {
        let content = store::render(&plan.lines);
        if content == store::read_text(&plan.manifest.path)? {
            continue;
        }
        session.log.info(&format!(
            "{}: {} kept, {} added, {} dropped",
            plan.manifest.id,
            plan.lines.len() - plan.added,
            plan.added,
            plan.dropped
        ));
        staged.push(store::StagedWrite::new(&plan.manifest.path, &content)?);
    }
    if staged.is_empty() {
        session.log.success("Brewfiles already match the system");
        return Ok(());
    }
    if interrupted() {
        return Err(BrewfileError::Interrupted.into());
    }

    let count = staged.len();
    for write in staged {
        session
            .log
            .debug(&format!("replacing {}", write.target().display()));
        write.commit()?;
    }
    session.log.success(&format!("rewrote {count} Brewfile(s)"));
    Ok(())
}

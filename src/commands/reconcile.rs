//! Status and the interactive reconcile.
use anyhow::{Context as _, Result, bail};

use super::Session;
use crate::error::BrewfileError;
use crate::manifest::store;
use crate::prompt::{confirm, interrupted};
use crate::reconcile::{Reconciliation, reconcile};
use crate::render;

/// Probe the system once and diff it against the scope.
///
/// # Errors
///
/// Returns an error if the package manager is missing, a manifest cannot
/// be read, or the probe fails.
pub fn compute(session: &Session) -> Result<Reconciliation> {
    session.pm().ensure_available()?;
    let manifests = session.catalog.load_all()?;
    session.log.stage("Reading installed packages");
    let installed = session.state.installed()?.clone();
    Ok(reconcile(&manifests, &session.scope, installed))
}

/// Log the grouped status listing and the summary line.
pub fn show(session: &Session, result: &Reconciliation) {
    let listing = render::status(result, session.style);
    for line in listing.lines() {
        session.log.info(line);
    }
    if !listing.is_empty() {
        session.log.info("");
    }
    session
        .log
        .info(&render::summary(&result.counts(), session.style));
}

/// `check`: status without prompting.  Fails when something declared is
/// not installed.
///
/// # Errors
///
/// Returns an error if reconciliation fails or packages are missing.
pub fn check(session: &Session) -> Result<()> {
    let result = compute(session)?;
    show(session, &result);
    if !result.missing.is_empty() {
        bail!(
            "{} declared package(s) not installed; run `brewfile install`",
            result.missing.len()
        );
    }
    Ok(())
}

/// Bare invocation: show status, then offer to act on it.
///
/// The menu acts on the result already shown; the system is not probed
/// again.
///
/// # Errors
///
/// Returns an error if reconciliation or the chosen action fails.
pub fn run(session: &Session) -> Result<()> {
    let result = compute(session)?;
    show(session, &result);
    if !result.needs_action() {
        session.log.success("Everything is in sync");
        return Ok(());
    }

    let log = &session.log;
    log.info("");
    log.info("What would you like to do?");
    log.info("  (1) Remove extraneous packages");
    log.info("  (2) Install missing packages");
    log.info("  (3) Both");
    log.info("  (q) Quit");
    let Some(choice) = session.prompt.ask("Enter your choice [q]: ") else {
        return Ok(());
    };
    match choice.to_lowercase().as_str() {
        "1" => remove_extraneous(session, &result),
        "2" => install_missing(session, &result),
        "3" => {
            install_missing(session, &result)?;
            remove_extraneous(session, &result)
        }
        "" | "q" => Ok(()),
        other => {
            log.warn(&format!("invalid choice '{other}'"));
            Ok(())
        }
    }
}

/// Uninstall every extraneous declaration, one by one, after confirmation.
///
/// Taps go last so their formulae are gone first.
///
/// # Errors
///
/// Returns an error if the run is interrupted or any uninstall fails.
pub fn remove_extraneous(session: &Session, result: &Reconciliation) -> Result<()> {
    let log = &session.log;
    if result.extraneous.is_empty() {
        log.info("Nothing to remove");
        return Ok(());
    }
    let counts = result.counts();
    log.info(&format!(
        "This will uninstall {} package(s) from your system.",
        counts.extraneous
    ));
    if counts.cross_referenced > 0 {
        log.warn(&format!(
            "{} of them are declared in Brewfiles outside the current scope",
            counts.cross_referenced
        ));
    }
    if !confirm(session.prompt.as_ref(), "Are you sure?") {
        log.info("Cancelled");
        return Ok(());
    }

    log.stage("Removing extraneous packages");
    let mut failed = 0usize;
    for decl in result.extraneous.keys().rev() {
        if interrupted() {
            return Err(BrewfileError::Interrupted.into());
        }
        match session.pm().uninstall(decl) {
            Ok(()) => log.success(&format!("removed {decl}")),
            Err(e) => {
                log.warn(&format!("{e:#}"));
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} package(s) could not be removed");
    }
    Ok(())
}

/// Install every missing declaration through a temporary manifest.
///
/// # Errors
///
/// Returns an error if the temporary manifest cannot be written or the
/// install fails.
pub fn install_missing(session: &Session, result: &Reconciliation) -> Result<()> {
    let log = &session.log;
    if result.missing.is_empty() {
        log.info("Nothing to install");
        return Ok(());
    }
    let missing: Vec<_> = result.missing.iter().cloned().collect();
    let manifest = tempfile::Builder::new()
        .prefix("brewfile-missing-")
        .tempfile()
        .context("creating temporary Brewfile")?;
    std::fs::write(manifest.path(), store::render(&missing))
        .context("writing temporary Brewfile")?;

    log.stage(&format!("Installing {} missing package(s)", missing.len()));
    session.pm().bundle_install(manifest.path())?;
    log.success(&format!("installed {} package(s)", missing.len()));
    Ok(())
}

//! Command: remove installed packages the scope does not declare.
use anyhow::{Context as _, Result};
use std::collections::BTreeSet;

use super::Session;
use crate::error::BrewfileError;
use crate::manifest::{Declaration, store};
use crate::prompt::{confirm, interrupted};

/// Preview what `brew bundle cleanup` would remove against the in-scope
/// declarations, confirm, then remove it.
///
/// The declarations are merged into a temporary manifest that is deleted
/// however the command ends.  `force` skips the confirmation.
///
/// # Errors
///
/// Returns an error if the package manager is missing, the temporary
/// manifest cannot be written, the run was interrupted, or the removal
/// fails.
pub fn run(session: &Session, force: bool) -> Result<()> {
    let pm = session.pm();
    pm.ensure_available()?;
    let log = &session.log;

    let declared: BTreeSet<Declaration> = session
        .load_scope()?
        .into_iter()
        .flat_map(|m| m.declarations)
        .collect();
    let declared: Vec<Declaration> = declared.into_iter().collect();
    let manifest = tempfile::Builder::new()
        .prefix("brewfile-scope-")
        .tempfile()
        .context("creating temporary Brewfile")?;
    std::fs::write(manifest.path(), store::render(&declared))
        .context("writing temporary Brewfile")?;

    log.stage("Checking for packages to clean up");
    let preview = pm.cleanup_preview(manifest.path())?;
    if preview.is_empty() {
        log.success("Nothing to clean up");
        return Ok(());
    }
    for line in &preview {
        log.info(line);
    }
    if !force && !confirm(session.prompt.as_ref(), "Proceed with removal?") {
        log.info("Cancelled");
        return Ok(());
    }
    if interrupted() {
        return Err(BrewfileError::Interrupted.into());
    }

    log.stage("Cleaning up");
    pm.cleanup_apply(manifest.path())?;
    log.success("Cleanup complete");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::manifest::Selection;
    use crate::probe::MockPackageManager;
    use crate::test_helpers::{root_with, session};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    fn available() -> MockPackageManager {
        let mut pm = MockPackageManager::new();
        pm.expect_ensure_available().returning(|| Ok(()));
        pm
    }

    #[test]
    fn nothing_to_remove_skips_prompt() {
        let root = root_with(&[("Brewfile", "brew \"jq\"\n")]);
        let mut pm = available();
        pm.expect_cleanup_preview().returning(|_| Ok(Vec::new()));
        pm.expect_cleanup_apply().never();
        let (s, log, _) = session(root.path(), &Selection::default(), pm, &[]);
        run(&s, false).unwrap();
        assert!(log.contains("Nothing to clean up"));
    }

    #[test]
    fn preview_sees_merged_scope_and_file_is_removed() {
        let root = root_with(&[
            ("Brewfile", "brew \"jq\"\n"),
            ("Brewfile.a", "cask \"zoom\"\nbrew \"jq\"\n"),
        ]);
        let seen = Arc::new(Mutex::new(None::<PathBuf>));
        let record = Arc::clone(&seen);
        let mut pm = available();
        pm.expect_cleanup_preview().returning(move |p| {
            assert_eq!(
                std::fs::read_to_string(p).unwrap(),
                "brew \"jq\"\ncask \"zoom\"\n"
            );
            *record.lock().unwrap() = Some(p.to_path_buf());
            Ok(Vec::new())
        });
        let selection = Selection {
            include: vec!["a".into()],
            all: false,
        };
        let (s, _, _) = session(root.path(), &selection, pm, &[]);
        run(&s, false).unwrap();
        let path = seen.lock().unwrap().clone().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn declined_confirmation_removes_nothing() {
        let root = root_with(&[("Brewfile", "")]);
        let mut pm = available();
        pm.expect_cleanup_preview()
            .returning(|_| Ok(vec!["Would uninstall formulae:".into(), "wget".into()]));
        pm.expect_cleanup_apply().never();
        let (s, log, _) = session(root.path(), &Selection::default(), pm, &[None]);
        run(&s, false).unwrap();
        assert!(log.contains("wget"));
        assert!(log.contains("Cancelled"));
    }

    #[test]
    fn confirmed_cleanup_applies() {
        let root = root_with(&[("Brewfile", "")]);
        let mut pm = available();
        pm.expect_cleanup_preview()
            .returning(|_| Ok(vec!["wget".into()]));
        pm.expect_cleanup_apply().times(1).returning(|_| Ok(()));
        let (s, _, _) = session(root.path(), &Selection::default(), pm, &[Some("y")]);
        run(&s, false).unwrap();
    }

    #[test]
    fn force_skips_confirmation() {
        let root = root_with(&[("Brewfile", "")]);
        let mut pm = available();
        pm.expect_cleanup_preview()
            .returning(|_| Ok(vec!["wget".into()]));
        pm.expect_cleanup_apply().times(1).returning(|_| Ok(()));
        let (s, _, _) = session(root.path(), &Selection::default(), pm, &[]);
        run(&s, true).unwrap();
    }
}

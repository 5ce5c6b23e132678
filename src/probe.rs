//! System state probe: the package-manager collaborator.
//!
//! [`PackageManager`] is the seam between the reconciler and the real
//! package manager.  [`Homebrew`] drives `brew` (and `mas`, `whalebrew`,
//! `code` for the kinds brew does not manage itself) through an
//! [`Executor`]; [`SystemState`] caches the installed set for one
//! invocation.
use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::error::BrewfileError;
use crate::exec::{ExecResult, Executor};
use crate::manifest::{Declaration, Kind, store};

/// Operations the reconciler needs from the package manager.
#[cfg_attr(test, mockall::automock)]
pub trait PackageManager: std::fmt::Debug {
    /// Fail with [`BrewfileError::ToolMissing`] unless the program is on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be found.
    fn ensure_available(&self) -> Result<()>;

    /// Export the installed state and parse it with the manifest grammar.
    ///
    /// # Errors
    ///
    /// Returns an error if the export fails or its output cannot be read.
    fn installed(&self) -> Result<BTreeSet<Declaration>>;

    /// Decide the kind a bare package name installs as.
    ///
    /// # Errors
    ///
    /// Returns [`BrewfileError::Install`] if the package is unknown.
    fn classify(&self, name: &str) -> Result<Kind>;

    /// Install a single package.
    ///
    /// # Errors
    ///
    /// Returns [`BrewfileError::Install`] on non-zero exit.
    fn install(&self, decl: &Declaration) -> Result<()>;

    /// Uninstall a single package.
    ///
    /// # Errors
    ///
    /// Returns [`BrewfileError::Uninstall`] on non-zero exit.
    fn uninstall(&self, decl: &Declaration) -> Result<()>;

    /// Install everything a manifest file declares.
    ///
    /// # Errors
    ///
    /// Returns [`BrewfileError::Install`] on non-zero exit.
    fn bundle_install(&self, manifest: &Path) -> Result<()>;

    /// Lines describing what a cleanup against `manifest` would remove.
    /// Empty when nothing would be removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the package manager cannot be run.
    fn cleanup_preview(&self, manifest: &Path) -> Result<Vec<String>>;

    /// Remove everything not declared in `manifest`.
    ///
    /// # Errors
    ///
    /// Returns [`BrewfileError::Uninstall`] on non-zero exit.
    fn cleanup_apply(&self, manifest: &Path) -> Result<()>;
}

/// `brew info --json=v2` output, reduced to what classification needs.
#[derive(Debug, Default, Deserialize)]
struct InfoV2 {
    #[serde(default)]
    formulae: Vec<serde_json::Value>,
    #[serde(default)]
    casks: Vec<serde_json::Value>,
}

/// Homebrew, driven through `brew bundle` and friends.
#[derive(Debug, Clone)]
pub struct Homebrew {
    executor: Arc<dyn Executor>,
    program: String,
    vscode: bool,
}

impl Homebrew {
    /// Create a driver running `program` through `executor`.  `vscode`
    /// keeps editor extensions in state exports.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, program: &str, vscode: bool) -> Self {
        Self {
            executor,
            program: program.to_string(),
            vscode,
        }
    }

    /// Program and arguments that install or uninstall `decl`.
    fn command_for(&self, decl: &Declaration, install: bool) -> (String, Vec<String>) {
        let name = decl.name.clone();
        let brew = |args: &[&str]| {
            let mut argv: Vec<String> = args.iter().map(ToString::to_string).collect();
            argv.push(decl.name.clone());
            (self.program.clone(), argv)
        };
        match (decl.kind, install) {
            (Kind::Tap, true) => brew(&["tap"]),
            (Kind::Tap, false) => brew(&["untap"]),
            (Kind::Brew, true) => brew(&["install"]),
            (Kind::Brew, false) => brew(&["uninstall"]),
            (Kind::Cask, true) => brew(&["install", "--cask"]),
            (Kind::Cask, false) => brew(&["uninstall", "--cask"]),
            (Kind::Mas, _) => {
                let id = decl.option_id().map_or(name, String::from);
                let verb = if install { "install" } else { "uninstall" };
                ("mas".to_string(), vec![verb.to_string(), id])
            }
            (Kind::Whalebrew, _) => {
                let verb = if install { "install" } else { "uninstall" };
                ("whalebrew".to_string(), vec![verb.to_string(), name])
            }
            (Kind::Vscode, _) => {
                let flag = if install {
                    "--install-extension"
                } else {
                    "--uninstall-extension"
                };
                ("code".to_string(), vec![flag.to_string(), name])
            }
        }
    }

    fn run_for(&self, decl: &Declaration, install: bool) -> Result<ExecResult> {
        let (program, args) = self.command_for(decl, install);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.executor.run_interactive(&program, &args)
    }

    fn bundle(&self, args: &[&str], manifest: &Path) -> Vec<String> {
        let mut argv = vec!["bundle".to_string()];
        argv.extend(args.iter().map(ToString::to_string));
        argv.push("--file".to_string());
        argv.push(manifest.display().to_string());
        argv
    }
}

impl PackageManager for Homebrew {
    fn ensure_available(&self) -> Result<()> {
        if self.executor.which(&self.program) {
            Ok(())
        } else {
            Err(BrewfileError::ToolMissing {
                program: self.program.clone(),
            }
            .into())
        }
    }

    fn installed(&self) -> Result<BTreeSet<Declaration>> {
        let dump = tempfile::Builder::new()
            .prefix("brewfile-dump-")
            .tempfile()
            .context("creating temp file for state dump")?;
        let mut args = self.bundle(&["dump", "--force"], dump.path());
        if !self.vscode {
            args.push("--no-vscode".to_string());
        }
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.executor
            .run(&self.program, &args)
            .context("exporting installed state")?;
        Ok(store::parse(dump.path())?.into_iter().collect())
    }

    fn classify(&self, name: &str) -> Result<Kind> {
        if name.matches('/').count() == 1 {
            return Ok(Kind::Tap);
        }
        let result = self
            .executor
            .run_unchecked(&self.program, &["info", "--json=v2", name])?;
        if !result.success {
            return Err(BrewfileError::install(name, &result.detail()).into());
        }
        let info: InfoV2 = serde_json::from_str(&result.stdout)
            .with_context(|| format!("parsing package info for '{name}'"))?;
        if !info.casks.is_empty() {
            Ok(Kind::Cask)
        } else if !info.formulae.is_empty() {
            Ok(Kind::Brew)
        } else {
            Err(BrewfileError::install(name, "no formula or cask with this name").into())
        }
    }

    fn install(&self, decl: &Declaration) -> Result<()> {
        let result = self.run_for(decl, true)?;
        if !result.success {
            return Err(BrewfileError::install(&decl.name, &result.detail()).into());
        }
        Ok(())
    }

    fn uninstall(&self, decl: &Declaration) -> Result<()> {
        let result = self.run_for(decl, false)?;
        if !result.success {
            return Err(BrewfileError::uninstall(&decl.name, &result.detail()).into());
        }
        Ok(())
    }

    fn bundle_install(&self, manifest: &Path) -> Result<()> {
        let args = self.bundle(&["install"], manifest);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self.executor.run_interactive(&self.program, &args)?;
        if !result.success {
            return Err(
                BrewfileError::install(&manifest.display().to_string(), &result.detail()).into(),
            );
        }
        Ok(())
    }

    fn cleanup_preview(&self, manifest: &Path) -> Result<Vec<String>> {
        let args = self.bundle(&["cleanup"], manifest);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        // Exits non-zero whenever there is something to clean up.
        let result = self.executor.run_unchecked(&self.program, &args)?;
        Ok(result
            .stdout
            .lines()
            .map(str::trim_end)
            .filter(|l| !l.trim().is_empty() && !l.contains("--force"))
            .map(String::from)
            .collect())
    }

    fn cleanup_apply(&self, manifest: &Path) -> Result<()> {
        let args = self.bundle(&["cleanup", "--force"], manifest);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let result = self.executor.run_interactive(&self.program, &args)?;
        if !result.success {
            return Err(
                BrewfileError::uninstall(&manifest.display().to_string(), &result.detail()).into(),
            );
        }
        Ok(())
    }
}

/// The installed set, probed at most once per invocation.
#[derive(Debug)]
pub struct SystemState {
    pm: Box<dyn PackageManager>,
    installed: OnceCell<BTreeSet<Declaration>>,
}

impl SystemState {
    /// Wrap a package manager.
    #[must_use]
    pub fn new(pm: Box<dyn PackageManager>) -> Self {
        Self {
            pm,
            installed: OnceCell::new(),
        }
    }

    /// The underlying package manager.
    #[must_use]
    pub fn pm(&self) -> &dyn PackageManager {
        self.pm.as_ref()
    }

    /// Installed declarations, probing on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the probe fails; a later call probes again.
    pub fn installed(&self) -> Result<&BTreeSet<Declaration>> {
        if let Some(set) = self.installed.get() {
            return Ok(set);
        }
        let set = self.pm.installed()?;
        Ok(self.installed.get_or_init(|| set))
    }
}

//! Settings file and manifest-root resolution.
//!
//! Settings live in an optional TOML file:
//!
//! ```toml
//! root = "~/dotfiles/brew"   # manifest directory
//! brew = "brew"              # package-manager program
//! misc = "extra"             # auxiliary receiving new items on `dump --force`
//! editor = "nvim"            # used when $EDITOR is unset
//! vscode = false             # keep editor extensions in state exports
//! ```
pub mod toml_loader;

use anyhow::{Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::manifest::PRIMARY_FILE;

/// User settings.  Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Manifest directory.
    pub root: Option<PathBuf>,
    /// Package-manager program.
    pub brew: String,
    /// Auxiliary suffix for new items during a force dump.
    pub misc: String,
    /// Editor used when `EDITOR` is unset.
    pub editor: Option<String>,
    /// Keep editor extensions in state exports.
    pub vscode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root: None,
            brew: "brew".to_string(),
            misc: "extra".to_string(),
            editor: None,
            vscode: false,
        }
    }
}

/// The environment variables and working directory configuration depends
/// on, captured once so resolution is a pure function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `BREWFILE_CONFIG`.
    pub config: Option<PathBuf>,
    /// `BREWFILE_ROOT`.
    pub root: Option<PathBuf>,
    /// `XDG_CONFIG_HOME`.
    pub xdg_config_home: Option<PathBuf>,
    /// `HOME`.
    pub home: Option<PathBuf>,
    /// `EDITOR`.
    pub editor: Option<String>,
    /// Current working directory.
    pub cwd: Option<PathBuf>,
}

impl Environment {
    /// Capture the current process environment.  Empty variables count as
    /// unset.
    #[must_use]
    pub fn capture() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            config: var("BREWFILE_CONFIG").map(PathBuf::from),
            root: var("BREWFILE_ROOT").map(PathBuf::from),
            xdg_config_home: var("XDG_CONFIG_HOME").map(PathBuf::from),
            home: var("HOME").map(PathBuf::from),
            editor: var("EDITOR"),
            cwd: std::env::current_dir().ok(),
        }
    }

    /// Settings file location, if one can be determined.
    #[must_use]
    pub fn config_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config {
            return Some(self.expand(path));
        }
        let base = self
            .xdg_config_home
            .clone()
            .or_else(|| self.home.as_ref().map(|h| h.join(".config")))?;
        Some(base.join("brewfile").join("config.toml"))
    }

    /// Expand a leading `~/` against `HOME`.
    #[must_use]
    pub fn expand(&self, path: &Path) -> PathBuf {
        match (path.strip_prefix("~"), &self.home) {
            (Ok(rest), Some(home)) => home.join(rest),
            _ => path.to_path_buf(),
        }
    }
}

impl Settings {
    /// Load settings from the configured file; defaults when there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(env: &Environment) -> Result<Self> {
        match env.config_path() {
            Some(path) => toml_loader::load_config(&path),
            None => Ok(Self::default()),
        }
    }

    /// Editor program: `EDITOR`, then the `editor` setting, then `vi`.
    #[must_use]
    pub fn editor(&self, env: &Environment) -> String {
        env.editor
            .clone()
            .or_else(|| self.editor.clone())
            .unwrap_or_else(|| "vi".to_string())
    }
}

/// Resolve the manifest directory.
///
/// Order: the `--root` flag, `BREWFILE_ROOT`, the `root` setting, then the
/// current directory if it holds a `Brewfile`.
///
/// # Errors
///
/// Returns an error when none of these yields a directory.
pub fn resolve_root(
    flag: Option<&Path>,
    env: &Environment,
    settings: &Settings,
) -> Result<PathBuf> {
    let explicit = flag
        .map(Path::to_path_buf)
        .or_else(|| env.root.clone())
        .or_else(|| settings.root.clone());
    if let Some(root) = explicit {
        let root = env.expand(&root);
        if !root.is_dir() {
            bail!("manifest directory {} does not exist", root.display());
        }
        return Ok(root);
    }
    if let Some(cwd) = &env.cwd
        && cwd.join(PRIMARY_FILE).is_file()
    {
        return Ok(cwd.clone());
    }
    bail!(
        "no {PRIMARY_FILE} found; pass --root, set BREWFILE_ROOT, or set `root` in {}",
        env.config_path()
            .map_or_else(|| "the config file".to_string(), |p| p.display().to_string())
    )
}

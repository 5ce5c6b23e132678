//! Domain-specific error types for the manifest reconciler.
//!
//! Internal modules return [`anyhow::Result`] and attach context at I/O
//! boundaries.  Failures the user has to act on are raised as a
//! [`BrewfileError`] so that callers (and tests) can tell them apart with
//! [`anyhow::Error::downcast_ref`].
//!
//! # Error taxonomy
//!
//! ```text
//! BrewfileError
//! ├── ToolMissing  — package-manager binary absent, checked before any work
//! ├── NotFound     — `remove` target not declared in any manifest
//! ├── Conflict     — `add` target already mentioned in some manifest
//! ├── Install      — package manager exited non-zero while installing
//! ├── Uninstall    — package manager exited non-zero while uninstalling
//! ├── Interrupted  — Ctrl-C seen before a destructive write
//! └── Manifest     — a manifest file could not be read or written
//! ```
//!
//! Lines that do not match the declaration grammar are not errors; the
//! manifest parser skips them.

use thiserror::Error;

/// Errors surfaced to the user by the reconciler commands.
#[derive(Error, Debug)]
pub enum BrewfileError {
    /// The package-manager program could not be found on `PATH`.
    #[error("'{program}' not found in your PATH")]
    ToolMissing {
        /// Program that was looked up.
        program: String,
    },

    /// No manifest declares a package with this exact name.
    #[error("'{name}' is not declared in any Brewfile")]
    NotFound {
        /// Name that was searched for.
        name: String,
    },

    /// The name already occurs in a manifest, so `add` refuses to run.
    #[error("'{name}' already appears in {manifest}")]
    Conflict {
        /// Name that was being added.
        name: String,
        /// Manifest whose text contains the name.
        manifest: String,
    },

    /// Installing a package failed.
    #[error("failed to install '{name}': {detail}")]
    Install {
        /// Package that could not be installed.
        name: String,
        /// Output from the package manager.
        detail: String,
    },

    /// Uninstalling a package failed.
    #[error("failed to uninstall '{name}': {detail}")]
    Uninstall {
        /// Package that could not be uninstalled.
        name: String,
        /// Output from the package manager.
        detail: String,
    },

    /// The user interrupted the run before a write took place.
    #[error("interrupted, no manifest was changed")]
    Interrupted,

    /// A manifest file could not be read or written.
    #[error("cannot access manifest {path}: {source}")]
    Manifest {
        /// Path of the manifest.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl BrewfileError {
    /// Build an [`Install`](Self::Install) error from package-manager output.
    #[must_use]
    pub fn install(name: &str, detail: &str) -> Self {
        Self::Install {
            name: name.to_string(),
            detail: summarize(detail),
        }
    }

    /// Build an [`Uninstall`](Self::Uninstall) error from package-manager output.
    #[must_use]
    pub fn uninstall(name: &str, detail: &str) -> Self {
        Self::Uninstall {
            name: name.to_string(),
            detail: summarize(detail),
        }
    }
}

/// Collapse package-manager output to its last non-empty line, which is
/// where brew puts the actual error.
fn summarize(detail: &str) -> String {
    detail
        .lines()
        .map(str::trim)
        .rfind(|l| !l.is_empty())
        .map_or_else(|| "exited with a non-zero status".to_string(), String::from)
}

//! Homebrew manifest reconciliation.
//!
//! Keeps the installed Homebrew state and a set of Brewfiles in agreement:
//! a primary `Brewfile` plus optional auxiliaries (`Brewfile.work`,
//! `Brewfile.fonts`, …) selected per invocation.
//!
//! The public API is organised into layers:
//!
//! - **[`manifest`]**: discover, parse and rewrite Brewfiles
//! - **[`probe`]**: the package-manager seam and the installed-state cache
//! - **[`reconcile`]**: pure set arithmetic with provenance
//! - **[`render`]**: status and listing output
//! - **[`commands`]**: subcommand orchestration over a [`commands::Session`]
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod manifest;
pub mod probe;
pub mod prompt;
pub mod reconcile;
pub mod render;

#[cfg(test)]
pub(crate) mod test_helpers;

//! Command-line argument model.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::manifest::Selection;

/// Top-level CLI entry point.
///
/// With no subcommand, runs the interactive reconcile.
#[derive(Parser, Debug)]
#[command(
    name = "brewfile",
    about = "Reconcile Homebrew against one or more Brewfiles",
    version = option_env!("BREWFILE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Subcommand; omit for the interactive reconcile.
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Auxiliary Brewfiles to include, by suffix (work,fonts)
    #[arg(short, long, global = true, value_delimiter = ',', conflicts_with = "all")]
    pub include: Vec<String>,

    /// Include every auxiliary Brewfile
    #[arg(short, long, global = true)]
    pub all: bool,

    /// Directory holding the Brewfiles
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl GlobalOpts {
    /// The auxiliary selection these options request.
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection {
            include: self.include.clone(),
            all: self.all,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Install a package and declare it
    Add {
        /// Package name (a name with one slash is a tap)
        name: String,
        /// Auxiliary Brewfile to declare it in, by suffix
        #[arg(long)]
        to: Option<String>,
    },
    /// Remove a declaration, optionally uninstalling the package
    Remove {
        /// Package name as declared
        name: String,
    },
    /// Write installed packages into the Brewfiles
    Dump {
        /// Rewrite every Brewfile from the installed state
        #[arg(short, long)]
        force: bool,
    },
    /// Open the Brewfiles in scope in $EDITOR
    Edit,
    /// Print the paths of the Brewfiles in scope
    Path,
    /// Show status without prompting
    Check,
    /// Install everything declared in scope
    Install,
    /// Uninstall everything not declared in scope
    Cleanup {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Install, then clean up
    Sync {
        /// Skip the cleanup confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// List declarations in scope
    List,
    /// Print a shell completion script
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn log_name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Remove { .. } => "remove",
            Self::Dump { .. } => "dump",
            Self::Edit => "edit",
            Self::Path => "path",
            Self::Check => "check",
            Self::Install => "install",
            Self::Cleanup { .. } => "cleanup",
            Self::Sync { .. } => "sync",
            Self::List => "list",
            Self::Completions { .. } => "completions",
            Self::Version => "version",
        }
    }
}

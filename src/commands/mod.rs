//! Subcommand orchestration: one module per command over a shared [`Session`].
pub mod add;
pub mod cleanup;
pub mod dump;
pub mod edit;
pub mod install;
pub mod list;
pub mod path;
pub mod reconcile;
pub mod remove;
pub mod sync;
pub mod version;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

use crate::cli::{Cli, Command};
use crate::config::{self, Environment, Settings};
use crate::exec::{Executor, SystemExecutor};
use crate::logging::Log;
use crate::manifest::{Catalog, LoadedManifest, Manifest, Scope, Selection};
use crate::probe::{Homebrew, PackageManager, SystemState};
use crate::prompt::{Prompt, TerminalPrompt};
use crate::render::Style;

/// Collaborators a [`Session`] runs against.
#[derive(Debug)]
pub struct Services {
    /// Log sink.
    pub log: Arc<dyn Log>,
    /// Package manager.
    pub pm: Box<dyn PackageManager>,
    /// Source of interactive answers.
    pub prompt: Box<dyn Prompt>,
    /// Runs the editor.
    pub executor: Arc<dyn Executor>,
    /// Colour decision.
    pub style: Style,
    /// Loaded settings.
    pub settings: Settings,
    /// Editor command line.
    pub editor: String,
}

/// Everything one invocation works with.
///
/// The catalog and scope are computed once here, so reads and any writes
/// triggered later in the same invocation see the same manifests.
#[derive(Debug)]
pub struct Session {
    /// Every manifest under the root.
    pub catalog: Catalog,
    /// Manifests selected for this command.
    pub scope: Scope,
    /// Log sink.
    pub log: Arc<dyn Log>,
    /// Installed state, probed at most once.
    pub state: SystemState,
    /// Source of interactive answers.
    pub prompt: Box<dyn Prompt>,
    /// Runs the editor.
    pub executor: Arc<dyn Executor>,
    /// Colour decision.
    pub style: Style,
    /// Loaded settings.
    pub settings: Settings,
    /// Editor command line.
    pub editor: String,
}

impl Session {
    /// Discover manifests under `root` and resolve `selection` into a scope.
    ///
    /// Unknown auxiliary names are warned about and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the root cannot be listed.
    pub fn open(root: &Path, selection: &Selection, services: Services) -> Result<Self> {
        let catalog = Catalog::discover(root)?;
        let scope = catalog.scope(selection);
        for name in scope.unknown() {
            services
                .log
                .warn(&format!("no Brewfile.{name} in {}, skipping", root.display()));
        }
        services.log.debug(&format!(
            "scope: {}",
            crate::render::manifest_list(scope.manifests().iter().map(|m| &m.id))
        ));
        Ok(Self {
            catalog,
            scope,
            log: services.log,
            state: SystemState::new(services.pm),
            prompt: services.prompt,
            executor: services.executor,
            style: services.style,
            settings: services.settings,
            editor: services.editor,
        })
    }

    /// The package manager.
    #[must_use]
    pub fn pm(&self) -> &dyn PackageManager {
        self.state.pm()
    }

    /// Parse the manifests in scope, PRIMARY first.
    ///
    /// # Errors
    ///
    /// Returns an error if a manifest exists but cannot be read.
    pub fn load_scope(&self) -> Result<Vec<LoadedManifest>> {
        self.scope.manifests().iter().map(Manifest::load).collect()
    }
}

/// Build a production session from the parsed command line.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, no manifest root can be
/// resolved, or the Ctrl-C handler cannot be installed.
pub fn open_session(cli: &Cli, log: Arc<dyn Log>, style: Style) -> Result<Session> {
    let env = Environment::capture();
    let settings = Settings::load(&env)?;
    let root = config::resolve_root(cli.global.root.as_deref(), &env, &settings)?;
    log.debug(&format!("manifest root: {}", root.display()));

    let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
    let pm = Homebrew::new(Arc::clone(&executor), &settings.brew, settings.vscode);
    let services = Services {
        log,
        pm: Box::new(pm),
        prompt: Box::new(TerminalPrompt::new(style)?),
        executor,
        style,
        editor: settings.editor(&env),
        settings,
    };
    Session::open(&root, &cli.global.selection(), services)
}

/// Run the parsed command line.
///
/// `version` and `completions` run without a manifest root; everything
/// else opens a [`Session`] first.
///
/// # Errors
///
/// Returns the first error raised by the command.
pub fn run(cli: &Cli, log: Arc<dyn Log>, style: Style) -> Result<()> {
    match &cli.command {
        Some(Command::Version) => {
            version::run();
            Ok(())
        }
        Some(Command::Completions { shell }) => {
            version::completions(*shell);
            Ok(())
        }
        command => {
            let session = open_session(cli, log, style)?;
            dispatch(command.as_ref(), &session)
        }
    }
}

/// Route a command to its handler.
///
/// # Errors
///
/// Returns the first error raised by the handler.
pub fn dispatch(command: Option<&Command>, session: &Session) -> Result<()> {
    match command {
        None => reconcile::run(session),
        Some(Command::Add { name, to }) => add::run(session, name, to.as_deref()),
        Some(Command::Remove { name }) => remove::run(session, name),
        Some(Command::Dump { force: false }) => dump::append(session),
        Some(Command::Dump { force: true }) => dump::force(session),
        Some(Command::Edit) => edit::run(session),
        Some(Command::Path) => {
            path::run(session);
            Ok(())
        }
        Some(Command::Check) => reconcile::check(session),
        Some(Command::Install) => install::run(session),
        Some(Command::Cleanup { force }) => cleanup::run(session, *force),
        Some(Command::Sync { force }) => sync::run(session, *force),
        Some(Command::List) => list::run(session),
        Some(Command::Completions { shell }) => {
            version::completions(*shell);
            Ok(())
        }
        Some(Command::Version) => {
            version::run();
            Ok(())
        }
    }
}

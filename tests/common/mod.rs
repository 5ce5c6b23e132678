// Shared helpers for integration tests.
//
// Provides a temporary manifest root and an in-memory package manager so
// each integration test can drive commands end to end without touching
// Homebrew.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use brewfile_cli::commands::{Services, Session};
use brewfile_cli::config::Settings;
use brewfile_cli::error::BrewfileError;
use brewfile_cli::exec::SystemExecutor;
use brewfile_cli::logging::Log;
use brewfile_cli::manifest::{Declaration, Kind, Selection, store};
use brewfile_cli::probe::PackageManager;
use brewfile_cli::prompt::Prompt;
use brewfile_cli::render::Style;

/// Parse manifest lines into declarations.
pub fn decls(lines: &[&str]) -> BTreeSet<Declaration> {
    lines
        .iter()
        .map(|l| Declaration::parse(l).expect("valid declaration"))
        .collect()
}

/// A package manager whose installed set lives in memory.
///
/// Installs and uninstalls mutate the set; names listed in `casks` classify
/// as casks, names with one `/` as taps, everything else as formulae.
#[derive(Debug, Default)]
pub struct MemoryBrew {
    pub installed: Mutex<BTreeSet<Declaration>>,
    pub casks: Vec<String>,
    pub broken: Vec<String>,
    pub installed_reads: Mutex<usize>,
}

impl MemoryBrew {
    pub fn with(installed: &[&str]) -> Self {
        Self {
            installed: Mutex::new(decls(installed)),
            ..Self::default()
        }
    }

    /// Make installs and uninstalls of `name` fail.
    pub fn broken(mut self, name: &str) -> Self {
        self.broken.push(name.to_string());
        self
    }

    pub fn cask(mut self, name: &str) -> Self {
        self.casks.push(name.to_string());
        self
    }
}

/// Shares one [`MemoryBrew`] between the session and the test.
#[derive(Debug, Clone)]
pub struct SharedBrew(pub Arc<MemoryBrew>);

impl SharedBrew {
    pub fn snapshot(&self) -> BTreeSet<Declaration> {
        self.0.installed.lock().expect("lock").clone()
    }

    pub fn installed_reads(&self) -> usize {
        *self.0.installed_reads.lock().expect("lock")
    }
}

impl PackageManager for SharedBrew {
    fn ensure_available(&self) -> Result<()> {
        Ok(())
    }

    fn installed(&self) -> Result<BTreeSet<Declaration>> {
        *self.0.installed_reads.lock().expect("lock") += 1;
        Ok(self.snapshot())
    }

    fn classify(&self, name: &str) -> Result<Kind> {
        if name.matches('/').count() == 1 {
            Ok(Kind::Tap)
        } else if self.0.casks.iter().any(|c| c == name) {
            Ok(Kind::Cask)
        } else {
            Ok(Kind::Brew)
        }
    }

    fn install(&self, decl: &Declaration) -> Result<()> {
        if self.0.broken.contains(&decl.name) {
            return Err(BrewfileError::install(&decl.name, "Error: broken").into());
        }
        self.0.installed.lock().expect("lock").insert(decl.clone());
        Ok(())
    }

    fn uninstall(&self, decl: &Declaration) -> Result<()> {
        if self.0.broken.contains(&decl.name) {
            return Err(BrewfileError::uninstall(&decl.name, "Error: broken").into());
        }
        self.0.installed.lock().expect("lock").remove(decl);
        Ok(())
    }

    fn bundle_install(&self, manifest: &Path) -> Result<()> {
        let wanted = store::parse(manifest)?;
        self.0.installed.lock().expect("lock").extend(wanted);
        Ok(())
    }

    fn cleanup_preview(&self, manifest: &Path) -> Result<Vec<String>> {
        let keep: BTreeSet<_> = store::parse(manifest)?.into_iter().collect();
        Ok(self
            .snapshot()
            .difference(&keep)
            .map(|d| d.raw_line.clone())
            .collect())
    }

    fn cleanup_apply(&self, manifest: &Path) -> Result<()> {
        let keep: BTreeSet<_> = store::parse(manifest)?.into_iter().collect();
        self.0.installed.lock().expect("lock").retain(|d| keep.contains(d));
        Ok(())
    }
}

/// [`Log`] that keeps every message as `"<level>: <msg>"`.
#[derive(Debug, Default)]
pub struct RecordingLog(Mutex<Vec<String>>);

impl RecordingLog {
    pub fn contains(&self, needle: &str) -> bool {
        self.0.lock().expect("lock").iter().any(|m| m.contains(needle))
    }

    fn push(&self, level: &str, msg: &str) {
        self.0.lock().expect("lock").push(format!("{level}: {msg}"));
    }
}

impl Log for RecordingLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn success(&self, msg: &str) {
        self.push("success", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
}

/// [`Prompt`] replaying canned answers; `None` acts like end of input.
#[derive(Debug, Default)]
pub struct ScriptedPrompt(Mutex<VecDeque<Option<String>>>);

impl ScriptedPrompt {
    pub fn new(answers: &[Option<&str>]) -> Self {
        Self(Mutex::new(
            answers.iter().map(|a| a.map(String::from)).collect(),
        ))
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, _question: &str) -> Option<String> {
        self.0.lock().expect("lock").pop_front().flatten()
    }
}

/// A temporary manifest root.
pub struct TestRoot {
    pub dir: tempfile::TempDir,
}

impl TestRoot {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// Write `content` to `name` under the root.
    pub fn with(self, name: &str, content: &str) -> Self {
        std::fs::write(self.dir.path().join(name), content).expect("write manifest");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Contents of `name`, empty if absent.
    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).unwrap_or_default()
    }

    /// Open a session over this root.
    pub fn session(
        &self,
        selection: &Selection,
        brew: &SharedBrew,
        answers: &[Option<&str>],
    ) -> (Session, Arc<RecordingLog>) {
        let log = Arc::new(RecordingLog::default());
        let services = Services {
            log: log.clone(),
            pm: Box::new(brew.clone()),
            prompt: Box::new(ScriptedPrompt::new(answers)),
            executor: Arc::new(SystemExecutor),
            style: Style::PLAIN,
            settings: Settings::default(),
            editor: "true".to_string(),
        };
        let session = Session::open(self.path(), selection, services).expect("open session");
        (session, log)
    }
}

pub fn shared(brew: MemoryBrew) -> SharedBrew {
    SharedBrew(Arc::new(brew))
}

pub fn include(names: &[&str]) -> Selection {
    Selection {
        include: names.iter().map(ToString::to_string).collect(),
        all: false,
    }
}

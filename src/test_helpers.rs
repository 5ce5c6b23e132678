//! Shared fakes for unit tests.
#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]

use anyhow::{Result, bail};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::commands::{Services, Session};
use crate::config::Settings;
use crate::exec::{ExecResult, Executor};
use crate::logging::Log;
use crate::manifest::Selection;
use crate::probe::MockPackageManager;
use crate::prompt::Prompt;
use crate::render::Style;

/// [`Log`] that keeps every message as `"<level>: <msg>"`.
#[derive(Debug, Default)]
pub struct RecordingLog {
    messages: Mutex<Vec<String>>,
}

impl RecordingLog {
    fn push(&self, level: &str, msg: &str) {
        self.messages
            .lock()
            .unwrap()
            .push(format!("{level}: {msg}"));
    }

    /// All recorded messages, in order.
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    /// Whether any message contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages().iter().any(|m| m.contains(needle))
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

/// [`Prompt`] that replays canned answers; cancels once they run out.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: RefCell<VecDeque<Option<String>>>,
    questions: RefCell<Vec<String>>,
}

impl ScriptedPrompt {
    /// Answers in order; `None` simulates end of input or Ctrl-C.
    pub fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: RefCell::new(answers.iter().map(|a| a.map(String::from)).collect()),
            questions: RefCell::default(),
        }
    }

    /// Questions asked so far.
    pub fn questions(&self) -> Vec<String> {
        self.questions.borrow().clone()
    }
}

impl Prompt for ScriptedPrompt {
    fn ask(&self, question: &str) -> Option<String> {
        self.questions.borrow_mut().push(question.to_string());
        self.answers.borrow_mut().pop_front().flatten()
    }
}

type DumpHook = Box<dyn Fn(&Path) + Send + Sync>;

/// [`Executor`] that records `"program arg arg"` lines and answers from a
/// table instead of spawning anything.
#[derive(Default)]
pub struct FakeExecutor {
    calls: Mutex<Vec<String>>,
    responses: Vec<(String, String)>,
    failing: Vec<String>,
    missing: Vec<String>,
    on_dump: Option<DumpHook>,
}

impl std::fmt::Debug for FakeExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeExecutor")
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `program` as absent from `PATH`.
    pub fn without_program(mut self, program: &str) -> Self {
        self.missing.push(program.to_string());
        self
    }

    /// Reply with `stdout` when the joined arguments equal `args`.
    pub fn respond(mut self, args: &str, stdout: &str) -> Self {
        self.responses.push((args.to_string(), stdout.to_string()));
        self
    }

    /// Exit non-zero whenever any argument equals `arg`.
    pub fn failing(mut self, arg: &str) -> Self {
        self.failing.push(arg.to_string());
        self
    }

    /// Run `hook` with the `--file` path of every `bundle dump`.
    pub fn on_bundle_dump(mut self, hook: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        self.on_dump = Some(Box::new(hook));
        self
    }

    /// Recorded command lines.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, program: &str, args: &[&str]) -> ExecResult {
        self.calls
            .lock()
            .unwrap()
            .push(std::iter::once(program).chain(args.iter().copied()).collect::<Vec<_>>().join(" "));

        if args.iter().any(|a| self.failing.iter().any(|f| f == a)) {
            return ExecResult {
                stderr: format!("Error: {program} failed"),
                success: false,
                code: Some(1),
                ..ExecResult::default()
            };
        }
        if args.first() == Some(&"bundle")
            && args.get(1) == Some(&"dump")
            && let Some(hook) = &self.on_dump
            && let Some(i) = args.iter().position(|a| *a == "--file")
        {
            hook(&PathBuf::from(args[i + 1]));
        }
        let joined = args.join(" ");
        let stdout = self
            .responses
            .iter()
            .find(|(k, _)| *k == joined)
            .map(|(_, v)| v.clone())
            .unwrap_or_default();
        ExecResult {
            stdout,
            success: true,
            code: Some(0),
            ..ExecResult::default()
        }
    }
}

impl Executor for FakeExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let result = self.answer(program, args);
        if !result.success {
            bail!("{program} failed: {}", result.stderr);
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Ok(self.answer(program, args))
    }

    fn run_interactive(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        Ok(self.answer(program, args))
    }

    fn which(&self, program: &str) -> bool {
        !self.missing.iter().any(|m| m == program)
    }
}

/// A session over `root` with a mocked package manager and scripted answers.
pub fn session(
    root: &Path,
    selection: &Selection,
    pm: MockPackageManager,
    answers: &[Option<&str>],
) -> (Session, Arc<RecordingLog>, Arc<FakeExecutor>) {
    let log = Arc::new(RecordingLog::default());
    let executor = Arc::new(FakeExecutor::new());
    let services = Services {
        log: log.clone(),
        pm: Box::new(pm),
        prompt: Box::new(ScriptedPrompt::new(answers)),
        executor: executor.clone(),
        style: Style::PLAIN,
        settings: Settings::default(),
        editor: "vi".to_string(),
    };
    let session = Session::open(root, selection, services).unwrap();
    (session, log, executor)
}

/// A package manager that is present and reports `installed`.
pub fn brew_with(installed: &[&str]) -> MockPackageManager {
    let set: std::collections::BTreeSet<_> = installed
        .iter()
        .map(|l| crate::manifest::Declaration::parse(l).unwrap())
        .collect();
    let mut pm = MockPackageManager::new();
    pm.expect_ensure_available().returning(|| Ok(()));
    pm.expect_installed().returning(move || Ok(set.clone()));
    pm
}

/// Write `files` (name, content) into a fresh temp root.
pub fn root_with(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

/// Read a file under `root`, empty if absent.
pub fn read(root: &Path, name: &str) -> String {
    std::fs::read_to_string(root.join(name)).unwrap_or_default()
}

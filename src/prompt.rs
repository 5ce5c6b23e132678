//! Interactive confirmation.
//!
//! A prompt answer is `Some(text)` or `None`.  `None` means the user
//! cancelled: end of input or Ctrl-C while waiting.  Callers treat it
//! exactly like "no" or "quit".
use anyhow::{Context as _, Result};
use std::io::{BufRead as _, Write as _};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use crate::render::{Color, Style};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Whether Ctrl-C has been pressed during this process.
///
/// Destructive steps check this before writing and abort with
/// [`BrewfileError::Interrupted`](crate::error::BrewfileError::Interrupted).
#[must_use]
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::SeqCst)
}

/// Source of interactive answers.
pub trait Prompt: std::fmt::Debug {
    /// Show `question` and wait for one line.  Returns the trimmed answer,
    /// or `None` when the user cancelled.
    fn ask(&self, question: &str) -> Option<String>;
}

/// Ask a `y/N` question.  Anything but an answer starting with `y` is no.
pub fn confirm(prompt: &dyn Prompt, question: &str) -> bool {
    prompt
        .ask(&format!("{question} (y/N): "))
        .is_some_and(|a| a.to_lowercase().starts_with('y'))
}

enum Input {
    Line(String),
    Eof,
    Interrupt,
}

struct Terminal {
    inputs: Receiver<Input>,
    requests: Option<Sender<()>>,
    /// The reader has been asked for a line it has not delivered yet.
    pending: bool,
    /// Stdin reached end of input; every later prompt cancels at once.
    closed: bool,
}

/// Prompt on the controlling terminal.
///
/// Lines come from a stdin reader thread that reads only when a prompt is
/// waiting, so subprocesses sharing the terminal see their own input.  The
/// Ctrl-C handler is installed by [`TerminalPrompt::new`]; create one per
/// process.
pub struct TerminalPrompt {
    style: Style,
    input_tx: Sender<Input>,
    terminal: Mutex<Terminal>,
}

impl std::fmt::Debug for TerminalPrompt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalPrompt")
            .field("style", &self.style)
            .finish_non_exhaustive()
    }
}

impl TerminalPrompt {
    /// Install the Ctrl-C handler and build the prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if a Ctrl-C handler is already installed.
    pub fn new(style: Style) -> Result<Self> {
        let (input_tx, inputs) = mpsc::channel();
        let handler_tx = input_tx.clone();
        ctrlc::set_handler(move || {
            INTERRUPTED.store(true, Ordering::SeqCst);
            handler_tx.send(Input::Interrupt).ok();
        })
        .context("installing Ctrl-C handler")?;
        Ok(Self {
            style,
            input_tx,
            terminal: Mutex::new(Terminal {
                inputs,
                requests: None,
                pending: false,
                closed: false,
            }),
        })
    }

    fn read_line(&self) -> Input {
        let mut term = self
            .terminal
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if term.closed {
            return Input::Eof;
        }
        if !term.pending {
            let requests = term
                .requests
                .get_or_insert_with(|| spawn_reader(self.input_tx.clone()));
            if requests.send(()).is_err() {
                term.closed = true;
                return Input::Eof;
            }
            term.pending = true;
        }
        match term.inputs.recv() {
            Ok(Input::Line(line)) => {
                term.pending = false;
                Input::Line(line)
            }
            Ok(Input::Interrupt) => Input::Interrupt,
            Ok(Input::Eof) | Err(_) => {
                term.pending = false;
                term.closed = true;
                Input::Eof
            }
        }
    }
}

/// Spawn the stdin reader.  It reads one line per request and stops after
/// end of input.
fn spawn_reader(input_tx: Sender<Input>) -> Sender<()> {
    let (request_tx, request_rx) = mpsc::channel::<()>();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for () in request_rx {
            let mut line = String::new();
            let input = match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => Input::Eof,
                Ok(_) => Input::Line(line),
            };
            let eof = matches!(input, Input::Eof);
            if input_tx.send(input).is_err() || eof {
                break;
            }
        }
    });
    request_tx
}

impl Prompt for TerminalPrompt {
    #[allow(clippy::print_stdout)]
    fn ask(&self, question: &str) -> Option<String> {
        print!("{}", self.style.paint(Color::Bold, question));
        std::io::stdout().flush().ok();
        match self.read_line() {
            Input::Line(line) => Some(line.trim().to_string()),
            Input::Eof | Input::Interrupt => {
                println!();
                None
            }
        }
    }
}

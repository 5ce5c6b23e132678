//! Tracing subscriber setup: console formatter, file layer, and initialisation.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use super::utils::{format_utc_datetime, format_utc_time, log_file_path, strip_ansi};
use crate::render::{Color, Style};

/// Extracts the `message` field from a [`tracing::Event`].
#[derive(Default)]
struct MessageExtractor {
    message: String,
}

impl tracing::field::Visit for MessageExtractor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        }
    }
}

/// A [`tracing_subscriber::Layer`] that appends all events to the persistent
/// log file with timestamps and ANSI codes stripped.
///
/// Always captures events at `DEBUG` level and above regardless of the
/// console verbosity setting.
#[derive(Debug)]
pub(super) struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open (or create) the log file for `command`, write a run header, and
    /// return a new `FileLayer` ready to receive events.
    ///
    /// Returns `None` if the cache directory cannot be created or the file
    /// cannot be opened.
    pub(super) fn new(command: &str) -> Option<Self> {
        let path = log_file_path(command)?;
        let version =
            option_env!("BREWFILE_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let header = format!(
            "==========================================\n\
             Brewfile {version} {}\n\
             ==========================================\n",
            format_utc_datetime(),
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some(Self {
            file: Mutex::new(file),
        })
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let metadata = event.metadata();
        let level = *metadata.level();
        let target = metadata.target();

        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        let msg = strip_ansi(&extractor.message);
        let ts = format_utc_time();

        let line = match (level, target) {
            (tracing::Level::INFO, "brewfile::stage") => format!("[{ts}] ==> {msg}"),
            (tracing::Level::INFO, "brewfile::success") => format!("[{ts}]     [ok] {msg}"),
            (tracing::Level::ERROR, _) => format!("[{ts}]     [error] {msg}"),
            (tracing::Level::WARN, _) => format!("[{ts}]     [warn] {msg}"),
            (tracing::Level::DEBUG | tracing::Level::TRACE, _) => {
                format!("[{ts}]     [debug] {msg}")
            }
            _ => format!("[{ts}]     {msg}"),
        };

        if let Ok(mut f) = self.file.lock() {
            writeln!(f, "{line}").ok();
        }
    }
}

/// A [`tracing_subscriber::fmt::FormatEvent`] for the console.
struct BrewfileFormatter {
    style: Style,
}

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for BrewfileFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut extractor = MessageExtractor::default();
        event.record(&mut extractor);
        writeln!(
            writer,
            "{}",
            console_line(self.style, *metadata.level(), metadata.target(), &extractor.message)
        )
    }
}

/// Render one console line.
fn console_line(style: Style, level: tracing::Level, target: &str, msg: &str) -> String {
    match level {
        tracing::Level::ERROR => format!("{} {msg}", style.paint(Color::Red, "ERROR")),
        tracing::Level::WARN => format!("{}  {msg}", style.paint(Color::Yellow, "WARN")),
        tracing::Level::INFO if target == "brewfile::stage" => format!(
            "{} {}",
            style.paint(Color::BoldBlue, "==>"),
            style.paint(Color::Bold, msg)
        ),
        tracing::Level::INFO if target == "brewfile::success" => {
            format!("{} {msg}", style.paint(Color::Green, "✓"))
        }
        tracing::Level::INFO => msg.to_string(),
        _ => style.paint(Color::Dim, msg),
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// Console events go through the brewfile formatter (warnings and errors to
/// stderr, the rest to stdout); every event at `DEBUG` and above is also
/// appended to `$XDG_CACHE_HOME/brewfile/<command>.log`.  `RUST_LOG`, when
/// set, overrides the console level.  Must be called once at startup.
pub fn init_subscriber(verbose: bool, command: &str, style: Style) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        EnvFilter, Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console_filter = EnvFilter::builder()
        .with_default_directive(console_level.into())
        .from_env_lossy();

    let make_writer = std::io::stderr
        .with_max_level(tracing::Level::WARN)
        .and(std::io::stdout.with_min_level(tracing::Level::INFO));

    let console_layer = fmt::layer()
        .event_format(BrewfileFormatter { style })
        .with_writer(make_writer)
        .with_filter(console_filter);

    let file_layer = FileLayer::new(command).map(|l| l.with_filter(LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn console_plain_lines() {
        let style = Style::PLAIN;
        assert_eq!(console_line(style, Level::ERROR, "x", "boom"), "ERROR boom");
        assert_eq!(console_line(style, Level::WARN, "x", "careful"), "WARN  careful");
        assert_eq!(
            console_line(style, Level::INFO, "brewfile::stage", "Dump"),
            "==> Dump"
        );
        assert_eq!(
            console_line(style, Level::INFO, "brewfile::success", "done"),
            "✓ done"
        );
        assert_eq!(console_line(style, Level::INFO, "x", "plain"), "plain");
        assert_eq!(console_line(style, Level::DEBUG, "x", "detail"), "detail");
    }

    #[test]
    fn console_colored_error() {
        assert_eq!(
            console_line(Style::COLOR, Level::ERROR, "x", "boom"),
            "\x1b[31mERROR\x1b[0m boom"
        );
    }
}

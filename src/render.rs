//! Presentation of reconciliation results.
//!
//! All rendering functions return plain `String`s and take the [`Style`]
//! decided once at startup, so nothing here reads the environment.
use std::fmt::Write as _;
use std::io::IsTerminal as _;

use crate::manifest::{Declaration, Kind, ManifestId};
use crate::reconcile::{Counts, Ownership, Reconciliation, group_by_kind};

/// Terminal colours used by the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    /// Errors, entries that would be removed.
    Red,
    /// Success, consistent entries.
    Green,
    /// Warnings, entries that need installing.
    Yellow,
    /// Stage arrows.
    BoldBlue,
    /// Headers and questions.
    Bold,
    /// Provenance and secondary detail.
    Dim,
}

impl Color {
    const fn code(self) -> &'static str {
        match self {
            Self::Red => "\x1b[31m",
            Self::Green => "\x1b[32m",
            Self::Yellow => "\x1b[33m",
            Self::BoldBlue => "\x1b[1;34m",
            Self::Bold => "\x1b[1m",
            Self::Dim => "\x1b[2m",
        }
    }
}

/// Whether output is styled with ANSI colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Style {
    color: bool,
}

impl Style {
    /// No colour.
    pub const PLAIN: Self = Self { color: false };
    /// Colour on.
    pub const COLOR: Self = Self { color: true };

    /// Decide once for the whole process: `--no-color`, `NO_COLOR` (any
    /// value) and a non-terminal stdout each turn colour off.
    #[must_use]
    pub fn detect(no_color_flag: bool) -> Self {
        Self::decide(
            no_color_flag,
            std::env::var_os("NO_COLOR").is_some(),
            std::io::stdout().is_terminal(),
        )
    }

    /// The decision itself, free of the environment.
    #[must_use]
    pub const fn decide(no_color_flag: bool, no_color_env: bool, stdout_tty: bool) -> Self {
        Self {
            color: !no_color_flag && !no_color_env && stdout_tty,
        }
    }

    /// Whether colour is on.
    #[must_use]
    pub const fn color(self) -> bool {
        self.color
    }

    /// Wrap `text` in `color` when colour is on.
    #[must_use]
    pub fn paint(self, color: Color, text: &str) -> String {
        if self.color {
            format!("{}{text}\x1b[0m", color.code())
        } else {
            text.to_string()
        }
    }
}

/// Status marker for a declared, installed entry.
pub const MARK_OK: &str = "✓";
/// Status marker for a declared entry that needs installing.
pub const MARK_MISSING: &str = "!";
/// Status marker for an installed entry that would be removed.
pub const MARK_EXTRA: &str = "*";

enum Row<'a> {
    Declared {
        decl: &'a Declaration,
        installed: bool,
        owners: String,
    },
    Extra {
        decl: &'a Declaration,
        ownership: &'a Ownership,
    },
}

impl Row<'_> {
    const fn decl(&self) -> &Declaration {
        match self {
            Self::Declared { decl, .. } | Self::Extra { decl, .. } => *decl,
        }
    }
}

/// Comma-separated manifest names.
#[must_use]
pub fn manifest_list<'a>(ids: impl IntoIterator<Item = &'a ManifestId>) -> String {
    ids.into_iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Status listing grouped by kind.
///
/// ```text
/// brew (2)
///   ✓ brew "jq"  (Brewfile)
///   * brew "wget"  (system-only)
/// ```
#[must_use]
pub fn status(result: &Reconciliation, style: Style) -> String {
    let mut rows: Vec<Row<'_>> = result
        .declared
        .iter()
        .map(|(decl, owners)| Row::Declared {
            decl,
            installed: result.installed.contains(decl),
            owners: manifest_list(owners),
        })
        .chain(
            result
                .extraneous
                .iter()
                .map(|(decl, ownership)| Row::Extra { decl, ownership }),
        )
        .collect();
    rows.sort_by(|a, b| a.decl().cmp(b.decl()));

    let mut out = String::new();
    for kind in Kind::ALL {
        let group: Vec<&Row<'_>> = rows.iter().filter(|r| r.decl().kind == kind).collect();
        if group.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        let _ = writeln!(out, "{}", style.paint(Color::Bold, &format!("{kind} ({})", group.len())));
        for row in group {
            let (mark, detail) = match row {
                Row::Declared {
                    installed: true,
                    owners,
                    ..
                } => (style.paint(Color::Green, MARK_OK), owners.clone()),
                Row::Declared { owners, .. } => {
                    (style.paint(Color::Yellow, MARK_MISSING), owners.clone())
                }
                Row::Extra {
                    ownership: Ownership::SystemOnly,
                    ..
                } => (style.paint(Color::Red, MARK_EXTRA), "system-only".to_string()),
                Row::Extra {
                    ownership: Ownership::CrossReferenced(owners),
                    ..
                } => (
                    style.paint(Color::Red, MARK_EXTRA),
                    format!("declared in {}", manifest_list(owners)),
                ),
            };
            let _ = writeln!(
                out,
                "  {mark} {}  {}",
                row.decl(),
                style.paint(Color::Dim, &format!("({detail})"))
            );
        }
    }
    out
}

/// One-line totals, e.g. `12 consistent, 1 missing, 2 extraneous (1 system-only, 1 cross-referenced)`.
#[must_use]
pub fn summary(counts: &Counts, style: Style) -> String {
    let mut line = format!(
        "{} consistent, {} missing, {} extraneous",
        style.paint(Color::Green, &counts.consistent.to_string()),
        style.paint(Color::Yellow, &counts.missing.to_string()),
        style.paint(Color::Red, &counts.extraneous.to_string()),
    );
    if counts.extraneous > 0 {
        let _ = write!(
            line,
            " ({} system-only, {} cross-referenced)",
            counts.system_only, counts.cross_referenced
        );
    }
    line
}

/// Compact listing: one `kind (n): a, b, c` paragraph per kind, wrapped to
/// `width` columns with continuation lines indented.
#[must_use]
pub fn compact<'a>(
    declarations: impl IntoIterator<Item = &'a Declaration>,
    width: usize,
    style: Style,
) -> String {
    const INDENT: &str = "    ";
    let mut out = String::new();
    for (kind, group) in group_by_kind(declarations) {
        let header = format!("{kind} ({}):", group.len());
        let mut line = style.paint(Color::Bold, &header);
        let mut line_width = header.chars().count();
        let last = group.len().saturating_sub(1);
        for (i, decl) in group.iter().enumerate() {
            let word = if i == last {
                decl.name.clone()
            } else {
                format!("{},", decl.name)
            };
            let word_width = word.chars().count();
            if line_width + 1 + word_width > width && line_width > INDENT.len() {
                let _ = writeln!(out, "{line}");
                line = INDENT.to_string();
                line_width = INDENT.len();
            } else {
                line.push(' ');
                line_width += 1;
            }
            line.push_str(&word);
            line_width += word_width;
        }
        let _ = writeln!(out, "{line}");
    }
    out
}

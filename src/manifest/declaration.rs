//! The `kind "name"` declaration grammar shared by manifests and state dumps.
use std::fmt;
use std::str::FromStr;

/// Category of a declaration.
///
/// Variant order is the display order used when grouping results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    /// Third-party repository reference.
    Tap,
    /// Formula (command-line) package.
    Brew,
    /// Binary application package.
    Cask,
    /// App Store package.
    Mas,
    /// Container-wrapped package.
    Whalebrew,
    /// Editor extension.
    Vscode,
}

impl Kind {
    /// Every kind, in display order.
    pub const ALL: [Self; 6] = [
        Self::Tap,
        Self::Brew,
        Self::Cask,
        Self::Mas,
        Self::Whalebrew,
        Self::Vscode,
    ];

    /// The keyword used in manifest files.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::Brew => "brew",
            Self::Cask => "cask",
            Self::Mas => "mas",
            Self::Whalebrew => "whalebrew",
            Self::Vscode => "vscode",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for Kind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.keyword() == s)
            .ok_or_else(|| anyhow::anyhow!("unknown declaration kind '{s}'"))
    }
}

/// One `kind "name"` line from a manifest or a state dump.
///
/// Identity is the trimmed source text (`raw_line`): two lines that differ
/// only in interior whitespace are different declarations.  `kind` and
/// `name` are derived from `raw_line`, so the derived ordering sorts by kind,
/// then name, then raw text.
///
/// # Examples
///
/// ```
/// use brewfile_cli::manifest::{Declaration, Kind};
///
/// let decl = Declaration::parse(r#"  brew "jq"  "#).unwrap();
/// assert_eq!(decl.kind, Kind::Brew);
/// assert_eq!(decl.name, "jq");
/// assert_eq!(decl.raw_line, r#"brew "jq""#);
///
/// assert!(Declaration::parse("# comment").is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Declaration {
    /// Declaration category.
    pub kind: Kind,
    /// Quoted identifier, without the quotes.
    pub name: String,
    /// The source line with surrounding whitespace removed.
    pub raw_line: String,
}

impl Declaration {
    /// Build the canonical line for a new declaration.
    #[must_use]
    pub fn new(kind: Kind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            raw_line: format!("{kind} \"{name}\""),
        }
    }

    /// Parse one line.  Returns `None` for blank lines, comments, and
    /// anything else that does not match `<kind><whitespace>"<name>"`.
    ///
    /// Text after the closing quote is allowed and kept in `raw_line`
    /// (`mas "Xcode", id: 497799835`).
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let raw = line.trim();
        let split = raw.find(char::is_whitespace)?;
        let (keyword, rest) = raw.split_at(split);
        let kind = keyword.parse::<Kind>().ok()?;
        let quoted = rest.trim_start().strip_prefix('"')?;
        let end = quoted.find('"')?;
        let name = quoted.get(..end)?;
        if name.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            name: name.to_string(),
            raw_line: raw.to_string(),
        })
    }

    /// Value of a trailing `id: N` option, as written by `brew bundle dump`
    /// for App Store entries.
    #[must_use]
    pub fn option_id(&self) -> Option<&str> {
        let (_, tail) = self.raw_line.split_once("id:")?;
        let id = tail.trim_start();
        let end = id.find(|c: char| !c.is_ascii_digit()).unwrap_or(id.len());
        id.get(..end).filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_line)
    }
}

/// Parse every matching line of `content`, in order.
#[must_use]
pub fn parse_all(content: &str) -> Vec<Declaration> {
    content.lines().filter_map(Declaration::parse).collect()
}

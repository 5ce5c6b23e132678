//! Manifest discovery and per-command scope.
//!
//! The PRIMARY manifest is `<root>/Brewfile`.  Auxiliary manifests are the
//! regular files `<root>/Brewfile.<name>`, ordered lexicographically by
//! name.  A [`Scope`] is PRIMARY plus the auxiliaries selected with
//! `--include` or `--all`, and is computed once per invocation.
use anyhow::{Context as _, Result};
use std::fmt;
use std::path::{Path, PathBuf};

use super::declaration::Declaration;
use super::store;

/// File name of the primary manifest.
pub const PRIMARY_FILE: &str = "Brewfile";

/// Identity of a manifest.  The primary manifest sorts first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ManifestId {
    /// `Brewfile`.
    Primary,
    /// `Brewfile.<name>`.
    Auxiliary(String),
}

impl ManifestId {
    /// File name of this manifest inside the root.
    #[must_use]
    pub fn file_name(&self) -> String {
        match self {
            Self::Primary => PRIMARY_FILE.to_string(),
            Self::Auxiliary(name) => format!("{PRIMARY_FILE}.{name}"),
        }
    }
}

impl fmt::Display for ManifestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// A manifest file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// Manifest identity.
    pub id: ManifestId,
    /// Absolute or root-relative path to the file.
    pub path: PathBuf,
}

impl Manifest {
    /// Parse this manifest's declarations.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(&self) -> Result<LoadedManifest> {
        Ok(LoadedManifest {
            id: self.id.clone(),
            path: self.path.clone(),
            declarations: store::parse(&self.path)?,
        })
    }
}

/// A manifest together with the declarations parsed from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedManifest {
    /// Manifest identity.
    pub id: ManifestId,
    /// Path the declarations were read from.
    pub path: PathBuf,
    /// Declarations in file order.
    pub declarations: Vec<Declaration>,
}

/// Auxiliary selection requested on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Auxiliary names from `--include a,b`.
    pub include: Vec<String>,
    /// Whether `--all` was given.
    pub all: bool,
}

/// The manifests considered by one command: always PRIMARY, then the
/// selected auxiliaries in selection order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    manifests: Vec<Manifest>,
    unknown: Vec<String>,
}

impl Scope {
    /// Manifests in scope, PRIMARY first.
    #[must_use]
    pub fn manifests(&self) -> &[Manifest] {
        &self.manifests
    }

    /// Selected auxiliaries, in selection order.
    pub fn auxiliaries(&self) -> impl Iterator<Item = &Manifest> {
        self.manifests
            .iter()
            .filter(|m| m.id != ManifestId::Primary)
    }

    /// Whether `id` is in scope.
    #[must_use]
    pub fn contains(&self, id: &ManifestId) -> bool {
        self.manifests.iter().any(|m| &m.id == id)
    }

    /// Requested auxiliary names that do not exist.
    #[must_use]
    pub fn unknown(&self) -> &[String] {
        &self.unknown
    }
}

/// Every manifest under a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    root: PathBuf,
    primary: Manifest,
    auxiliaries: Vec<Manifest>,
}

impl Catalog {
    /// Discover the manifests in `root`.
    ///
    /// `Brewfile.lock.json` and editor backups (`~` suffix) are not
    /// manifests.  A missing root directory yields a catalog with only the
    /// (not yet existing) primary manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` exists but cannot be listed.
    pub fn discover(root: &Path) -> Result<Self> {
        let mut auxiliaries = Vec::new();
        if root.is_dir() {
            for entry in std::fs::read_dir(root)
                .with_context(|| format!("reading directory {}", root.display()))?
            {
                let entry = entry.with_context(|| format!("reading entry in {}", root.display()))?;
                let path = entry.path();
                if !path.is_file() {
                    continue;
                }
                let Some(name) = entry
                    .file_name()
                    .to_str()
                    .and_then(auxiliary_name)
                    .map(String::from)
                else {
                    continue;
                };
                auxiliaries.push(Manifest {
                    id: ManifestId::Auxiliary(name),
                    path,
                });
            }
        }
        auxiliaries.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(Self {
            root: root.to_path_buf(),
            primary: Manifest {
                id: ManifestId::Primary,
                path: root.join(PRIMARY_FILE),
            },
            auxiliaries,
        })
    }

    /// Directory holding the manifests.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The primary manifest.
    #[must_use]
    pub const fn primary(&self) -> &Manifest {
        &self.primary
    }

    /// Discovered auxiliaries in lexicographic order.
    #[must_use]
    pub fn auxiliaries(&self) -> &[Manifest] {
        &self.auxiliaries
    }

    /// All manifests: PRIMARY first, then auxiliaries in discovery order.
    pub fn all(&self) -> impl Iterator<Item = &Manifest> {
        std::iter::once(&self.primary).chain(self.auxiliaries.iter())
    }

    /// Look up an existing auxiliary by name.
    #[must_use]
    pub fn auxiliary(&self, name: &str) -> Option<&Manifest> {
        self.auxiliaries
            .iter()
            .find(|m| matches!(&m.id, ManifestId::Auxiliary(n) if n == name))
    }

    /// The manifest for `name`, whether or not the file exists yet.
    #[must_use]
    pub fn manifest_named(&self, name: &str) -> Manifest {
        self.auxiliary(name).cloned().unwrap_or_else(|| {
            let id = ManifestId::Auxiliary(name.to_string());
            Manifest {
                path: self.root.join(id.file_name()),
                id,
            }
        })
    }

    /// Resolve a selection into a scope.
    ///
    /// `--all` takes every auxiliary in lexicographic order.  `--include`
    /// keeps the given order and drops duplicates; names without a file are
    /// recorded in [`Scope::unknown`] and left out.
    #[must_use]
    pub fn scope(&self, selection: &Selection) -> Scope {
        let mut manifests = vec![self.primary.clone()];
        let mut unknown = Vec::new();

        if selection.all {
            manifests.extend(self.auxiliaries.iter().cloned());
        } else {
            for name in selection.include.iter().map(|n| n.trim()) {
                if name.is_empty() {
                    continue;
                }
                match self.auxiliary(name) {
                    Some(m) if !manifests.contains(m) => manifests.push(m.clone()),
                    Some(_) => {}
                    None => {
                        if !unknown.iter().any(|u| u == name) {
                            unknown.push(name.to_string());
                        }
                    }
                }
            }
        }

        Scope { manifests, unknown }
    }

    /// Parse every manifest, PRIMARY first.
    ///
    /// # Errors
    ///
    /// Returns an error if any manifest exists but cannot be read.
    pub fn load_all(&self) -> Result<Vec<LoadedManifest>> {
        self.all().map(Manifest::load).collect()
    }
}

/// Auxiliary suffix of a file name, if it names an auxiliary manifest.
fn auxiliary_name(file_name: &str) -> Option<&str> {
    let name = file_name.strip_prefix(PRIMARY_FILE)?.strip_prefix('.')?;
    if name.is_empty() || name.ends_with(".json") || name.ends_with('~') {
        return None;
    }
    Some(name)
}

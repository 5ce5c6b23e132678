//! Reading and writing manifest files.
//!
//! Every write path emits only well-formed declaration lines (or preserves
//! existing lines verbatim), and whole-file rewrites go through a staged
//! temp file in the same directory followed by an atomic rename.
use anyhow::{Context as _, Result};
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use super::declaration::{Declaration, parse_all};
use crate::error::BrewfileError;

/// Read a manifest file.  A missing file reads as empty.
///
/// # Errors
///
/// Returns [`BrewfileError::Manifest`] if the file exists but cannot be read.
pub fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(BrewfileError::Manifest {
            path: path.display().to_string(),
            source,
        }
        .into()),
    }
}

/// Parse the declarations of a manifest, in file order.
///
/// Blank and non-matching lines are skipped; a missing file yields an empty
/// list.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn parse(path: &Path) -> Result<Vec<Declaration>> {
    Ok(parse_all(&read_text(path)?))
}

/// Append declarations to a manifest, one per line.
///
/// If the file has content that does not end in a newline, a newline is
/// written first.  Existing content is never rewritten.  Creates the file
/// if it does not exist.
///
/// # Errors
///
/// Returns an error if the file cannot be read or opened for appending.
pub fn append(path: &Path, declarations: &[Declaration]) -> Result<()> {
    if declarations.is_empty() {
        return Ok(());
    }
    let existing = read_text(path)?;
    let mut buf = String::new();
    if !existing.is_empty() && !existing.ends_with('\n') {
        buf.push('\n');
    }
    for decl in declarations {
        buf.push_str(&decl.raw_line);
        buf.push('\n');
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open for append: {}", path.display()))?;
    file.write_all(buf.as_bytes())
        .with_context(|| format!("append to {}", path.display()))?;
    Ok(())
}

/// Replace a manifest's content with `declarations`, one per line.  An
/// empty list leaves an empty file.
///
/// # Errors
///
/// Returns an error if the staged file cannot be written or renamed.
pub fn overwrite(path: &Path, declarations: &[Declaration]) -> Result<()> {
    StagedWrite::new(path, &render(declarations))?.commit()
}

/// Remove the first line whose trimmed text equals `raw_line`.
///
/// All other lines, blank lines and line endings are preserved verbatim.
/// Returns `false` (and leaves the file untouched) when nothing matched.
///
/// # Errors
///
/// Returns an error if the file cannot be read or rewritten.
pub fn strike(path: &Path, raw_line: &str) -> Result<bool> {
    let content = read_text(path)?;
    let mut struck = false;
    let kept: String = content
        .split_inclusive('\n')
        .filter(|line| {
            if !struck && line.trim() == raw_line {
                struck = true;
                false
            } else {
                true
            }
        })
        .collect();
    if struck {
        StagedWrite::new(path, &kept)?.commit()?;
    }
    Ok(struck)
}

/// Whether `needle` occurs anywhere in the manifest's raw text.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn mentions(path: &Path, needle: &str) -> Result<bool> {
    Ok(read_text(path)?.contains(needle))
}

/// Serialize declarations as manifest text.
#[must_use]
pub fn render(declarations: &[Declaration]) -> String {
    declarations
        .iter()
        .map(|d| format!("{}\n", d.raw_line))
        .collect()
}

/// New file content written to a temp file beside its target, not yet
/// visible under the target name.
///
/// A symlinked target is resolved first, so the file it points to is
/// replaced and the link survives.  The staged file takes the existing
/// file's permissions.
///
/// Staging every file of a multi-file rewrite before committing any of them
/// means a failure while producing content leaves all targets untouched.
/// Dropping an uncommitted stage deletes the temp file.
#[derive(Debug)]
pub struct StagedWrite {
    target: PathBuf,
    file: tempfile::NamedTempFile,
}

impl StagedWrite {
    /// Write `content` to a temp file in the target's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created or written.
    pub fn new(target: &Path, content: &str) -> Result<Self> {
        let target = resolve(target)?;
        let dir = target
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = tempfile::Builder::new()
            .prefix(".brewfile-")
            .suffix(".tmp")
            .tempfile_in(dir)
            .with_context(|| format!("stage write in {}", dir.display()))?;
        file.write_all(content.as_bytes())
            .and_then(|()| file.as_file().sync_all())
            .with_context(|| format!("stage write for {}", target.display()))?;
        if let Some(permissions) = permissions_for(&target)? {
            file.as_file()
                .set_permissions(permissions)
                .with_context(|| format!("set permissions for {}", target.display()))?;
        }
        Ok(Self { target, file })
    }

    /// Path the staged content will replace, with symlinks resolved.
    #[must_use]
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Atomically replace the target with the staged content.
    ///
    /// # Errors
    ///
    /// Returns an error if the rename fails; the target is then unchanged.
    pub fn commit(self) -> Result<()> {
        let target = self.target;
        self.file
            .persist(&target)
            .map_err(|e| e.error)
            .with_context(|| format!("replace {}", target.display()))?;
        Ok(())
    }
}

/// Follow symlinks to the real file.  A target that does not exist yet is
/// returned as is.
fn resolve(target: &Path) -> Result<PathBuf> {
    match fs::canonicalize(target) {
        Ok(path) => Ok(path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(target.to_path_buf()),
        Err(e) => Err(e).with_context(|| format!("resolve {}", target.display())),
    }
}

/// Permissions of the existing file, or the usual `0644` for a new one.
fn permissions_for(target: &Path) -> Result<Option<fs::Permissions>> {
    match fs::metadata(target) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e).with_context(|| format!("read permissions of {}", target.display())),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt as _;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
const fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

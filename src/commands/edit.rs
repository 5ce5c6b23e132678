//! Command: open the manifests in scope in an editor.
use anyhow::{Result, bail};

use super::{Session, path};

/// Run the configured editor on every manifest in scope.
///
/// The editor setting may carry arguments (`code --wait`); it is split on
/// whitespace and the manifest paths are appended.
///
/// # Errors
///
/// Returns an error if no editor is configured, it cannot be started, or it
/// exits non-zero.
pub fn run(session: &Session) -> Result<()> {
    let mut words = session.editor.split_whitespace();
    let Some(program) = words.next() else {
        bail!("no editor configured; set EDITOR or `editor` in the config file");
    };
    let paths: Vec<String> = path::paths(session)
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let args: Vec<&str> = words.chain(paths.iter().map(String::as_str)).collect();

    session.log.debug(&format!("{program} {}", args.join(" ")));
    let result = session.executor.run_interactive(program, &args)?;
    if !result.success {
        bail!(
            "{program} exited with status {}",
            result.code.map_or_else(|| "unknown".to_string(), |c| c.to_string())
        );
    }
    Ok(())
}

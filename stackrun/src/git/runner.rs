//! Git command runner
//!
//! Centralized functions for running git commands with consistent error
//! handling, plus the handful of queries the rest of the crate needs.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::trace;

/// Run a git command in `dir` and return the raw Output.
pub fn run_git(args: &[&str], dir: &Path) -> Result<Output> {
    trace!(?args, dir = %dir.display(), "running git");
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .with_context(|| format!("Failed to execute: git {}", args.join(" ")))
}

/// Run a git command, check for success, and return trimmed stdout.
pub fn run_git_checked(args: &[&str], dir: &Path) -> Result<String> {
    let output = run_git(args, dir)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command and return true if it exited with code 0.
///
/// Spawn failures count as false.
pub fn run_git_bool(args: &[&str], dir: &Path) -> bool {
    run_git(args, dir)
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Absolute path of the repository toplevel containing `dir`
pub fn toplevel(dir: &Path) -> Result<PathBuf> {
    run_git_checked(&["rev-parse", "--show-toplevel"], dir).map(PathBuf::from)
}

/// Name of the checked-out branch, `None` on a detached HEAD
pub fn current_branch(dir: &Path) -> Result<Option<String>> {
    let name = run_git_checked(&["rev-parse", "--abbrev-ref", "HEAD"], dir)?;
    Ok((name != "HEAD").then_some(name))
}

/// Whether `reference` names an existing commit
pub fn ref_exists(reference: &str, dir: &Path) -> bool {
    let spec = format!("{reference}^{{commit}}");
    run_git_bool(&["rev-parse", "--verify", "--quiet", &spec], dir)
}

/// URL of the remote called `name`, `None` if there is no such remote
pub fn remote_url(name: &str, dir: &Path) -> Result<Option<String>> {
    let output = run_git(&["remote", "get-url", name], dir)?;
    if !output.status.success() {
        return Ok(None);
    }
    let url = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok((!url.is_empty()).then_some(url))
}

//! Changed-stack detection
//!
//! A stack is changed when any file inside its directory (and not inside a
//! nested stack) differs between the change base and `HEAD`.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use super::runner::{current_branch, ref_exists, run_git_checked};
use crate::config::GitSettings;
use crate::stack::{Registry, StackPath};

/// The empty tree object, used as base when `HEAD` has no parent
const EMPTY_TREE: &str = "4b825dc642cb6eb9a060e54bf8d69288fbee4904";

/// Pick the ref changes are computed against.
///
/// An explicit base (argument, then config) wins. On the default branch the
/// base is the previous commit; on any other branch it is the default branch,
/// preferring its remote-tracking ref.
pub fn resolve_change_base(
    root: &Path,
    settings: &GitSettings,
    explicit: Option<&str>,
) -> Result<String> {
    if let Some(base) = explicit.or(settings.change_base.as_deref()) {
        return Ok(base.to_string());
    }

    let branch = current_branch(root).context("Failed to determine the current branch")?;
    if branch.as_deref() == Some(settings.default_branch.as_str()) {
        if ref_exists("HEAD^", root) {
            return Ok("HEAD^".to_string());
        }
        return Ok(EMPTY_TREE.to_string());
    }

    let remote_ref = format!("{}/{}", settings.default_remote, settings.default_branch);
    if ref_exists(&remote_ref, root) {
        return Ok(remote_ref);
    }
    Ok(settings.default_branch.clone())
}

/// Files changed between `base` and `HEAD`, relative to `root`.
///
/// Files outside `root` are not reported.
pub fn changed_files(root: &Path, base: &str) -> Result<Vec<String>> {
    let range = format!("{base}...HEAD");
    // -z keeps non-ASCII paths verbatim instead of C-quoted
    let mut args = vec!["diff", "--name-only", "--relative", "--no-renames", "-z"];
    if base == EMPTY_TREE {
        args.extend([base, "HEAD"]);
    } else {
        args.push(&range);
    }

    let output = run_git_checked(&args, root)
        .with_context(|| format!("Failed to list files changed since {base}"))?;

    Ok(output
        .split('\0')
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect())
}

/// Map changed files (relative to the project root) to their owning stacks
pub fn changed_stacks<S: AsRef<str>>(registry: &Registry, files: &[S]) -> BTreeSet<StackPath> {
    files
        .iter()
        .filter_map(|file| StackPath::from_relative(Path::new(file.as_ref())))
        .filter_map(|path| registry.owner_of(&path))
        .map(|stack| stack.path.clone())
        .collect()
}

/// Compute the set of changed stacks for the project at `root`
pub fn detect_changed_stacks(
    root: &Path,
    registry: &Registry,
    settings: &GitSettings,
    explicit_base: Option<&str>,
) -> Result<BTreeSet<StackPath>> {
    let base = resolve_change_base(root, settings, explicit_base)?;
    let files = changed_files(root, &base)?;
    let changed = changed_stacks(registry, &files);

    info!(base = %base, files = files.len(), stacks = changed.len(), "detected changes");
    debug!(?changed, "changed stacks");
    Ok(changed)
}

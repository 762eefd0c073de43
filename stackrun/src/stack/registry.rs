//! Stack registry: the complete set of stacks found under a project root

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use tracing::{debug, trace};

use super::{Stack, StackFile, StackPath};
use crate::error::{DiscoveryError, StackError};

/// File marking a directory as a stack
pub const STACK_FILE: &str = "stack.toml";

/// Every stack of a project, keyed (and iterated) by canonical path
#[derive(Debug, Clone, Default)]
pub struct Registry {
    stacks: BTreeMap<StackPath, Stack>,
}

impl Registry {
    /// Build a registry from already-discovered stacks.
    ///
    /// Paths map 1:1 to directories, so a later stack with the same path
    /// replaces an earlier one.
    pub fn from_stacks(stacks: impl IntoIterator<Item = Stack>) -> Self {
        let stacks = stacks
            .into_iter()
            .map(|stack| (stack.path.clone(), stack))
            .collect();
        Self { stacks }
    }

    pub fn get(&self, path: &StackPath) -> Option<&Stack> {
        self.stacks.get(path)
    }

    pub fn contains(&self, path: &StackPath) -> bool {
        self.stacks.contains_key(path)
    }

    /// Stacks in lexicographic path order
    pub fn iter(&self) -> impl Iterator<Item = &Stack> {
        self.stacks.values()
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }

    /// The deepest stack whose directory contains `path`
    pub fn owner_of(&self, path: &StackPath) -> Option<&Stack> {
        self.stacks
            .values()
            .filter(|stack| path.is_within(&stack.path))
            .max_by_key(|stack| stack.path.depth())
    }
}

/// Scan `root` recursively and load every stack below it.
///
/// All unreadable or invalid stack files are collected and reported together
/// in a single [`StackError::Discovery`].
pub fn discover(root: &Path) -> Result<Registry, StackError> {
    let mut stacks = Vec::new();
    let mut errors = Vec::new();

    walk(root, root, &mut stacks, &mut errors);
    check_unique_ids(root, &stacks, &mut errors);

    if !errors.is_empty() {
        return Err(StackError::Discovery(errors));
    }

    debug!(count = stacks.len(), root = %root.display(), "discovered stacks");
    Ok(Registry::from_stacks(stacks))
}

fn walk(root: &Path, dir: &Path, stacks: &mut Vec<Stack>, errors: &mut Vec<DiscoveryError>) {
    match load_stack(root, dir) {
        Ok(Some(stack)) => {
            trace!(path = %stack.path, "found stack");
            stacks.push(stack);
        }
        Ok(None) => {}
        Err(err) => errors.push(err),
    }

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            errors.push(DiscoveryError::new(dir, format!("reading directory: {e}")));
            return;
        }
    };

    let mut children = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                errors.push(DiscoveryError::new(dir, format!("reading directory: {e}")));
                continue;
            }
        };
        // file_type() does not follow symlinks
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if is_dir && !hidden {
            children.push(entry.path());
        }
    }
    children.sort();

    for child in children {
        walk(root, &child, stacks, errors);
    }
}

fn load_stack(root: &Path, dir: &Path) -> Result<Option<Stack>, DiscoveryError> {
    let file = dir.join(STACK_FILE);
    if !file.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(&file)
        .map_err(|e| DiscoveryError::new(&file, format!("reading file: {e}")))?;

    let parsed: StackFile = toml::from_str(&content)
        .map_err(|e| DiscoveryError::new(&file, format!("parsing: {}", e.message())))?;

    let Some(block) = parsed.stack else {
        return Ok(None);
    };

    let rel = dir
        .strip_prefix(root)
        .map_err(|_| DiscoveryError::new(dir, "directory is not below the project root"))?;
    let path = StackPath::from_relative(rel)
        .ok_or_else(|| DiscoveryError::new(dir, "directory name is not valid UTF-8"))?;

    block
        .into_stack(path)
        .map(Some)
        .map_err(|e| DiscoveryError::new(&file, e))
}

fn check_unique_ids(root: &Path, stacks: &[Stack], errors: &mut Vec<DiscoveryError>) {
    let mut seen: HashMap<&str, &StackPath> = HashMap::new();
    for stack in stacks {
        let Some(id) = stack.id.as_deref() else {
            continue;
        };
        if let Some(first) = seen.get(id) {
            errors.push(DiscoveryError::new(
                stack.dir(root).join(STACK_FILE),
                format!("duplicate stack id {id:?} (already used by {first})"),
            ));
        } else {
            seen.insert(id, &stack.path);
        }
    }
}

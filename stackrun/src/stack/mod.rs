//! Stacks and their discovery
//!
//! A stack is a directory holding a `stack.toml` file with a `[stack]` table.
//! This module handles:
//! - Canonical stack paths ([`StackPath`])
//! - Parsing stack configuration files
//! - Scanning a project tree into a [`Registry`]

pub mod path;
pub mod registry;

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub use path::StackPath;
pub use registry::{discover, Registry, STACK_FILE};

/// Maximum allowed length for stack IDs
pub const MAX_ID_LENGTH: usize = 64;

/// A discovered stack with its raw ordering constraints
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    /// Canonical project-absolute path (primary key)
    pub path: StackPath,
    /// Logical identifier used by cloud status lookups
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    /// References to stacks that must run before this one, as declared
    pub after: Vec<String>,
}

impl Stack {
    /// Create a stack with no constraints, named after its directory
    pub fn new(path: StackPath) -> Self {
        let name = path.name().to_string();
        Self {
            path,
            id: None,
            name,
            description: None,
            after: Vec::new(),
        }
    }

    pub fn with_after<S: Into<String>>(mut self, after: impl IntoIterator<Item = S>) -> Self {
        self.after = after.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Directory of this stack on disk
    pub fn dir(&self, root: &Path) -> PathBuf {
        self.path.to_fs_path(root)
    }
}

/// On-disk layout of `stack.toml`
#[derive(Debug, Default, Deserialize)]
pub struct StackFile {
    pub stack: Option<StackBlock>,
}

/// The `[stack]` table
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackBlock {
    pub id: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub after: Vec<String>,
}

impl StackBlock {
    /// Turn the parsed block into a stack located at `path`
    pub fn into_stack(self, path: StackPath) -> Result<Stack> {
        if let Some(id) = &self.id {
            validate_id(id)?;
        }
        for reference in &self.after {
            if reference.trim().is_empty() {
                bail!("after references cannot be empty");
            }
        }

        let mut stack = Stack::new(path);
        stack.id = self.id;
        if let Some(name) = self.name {
            stack.name = name;
        }
        stack.description = self.description;
        stack.after = self.after;
        Ok(stack)
    }
}

/// Validate a stack ID.
///
/// IDs must be non-empty, at most [`MAX_ID_LENGTH`] characters and use only
/// ASCII alphanumerics, dashes and underscores.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() {
        bail!("stack id cannot be empty");
    }

    if id.len() > MAX_ID_LENGTH {
        bail!(
            "stack id too long: {} characters (max {})",
            id.len(),
            MAX_ID_LENGTH
        );
    }

    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        bail!("stack id {id:?} contains invalid character {c:?} (use a-z, 0-9, '-', '_')");
    }

    Ok(())
}

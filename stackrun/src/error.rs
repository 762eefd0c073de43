//! Error types for stack discovery, ordering, execution and cloud lookups.
//!
//! Structural errors (discovery, unresolved references, cycles) abort a
//! command before any stack runs. A failing stack is not an error value; the
//! driver records it as an outcome and the command layer turns failed
//! outcomes into [`RunError::Aggregate`].

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::stack::StackPath;

/// A stack configuration file that could not be read or parsed
#[derive(Debug, Error)]
#[error("{}: {reason}", .path.display())]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub reason: String,
}

impl DiscoveryError {
    pub fn new(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Why an `after` reference could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The reference climbs above the project root
    OutsideProject,
    /// The reference names a directory that is not a stack
    NotAStack,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnresolvedReason::OutsideProject => write!(f, "points outside the project root"),
            UnresolvedReason::NotAStack => write!(f, "does not match any stack"),
        }
    }
}

/// Structural errors raised while loading stacks or resolving their order
#[derive(Debug, Error)]
pub enum StackError {
    #[error("failed to load {} stack configuration(s):\n{}", .0.len(), format_discovery(.0))]
    Discovery(Vec<DiscoveryError>),

    #[error("stack {stack}: after reference {reference:?} {reason}")]
    UnresolvedReference {
        stack: StackPath,
        reference: String,
        reason: UnresolvedReason,
    },

    #[error("cycle detected in stack ordering: {}", format_cycle(.cycle))]
    Cycle { cycle: Vec<StackPath> },
}

impl StackError {
    /// Stacks named by this error
    pub fn stacks(&self) -> Vec<&StackPath> {
        match self {
            StackError::Discovery(_) => Vec::new(),
            StackError::UnresolvedReference { stack, .. } => vec![stack],
            StackError::Cycle { cycle } => cycle.iter().collect(),
        }
    }
}

fn format_discovery(errors: &[DiscoveryError]) -> String {
    errors
        .iter()
        .map(|e| format!("  {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_cycle(cycle: &[StackPath]) -> String {
    cycle
        .iter()
        .map(StackPath::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Command-level execution errors
#[derive(Debug, Error)]
pub enum RunError {
    #[error("no command given to run")]
    EmptyCommand,

    #[error("command not found: {program}")]
    CommandNotFound { program: String },

    #[error("{failed} of {total} stacks failed: {}", format_stacks(.stacks))]
    Aggregate {
        failed: usize,
        total: usize,
        stacks: Vec<StackPath>,
    },

    #[error("interrupted: {attempted} of {total} stacks attempted")]
    Interrupted { attempted: usize, total: usize },
}

fn format_stacks(stacks: &[StackPath]) -> String {
    stacks
        .iter()
        .map(StackPath::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from the cloud status lookup
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("{filter} status filter does not work with filesystem based remotes")]
    LocalRepository { filter: String },

    #[error("status filters need a git remote named {remote:?}")]
    MissingRemote { remote: String },

    #[error("status filters need `cloud.api_url` in stackrun.toml or STACKRUN_CLOUD_URL")]
    MissingApiUrl,

    #[error("invalid cloud API URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("requesting {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("decoding response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

//! Git operations used for change detection and repository identity
//!
//! This module provides:
//! - A thin runner around the `git` binary
//! - Changed-stack detection from `git diff`
//! - Normalization of remote URLs into a repository identity

pub mod changes;
pub mod remote;
pub mod runner;

pub use changes::{changed_stacks, detect_changed_stacks, resolve_change_base};
pub use remote::{repository_identity, Repository};
pub use runner::{current_branch, ref_exists, remote_url, run_git, run_git_bool, run_git_checked, toplevel};

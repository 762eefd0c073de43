pub mod cloud;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod exit_codes;
pub mod git;
pub mod logging;
pub mod plan;
pub mod stack;

pub use error::{CloudError, DiscoveryError, RunError, StackError, UnresolvedReason};

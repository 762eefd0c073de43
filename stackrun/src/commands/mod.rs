//! Command implementations behind the CLI.
//!
//! Commands write their machine-readable output to a caller-supplied writer
//! so they can be exercised without a terminal.

pub mod list;
pub mod plan;
pub mod project;
pub mod run;

pub use project::{Project, SelectArgs};

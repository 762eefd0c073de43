//! End-to-end tests for stackrun
//!
//! Every test builds a real git repository in a temporary directory, lays
//! out stacks in it and drives the command layer against it.

pub mod cloud_status;
pub mod helpers;
pub mod run;
pub mod run_order;

pub use helpers::*;

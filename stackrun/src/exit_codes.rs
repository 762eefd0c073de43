//! Stable exit codes for stackrun commands.

use crate::error::RunError;

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid configuration, stack layout, ordering or invocation.
pub const INVALID: i32 = 1;
/// At least one stack's command failed.
pub const STACK_FAILED: i32 = 2;
/// The run was interrupted with Ctrl-C.
pub const INTERRUPTED: i32 = 130;

/// Exit code for an error returned by a command
pub fn for_error(err: &anyhow::Error) -> i32 {
    if let Some(run) = err.downcast_ref::<RunError>() {
        return match run {
            RunError::Aggregate { .. } => STACK_FAILED,
            RunError::Interrupted { .. } => INTERRUPTED,
            RunError::EmptyCommand | RunError::CommandNotFound { .. } => INVALID,
        };
    }
    INVALID
}

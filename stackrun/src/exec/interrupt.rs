//! Ctrl-C handling for stack runs

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag set when the user interrupts a run
#[derive(Debug, Clone, Default)]
pub struct Interrupt(Arc<AtomicBool>);

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a process-wide Ctrl-C handler that sets this flag.
    ///
    /// Children share our process group and receive the signal themselves,
    /// so the handler only records it.
    pub fn install(&self) -> Result<()> {
        let flag = self.0.clone();
        ctrlc::set_handler(move || {
            flag.store(true, Ordering::SeqCst);
        })
        .context("Failed to set Ctrl+C handler")
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

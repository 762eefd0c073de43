//! Execution driver
//!
//! Walks an execution plan and runs one action per stack, strictly in order,
//! reporting each outcome as soon as it is known.

pub mod action;
pub mod driver;
pub mod interrupt;

pub use action::{ActionOutput, CommandAction, StackAction};
pub use driver::{Driver, FailurePolicy, NullSink, Outcome, OutcomeSink, RunReport, StackOutcome};
pub use interrupt::Interrupt;

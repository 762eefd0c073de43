//! Sequential execution of an action over an execution plan

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use super::action::StackAction;
use super::interrupt::Interrupt;
use crate::error::RunError;
use crate::plan::ExecutionPlan;
use crate::stack::{Stack, StackPath};

/// What to do after a stack fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop after the first failed stack
    #[default]
    Halt,
    /// Attempt every stack
    Continue,
}

impl FailurePolicy {
    pub fn from_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Halt
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    Failed {
        exit_code: Option<i32>,
        reason: String,
    },
    /// The stack was running when the user interrupted and did not succeed
    Interrupted,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded)
    }
}

/// Result of running the action on one stack
#[derive(Debug, Clone)]
pub struct StackOutcome {
    pub path: StackPath,
    pub stdout: String,
    pub stderr: String,
    pub outcome: Outcome,
    pub duration: Duration,
}

/// Receives outcomes as they happen, before the next stack starts
pub trait OutcomeSink {
    fn stack_started(&mut self, _stack: &Stack) {}

    fn stack_finished(&mut self, outcome: &StackOutcome);
}

/// Sink that discards everything
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn stack_finished(&mut self, _outcome: &StackOutcome) {}
}

/// Everything the driver observed during a run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Outcomes of attempted stacks, in run order
    pub outcomes: Vec<StackOutcome>,
    /// Stacks skipped after a halt or interrupt, in run order
    pub not_attempted: Vec<StackPath>,
    pub interrupted: bool,
    pub total: usize,
}

impl RunReport {
    pub fn failed(&self) -> Vec<&StackOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.outcome.is_success())
            .collect()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.outcome.is_success()).count()
    }

    pub fn is_success(&self) -> bool {
        !self.interrupted && self.failed().is_empty()
    }

    /// Turn the report into the command-level result
    pub fn into_result(self) -> Result<Self, RunError> {
        if self.interrupted {
            return Err(RunError::Interrupted {
                attempted: self.outcomes.len(),
                total: self.total,
            });
        }

        let failed: Vec<StackPath> = self.failed().iter().map(|o| o.path.clone()).collect();
        if failed.is_empty() {
            Ok(self)
        } else {
            Err(RunError::Aggregate {
                failed: failed.len(),
                total: self.total,
                stacks: failed,
            })
        }
    }
}

/// Runs an action over every stack of a plan, one at a time
pub struct Driver {
    root: PathBuf,
    policy: FailurePolicy,
    interrupt: Interrupt,
}

impl Driver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            policy: FailurePolicy::default(),
            interrupt: Interrupt::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run(
        &self,
        plan: &ExecutionPlan,
        action: &dyn StackAction,
        sink: &mut dyn OutcomeSink,
    ) -> RunReport {
        let mut report = RunReport {
            total: plan.len(),
            ..RunReport::default()
        };

        let mut stacks = plan.iter();
        for stack in stacks.by_ref() {
            if self.interrupt.is_set() {
                report.interrupted = true;
                report.not_attempted.push(stack.path.clone());
                break;
            }

            sink.stack_started(stack);
            let outcome = self.run_one(stack, action);
            sink.stack_finished(&outcome);

            let failed = !outcome.outcome.is_success();
            report.interrupted |= outcome.outcome == Outcome::Interrupted;
            report.outcomes.push(outcome);

            if report.interrupted {
                break;
            }
            if failed && self.policy == FailurePolicy::Halt {
                warn!(stack = %stack.path, "stack failed, halting");
                break;
            }
        }
        report
            .not_attempted
            .extend(stacks.map(|s| s.path.clone()));

        info!(
            total = report.total,
            attempted = report.outcomes.len(),
            failed = report.failed().len(),
            interrupted = report.interrupted,
            "run finished"
        );
        report
    }

    fn run_one(&self, stack: &Stack, action: &dyn StackAction) -> StackOutcome {
        let dir = stack.dir(&self.root);
        let start = Instant::now();
        debug!(stack = %stack.path, dir = %dir.display(), "running stack");

        let (stdout, stderr, outcome) = match action.run(stack, &dir) {
            Ok(output) => {
                let outcome = if output.success {
                    Outcome::Succeeded
                } else if self.interrupt.is_set() {
                    Outcome::Interrupted
                } else {
                    Outcome::Failed {
                        exit_code: output.exit_code,
                        reason: failure_reason(output.exit_code, output.timed_out),
                    }
                };
                (output.stdout, output.stderr, outcome)
            }
            Err(e) => {
                let outcome = if self.interrupt.is_set() {
                    Outcome::Interrupted
                } else {
                    Outcome::Failed {
                        exit_code: None,
                        reason: format!("{e:#}"),
                    }
                };
                (String::new(), String::new(), outcome)
            }
        };

        StackOutcome {
            path: stack.path.clone(),
            stdout,
            stderr,
            outcome,
            duration: start.elapsed(),
        }
    }
}

fn failure_reason(exit_code: Option<i32>, timed_out: bool) -> String {
    if timed_out {
        return "timed out".to_string();
    }
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

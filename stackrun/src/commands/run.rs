//! `stackrun run`

use anyhow::Result;
use colored::Colorize;
use std::io::{self, Write};
use std::time::Duration;

use tracing::info;

use super::project::{Project, SelectArgs};
use crate::cloud::StatusSource;
use crate::exec::{
    CommandAction, Driver, FailurePolicy, Interrupt, Outcome, OutcomeSink, RunReport,
    StackAction, StackOutcome,
};
use crate::stack::Stack;

#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub select: SelectArgs,
    /// Overrides `run.continue_on_error` when set
    pub continue_on_error: bool,
    /// Overrides `run.timeout_secs` when set
    pub timeout_secs: Option<u64>,
    /// Print what would run without running it
    pub dry_run: bool,
    pub command: Vec<String>,
}

/// Where run output goes
pub struct RunOutput<'a> {
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

/// Run the command in every selected stack, in run order
pub fn execute<'a>(
    project: &'a Project,
    args: &RunArgs,
    source: Option<&dyn StatusSource>,
    interrupt: Interrupt,
    output: RunOutput<'a>,
) -> Result<RunReport> {
    let timeout = args
        .timeout_secs
        .map(Duration::from_secs)
        .or(project.config.run.timeout());
    let action = CommandAction::new(&args.command, timeout)?;
    let policy =
        FailurePolicy::from_flag(args.continue_on_error || project.config.run.continue_on_error);

    let plan = project.select(&args.select, source)?;

    if args.select.changed {
        writeln!(output.out, "Running on changed stacks:")?;
    }

    if args.dry_run {
        for stack in &plan {
            writeln!(
                output.out,
                "[{}] would run {}",
                project.display_path(&stack.path),
                action.describe()
            )?;
        }
        return Ok(RunReport {
            total: plan.len(),
            not_attempted: plan.paths().into_iter().cloned().collect(),
            ..RunReport::default()
        });
    }

    info!(stacks = plan.len(), ?policy, command = %action.describe(), "running");
    let mut sink = PrintSink::new(project, action.describe(), output);
    let report = Driver::new(&project.root)
        .with_policy(policy)
        .with_interrupt(interrupt)
        .run(&plan, &action, &mut sink);
    sink.finish(&report)?;

    Ok(report.into_result()?)
}

/// Streams per-stack output as the driver reports it
struct PrintSink<'a> {
    project: &'a Project,
    command: String,
    output: RunOutput<'a>,
    error: Option<io::Error>,
}

impl<'a> PrintSink<'a> {
    fn new(project: &'a Project, command: String, output: RunOutput<'a>) -> Self {
        Self {
            project,
            command,
            output,
            error: None,
        }
    }

    fn record(&mut self, result: io::Result<()>) {
        if let Err(e) = result {
            self.error.get_or_insert(e);
        }
    }

    /// Print the summary, surfacing the first write error seen while running
    fn finish(mut self, report: &RunReport) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        if report.total == 0 {
            return Ok(());
        }

        let err = &mut *self.output.err;
        let failed = report.failed().len();
        let summary = format!(
            "{} succeeded, {} failed, {} not attempted",
            report.succeeded(),
            failed,
            report.not_attempted.len()
        );
        if report.is_success() {
            writeln!(err, "{} {summary}", "✓".green().bold())?;
        } else {
            writeln!(err, "{} {summary}", "✗".red().bold())?;
            for path in &report.not_attempted {
                writeln!(
                    err,
                    "  {} {}",
                    "skipped".dimmed(),
                    self.project.display_path(path)
                )?;
            }
        }
        Ok(())
    }
}

impl OutcomeSink for PrintSink<'_> {
    fn stack_started(&mut self, stack: &Stack) {
        let label = self.project.display_path(&stack.path);
        let result = writeln!(
            self.output.out,
            "[{}] running {}",
            label.bold(),
            self.command
        );
        self.record(result);
    }

    fn stack_finished(&mut self, outcome: &StackOutcome) {
        let result = self
            .output
            .out
            .write_all(outcome.stdout.as_bytes())
            .and_then(|()| self.output.err.write_all(outcome.stderr.as_bytes()));
        self.record(result);

        let label = self.project.display_path(&outcome.path);
        let result = match &outcome.outcome {
            Outcome::Succeeded => Ok(()),
            Outcome::Failed { reason, .. } => writeln!(
                self.output.err,
                "{} {label}: {reason}",
                "failed".red().bold()
            ),
            Outcome::Interrupted => {
                writeln!(self.output.err, "{} {label}", "interrupted".yellow().bold())
            }
        };
        self.record(result);
    }
}

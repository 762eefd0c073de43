//! `stackrun plan run-order`

use anyhow::Result;
use std::io::Write;

use super::project::{Project, SelectArgs};
use crate::cloud::StatusSource;

/// Print the selected stacks in the order `run` would execute them
pub fn run_order(
    project: &Project,
    args: &SelectArgs,
    source: Option<&dyn StatusSource>,
    out: &mut dyn Write,
) -> Result<()> {
    let plan = project.select(args, source)?;
    for stack in &plan {
        writeln!(out, "{}", project.display_path(&stack.path))?;
    }
    Ok(())
}

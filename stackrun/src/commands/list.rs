//! `stackrun list`

use anyhow::Result;
use std::io::Write;

use super::project::{Project, SelectArgs};
use crate::cloud::StatusSource;

#[derive(Debug, Clone, Default)]
pub struct ListArgs {
    pub select: SelectArgs,
    /// Print in run order instead of by path
    pub run_order: bool,
}

/// Print the selected stacks, one path per line
pub fn execute(
    project: &Project,
    args: &ListArgs,
    source: Option<&dyn StatusSource>,
    out: &mut dyn Write,
) -> Result<()> {
    let plan = project.select(&args.select, source)?;

    let mut paths: Vec<_> = plan.paths();
    if !args.run_order {
        paths.sort();
    }

    for path in paths {
        writeln!(out, "{}", project.display_path(path))?;
    }
    Ok(())
}

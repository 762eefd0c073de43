use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use std::io;
use std::path::PathBuf;

use stackrun::cloud::StatusFilter;
use stackrun::commands::list::{self, ListArgs};
use stackrun::commands::run::{self, RunArgs, RunOutput};
use stackrun::commands::{plan, Project, SelectArgs};
use stackrun::exec::Interrupt;
use stackrun::{exit_codes, logging};

#[derive(Parser)]
#[command(name = "stackrun")]
#[command(about = "Run commands across infrastructure stacks in dependency order", long_about = None)]
#[command(version)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "chdir", global = true, value_name = "DIR")]
    chdir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List stacks below the current directory
    List {
        #[command(flatten)]
        select: SelectOpts,

        /// Print stacks in run order instead of by path
        #[arg(long)]
        run_order: bool,
    },

    /// Run a command in each selected stack, in dependency order
    Run {
        #[command(flatten)]
        select: SelectOpts,

        /// Keep running remaining stacks after one fails
        #[arg(long)]
        continue_on_error: bool,

        /// Kill a stack's command after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,

        /// Show what would run without running anything
        #[arg(long)]
        dry_run: bool,

        /// Command and arguments, after `--`
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "CMD")]
        command: Vec<String>,
    },

    /// Inspect execution planning
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Print the order `run` would execute stacks in
    RunOrder {
        #[command(flatten)]
        select: SelectOpts,
    },
}

#[derive(Args)]
struct SelectOpts {
    /// Only stacks changed since the change base
    #[arg(long)]
    changed: bool,

    /// Git ref to compute changes against (with --changed)
    #[arg(long, value_name = "REF")]
    git_change_base: Option<String>,

    /// Only stacks with this cloud status (ok, healthy, unhealthy, failed, drifted)
    #[arg(long, value_name = "FILTER", value_parser = parse_status_filter)]
    cloud_status: Option<StatusFilter>,
}

impl From<SelectOpts> for SelectArgs {
    fn from(opts: SelectOpts) -> Self {
        SelectArgs {
            changed: opts.changed,
            git_change_base: opts.git_change_base,
            cloud_status: opts.cloud_status,
        }
    }
}

fn parse_status_filter(s: &str) -> Result<StatusFilter, String> {
    s.parse().map_err(|e: anyhow::Error| e.to_string())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                exit_codes::INVALID
            } else {
                exit_codes::OK
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    logging::init(cli.verbose);

    if let Err(err) = execute(cli) {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(exit_codes::for_error(&err));
    }
}

fn execute(cli: Cli) -> Result<()> {
    let workdir = match cli.chdir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    let stdout = io::stdout();

    match cli.command {
        Commands::List { select, run_order } => {
            let project = Project::load(&workdir)?;
            let args = ListArgs {
                select: select.into(),
                run_order,
            };
            list::execute(&project, &args, None, &mut stdout.lock())
        }
        Commands::Run {
            select,
            continue_on_error,
            timeout,
            dry_run,
            command,
        } => {
            let project = Project::load(&workdir)?;
            let args = RunArgs {
                select: select.into(),
                continue_on_error,
                timeout_secs: timeout,
                dry_run,
                command,
            };
            let interrupt = Interrupt::new();
            interrupt.install()?;

            let output = RunOutput {
                out: &mut stdout.lock(),
                err: &mut io::stderr().lock(),
            };
            run::execute(&project, &args, None, interrupt, output).map(|_| ())
        }
        Commands::Plan {
            command: PlanCommands::RunOrder { select },
        } => {
            let project = Project::load(&workdir)?;
            plan::run_order(&project, &select.into(), None, &mut stdout.lock())
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "stackrun", &mut stdout.lock());
            Ok(())
        }
    }
}

//! The per-stack action and its process-backed implementation

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use wait_timeout::ChildExt;

use tracing::debug;

use crate::error::RunError;
use crate::stack::Stack;

/// Timeout for collecting output from child process pipes
const OUTPUT_COLLECTION_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum captured output per stream (10MB)
const MAX_OUTPUT_SIZE: usize = 10 * 1024 * 1024;

pub const ENV_STACK_PATH: &str = "STACKRUN_STACK_PATH";
pub const ENV_STACK_NAME: &str = "STACKRUN_STACK_NAME";
pub const ENV_STACK_ID: &str = "STACKRUN_STACK_ID";

/// What an action produced for one stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionOutput {
    pub success: bool,
    /// `None` when the process was killed or terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl ActionOutput {
    pub fn succeeded(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stderr: stderr.into(),
            ..Self::default()
        }
    }
}

/// Work performed once per stack, with the stack directory as working
/// directory
pub trait StackAction {
    /// Human-readable form, used in run headers
    fn describe(&self) -> String;

    /// Run against `stack` located at `dir`.
    ///
    /// An `Err` means the action could not be started at all; the driver
    /// records it as the stack's failure.
    fn run(&self, stack: &Stack, dir: &Path) -> Result<ActionOutput>;
}

/// Spawns a program with arguments in each stack directory, without a shell
#[derive(Debug, Clone)]
pub struct CommandAction {
    program: PathBuf,
    args: Vec<String>,
    display: String,
    timeout: Option<Duration>,
}

impl CommandAction {
    /// Build from an argv. Bare program names are looked up on `PATH` now so
    /// a typo fails before any stack runs; programs given as a path are
    /// resolved in each stack directory.
    pub fn new(argv: &[String], timeout: Option<Duration>) -> Result<Self, RunError> {
        let (program, args) = argv.split_first().ok_or(RunError::EmptyCommand)?;
        if program.is_empty() {
            return Err(RunError::EmptyCommand);
        }

        let program_path = if program.contains(std::path::MAIN_SEPARATOR) || program.contains('/') {
            PathBuf::from(program)
        } else {
            which::which(program).map_err(|_| RunError::CommandNotFound {
                program: program.clone(),
            })?
        };

        // the header shows the program that actually runs, not what was typed
        let display = std::iter::once(program_path.to_string_lossy().into_owned())
            .chain(args.iter().cloned())
            .map(|a| shell_escape::escape(a.into()).into_owned())
            .collect::<Vec<_>>()
            .join(" ");

        Ok(Self {
            program: program_path,
            args: args.to_vec(),
            display,
            timeout,
        })
    }

    fn spawn(&self, stack: &Stack, dir: &Path) -> Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(dir)
            .env(ENV_STACK_PATH, stack.path.as_str())
            .env(ENV_STACK_NAME, &stack.name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(id) = &stack.id {
            cmd.env(ENV_STACK_ID, id);
        }

        cmd.spawn()
            .with_context(|| format!("Failed to spawn command: {}", self.display))
    }
}

impl StackAction for CommandAction {
    fn describe(&self) -> String {
        self.display.clone()
    }

    fn run(&self, stack: &Stack, dir: &Path) -> Result<ActionOutput> {
        debug!(stack = %stack.path, command = %self.display, "spawning");
        let mut child = self.spawn(stack, dir)?;

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe buffer.
        let stdout_rx = drain(child.stdout.take());
        let stderr_rx = drain(child.stderr.take());

        let status = match self.timeout {
            Some(timeout) => child
                .wait_timeout(timeout)
                .with_context(|| format!("Failed to wait for command: {}", self.display))?,
            None => Some(
                child
                    .wait()
                    .with_context(|| format!("Failed to wait for command: {}", self.display))?,
            ),
        };

        if status.is_none() {
            kill_child_process(&mut child);
        }

        let stdout = collect(stdout_rx);
        let mut stderr = collect(stderr_rx);

        Ok(match status {
            Some(status) => ActionOutput {
                success: status.success(),
                exit_code: status.code(),
                stdout,
                stderr,
                timed_out: false,
            },
            None => {
                let secs = self.timeout.map_or(0, |t| t.as_secs());
                stderr.push_str(&format!("\n[Process killed after {secs}s timeout]"));
                ActionOutput {
                    success: false,
                    exit_code: None,
                    stdout,
                    stderr,
                    timed_out: true,
                }
            }
        })
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    match stream {
        Some(stream) => {
            thread::spawn(move || {
                let _ = tx.send(read_stream_to_string(stream));
            });
        }
        None => {
            let _ = tx.send(String::new());
        }
    }
    rx
}

fn collect(rx: mpsc::Receiver<String>) -> String {
    rx.recv_timeout(OUTPUT_COLLECTION_TIMEOUT)
        .unwrap_or_else(|_| "[output collection timed out]".to_string())
}

/// Read a stream to string, keeping at most `MAX_OUTPUT_SIZE` bytes
fn read_stream_to_string<R: Read>(mut stream: R) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let mut truncated = false;

    loop {
        match stream.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                let remaining = MAX_OUTPUT_SIZE.saturating_sub(buf.len());
                let to_copy = n.min(remaining);
                buf.extend_from_slice(&chunk[..to_copy]);
                // keep reading past the limit so the child never sees a broken pipe
                truncated |= to_copy < n;
            }
            Err(_) => break,
        }
    }

    if truncated {
        buf.extend_from_slice(b"\n[output truncated at 10MB]");
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn kill_child_process(child: &mut Child) {
    // the process may already have exited
    let _ = child.kill();
    let _ = child.wait();
}

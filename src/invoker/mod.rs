//! External process invocation.
//!
//! Every external tool the hooks call goes through [`ProcessInvoker`], and
//! every call produces a [`CommandOutcome`] the caller must look at. Nothing
//! is fire-and-forget: a failed tool run is always visible to the code that
//! issued it.

mod tool_detection;

pub use tool_detection::resolve_tool;

use crate::error::{PipelineError, Result};
use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::process::Stdio;

/// One external command: program plus arguments, no shell involved.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Creates a command with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of running a [`ToolCommand`].
#[derive(Clone, Debug, Serialize)]
pub struct CommandOutcome {
    /// Rendered command line
    pub command: String,
    /// Exit code, `None` if the process was killed or never started
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Outcome for a command that could not be started at all.
    pub fn spawn_failed(command: &ToolCommand, error: &std::io::Error) -> Self {
        Self {
            command: command.to_string(),
            exit_code: None,
            success: false,
            stdout: String::new(),
            stderr: format!("failed to start {}: {}", command.program, error),
        }
    }

    /// Convert a failed outcome into [`PipelineError::ExternalCommandFailure`].
    pub fn into_result(self) -> Result<Self> {
        if self.success {
            return Ok(self);
        }
        let status = match self.exit_code {
            Some(code) => format!("exit code {}", code),
            None => "no exit code".to_string(),
        };
        Err(PipelineError::ExternalCommandFailure {
            reason: format!("{}: {}", status, self.stderr.trim()),
            command: self.command,
        })
    }
}

/// Runs external commands on behalf of the hooks.
pub trait ProcessInvoker {
    /// Run `command` to completion and report what happened.
    fn execute(&self, command: &ToolCommand) -> impl Future<Output = CommandOutcome> + Send;
}

/// [`ProcessInvoker`] backed by real child processes.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemInvoker;

impl ProcessInvoker for SystemInvoker {
    async fn execute(&self, command: &ToolCommand) -> CommandOutcome {
        log::info!("Executing: {}", command);

        let program = resolve_tool(&command.program);
        let output = tokio::process::Command::new(&program)
            .args(&command.args)
            .stdin(Stdio::null())
            .output()
            .await;

        match output {
            Ok(output) => {
                let outcome = CommandOutcome {
                    command: command.to_string(),
                    exit_code: output.status.code(),
                    success: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                };
                for line in outcome.stdout.lines() {
                    log::info!("  {}", line);
                }
                if !outcome.success {
                    log::warn!(
                        "{} exited with {:?}: {}",
                        command.program,
                        outcome.exit_code,
                        outcome.stderr.trim()
                    );
                }
                outcome
            }
            Err(e) => {
                log::warn!("Could not start {}: {}", command.program, e);
                CommandOutcome::spawn_failed(command, &e)
            }
        }
    }
}

//! External command execution
//!
//! Every inspection or mutation of the live machine goes through
//! [`CommandExecutor`], so the rest of the crate never spawns processes
//! itself and can run against a fake machine in tests.

use std::fmt;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::{Error, Result};

/// A program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl SystemCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            ..Self::default()
        }
    }

    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs commands against the machine being reconciled.
///
/// A non-zero exit status is reported in [`CommandOutput`], not as an
/// error. Errors are reserved for commands that could not run to
/// completion.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// [`Error::CommandTimeout`] when the timeout elapses and
    /// [`Error::CommandSpawn`] when the process cannot be started.
    async fn run(&self, command: &SystemCommand, timeout: Duration) -> Result<CommandOutput>;
}

/// [`CommandExecutor`] that spawns real processes.
///
/// A command that times out is killed; stdin is never attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandExecutor for SystemCommandExecutor {
    async fn run(&self, command: &SystemCommand, timeout: Duration) -> Result<CommandOutput> {
        tracing::debug!(command = %command, ?timeout, "Running command");

        let child = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::CommandSpawn {
                command: command.to_string(),
                source,
            })?;

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let output = CommandOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code: output.status.code().unwrap_or(-1),
                };
                tracing::debug!(command = %command, exit_code = output.exit_code, "Command finished");
                Ok(output)
            }
            Ok(Err(source)) => Err(Error::CommandSpawn {
                command: command.to_string(),
                source,
            }),
            Err(_) => {
                tracing::warn!(command = %command, ?timeout, "Command timed out, killed");
                Err(Error::CommandTimeout {
                    command: command.to_string(),
                    timeout,
                })
            }
        }
    }
}

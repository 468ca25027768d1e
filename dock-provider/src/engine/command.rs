//! Engine CLI command builder.
//!
//! Engines driven through a command-line client build their invocations with
//! [`EngineCommand`], which routes execution through the shared helpers in
//! `dock_core::command_stream` so failures carry the full command line.

use dock_core::command_stream::{
    command_line, run_captured, run_checked, stream_command_with_timeout,
};
use dock_core::{CommandError, CommandOutput};
use tracing::debug;

/// Builder for engine CLI invocations with a fluent interface.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    binary: String,
    subcommand: Option<String>,
    args: Vec<String>,
    timeout_secs: Option<u64>,
}

impl EngineCommand {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            subcommand: None,
            args: Vec::new(),
            timeout_secs: None,
        }
    }

    /// Set the subcommand (e.g. "run", "ps", "rm").
    pub fn subcommand<S: Into<String>>(mut self, cmd: S) -> Self {
        self.subcommand = Some(cmd.into());
        self
    }

    /// Add a single argument to the command.
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Kill the command if it runs longer than this. Only applies to [`Self::execute`].
    pub fn timeout(mut self, timeout_secs: Option<u64>) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn full_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.args.len() + 1);
        if let Some(subcmd) = &self.subcommand {
            args.push(subcmd.clone());
        }
        args.extend(self.args.iter().cloned());
        args
    }

    /// Rendered command line, for logs.
    pub fn display(&self) -> String {
        command_line(&self.binary, &self.full_args())
    }

    /// Execute the command, logging its output, and fail on a non-zero exit.
    pub fn execute(self) -> Result<(), CommandError> {
        let args = self.full_args();
        debug!("Executing engine command: {}", self.display());
        stream_command_with_timeout(&self.binary, &args, self.timeout_secs)
    }

    /// Execute the command and return its stdout.
    pub fn execute_with_output(self) -> Result<String, CommandError> {
        let args = self.full_args();
        debug!("Executing engine command with output: {}", self.display());
        run_checked(&self.binary, &args)
    }

    /// Execute the command and return the captured output whatever the exit status.
    pub fn execute_raw(self) -> Result<CommandOutput, CommandError> {
        let args = self.full_args();
        debug!("Executing engine command (raw): {}", self.display());
        run_captured(&self.binary, &args)
    }
}

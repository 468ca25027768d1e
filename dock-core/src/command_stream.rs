// Standard library
use std::ffi::OsStr;
use std::io::{self, BufRead, BufReader};
use std::thread;
use std::time::{Duration, Instant};

// External crates
use duct::cmd;
use thiserror::Error;
use tracing::{debug, info};
use which::which;

/// Lines of output kept when a command fails.
const ERROR_CONTEXT_LINES: usize = 50;

/// Failure of an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("failed to start '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("'{command}' exited with code {code:?}: {output}")]
    Failed {
        command: String,
        code: Option<i32>,
        output: String,
    },

    #[error("'{command}' timed out after {secs}s")]
    Timeout { command: String, secs: u64 },
}

/// Captured streams and exit status of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Renders `command args...` for logs and error messages.
pub fn command_line<A: AsRef<OsStr>>(command: &str, args: &[A]) -> String {
    let mut line = command.to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.as_ref().to_string_lossy());
    }
    line
}

fn tail(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(ERROR_CONTEXT_LINES);
    lines[start..].join("\n")
}

/// Runs a command to completion and captures stdout and stderr, whatever the exit status.
pub fn run_captured<A: AsRef<OsStr>>(
    command: &str,
    args: &[A],
) -> Result<CommandOutput, CommandError> {
    let full_command = command_line(command, args);
    debug!("Executing: {}", full_command);

    let output = cmd(command, args)
        .stdout_capture()
        .stderr_capture()
        .unchecked()
        .run()
        .map_err(|source| CommandError::Spawn {
            command: full_command,
            source,
        })?;

    Ok(CommandOutput {
        code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Runs a command and returns its stdout, failing on a non-zero exit.
pub fn run_checked<A: AsRef<OsStr>>(command: &str, args: &[A]) -> Result<String, CommandError> {
    let output = run_captured(command, args)?;
    if output.success() {
        Ok(output.stdout)
    } else {
        Err(CommandError::Failed {
            command: command_line(command, args),
            code: output.code,
            output: tail(output.stderr.trim()),
        })
    }
}

/// Stream command output to the log, with an optional timeout in seconds.
///
/// Without a timeout each line is logged as it arrives. With one, output is
/// collected and logged once the process exits; the process is killed when the
/// deadline passes.
pub fn stream_command_with_timeout<A: AsRef<OsStr>>(
    command: &str,
    args: &[A],
    timeout_secs: Option<u64>,
) -> Result<(), CommandError> {
    let full_command = command_line(command, args);

    let Some(secs) = timeout_secs else {
        let reader = cmd(command, args)
            .stderr_to_stdout()
            .reader()
            .map_err(|source| CommandError::Spawn {
                command: full_command.clone(),
                source,
            })?;

        // The reader reports a non-zero exit as an error once output is drained.
        let mut collected = Vec::new();
        for line in BufReader::new(reader).lines() {
            match line {
                Ok(line) => {
                    info!("{}", line);
                    collected.push(line);
                }
                Err(e) => {
                    return Err(CommandError::Failed {
                        command: full_command,
                        code: None,
                        output: format!("{}\n{}", tail(&collected.join("\n")), e),
                    });
                }
            }
        }
        return Ok(());
    };

    let handle = cmd(command, args)
        .stderr_to_stdout()
        .stdout_capture()
        .unchecked()
        .start()
        .map_err(|source| CommandError::Spawn {
            command: full_command.clone(),
            source,
        })?;

    let start = Instant::now();
    let timeout = Duration::from_secs(secs);

    loop {
        if start.elapsed() >= timeout {
            let _ = handle.kill();
            return Err(CommandError::Timeout {
                command: full_command,
                secs,
            });
        }

        match handle.try_wait() {
            Ok(Some(output)) => {
                let stdout = String::from_utf8_lossy(&output.stdout);
                for line in stdout.lines() {
                    info!("{}", line);
                }

                if !output.status.success() {
                    return Err(CommandError::Failed {
                        command: full_command,
                        code: output.status.code(),
                        output: tail(&stdout),
                    });
                }
                return Ok(());
            }
            Ok(None) => thread::sleep(Duration::from_millis(100)),
            Err(source) => {
                return Err(CommandError::Spawn {
                    command: full_command,
                    source,
                })
            }
        }
    }
}

/// Checks if a command-line tool is available in the system's PATH.
pub fn is_tool_installed(tool_name: &str) -> bool {
    which(tool_name).is_ok()
}

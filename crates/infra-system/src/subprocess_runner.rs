// Subprocess runner
// reason: tokio::process for async spawn, wait and kill-on-timeout
use async_trait::async_trait;
use std::io;
use std::process::{Output, Stdio};
use std::time::Instant;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use netfix_core::domain::{FailureKind, StepOutcome};
use netfix_core::port::{CommandRunner, CommandSpec, RunOptions};

use crate::decode::OutputDecoder;

/// Suppresses the console window flash for every spawned tool
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Spawns real child processes
///
/// Each call is independent; the runner holds no per-command state.
#[derive(Debug, Clone, Default)]
pub struct SubprocessRunner {
    decoder: OutputDecoder,
}

impl SubprocessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_command(spec: &CommandSpec, options: &RunOptions) -> Command {
        let mut command = if options.shell {
            shell_command(&spec.command_line())
        } else {
            let mut command = Command::new(spec.program());
            command.args(spec.arguments());
            command
        };

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW);

        command
    }

    /// stdout followed by stderr, decoded
    fn merged_output(&self, output: &Output) -> String {
        let mut bytes = output.stdout.clone();
        if !output.stderr.is_empty() {
            if !bytes.is_empty() && !bytes.ends_with(b"\n") {
                bytes.push(b'\n');
            }
            bytes.extend_from_slice(&output.stderr);
        }
        self.decoder.decode(&bytes)
    }

    fn spawn_failure(label: String, error: &io::Error) -> StepOutcome {
        let kind = if error.kind() == io::ErrorKind::PermissionDenied {
            FailureKind::PermissionDenied
        } else {
            FailureKind::Execution
        };
        StepOutcome::failure(label, kind, error.to_string())
    }
}

#[cfg(windows)]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(line);
    command
}

#[cfg(not(windows))]
fn shell_command(line: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(line);
    command
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(&self, spec: &CommandSpec, options: &RunOptions) -> StepOutcome {
        let label = spec.command_line();
        let started = Instant::now();
        debug!(command = %label, shell = options.shell, timeout = ?options.timeout, "Spawning command");

        let child = match Self::build_command(spec, options).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %label, error = %e, "Failed to spawn command");
                return Self::spawn_failure(label, &e).with_duration(started.elapsed());
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it
        let waited = match options.timeout {
            Some(limit) => match timeout(limit, child.wait_with_output()).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(command = %label, timeout = ?limit, "Command timed out, killed");
                    return StepOutcome::failure(
                        label,
                        FailureKind::Timeout,
                        format!("Timed out after {:?}", limit),
                    )
                    .with_duration(started.elapsed());
                }
            },
            None => child.wait_with_output().await,
        };

        let output = match waited {
            Ok(output) => output,
            Err(e) => {
                warn!(command = %label, error = %e, "Failed to collect command output");
                return StepOutcome::failure(label, FailureKind::Execution, e.to_string())
                    .with_duration(started.elapsed());
            }
        };

        let text = self.merged_output(&output);
        let exit_code = output.status.code().unwrap_or(-1);
        let duration = started.elapsed();
        debug!(command = %label, exit_code, duration_ms = duration.as_millis() as u64, "Command finished");

        let outcome = if output.status.success() || !options.check {
            StepOutcome::success(label, text)
        } else {
            StepOutcome::failure(label, FailureKind::Execution, text)
        };
        outcome.with_exit_code(exit_code).with_duration(duration)
    }
}

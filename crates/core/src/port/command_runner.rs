// Command Runner Port
// Abstraction for executing one external command and folding the result into a StepOutcome

use crate::domain::StepOutcome;
use async_trait::async_trait;
use std::time::Duration;

/// Program plus exact argument vector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Build from a literal argument vector, e.g. `["netsh", "winsock", "reset"]`
    ///
    /// An empty slice yields an empty program, which fails at spawn time.
    pub fn argv(parts: &[&str]) -> Self {
        let mut iter = parts.iter();
        let program = iter.next().copied().unwrap_or_default();
        Self::new(program).args(iter.copied())
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

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Single command line, used when running through a shell
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.command_line())
    }
}

/// How to run a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Run `command_line()` through the platform shell instead of spawning argv directly
    pub shell: bool,
    /// Kill the process and report `FailureKind::Timeout` after this long
    pub timeout: Option<Duration>,
    /// Treat a non-zero exit as failure
    pub check: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            shell: false,
            timeout: None,
            check: true,
        }
    }
}

impl RunOptions {
    /// Non-zero exit is failure, bounded by `timeout`
    pub fn checked(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            ..Self::default()
        }
    }

    /// Non-zero exit is still reported as success; callers inspect the exit code
    pub fn unchecked(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            check: false,
            ..Self::default()
        }
    }

    pub fn through_shell(mut self) -> Self {
        self.shell = true;
        self
    }
}

/// Command Runner trait
///
/// Implementations:
/// - SubprocessRunner (infra-system): spawns a real process
/// - mocks::MockCommandRunner: scripted responses for tests
///
/// `run` never fails: spawn errors, non-zero exits and timeouts all come back
/// as an unsuccessful [`StepOutcome`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Execute one command
    async fn run(&self, command: &CommandSpec, options: &RunOptions) -> StepOutcome;

    /// Run commands in order, stopping at the first failure.
    ///
    /// Returns the failing outcome without invoking the rest, or the last
    /// outcome if every command succeeded. An empty chain succeeds.
    async fn run_chain(&self, commands: &[CommandSpec], options: &RunOptions) -> StepOutcome {
        let mut last = StepOutcome::success("", "");
        for command in commands {
            last = self.run(command, options).await;
            if !last.succeeded() {
                tracing::warn!(command = %command, "Command chain stopped at failing command");
                return last;
            }
        }
        last
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::FailureKind;
    use std::sync::{Arc, Mutex};

    /// Scripted response for a matching command
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0 with this output
        Succeed(String),
        /// Non-zero exit with this output
        Fail { exit_code: i32, output: String },
        Timeout,
        /// Panic inside `run` (for fault isolation testing)
        Panic(String),
    }

    /// Mock Command Runner for testing
    ///
    /// Records every invocation. The first rule whose needle occurs in the
    /// command line decides the response; unmatched commands succeed with
    /// empty output.
    #[derive(Clone, Default)]
    pub struct MockCommandRunner {
        rules: Arc<Mutex<Vec<(String, MockBehavior)>>>,
        calls: Arc<Mutex<Vec<CommandSpec>>>,
    }

    impl MockCommandRunner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Respond with `behavior` to commands whose command line contains `needle`
        pub fn on(self, needle: impl Into<String>, behavior: MockBehavior) -> Self {
            self.rules.lock().unwrap().push((needle.into(), behavior));
            self
        }

        /// Add a rule that takes precedence over the existing ones
        pub fn prepend(&self, needle: impl Into<String>, behavior: MockBehavior) {
            self.rules.lock().unwrap().insert(0, (needle.into(), behavior));
        }

        pub fn calls(&self) -> Vec<CommandSpec> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        /// Number of invocations whose command line contains `needle`
        pub fn count_matching(&self, needle: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|c| c.command_line().contains(needle))
                .count()
        }

        fn behavior_for(&self, command: &CommandSpec) -> Option<MockBehavior> {
            let line = command.command_line();
            self.rules
                .lock()
                .unwrap()
                .iter()
                .find(|(needle, _)| line.contains(needle.as_str()))
                .map(|(_, behavior)| behavior.clone())
        }
    }

    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn run(&self, command: &CommandSpec, options: &RunOptions) -> StepOutcome {
            self.calls.lock().unwrap().push(command.clone());
            let label = command.command_line();

            match self.behavior_for(command) {
                None => StepOutcome::success(label, "").with_exit_code(0),
                Some(MockBehavior::Succeed(output)) => {
                    StepOutcome::success(label, output).with_exit_code(0)
                }
                Some(MockBehavior::Fail { exit_code, output }) => {
                    if options.check {
                        StepOutcome::failure(label, FailureKind::Execution, output)
                            .with_exit_code(exit_code)
                    } else {
                        StepOutcome::success(label, output).with_exit_code(exit_code)
                    }
                }
                Some(MockBehavior::Timeout) => {
                    StepOutcome::failure(label, FailureKind::Timeout, "Command timed out")
                }
                Some(MockBehavior::Panic(message)) => {
                    panic!("{}", message);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::{MockBehavior, MockCommandRunner};
    use super::*;
    use crate::domain::FailureKind;

    #[test]
    fn test_argv_and_command_line() {
        let cmd = CommandSpec::argv(&["netsh", "interface", "show", "interface"]);
        assert_eq!(cmd.program(), "netsh");
        assert_eq!(cmd.arguments().len(), 3);
        assert_eq!(cmd.command_line(), "netsh interface show interface");
        assert_eq!(CommandSpec::argv(&[]).program(), "");
    }

    #[tokio::test]
    async fn test_chain_short_circuits_on_failure() {
        let runner = MockCommandRunner::new().on(
            "second",
            MockBehavior::Fail {
                exit_code: 5,
                output: "second broke".into(),
            },
        );
        let chain = [
            CommandSpec::argv(&["first"]),
            CommandSpec::argv(&["second"]),
            CommandSpec::argv(&["third"]),
        ];

        let outcome = runner.run_chain(&chain, &RunOptions::default()).await;

        assert!(!outcome.succeeded());
        assert_eq!(outcome.failure_kind(), Some(FailureKind::Execution));
        assert_eq!(outcome.exit_code(), 5);
        assert_eq!(outcome.output(), "second broke");
        assert_eq!(outcome.label(), "second");
        assert_eq!(runner.call_count(), 2);
        assert_eq!(runner.count_matching("third"), 0);
    }

    #[tokio::test]
    async fn test_chain_returns_last_outcome_when_all_succeed() {
        let runner = MockCommandRunner::new()
            .on("release", MockBehavior::Succeed("released".into()))
            .on("renew", MockBehavior::Succeed("renewed".into()));
        let chain = [
            CommandSpec::argv(&["ipconfig", "/release"]),
            CommandSpec::argv(&["ipconfig", "/renew"]),
        ];

        let outcome = runner.run_chain(&chain, &RunOptions::default()).await;

        assert!(outcome.succeeded());
        assert_eq!(outcome.output(), "renewed");
        assert_eq!(runner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_chain_succeeds() {
        let runner = MockCommandRunner::new();
        let outcome = runner.run_chain(&[], &RunOptions::default()).await;
        assert!(outcome.succeeded());
        assert_eq!(runner.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unchecked_failure_reports_exit_code() {
        let runner = MockCommandRunner::new().on(
            "ping",
            MockBehavior::Fail {
                exit_code: 1,
                output: "Request timed out.".into(),
            },
        );
        let outcome = runner
            .run(
                &CommandSpec::argv(&["ping", "8.8.8.8"]),
                &RunOptions::unchecked(Duration::from_secs(1)),
            )
            .await;
        assert!(outcome.succeeded());
        assert_eq!(outcome.exit_code(), 1);
    }
}

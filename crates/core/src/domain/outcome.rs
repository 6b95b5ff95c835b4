// Outcome values: every expected failure is data, never an error crossing a boundary

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Why a step (or probe) did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Non-zero exit from an external command, or the command could not be spawned
    Execution,
    Timeout,
    /// Write to persisted configuration denied (operator must elevate)
    PermissionDenied,
    /// Adapter name rejected before it reached a command line
    Validation,
    Probe,
    /// A step action panicked and was caught at the step boundary
    Internal,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Execution => write!(f, "EXECUTION"),
            FailureKind::Timeout => write!(f, "TIMEOUT"),
            FailureKind::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            FailureKind::Validation => write!(f, "VALIDATION"),
            FailureKind::Probe => write!(f, "PROBE"),
            FailureKind::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Result of one remediation action or external command.
///
/// `failure` is `Some` exactly when `succeeded` is false. The only way to build
/// an outcome is through [`StepOutcome::success`] and [`StepOutcome::failure`],
/// so the pairing cannot drift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    succeeded: bool,
    label: String,
    output: String,
    failure: Option<FailureKind>,
    exit_code: i32,
    duration: Duration,
}

impl StepOutcome {
    pub fn success(label: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            label: label.into(),
            output: output.into(),
            failure: None,
            exit_code: 0,
            duration: Duration::ZERO,
        }
    }

    /// Failed outcome. Exit code defaults to -1 (no process exit observed).
    pub fn failure(label: impl Into<String>, kind: FailureKind, output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            label: label.into(),
            output: output.into(),
            failure: Some(kind),
            exit_code: -1,
            duration: Duration::ZERO,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn succeeded(&self) -> bool {
        self.succeeded
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.failure {
            None => write!(f, "✓ {}", self.label),
            Some(kind) => write!(f, "✗ {} ({})", self.label, kind),
        }
    }
}

/// Which connectivity probe a value or fault belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    PingPrimary,
    PingSecondary,
    Http,
}

impl ProbeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeKind::PingPrimary => "ping_primary",
            ProbeKind::PingSecondary => "ping_secondary",
            ProbeKind::Http => "http",
        }
    }
}

/// A probe that crashed instead of returning a value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeFault {
    pub probe: ProbeKind,
    pub kind: FailureKind,
    pub message: String,
}

/// Aggregated connectivity result.
///
/// Every field defaults to "unreachable"; a probe that faults keeps the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityOutcome {
    pub ping_primary: bool,
    pub ping_secondary: bool,
    pub http_reachable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faults: Vec<ProbeFault>,
}

impl ConnectivityOutcome {
    /// Primary ping and HTTP are authoritative; the secondary ping is advisory only.
    pub fn overall_ok(&self) -> bool {
        self.ping_primary && self.http_reachable
    }

    pub fn set(&mut self, probe: ProbeKind, reachable: bool) {
        match probe {
            ProbeKind::PingPrimary => self.ping_primary = reachable,
            ProbeKind::PingSecondary => self.ping_secondary = reachable,
            ProbeKind::Http => self.http_reachable = reachable,
        }
    }

    pub fn record_fault(&mut self, probe: ProbeKind, message: impl Into<String>) {
        self.set(probe, false);
        self.faults.push(ProbeFault {
            probe,
            kind: FailureKind::Probe,
            message: message.into(),
        });
    }
}

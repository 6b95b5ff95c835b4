// Pipeline run state and final report

use super::outcome::{ConnectivityOutcome, StepOutcome};
use super::step::PlanWarning;
use serde::{Deserialize, Serialize};

/// Run identifier (UUID v4)
pub type RunId = String;

/// Lifecycle of one pipeline run.
///
/// `Idle -> Running -> {Completed | Cancelled | FailedButCompleted}`.
/// `FailedButCompleted` is a terminal success state: every step ran, some of
/// them reported failure. Per-step failure is data, not a pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Idle,
    Running,
    Completed,
    Cancelled,
    FailedButCompleted,
}

impl PipelineState {
    /// Terminal state for a run that planned `planned` steps and collected `outcomes`
    pub fn settle(planned: usize, outcomes: &[StepOutcome]) -> Self {
        if outcomes.len() < planned {
            PipelineState::Cancelled
        } else if outcomes.iter().any(|o| !o.succeeded()) {
            PipelineState::FailedButCompleted
        } else {
            PipelineState::Completed
        }
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => write!(f, "IDLE"),
            PipelineState::Running => write!(f, "RUNNING"),
            PipelineState::Completed => write!(f, "COMPLETED"),
            PipelineState::Cancelled => write!(f, "CANCELLED"),
            PipelineState::FailedButCompleted => write!(f, "FAILED_BUT_COMPLETED"),
        }
    }
}

/// Everything one run produced, in pipeline order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineReport {
    pub run_id: RunId,
    pub state: PipelineState,
    pub outcomes: Vec<StepOutcome>,
    pub connectivity: Option<ConnectivityOutcome>,
    pub warnings: Vec<PlanWarning>,
}

impl PipelineReport {
    pub fn failed_steps(&self) -> impl Iterator<Item = &StepOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }
}

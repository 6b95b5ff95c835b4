// Run Observer Port
// Progress sink for a pipeline run. Implementations must not block: the worker
// calls these between steps, the observer renders them on its own context.

use crate::domain::{
    ConnectivityOutcome, PipelineReport, PlanWarning, ProxyConfiguration, StepId, StepOutcome,
};

/// Receives run events in pipeline order
pub trait RunObserver: Send + Sync {
    fn on_proxy_status(&self, _config: &ProxyConfiguration) {}

    fn on_warning(&self, _warning: &PlanWarning) {}

    /// `index` is 1-based; `total` includes the final diagnostics step
    fn on_step_started(&self, _index: usize, _total: usize, _step: StepId) {}

    fn on_step_finished(&self, _step: StepId, _outcome: &StepOutcome) {}

    fn on_diagnostics_started(&self, _index: usize, _total: usize) {}

    fn on_connectivity(&self, _outcome: &ConnectivityOutcome) {}

    fn on_finished(&self, _report: &PipelineReport) {}
}

/// Observer that ignores everything
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::PipelineState;
    use std::sync::{Arc, Mutex};

    /// Flattened run event, for asserting on ordering
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum ObservedEvent {
        ProxyStatus(ProxyConfiguration),
        Warning(PlanWarning),
        StepStarted { index: usize, total: usize, step: StepId },
        StepFinished { step: StepId, succeeded: bool },
        DiagnosticsStarted { index: usize, total: usize },
        Connectivity(ConnectivityOutcome),
        Finished(PipelineState),
    }

    /// Records every event it receives
    #[derive(Clone, Default)]
    pub struct RecordingObserver {
        events: Arc<Mutex<Vec<ObservedEvent>>>,
    }

    impl RecordingObserver {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<ObservedEvent> {
            self.events.lock().unwrap().clone()
        }

        fn push(&self, event: ObservedEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    impl RunObserver for RecordingObserver {
        fn on_proxy_status(&self, config: &ProxyConfiguration) {
            self.push(ObservedEvent::ProxyStatus(config.clone()));
        }

        fn on_warning(&self, warning: &PlanWarning) {
            self.push(ObservedEvent::Warning(warning.clone()));
        }

        fn on_step_started(&self, index: usize, total: usize, step: StepId) {
            self.push(ObservedEvent::StepStarted { index, total, step });
        }

        fn on_step_finished(&self, step: StepId, outcome: &StepOutcome) {
            self.push(ObservedEvent::StepFinished {
                step,
                succeeded: outcome.succeeded(),
            });
        }

        fn on_diagnostics_started(&self, index: usize, total: usize) {
            self.push(ObservedEvent::DiagnosticsStarted { index, total });
        }

        fn on_connectivity(&self, outcome: &ConnectivityOutcome) {
            self.push(ObservedEvent::Connectivity(outcome.clone()));
        }

        fn on_finished(&self, report: &PipelineReport) {
            self.push(ObservedEvent::Finished(report.state));
        }
    }
}

// Remediation Orchestrator - plans and runs the fix pipeline
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

use super::actions;
use super::cancel::CancellationToken;
use super::panic_guard::{execute_guarded_async, PanicGuardResult};
use crate::domain::{
    AdapterName, ConnectivityOutcome, FailureKind, PipelineReport, PipelineState, PlanWarning,
    ProxyConfiguration, RemediationSettings, RunId, Selections, StepId, StepOutcome,
};
use crate::port::{
    AdapterDirectory, CommandRunner, ConnectivityProber, ProxySettingStore, RunObserver,
    RunOptions,
};

type StepAction = Box<dyn FnOnce() -> BoxFuture<'static, StepOutcome> + Send>;

/// One planned pipeline step: an identifier plus a deferred action
pub struct Step {
    id: StepId,
    action: StepAction,
}

impl Step {
    pub fn new<F, Fut>(id: StepId, action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = StepOutcome> + Send + 'static,
    {
        Self {
            id,
            action: Box::new(move || Box::pin(action())),
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("id", &self.id).finish()
    }
}

/// Output of planning: steps in pipeline order plus notices for the operator
#[derive(Debug, Default)]
pub struct StepPlan {
    pub steps: Vec<Step>,
    pub warnings: Vec<PlanWarning>,
}

impl StepPlan {
    pub fn ids(&self) -> Vec<StepId> {
        self.steps.iter().map(Step::id).collect()
    }
}

/// Drives the remediation pipeline
///
/// Holds every collaborator behind its port; nothing here touches the OS directly.
pub struct RemediationOrchestrator {
    runner: Arc<dyn CommandRunner>,
    proxy: Arc<dyn ProxySettingStore>,
    adapters: Arc<dyn AdapterDirectory>,
    prober: Arc<dyn ConnectivityProber>,
    settings: RemediationSettings,
}

impl RemediationOrchestrator {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        proxy: Arc<dyn ProxySettingStore>,
        adapters: Arc<dyn AdapterDirectory>,
        prober: Arc<dyn ConnectivityProber>,
        settings: RemediationSettings,
    ) -> Self {
        Self {
            runner,
            proxy,
            adapters,
            prober,
            settings,
        }
    }

    fn command_options(&self) -> RunOptions {
        RunOptions::checked(self.settings.command_timeout())
    }

    // ------------------------------------------------------------------
    // Individual actions
    // ------------------------------------------------------------------

    pub async fn proxy_status(&self) -> ProxyConfiguration {
        self.proxy.read().await
    }

    pub async fn disable_proxy(&self) -> StepOutcome {
        self.proxy.disable().await
    }

    pub async fn flush_dns(&self) -> StepOutcome {
        actions::flush_dns(self.runner.as_ref(), &self.command_options()).await
    }

    pub async fn reset_winsock(&self) -> StepOutcome {
        actions::reset_winsock(self.runner.as_ref(), &self.command_options()).await
    }

    pub async fn reset_ip(&self) -> StepOutcome {
        actions::reset_ip(self.runner.as_ref(), &self.command_options()).await
    }

    pub async fn reset_tcpip(&self) -> StepOutcome {
        actions::reset_tcpip(self.runner.as_ref(), &self.command_options()).await
    }

    pub async fn list_adapters(&self) -> Vec<AdapterName> {
        self.adapters.list().await
    }

    pub async fn refresh_adapters(&self, force: bool) -> Vec<AdapterName> {
        self.adapters.refresh(force).await
    }

    pub async fn restart_adapter(&self, name: &str) -> StepOutcome {
        actions::restart_adapter(self.runner.as_ref(), name, &self.command_options()).await
    }

    pub async fn test_connectivity(&self, parallel: bool) -> ConnectivityOutcome {
        self.prober.probe(parallel).await
    }

    // ------------------------------------------------------------------
    // Planning and execution
    // ------------------------------------------------------------------

    /// Turn operator selections into steps in fixed pipeline order
    pub fn build_steps(&self, selections: &Selections) -> StepPlan {
        let mut plan = StepPlan::default();

        for id in StepId::ALL {
            if !selections.is_selected(id) {
                continue;
            }
            match self.step_for(id, selections.adapter()) {
                Some(step) => plan.steps.push(step),
                None => plan.warnings.push(PlanWarning::AdapterNotSelected),
            }
        }

        if plan.steps.is_empty() {
            plan.warnings.push(PlanWarning::NothingSelected);
        }
        plan
    }

    /// None only for an adapter restart with no adapter chosen
    fn step_for(&self, id: StepId, adapter: Option<&str>) -> Option<Step> {
        let runner = Arc::clone(&self.runner);
        let options = self.command_options();
        let step = match id {
            StepId::DisableProxy => {
                let proxy = Arc::clone(&self.proxy);
                Step::new(id, move || async move { proxy.disable().await })
            }
            StepId::FlushDns => Step::new(id, move || async move {
                actions::flush_dns(runner.as_ref(), &options).await
            }),
            StepId::ResetWinsock => Step::new(id, move || async move {
                actions::reset_winsock(runner.as_ref(), &options).await
            }),
            StepId::ResetIp => Step::new(id, move || async move {
                actions::reset_ip(runner.as_ref(), &options).await
            }),
            StepId::ResetTcpip => Step::new(id, move || async move {
                actions::reset_tcpip(runner.as_ref(), &options).await
            }),
            StepId::RestartAdapter => {
                let name = adapter?.to_string();
                Step::new(id, move || async move {
                    actions::restart_adapter(runner.as_ref(), &name, &options).await
                })
            }
        };
        Some(step)
    }

    /// Run `steps` strictly in order
    ///
    /// `is_cancelled` is polled before every step; once it reports true the
    /// outcomes collected so far are returned. Steps already applied are not
    /// rolled back. A failing step does not stop the pipeline.
    pub async fn execute_steps<P, C>(
        &self,
        steps: Vec<Step>,
        on_progress: P,
        is_cancelled: C,
    ) -> Vec<StepOutcome>
    where
        P: FnMut(usize, usize, StepId),
        C: Fn() -> bool,
    {
        run_steps(steps, on_progress, |_, _| {}, is_cancelled).await
    }

    /// Full fix run: proxy status, planned steps, then connectivity diagnostics
    pub async fn run(
        &self,
        selections: &Selections,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> PipelineReport {
        let run_id: RunId = uuid::Uuid::new_v4().to_string();
        let span = info_span!("remediation_run", run_id = %run_id);
        self.run_pipeline(run_id, selections, observer, cancel)
            .instrument(span)
            .await
    }

    async fn run_pipeline(
        &self,
        run_id: RunId,
        selections: &Selections,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> PipelineReport {
        let proxy = self.proxy_status().await;
        info!(proxy = %proxy, "Current proxy configuration");
        observer.on_proxy_status(&proxy);

        let plan = self.build_steps(selections);
        for warning in &plan.warnings {
            warn!(warning = %warning, "Plan warning");
            observer.on_warning(warning);
        }

        if plan.steps.is_empty() {
            let report = PipelineReport {
                run_id,
                state: PipelineState::settle(0, &[]),
                outcomes: Vec::new(),
                connectivity: None,
                warnings: plan.warnings,
            };
            observer.on_finished(&report);
            return report;
        }

        let planned = plan.steps.len();
        // Diagnostics count as the final step in progress reporting
        let total = planned + 1;
        info!(steps = ?plan.ids(), "Starting remediation");

        let outcomes = run_steps(
            plan.steps,
            |index, _, step| observer.on_step_started(index, total, step),
            |step, outcome| observer.on_step_finished(step, outcome),
            || cancel.is_cancelled(),
        )
        .await;

        let state = PipelineState::settle(planned, &outcomes);
        if state == PipelineState::Cancelled {
            info!(completed = outcomes.len(), planned, "Run cancelled, diagnosing what was applied");
        }

        // Diagnostics always close a started run, cancelled or not
        observer.on_diagnostics_started(total, total);
        let diagnosed = self.prober.probe(self.settings.parallel_probes).await;
        observer.on_connectivity(&diagnosed);

        let report = PipelineReport {
            run_id,
            state,
            outcomes,
            connectivity: Some(diagnosed),
            warnings: plan.warnings,
        };
        info!(
            state = %report.state,
            failed = report.failed_steps().count(),
            "Remediation finished"
        );
        observer.on_finished(&report);
        report
    }

    /// Connectivity-only run
    pub async fn diagnose(&self, observer: &dyn RunObserver) -> ConnectivityOutcome {
        observer.on_diagnostics_started(1, 1);
        let outcome = self
            .prober
            .probe(self.settings.parallel_probes)
            .instrument(info_span!("diagnose"))
            .await;
        observer.on_connectivity(&outcome);
        outcome
    }
}

async fn run_steps<P, F, C>(
    steps: Vec<Step>,
    mut on_progress: P,
    mut on_outcome: F,
    is_cancelled: C,
) -> Vec<StepOutcome>
where
    P: FnMut(usize, usize, StepId),
    F: FnMut(StepId, &StepOutcome),
    C: Fn() -> bool,
{
    let total = steps.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, step) in steps.into_iter().enumerate() {
        if is_cancelled() {
            info!(completed = outcomes.len(), total, "Cancellation requested");
            break;
        }

        let id = step.id;
        on_progress(i + 1, total, id);
        info!(step = %id, index = i + 1, total, "Running step");

        let started = Instant::now();
        let outcome = match execute_guarded_async((step.action)()).await {
            PanicGuardResult::Success(outcome) => outcome,
            PanicGuardResult::Panicked(msg) => {
                StepOutcome::failure(id.as_str(), FailureKind::Internal, msg)
            }
        }
        .with_duration(started.elapsed());

        if outcome.succeeded() {
            info!(step = %id, duration_ms = outcome.duration().as_millis() as u64, "Step succeeded");
        } else {
            warn!(
                step = %id,
                failure = ?outcome.failure_kind(),
                exit_code = outcome.exit_code(),
                output = %outcome.output(),
                "Step failed"
            );
        }

        on_outcome(id, &outcome);
        outcomes.push(outcome);
    }

    outcomes
}

//! Worker/observer split end-to-end tests
//!
//! The pipeline runs on a spawned task and reports through a dispatch handle;
//! the test task owns the view state and pumps the dispatcher, the same way
//! the console front-end does.

use async_trait::async_trait;
use netfix_core::application::{
    cancellation_channel, dispatch_channel, CachingAdapterDirectory, CancelSource,
    CancellationToken, DispatchHandle, RemediationOrchestrator,
};
use netfix_core::domain::{
    ConnectivityOutcome, PipelineReport, PipelineState, ProxyConfiguration, RemediationSettings,
    Selections, StepId, StepOutcome,
};
use netfix_core::port::command_runner::mocks::MockCommandRunner;
use netfix_core::port::connectivity::mocks::MockConnectivityProber;
use netfix_core::port::proxy_store::mocks::MockProxyStore;
use netfix_core::port::time_provider::mocks::ManualTimeProvider;
use netfix_core::port::{CommandRunner, CommandSpec, RunObserver, RunOptions};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

const TICK: Duration = Duration::from_millis(5);

/// Holds any command containing `needle` until the gate is opened
struct GatedRunner {
    inner: MockCommandRunner,
    needle: &'static str,
    gate: Arc<Notify>,
}

#[async_trait]
impl CommandRunner for GatedRunner {
    async fn run(&self, command: &CommandSpec, options: &RunOptions) -> StepOutcome {
        if command.command_line().contains(self.needle) {
            self.gate.notified().await;
        }
        self.inner.run(command, options).await
    }
}

/// State owned by the draining task
#[derive(Default)]
struct View {
    started: Vec<(usize, usize, StepId)>,
    finished: Vec<StepId>,
    diagnostics: usize,
    final_state: Option<PipelineState>,
    /// Cancel once this step is seen finishing
    cancel_after: Option<(StepId, CancelSource, Arc<Notify>)>,
}

struct ForwardingObserver {
    handle: DispatchHandle<View>,
}

impl RunObserver for ForwardingObserver {
    fn on_step_started(&self, index: usize, total: usize, step: StepId) {
        self.handle.call(move |v| v.started.push((index, total, step)));
    }

    fn on_step_finished(&self, step: StepId, _outcome: &StepOutcome) {
        self.handle.call(move |v| {
            v.finished.push(step);
            if let Some((trigger, cancel, gate)) = &v.cancel_after {
                if *trigger == step {
                    cancel.cancel();
                    gate.notify_one();
                }
            }
        });
    }

    fn on_diagnostics_started(&self, _index: usize, _total: usize) {
        self.handle.call(|v| v.diagnostics += 1);
    }

    fn on_connectivity(&self, _outcome: &ConnectivityOutcome) {}

    fn on_finished(&self, report: &PipelineReport) {
        let state = report.state;
        self.handle.call(move |v| v.final_state = Some(state));
    }
}

fn orchestrator(
    runner: Arc<dyn CommandRunner>,
    prober: Arc<MockConnectivityProber>,
) -> Arc<RemediationOrchestrator> {
    let settings = RemediationSettings::default();
    let adapters = CachingAdapterDirectory::new(
        Arc::clone(&runner),
        Arc::new(ManualTimeProvider::new(0)),
        settings.adapter_cache_ttl(),
        settings.command_timeout(),
    );
    Arc::new(RemediationOrchestrator::new(
        runner,
        Arc::new(MockProxyStore::new(ProxyConfiguration::disabled())),
        Arc::new(adapters),
        prober,
        settings,
    ))
}

/// Events reach the view in order, on the draining task
#[tokio::test]
async fn test_run_events_drained_in_order() {
    let prober = Arc::new(MockConnectivityProber::all_reachable());
    let orchestrator = orchestrator(Arc::new(MockCommandRunner::new()), Arc::clone(&prober));
    let (dispatcher, handle) = dispatch_channel::<View>();

    let worker = tokio::spawn(async move {
        let observer = ForwardingObserver { handle };
        orchestrator
            .run(&Selections::recommended(), &observer, &CancellationToken::never())
            .await
    });

    let mut view = View::default();
    tokio::time::timeout(Duration::from_secs(5), dispatcher.pump_until_closed(&mut view, TICK))
        .await
        .expect("dispatcher should close once the worker is done");
    let report = worker.await.unwrap();

    assert_eq!(report.state, PipelineState::Completed);
    assert_eq!(
        view.started,
        vec![
            (1, 5, StepId::DisableProxy),
            (2, 5, StepId::FlushDns),
            (3, 5, StepId::ResetWinsock),
            (4, 5, StepId::ResetIp),
        ]
    );
    assert_eq!(view.finished.len(), 4);
    assert_eq!(view.diagnostics, 1);
    assert_eq!(view.final_state, Some(PipelineState::Completed));
    assert_eq!(prober.call_count(), 1);
}

/// Cancel requested by the observer mid-run: the running step finishes,
/// nothing after it starts, diagnostics still close the run
#[tokio::test]
async fn test_cancel_from_observer_stops_before_next_step() {
    let gate = Arc::new(Notify::new());
    let inner = MockCommandRunner::new();
    let runner = Arc::new(GatedRunner {
        inner: inner.clone(),
        needle: "winsock",
        gate: Arc::clone(&gate),
    });
    let prober = Arc::new(MockConnectivityProber::all_reachable());
    let orchestrator = orchestrator(runner, Arc::clone(&prober));

    let (cancel, token) = cancellation_channel();
    let (dispatcher, handle) = dispatch_channel::<View>();
    let selections = Selections::only(
        &[
            StepId::FlushDns,
            StepId::ResetWinsock,
            StepId::ResetIp,
            StepId::ResetTcpip,
        ],
        None,
    );

    let worker = tokio::spawn(async move {
        let observer = ForwardingObserver { handle };
        orchestrator.run(&selections, &observer, &token).await
    });

    let mut view = View {
        cancel_after: Some((StepId::FlushDns, cancel, gate)),
        ..View::default()
    };
    tokio::time::timeout(Duration::from_secs(5), dispatcher.pump_until_closed(&mut view, TICK))
        .await
        .expect("run should finish after cancellation");
    let report = worker.await.unwrap();

    assert_eq!(report.state, PipelineState::Cancelled);
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.outcomes[1].label(), "reset-winsock");
    assert!(report.connectivity.is_some());

    assert_eq!(view.finished, vec![StepId::FlushDns, StepId::ResetWinsock]);
    assert_eq!(view.diagnostics, 1);
    assert_eq!(view.final_state, Some(PipelineState::Cancelled));
    assert_eq!(prober.call_count(), 1);
    assert_eq!(inner.count_matching("ipconfig /release"), 0);
    assert_eq!(inner.count_matching("int ip reset"), 0);
    println!("✅ cancellation honoured between steps");
}

/// Many producer threads: every callback runs once, per-producer order kept
#[tokio::test]
async fn test_many_producers_single_consumer() {
    const PRODUCERS: usize = 8;
    const PER_PRODUCER: usize = 1000;

    let (dispatcher, handle) = dispatch_channel::<Vec<(usize, usize)>>();

    let threads: Vec<_> = (0..PRODUCERS)
        .map(|producer| {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for seq in 0..PER_PRODUCER {
                    assert!(handle.call(move |seen| seen.push((producer, seq))));
                }
            })
        })
        .collect();
    drop(handle);

    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(10), dispatcher.pump_until_closed(&mut seen, TICK))
        .await
        .expect("dispatcher should close once every producer is gone");
    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(seen.len(), PRODUCERS * PER_PRODUCER);
    for producer in 0..PRODUCERS {
        let order: Vec<usize> = seen
            .iter()
            .filter(|(p, _)| *p == producer)
            .map(|(_, seq)| *seq)
            .collect();
        assert_eq!(order, (0..PER_PRODUCER).collect::<Vec<_>>());
    }
}

// Connectivity probing: two pings and one HTTP check on a small task pool
use async_trait::async_trait;
use futures::future::{join_all, BoxFuture};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::constants::{
    HTTP_OK_RANGE, HTTP_PROBE_URL, PING_PROCESS_GRACE, PRIMARY_PING_TARGET, PROBE_POOL_SLOTS,
    SECONDARY_PING_TARGET,
};
use super::panic_guard::{execute_guarded_async, PanicGuardResult};
use crate::domain::{ConnectivityOutcome, ProbeKind, RemediationSettings};
use crate::port::{CommandRunner, CommandSpec, ConnectivityProber, HttpChecker, RunOptions};

const PROBES: [ProbeKind; PROBE_POOL_SLOTS] = [
    ProbeKind::PingPrimary,
    ProbeKind::PingSecondary,
    ProbeKind::Http,
];

/// Single-reply ping with the platform's flag dialect
pub fn ping_command(target: &str, timeout: Duration) -> CommandSpec {
    if cfg!(windows) {
        CommandSpec::argv(&["ping", "-n", "1", "-w"])
            .arg(timeout.as_millis().to_string())
            .arg(target)
    } else {
        // iputils takes whole seconds
        let secs = timeout.as_millis().div_ceil(1000).max(1);
        CommandSpec::argv(&["ping", "-c", "1", "-W"])
            .arg(secs.to_string())
            .arg(target)
    }
}

pub struct ConnectivityService {
    runner: Arc<dyn CommandRunner>,
    http: Arc<dyn HttpChecker>,
    ping_timeout: Duration,
    http_timeout: Duration,
}

impl ConnectivityService {
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpChecker>,
        ping_timeout: Duration,
        http_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            http,
            ping_timeout,
            http_timeout,
        }
    }

    pub fn from_settings(
        runner: Arc<dyn CommandRunner>,
        http: Arc<dyn HttpChecker>,
        settings: &RemediationSettings,
    ) -> Self {
        Self::new(runner, http, settings.ping_timeout(), settings.http_timeout())
    }

    /// Owned future for one probe, so it can run on its own task
    fn probe_task(&self, probe: ProbeKind) -> BoxFuture<'static, bool> {
        match probe {
            ProbeKind::PingPrimary => self.ping_task(PRIMARY_PING_TARGET),
            ProbeKind::PingSecondary => self.ping_task(SECONDARY_PING_TARGET),
            ProbeKind::Http => {
                let http = Arc::clone(&self.http);
                let timeout = self.http_timeout;
                Box::pin(async move {
                    match http.get_status(HTTP_PROBE_URL, timeout).await {
                        Ok(status) => {
                            debug!(status, url = HTTP_PROBE_URL, "HTTP probe answered");
                            HTTP_OK_RANGE.contains(&status)
                        }
                        Err(e) => {
                            debug!(error = %e, url = HTTP_PROBE_URL, "HTTP probe failed");
                            false
                        }
                    }
                })
            }
        }
    }

    fn ping_task(&self, target: &'static str) -> BoxFuture<'static, bool> {
        let runner = Arc::clone(&self.runner);
        let command = ping_command(target, self.ping_timeout);
        let options = RunOptions::unchecked(self.ping_timeout + PING_PROCESS_GRACE);
        Box::pin(async move {
            let outcome = runner.run(&command, &options).await;
            let reachable = outcome.failure_kind().is_none() && outcome.exit_code() == 0;
            debug!(target, reachable, exit_code = outcome.exit_code(), "Ping finished");
            reachable
        })
    }

    fn record(outcome: &mut ConnectivityOutcome, probe: ProbeKind, result: PanicGuardResult<bool>) {
        match result {
            PanicGuardResult::Success(reachable) => outcome.set(probe, reachable),
            PanicGuardResult::Panicked(msg) => {
                error!(probe = probe.as_str(), panic_msg = %msg, "Probe crashed");
                outcome.record_fault(probe, msg);
            }
        }
    }
}

#[async_trait]
impl ConnectivityProber for ConnectivityService {
    async fn probe(&self, parallel: bool) -> ConnectivityOutcome {
        let mut outcome = ConnectivityOutcome::default();

        if parallel {
            let results = join_all(
                PROBES
                    .iter()
                    .map(|&probe| execute_guarded_async(self.probe_task(probe))),
            )
            .await;
            for (&probe, result) in PROBES.iter().zip(results) {
                Self::record(&mut outcome, probe, result);
            }
        } else {
            for probe in PROBES {
                let result = execute_guarded_async(self.probe_task(probe)).await;
                Self::record(&mut outcome, probe, result);
            }
        }

        info!(
            ping_primary = outcome.ping_primary,
            ping_secondary = outcome.ping_secondary,
            http = outcome.http_reachable,
            overall_ok = outcome.overall_ok(),
            "Connectivity probe finished"
        );
        outcome
    }
}

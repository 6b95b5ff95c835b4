// Remediation actions
//
// Each action is a fixed command (or chain) run through the CommandRunner.
// Outcomes are relabelled with the step id so reports read the same no
// matter which command in a chain produced them.

use super::constants::{FLUSH_DNS, RELEASE_IP, RENEW_IP, RESET_TCPIP, RESET_WINSOCK};
use crate::domain::{validate_adapter_name, FailureKind, StepId, StepOutcome};
use crate::port::{CommandRunner, CommandSpec, RunOptions};
use tracing::{info, warn};

pub async fn flush_dns(runner: &dyn CommandRunner, options: &RunOptions) -> StepOutcome {
    single(runner, StepId::FlushDns, &FLUSH_DNS, options).await
}

pub async fn reset_winsock(runner: &dyn CommandRunner, options: &RunOptions) -> StepOutcome {
    single(runner, StepId::ResetWinsock, &RESET_WINSOCK, options).await
}

pub async fn reset_tcpip(runner: &dyn CommandRunner, options: &RunOptions) -> StepOutcome {
    single(runner, StepId::ResetTcpip, &RESET_TCPIP, options).await
}

/// `ipconfig /release` then `ipconfig /renew`; renew is skipped if release fails
pub async fn reset_ip(runner: &dyn CommandRunner, options: &RunOptions) -> StepOutcome {
    let chain = [CommandSpec::argv(&RELEASE_IP), CommandSpec::argv(&RENEW_IP)];
    runner
        .run_chain(&chain, options)
        .await
        .with_label(StepId::ResetIp.as_str())
}

/// Disable then re-enable one adapter
///
/// The name is validated before anything runs; a rejected name yields a
/// `Validation` failure and no command is spawned.
pub async fn restart_adapter(
    runner: &dyn CommandRunner,
    name: &str,
    options: &RunOptions,
) -> StepOutcome {
    let label = StepId::RestartAdapter.as_str();
    if !validate_adapter_name(name) {
        warn!(adapter = ?name, "Rejected adapter name");
        return StepOutcome::failure(
            label,
            FailureKind::Validation,
            format!("Invalid adapter name: {:?}", name),
        );
    }

    info!(adapter = %name, "Restarting adapter");
    let chain = [
        set_interface_state(name, "disabled"),
        set_interface_state(name, "enabled"),
    ];
    runner.run_chain(&chain, options).await.with_label(label)
}

/// `netsh interface set interface <name> admin=<state>`
pub fn set_interface_state(name: &str, state: &str) -> CommandSpec {
    CommandSpec::argv(&["netsh", "interface", "set", "interface"])
        .arg(name)
        .arg(format!("admin={}", state))
}

async fn single(
    runner: &dyn CommandRunner,
    step: StepId,
    argv: &[&str],
    options: &RunOptions,
) -> StepOutcome {
    runner
        .run(&CommandSpec::argv(argv), options)
        .await
        .with_label(step.as_str())
}

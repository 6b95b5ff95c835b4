//! netfix - one-click network remediation from the command line

mod console;
mod logging;
mod settings;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use netfix_core::application::{
    cancellation_channel, dispatch_channel, CachingAdapterDirectory, ConnectivityService,
    RemediationOrchestrator,
};
use netfix_core::domain::{PipelineReport, PipelineState, Selections, StepId};
use netfix_core::port::time_provider::SystemTimeProvider;
use netfix_core::port::{CommandRunner, ProxySettingStore};
use netfix_infra_system::{ReqwestHttpChecker, SubprocessRunner};

use console::{Badge, ConsoleView, DispatchingObserver};
use settings::AppConfig;

/// Exit status for a run stopped by Ctrl+C
const EXIT_CANCELLED: u8 = 130;

/// Exit status when the final connectivity test still fails
const EXIT_OFFLINE: u8 = 2;

#[derive(Parser)]
#[command(name = "netfix")]
#[command(about = "Repair common Windows network faults and verify connectivity", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); defaults to the per-user netfix.toml
    #[arg(long, global = true, env = "NETFIX_CONFIG")]
    config: Option<PathBuf>,

    /// Increase console log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the remediation pipeline, then test connectivity
    Fix(FixArgs),

    /// Test connectivity only
    Test {
        /// Run probes one after another
        #[arg(long)]
        sequential: bool,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List network adapters
    Adapters {
        #[arg(long)]
        json: bool,
    },

    /// Show (or disable) the per-user proxy
    Proxy {
        #[arg(long)]
        disable: bool,
    },
}

#[derive(Args)]
struct FixArgs {
    /// Steps to run (comma separated); defaults to the recommended set
    #[arg(long, value_delimiter = ',', value_parser = parse_step)]
    steps: Vec<StepId>,

    /// Run every step (adapter restart still needs --adapter)
    #[arg(long, conflicts_with = "steps")]
    all: bool,

    /// Adapter to restart; implies the restart-adapter step
    #[arg(long)]
    adapter: Option<String>,

    /// Run connectivity probes one after another
    #[arg(long)]
    sequential: bool,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn parse_step(raw: &str) -> std::result::Result<StepId, String> {
    raw.trim().parse()
}

impl FixArgs {
    fn selections(&self) -> Selections {
        let mut selections = if self.all {
            Selections::only(&StepId::ALL, None)
        } else if self.steps.is_empty() {
            Selections::recommended()
        } else {
            Selections::only(&self.steps, None)
        };
        if let Some(name) = &self.adapter {
            selections.adapter_name = Some(name.clone());
            selections.set(StepId::RestartAdapter, true);
        }
        selections
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 1. Load configuration
    let mut config = AppConfig::load(cli.config.as_deref())?;

    // 2. Initialize logging (guard flushes the file log on exit)
    let _log_guard = logging::init(&config.log, cli.verbose)?;
    info!(version = netfix_core::VERSION, "netfix starting");

    // 3. Wire dependencies
    match &cli.command {
        Commands::Fix(args) if args.sequential => config.engine.parallel_probes = false,
        Commands::Test { sequential: true, .. } => config.engine.parallel_probes = false,
        _ => {}
    }
    let orchestrator = Arc::new(build_orchestrator(&config)?);
    let tick = config.dispatch_tick();

    // 4. Dispatch
    match cli.command {
        Commands::Fix(args) => run_fix(orchestrator, &args, tick).await,
        Commands::Test { json, .. } => run_test(orchestrator, json, tick).await,
        Commands::Adapters { json } => {
            // Each process starts with an empty cache, so this always queries netsh
            let adapters = orchestrator.refresh_adapters(false).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&adapters)?);
            } else if adapters.is_empty() {
                println!("{}", "No adapters found".yellow());
            } else {
                println!("{}", "Network adapters".cyan().bold());
                for name in &adapters {
                    println!("  {}", name);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Proxy { disable } => {
            let current = orchestrator.proxy_status().await;
            println!("Current {}", current);
            if !disable {
                return Ok(ExitCode::SUCCESS);
            }
            let outcome = orchestrator.disable_proxy().await;
            if outcome.succeeded() {
                println!("{}", "✓ Proxy disabled".green().bold());
                Ok(ExitCode::SUCCESS)
            } else {
                println!("{} {}", "✗ Failed to disable proxy:".red().bold(), outcome.output());
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn build_orchestrator(config: &AppConfig) -> Result<RemediationOrchestrator> {
    let engine = &config.engine;
    let runner: Arc<dyn CommandRunner> = Arc::new(SubprocessRunner::new());
    let proxy = proxy_store(Arc::clone(&runner), engine.command_timeout())?;
    let adapters = Arc::new(CachingAdapterDirectory::new(
        Arc::clone(&runner),
        Arc::new(SystemTimeProvider),
        engine.adapter_cache_ttl(),
        engine.command_timeout(),
    ));
    let http = Arc::new(ReqwestHttpChecker::new().context("Failed to build HTTP client")?);
    let prober = Arc::new(ConnectivityService::from_settings(
        Arc::clone(&runner),
        http,
        engine,
    ));

    Ok(RemediationOrchestrator::new(
        runner,
        proxy,
        adapters,
        prober,
        engine.clone(),
    ))
}

#[cfg(windows)]
fn proxy_store(
    runner: Arc<dyn CommandRunner>,
    timeout: Duration,
) -> Result<Arc<dyn ProxySettingStore>> {
    Ok(Arc::new(netfix_infra_system::RegistryProxyStore::new(
        runner, timeout,
    )))
}

#[cfg(not(windows))]
fn proxy_store(
    _runner: Arc<dyn CommandRunner>,
    _timeout: Duration,
) -> Result<Arc<dyn ProxySettingStore>> {
    let path = netfix_infra_system::FileProxyStore::default_location()
        .context("Cannot determine the per-user config directory for proxy.json")?;
    Ok(Arc::new(netfix_infra_system::FileProxyStore::new(path)))
}

/// Run `work` on a worker task while this task renders its events
///
/// Returns once the worker has finished and every queued event is drawn.
async fn observed<T, Fut>(
    quiet: bool,
    tick: Duration,
    work: impl FnOnce(DispatchingObserver) -> Fut,
) -> Result<(T, ConsoleView)>
where
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (dispatcher, handle) = dispatch_channel::<ConsoleView>();
    let worker = tokio::spawn(work(DispatchingObserver::new(handle)));

    let mut view = ConsoleView::new(quiet);
    dispatcher.pump_until_closed(&mut view, tick).await;

    let value = worker.await.context("Worker task crashed")?;
    Ok((value, view))
}

async fn run_fix(
    orchestrator: Arc<RemediationOrchestrator>,
    args: &FixArgs,
    tick: Duration,
) -> Result<ExitCode> {
    let selections = args.selections();
    let (cancel, token) = cancellation_channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl+C received, stopping after the current step");
            cancel.cancel();
        }
    });

    let (report, view) = observed(args.json, tick, move |observer| async move {
        let notice = observer.watch_cancellation(token.clone());
        let report = orchestrator.run(&selections, &observer, &token).await;
        notice.abort();
        report
    })
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if !report.outcomes.is_empty() {
        println!();
        println!("{}", console::summary_table(&report));
        if view.badge() == Badge::Cancelled {
            println!(
                "{}",
                format!("Stopped after {} step(s).", view.finished_steps()).yellow()
            );
        }
        if view.failed_steps() > 0 {
            println!(
                "{}",
                "Some steps failed; try running from an elevated prompt.".yellow()
            );
        }
    }

    Ok(ExitCode::from(exit_status(&report)))
}

async fn run_test(
    orchestrator: Arc<RemediationOrchestrator>,
    json: bool,
    tick: Duration,
) -> Result<ExitCode> {
    let (outcome, _view) = observed(json, tick, move |observer| async move {
        orchestrator.diagnose(&observer).await
    })
    .await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    }
    Ok(if outcome.overall_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_OFFLINE)
    })
}

/// 0 clean, 1 step failures, 2 still offline, 130 cancelled
fn exit_status(report: &PipelineReport) -> u8 {
    match report.state {
        PipelineState::Cancelled => EXIT_CANCELLED,
        PipelineState::FailedButCompleted => 1,
        _ => match &report.connectivity {
            Some(c) if !c.overall_ok() => EXIT_OFFLINE,
            _ => 0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_args(argv: &[&str]) -> FixArgs {
        let mut full = vec!["netfix", "fix"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Fix(args) => args,
            _ => panic!("expected fix"),
        }
    }

    #[test]
    fn test_default_fix_is_recommended_set() {
        assert_eq!(fix_args(&[]).selections(), Selections::recommended());
    }

    #[test]
    fn test_steps_flag_selects_exactly() {
        let selections = fix_args(&["--steps", "flush-dns,reset-tcpip"]).selections();
        assert_eq!(
            selections,
            Selections::only(&[StepId::FlushDns, StepId::ResetTcpip], None)
        );
    }

    #[test]
    fn test_adapter_implies_restart() {
        let selections = fix_args(&["--steps", "flush-dns", "--adapter", "Wi-Fi"]).selections();
        assert!(selections.restart_adapter);
        assert_eq!(selections.adapter(), Some("Wi-Fi"));
    }

    #[test]
    fn test_unknown_step_is_rejected() {
        assert!(Cli::try_parse_from(["netfix", "fix", "--steps", "reboot"]).is_err());
    }

    #[test]
    fn test_all_conflicts_with_steps() {
        assert!(Cli::try_parse_from(["netfix", "fix", "--all", "--steps", "flush-dns"]).is_err());
    }

    #[test]
    fn test_adapters_takes_only_json() {
        assert!(Cli::try_parse_from(["netfix", "adapters", "--json"]).is_ok());
        assert!(Cli::try_parse_from(["netfix", "adapters", "--refresh"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let report = |state| PipelineReport {
            run_id: "r".into(),
            state,
            outcomes: vec![],
            connectivity: None,
            warnings: vec![],
        };
        assert_eq!(exit_status(&report(PipelineState::Cancelled)), EXIT_CANCELLED);
        assert_eq!(exit_status(&report(PipelineState::FailedButCompleted)), 1);
        assert_eq!(exit_status(&report(PipelineState::Completed)), 0);

        let mut offline = report(PipelineState::Completed);
        offline.connectivity = Some(netfix_core::domain::ConnectivityOutcome::default());
        assert_eq!(exit_status(&offline), EXIT_OFFLINE);
    }
}

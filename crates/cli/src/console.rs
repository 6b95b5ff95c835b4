// Console rendering of run events
//
// The worker task only enqueues callbacks through `DispatchingObserver`; the
// main task owns `ConsoleView` and applies them on each dispatcher tick.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use netfix_core::application::{CancellationToken, DispatchHandle};
use netfix_core::application::constants::{PRIMARY_PING_TARGET, SECONDARY_PING_TARGET};
use netfix_core::domain::{
    ConnectivityOutcome, PipelineReport, PipelineState, PlanWarning, ProxyConfiguration, StepId,
    StepOutcome,
};
use netfix_core::port::RunObserver;

/// Longest output excerpt shown in the summary table
const DETAIL_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Badge {
    Ready,
    Running,
    Testing,
    Done,
    Cancelled,
    Error,
}

impl Badge {
    fn render(&self) -> String {
        match self {
            Badge::Ready => "[ready]".dimmed().to_string(),
            Badge::Running => "[running]".cyan().bold().to_string(),
            Badge::Testing => "[testing]".blue().bold().to_string(),
            Badge::Done => "[done]".green().bold().to_string(),
            Badge::Cancelled => "[cancelled]".yellow().bold().to_string(),
            Badge::Error => "[error]".red().bold().to_string(),
        }
    }
}

/// Observer-side state; only the draining task touches it
pub struct ConsoleView {
    quiet: bool,
    badge: Badge,
    finished_steps: usize,
    failed_steps: usize,
    cancel_requested: bool,
}

impl ConsoleView {
    /// `quiet` suppresses progress lines (used for `--json`)
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            badge: Badge::Ready,
            finished_steps: 0,
            failed_steps: 0,
            cancel_requested: false,
        }
    }

    pub fn badge(&self) -> Badge {
        self.badge
    }

    pub fn finished_steps(&self) -> usize {
        self.finished_steps
    }

    pub fn failed_steps(&self) -> usize {
        self.failed_steps
    }

    fn print(&self, line: String) {
        if !self.quiet {
            println!("{} {}", self.badge.render(), line);
        }
    }

    fn proxy_status(&mut self, config: &ProxyConfiguration) {
        self.print(format!("Current {}", config));
    }

    fn warning(&mut self, warning: &PlanWarning) {
        self.print(format!("{} {}", "warning:".yellow().bold(), warning));
    }

    fn step_started(&mut self, index: usize, total: usize, step: StepId) {
        self.badge = Badge::Running;
        self.print(progress_line(index, total, step.describe()));
    }

    fn step_finished(&mut self, step: StepId, outcome: &StepOutcome) {
        self.finished_steps += 1;
        if outcome.succeeded() {
            self.print(format!("{} {}", "✓".green(), step.describe()));
        } else {
            self.failed_steps += 1;
            let kind = outcome
                .failure_kind()
                .map(|k| k.to_string())
                .unwrap_or_default();
            self.print(format!("{} {} ({})", "✗".red(), step.describe(), kind));
            if !outcome.output().is_empty() {
                self.print(format!("    {}", outcome.output().dimmed()));
            }
        }
    }

    fn cancel_requested(&mut self) {
        self.cancel_requested = true;
        self.print(
            "Cancelling: the current step will finish, nothing after it starts"
                .yellow()
                .to_string(),
        );
    }

    fn diagnostics_started(&mut self, index: usize, total: usize) {
        self.badge = Badge::Testing;
        self.print(progress_line(index, total, "Test connectivity"));
    }

    fn connectivity(&mut self, outcome: &ConnectivityOutcome) {
        for line in connectivity_lines(outcome) {
            self.print(line);
        }
    }

    fn finished(&mut self, report: &PipelineReport) {
        self.badge = match report.state {
            PipelineState::Cancelled => Badge::Cancelled,
            PipelineState::FailedButCompleted => Badge::Error,
            _ => Badge::Done,
        };
        self.print(format!("Run finished: {}", report.state));
    }
}

/// Forwards every run event to the console through the dispatcher
pub struct DispatchingObserver {
    handle: DispatchHandle<ConsoleView>,
}

impl DispatchingObserver {
    pub fn new(handle: DispatchHandle<ConsoleView>) -> Self {
        Self { handle }
    }

    /// Show the cancel request as soon as it is made, not when the step ends
    ///
    /// Abort the returned task once the run is over so the dispatcher can close.
    pub fn watch_cancellation(
        &self,
        mut token: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let handle = self.handle.clone();
        tokio::spawn(async move {
            token.cancelled().await;
            handle.call(ConsoleView::cancel_requested);
        })
    }

    fn send<F>(&self, f: F)
    where
        F: FnOnce(&mut ConsoleView) + Send + 'static,
    {
        if !self.handle.call(f) {
            tracing::debug!("Console is gone, dropping run event");
        }
    }
}

impl RunObserver for DispatchingObserver {
    fn on_proxy_status(&self, config: &ProxyConfiguration) {
        let config = config.clone();
        self.send(move |view| view.proxy_status(&config));
    }

    fn on_warning(&self, warning: &PlanWarning) {
        let warning = warning.clone();
        self.send(move |view| view.warning(&warning));
    }

    fn on_step_started(&self, index: usize, total: usize, step: StepId) {
        self.send(move |view| view.step_started(index, total, step));
    }

    fn on_step_finished(&self, step: StepId, outcome: &StepOutcome) {
        let outcome = outcome.clone();
        self.send(move |view| view.step_finished(step, &outcome));
    }

    fn on_diagnostics_started(&self, index: usize, total: usize) {
        self.send(move |view| view.diagnostics_started(index, total));
    }

    fn on_connectivity(&self, outcome: &ConnectivityOutcome) {
        let outcome = outcome.clone();
        self.send(move |view| view.connectivity(&outcome));
    }

    fn on_finished(&self, report: &PipelineReport) {
        let report = report.clone();
        self.send(move |view| view.finished(&report));
    }
}

pub fn progress_line(index: usize, total: usize, what: &str) -> String {
    format!("step {}/{}: {}", index, total, what)
}

pub fn connectivity_lines(outcome: &ConnectivityOutcome) -> Vec<String> {
    let mark = |ok: bool| if ok { "✓".green() } else { "✗".red() };
    let mut lines = vec![
        format!("{} ping {}", mark(outcome.ping_primary), PRIMARY_PING_TARGET),
        format!("{} ping {} (advisory)", mark(outcome.ping_secondary), SECONDARY_PING_TARGET),
        format!("{} HTTP connectivity check", mark(outcome.http_reachable)),
    ];
    for fault in &outcome.faults {
        lines.push(format!(
            "{} {} probe crashed: {}",
            "!".red(),
            fault.probe.as_str(),
            fault.message
        ));
    }
    lines.push(if outcome.overall_ok() {
        "Network connectivity restored".green().bold().to_string()
    } else {
        "Network is still unreachable".red().bold().to_string()
    });
    lines
}

#[derive(Tabled)]
struct StepRow {
    #[tabled(rename = "Step")]
    step: String,
    #[tabled(rename = "Result")]
    result: String,
    #[tabled(rename = "Exit")]
    exit_code: i32,
    #[tabled(rename = "Time")]
    duration: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&StepOutcome> for StepRow {
    fn from(outcome: &StepOutcome) -> Self {
        let result = match outcome.failure_kind() {
            None => "ok".to_string(),
            Some(kind) => kind.to_string(),
        };
        Self {
            step: outcome.label().to_string(),
            result,
            exit_code: outcome.exit_code(),
            duration: format!("{:.1}s", outcome.duration().as_secs_f64()),
            detail: excerpt(outcome.output(), DETAIL_WIDTH),
        }
    }
}

/// First line of `text`, shortened to `width` characters
fn excerpt(text: &str, width: usize) -> String {
    let first = text.lines().next().unwrap_or("").trim();
    if first.chars().count() <= width {
        first.to_string()
    } else {
        let cut: String = first.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

/// Per-step summary table for a finished run
pub fn summary_table(report: &PipelineReport) -> String {
    let rows: Vec<StepRow> = report.outcomes.iter().map(StepRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

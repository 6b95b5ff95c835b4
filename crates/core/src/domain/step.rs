// Remediation step identifiers and operator selections

use serde::{Deserialize, Serialize};

/// Stable identifier of a remediation step.
///
/// Declaration order is the fixed pipeline priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    DisableProxy,
    FlushDns,
    ResetWinsock,
    ResetIp,
    ResetTcpip,
    RestartAdapter,
}

impl StepId {
    /// All steps in pipeline order
    pub const ALL: [StepId; 6] = [
        StepId::DisableProxy,
        StepId::FlushDns,
        StepId::ResetWinsock,
        StepId::ResetIp,
        StepId::ResetTcpip,
        StepId::RestartAdapter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::DisableProxy => "disable-proxy",
            StepId::FlushDns => "flush-dns",
            StepId::ResetWinsock => "reset-winsock",
            StepId::ResetIp => "reset-ip",
            StepId::ResetTcpip => "reset-tcpip",
            StepId::RestartAdapter => "restart-adapter",
        }
    }

    /// Human-readable action name for progress lines
    pub fn describe(&self) -> &'static str {
        match self {
            StepId::DisableProxy => "Disable system proxy",
            StepId::FlushDns => "Flush DNS cache",
            StepId::ResetWinsock => "Reset Winsock catalog",
            StepId::ResetIp => "Release and renew IP address",
            StepId::ResetTcpip => "Reset TCP/IP stack",
            StepId::RestartAdapter => "Restart network adapter",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StepId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| format!("unknown step '{}'", s))
    }
}

/// Which steps the operator asked for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    pub disable_proxy: bool,
    pub flush_dns: bool,
    pub reset_winsock: bool,
    pub reset_ip: bool,
    pub reset_tcpip: bool,
    pub restart_adapter: bool,
    pub adapter_name: Option<String>,
}

impl Selections {
    /// Default operator choice: the four low-risk resets, no TCP/IP reset, no adapter restart
    pub fn recommended() -> Self {
        Self {
            disable_proxy: true,
            flush_dns: true,
            reset_winsock: true,
            reset_ip: true,
            ..Self::default()
        }
    }

    /// Select exactly the given steps
    pub fn only(ids: &[StepId], adapter_name: Option<String>) -> Self {
        let mut selections = Self {
            adapter_name,
            ..Self::default()
        };
        for id in ids {
            selections.set(*id, true);
        }
        selections
    }

    pub fn is_selected(&self, id: StepId) -> bool {
        match id {
            StepId::DisableProxy => self.disable_proxy,
            StepId::FlushDns => self.flush_dns,
            StepId::ResetWinsock => self.reset_winsock,
            StepId::ResetIp => self.reset_ip,
            StepId::ResetTcpip => self.reset_tcpip,
            StepId::RestartAdapter => self.restart_adapter,
        }
    }

    pub fn set(&mut self, id: StepId, selected: bool) {
        match id {
            StepId::DisableProxy => self.disable_proxy = selected,
            StepId::FlushDns => self.flush_dns = selected,
            StepId::ResetWinsock => self.reset_winsock = selected,
            StepId::ResetIp => self.reset_ip = selected,
            StepId::ResetTcpip => self.reset_tcpip = selected,
            StepId::RestartAdapter => self.restart_adapter = selected,
        }
    }

    pub fn is_empty(&self) -> bool {
        !StepId::ALL.iter().any(|id| self.is_selected(*id))
    }

    /// Adapter name with surrounding whitespace removed; `None` when blank
    pub fn adapter(&self) -> Option<&str> {
        self.adapter_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Non-fatal notices produced while planning a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanWarning {
    /// Adapter restart was selected but no adapter name was supplied; the step was dropped
    AdapterNotSelected,
    NothingSelected,
}

impl std::fmt::Display for PlanWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanWarning::AdapterNotSelected => {
                write!(f, "Adapter restart selected but no adapter chosen; skipping it")
            }
            PlanWarning::NothingSelected => write!(f, "No remediation step selected"),
        }
    }
}

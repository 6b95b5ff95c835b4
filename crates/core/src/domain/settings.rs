// Engine settings, passed into every component at construction

use super::error::{DomainError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration record for one engine session.
///
/// Components read what they need in their constructors; nothing falls back to
/// a global default afterwards. `Default` exists only to seed configuration
/// layering in the binary and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemediationSettings {
    /// Per-target ping timeout
    pub ping_timeout_ms: u64,
    pub http_timeout_secs: u64,
    pub adapter_cache_ttl_secs: u64,
    /// Upper bound for every remediation command (winsock/tcpip reset, IP renew, ...)
    pub command_timeout_secs: u64,
    /// Run the three connectivity probes concurrently
    pub parallel_probes: bool,
}

impl Default for RemediationSettings {
    fn default() -> Self {
        Self {
            ping_timeout_ms: 2000,
            http_timeout_secs: 3,
            adapter_cache_ttl_secs: 5,
            command_timeout_secs: 90,
            parallel_probes: true,
        }
    }
}

impl RemediationSettings {
    /// Reject zero timeouts (a zero timeout would fail every probe instantly)
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("ping_timeout_ms", self.ping_timeout_ms),
            ("http_timeout_secs", self.http_timeout_secs),
            ("command_timeout_secs", self.command_timeout_secs),
        ];
        for (field, value) in checks {
            if value == 0 {
                return Err(DomainError::InvalidSettings(format!(
                    "{} must be greater than zero",
                    field
                )));
            }
        }
        Ok(())
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_millis(self.ping_timeout_ms)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn adapter_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.adapter_cache_ttl_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

// Proxy Setting Store Port
// Reads and clears the per-user proxy configuration

use crate::domain::{ProxyConfiguration, StepOutcome};
use async_trait::async_trait;

/// Outcome label used by every store's `disable`
pub const DISABLE_PROXY_LABEL: &str = "disable-proxy";

/// Proxy Setting Store trait
///
/// Implementations:
/// - RegistryProxyStore (infra-system): HKCU Internet Settings via `reg.exe`
/// - FileProxyStore (infra-system): per-user JSON file
#[async_trait]
pub trait ProxySettingStore: Send + Sync {
    /// Current configuration.
    ///
    /// Proxy status is advisory: missing values and read failures both come
    /// back as [`ProxyConfiguration::disabled`].
    async fn read(&self) -> ProxyConfiguration;

    /// Persist `enabled=false, server=""`.
    ///
    /// A denied write is reported as `FailureKind::PermissionDenied` so the
    /// operator can be told to elevate.
    async fn disable(&self) -> StepOutcome;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::FailureKind;
    use std::sync::{Arc, Mutex};

    /// In-memory proxy store
    #[derive(Clone)]
    pub struct MockProxyStore {
        config: Arc<Mutex<ProxyConfiguration>>,
        deny_writes: bool,
        disable_calls: Arc<Mutex<usize>>,
    }

    impl MockProxyStore {
        pub fn new(config: ProxyConfiguration) -> Self {
            Self {
                config: Arc::new(Mutex::new(config)),
                deny_writes: false,
                disable_calls: Arc::new(Mutex::new(0)),
            }
        }

        /// Store whose writes fail with a permission error
        pub fn new_read_only(config: ProxyConfiguration) -> Self {
            Self {
                deny_writes: true,
                ..Self::new(config)
            }
        }

        pub fn current(&self) -> ProxyConfiguration {
            self.config.lock().unwrap().clone()
        }

        pub fn disable_calls(&self) -> usize {
            *self.disable_calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl ProxySettingStore for MockProxyStore {
        async fn read(&self) -> ProxyConfiguration {
            self.current()
        }

        async fn disable(&self) -> StepOutcome {
            *self.disable_calls.lock().unwrap() += 1;
            if self.deny_writes {
                return StepOutcome::failure(
                    DISABLE_PROXY_LABEL,
                    FailureKind::PermissionDenied,
                    "Permission denied",
                );
            }
            *self.config.lock().unwrap() = ProxyConfiguration::disabled();
            StepOutcome::success(DISABLE_PROXY_LABEL, "System proxy disabled")
        }
    }
}

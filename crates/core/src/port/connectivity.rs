// Connectivity Prober Port

use crate::domain::ConnectivityOutcome;
use async_trait::async_trait;

/// Connectivity Prober trait
///
/// Implementations:
/// - ConnectivityService (application): two pings + one HTTP check
/// - mocks::MockConnectivityProber: canned outcome
#[async_trait]
pub trait ConnectivityProber: Send + Sync {
    /// Run every probe; `parallel` runs them concurrently
    async fn probe(&self, parallel: bool) -> ConnectivityOutcome;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    pub struct MockConnectivityProber {
        outcome: ConnectivityOutcome,
        call_count: Arc<Mutex<usize>>,
    }

    impl MockConnectivityProber {
        pub fn new(outcome: ConnectivityOutcome) -> Self {
            Self {
                outcome,
                call_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn all_reachable() -> Self {
            Self::new(ConnectivityOutcome {
                ping_primary: true,
                ping_secondary: true,
                http_reachable: true,
                faults: vec![],
            })
        }

        pub fn call_count(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl ConnectivityProber for MockConnectivityProber {
        async fn probe(&self, _parallel: bool) -> ConnectivityOutcome {
            *self.call_count.lock().unwrap() += 1;
            self.outcome.clone()
        }
    }
}

// Adapter Directory Port
// Lists network adapters; implementations may cache

use crate::domain::AdapterName;
use async_trait::async_trait;

/// Adapter Directory trait
///
/// Implementations:
/// - CachingAdapterDirectory (application): `netsh` listing behind a TTL cache
/// - mocks::MockAdapterDirectory: fixed list
#[async_trait]
pub trait AdapterDirectory: Send + Sync {
    /// Query the OS for adapter names. Failure yields an empty list.
    async fn list(&self) -> Vec<AdapterName>;

    /// Cached list unless `force` is set or the cache has expired
    async fn refresh(&self, force: bool) -> Vec<AdapterName>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock Adapter Directory returning a fixed list
    #[derive(Clone, Default)]
    pub struct MockAdapterDirectory {
        names: Arc<Mutex<Vec<AdapterName>>>,
    }

    impl MockAdapterDirectory {
        pub fn new(names: &[&str]) -> Self {
            Self {
                names: Arc::new(Mutex::new(names.iter().map(|n| AdapterName::new(*n)).collect())),
            }
        }
    }

    #[async_trait]
    impl AdapterDirectory for MockAdapterDirectory {
        async fn list(&self) -> Vec<AdapterName> {
            self.names.lock().unwrap().clone()
        }

        async fn refresh(&self, _force: bool) -> Vec<AdapterName> {
            self.list().await
        }
    }
}

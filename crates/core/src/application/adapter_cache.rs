// Adapter directory backed by `netsh`, with a time-to-live cache
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error};

use super::constants::LIST_ADAPTERS;
use crate::domain::{parse_interface_table, AdapterName, CachedAdapterList};
use crate::port::{AdapterDirectory, CommandRunner, CommandSpec, RunOptions, TimeProvider};

/// Lists adapters through the command runner and caches the result
///
/// The cache is owned and mutated only here. At most one pipeline run is
/// expected to use it at a time; the mutex only makes `&self` mutation sound.
pub struct CachingAdapterDirectory {
    runner: Arc<dyn CommandRunner>,
    time_provider: Arc<dyn TimeProvider>,
    ttl_ms: i64,
    options: RunOptions,
    cache: Mutex<Option<CachedAdapterList>>,
}

impl CachingAdapterDirectory {
    /// Create a new adapter directory
    ///
    /// # Arguments
    /// * `runner` - Command runner used for `netsh interface show interface`
    /// * `time_provider` - Clock for cache age
    /// * `ttl` - Cache time-to-live (zero disables caching)
    /// * `command_timeout` - Upper bound for the listing command
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        time_provider: Arc<dyn TimeProvider>,
        ttl: Duration,
        command_timeout: Duration,
    ) -> Self {
        Self {
            runner,
            time_provider,
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            options: RunOptions::checked(command_timeout),
            cache: Mutex::new(None),
        }
    }

    /// Timestamp of the current cache population, if any
    #[cfg(test)]
    fn populated_at(&self) -> Option<i64> {
        self.lock_cache().as_ref().map(|c| c.populated_at_ms)
    }

    fn fresh_names(&self, now: i64) -> Option<Vec<AdapterName>> {
        let cache = self.lock_cache();
        let cached = cache.as_ref()?;
        if cached.is_fresh(now, self.ttl_ms) {
            debug!(age_ms = now - cached.populated_at_ms, "Adapter cache hit");
            Some(cached.names.clone())
        } else {
            None
        }
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, Option<CachedAdapterList>> {
        // A poisoned cache is still a valid Option; keep using it
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl AdapterDirectory for CachingAdapterDirectory {
    async fn list(&self) -> Vec<AdapterName> {
        let command = CommandSpec::argv(&LIST_ADAPTERS);
        let outcome = self.runner.run(&command, &self.options).await;

        if !outcome.succeeded() {
            error!(
                failure = ?outcome.failure_kind(),
                output = %outcome.output(),
                "Failed to list adapters"
            );
            return Vec::new();
        }

        let names = parse_interface_table(outcome.output());
        debug!(count = names.len(), adapters = ?names, "Parsed adapters");
        names
    }

    async fn refresh(&self, force: bool) -> Vec<AdapterName> {
        let now = self.time_provider.now_millis();

        if !force {
            if let Some(names) = self.fresh_names(now) {
                return names;
            }
        }

        let names = self.list().await;
        *self.lock_cache() = Some(CachedAdapterList::new(names.clone(), now));
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::command_runner::mocks::{MockBehavior, MockCommandRunner};
    use crate::port::time_provider::mocks::ManualTimeProvider;

    const TABLE_ONE: &str = "Admin State    State          Type             Interface Name\n\
        -------------------------------------------------------------------------\n\
        Enabled        Connected      Dedicated        Wi-Fi\n";

    const TABLE_TWO: &str = "Admin State    State          Type             Interface Name\n\
        Enabled        Connected      Dedicated        Ethernet 3\n";

    fn directory(
        runner: &MockCommandRunner,
        clock: &ManualTimeProvider,
        ttl_secs: u64,
    ) -> CachingAdapterDirectory {
        CachingAdapterDirectory::new(
            Arc::new(runner.clone()),
            Arc::new(clock.clone()),
            Duration::from_secs(ttl_secs),
            Duration::from_secs(10),
        )
    }

    #[tokio::test]
    async fn test_list_parses_runner_output() {
        let runner = MockCommandRunner::new().on("netsh", MockBehavior::Succeed(TABLE_ONE.into()));
        let clock = ManualTimeProvider::new(0);
        let dir = directory(&runner, &clock, 5);

        assert_eq!(dir.list().await, vec![AdapterName::new("Wi-Fi")]);
        assert_eq!(
            runner.calls()[0].command_line(),
            "netsh interface show interface"
        );
    }

    #[tokio::test]
    async fn test_list_failure_yields_empty() {
        let runner = MockCommandRunner::new().on(
            "netsh",
            MockBehavior::Fail {
                exit_code: 1,
                output: "The requested operation requires elevation.".into(),
            },
        );
        let clock = ManualTimeProvider::new(0);
        let dir = directory(&runner, &clock, 5);

        assert!(dir.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_within_ttl_returns_cached_list() {
        let runner = MockCommandRunner::new().on("netsh", MockBehavior::Succeed(TABLE_ONE.into()));
        let clock = ManualTimeProvider::new(1_000);
        let dir = directory(&runner, &clock, 5);

        let first = dir.refresh(false).await;
        // The OS now reports a different adapter set
        runner.prepend("netsh", MockBehavior::Succeed(TABLE_TWO.into()));
        clock.advance_millis(4_999);
        let second = dir.refresh(false).await;

        assert_eq!(first, second);
        assert_eq!(first, vec![AdapterName::new("Wi-Fi")]);
        assert_eq!(runner.call_count(), 1, "second refresh must not re-query");
        assert_eq!(dir.populated_at(), Some(1_000));

        let forced = dir.refresh(true).await;
        assert_eq!(forced, vec![AdapterName::new("Ethernet 3")]);
    }

    #[tokio::test]
    async fn test_refresh_after_ttl_requeries_and_resets_timestamp() {
        let runner = MockCommandRunner::new().on("netsh", MockBehavior::Succeed(TABLE_ONE.into()));
        let clock = ManualTimeProvider::new(1_000);
        let dir = directory(&runner, &clock, 5);

        dir.refresh(false).await;
        clock.advance_millis(5_000);
        dir.refresh(false).await;

        assert_eq!(runner.call_count(), 2);
        assert_eq!(dir.populated_at(), Some(6_000));
    }

    #[tokio::test]
    async fn test_forced_refresh_bypasses_cache() {
        let runner = MockCommandRunner::new().on("netsh", MockBehavior::Succeed(TABLE_ONE.into()));
        let clock = ManualTimeProvider::new(0);
        let dir = directory(&runner, &clock, 60);

        dir.refresh(false).await;
        dir.refresh(true).await;

        assert_eq!(runner.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_population_is_still_cached() {
        let runner = MockCommandRunner::new();
        let clock = ManualTimeProvider::new(0);
        let dir = directory(&runner, &clock, 60);

        assert!(dir.refresh(false).await.is_empty());
        assert!(dir.refresh(false).await.is_empty());
        assert_eq!(runner.call_count(), 1);
    }
}

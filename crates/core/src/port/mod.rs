// Port Layer - Capability interfaces for everything that touches the OS

pub mod adapter_directory;
pub mod command_runner;
pub mod connectivity;
pub mod http_checker;
pub mod proxy_store;
pub mod run_observer;
pub mod time_provider; // For deterministic TTL testing

// Re-exports
pub use adapter_directory::AdapterDirectory;
pub use command_runner::{CommandRunner, CommandSpec, RunOptions};
pub use connectivity::ConnectivityProber;
pub use http_checker::{HttpCheckError, HttpChecker};
pub use proxy_store::ProxySettingStore;
pub use run_observer::{NoopObserver, RunObserver};
pub use time_provider::TimeProvider;

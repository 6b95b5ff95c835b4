// Application Layer - Use Cases and Business Logic

pub mod actions;
pub mod adapter_cache;
pub mod cancel;
pub mod connectivity;
pub mod constants;
pub mod dispatcher;
pub mod orchestrator;
pub mod panic_guard;

// Re-exports
pub use adapter_cache::CachingAdapterDirectory;
pub use cancel::{cancellation_channel, CancelSource, CancellationToken};
pub use connectivity::ConnectivityService;
pub use dispatcher::{dispatch_channel, DispatchHandle, Dispatcher, DrainStatus};
pub use orchestrator::{RemediationOrchestrator, Step, StepPlan};
pub use panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};

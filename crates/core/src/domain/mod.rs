// Domain Layer - Pure values and rules, no I/O

pub mod adapter;
pub mod error;
pub mod outcome;
pub mod pipeline;
pub mod proxy;
pub mod settings;
pub mod step;

// Re-exports
pub use adapter::{parse_interface_table, validate_adapter_name, AdapterName, CachedAdapterList};
pub use error::DomainError;
pub use outcome::{ConnectivityOutcome, FailureKind, ProbeFault, ProbeKind, StepOutcome};
pub use pipeline::{PipelineReport, PipelineState, RunId};
pub use proxy::ProxyConfiguration;
pub use settings::RemediationSettings;
pub use step::{PlanWarning, Selections, StepId};

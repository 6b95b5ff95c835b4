// netfix Core - Domain Logic, Ports & Remediation Orchestration
// NO process, HTTP or registry access here: those live behind ports

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{AppError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

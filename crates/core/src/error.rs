// Central Error Type for the engine
//
// Only persistence seams return errors; operational failures travel as
// StepOutcome / ConnectivityOutcome values.

use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] crate::domain::DomainError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    /// True when the underlying cause is an OS permission denial
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, AppError::Io(e) if e.kind() == std::io::ErrorKind::PermissionDenied)
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

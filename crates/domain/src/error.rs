//! Domain error types.

use thiserror::Error;

use crate::geo::LocationError;
use crate::repository::RepositoryError;
use crate::vehicle::VehicleError;

/// Errors that can occur during domain operations.
///
/// Wraps the first failure encountered without masking its code: the
/// HTTP layer maps [`DomainError::code`] 1:1 to status codes.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A business-rule failure on the vehicle aggregate or its policy.
    #[error(transparent)]
    Vehicle(#[from] VehicleError),

    /// A persistence failure from the repository backend.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl DomainError {
    /// Stable error code for the failure.
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Vehicle(e) => e.code(),
            DomainError::Repository(_) => "RepositoryFailure",
        }
    }
}

impl From<LocationError> for DomainError {
    fn from(e: LocationError) -> Self {
        DomainError::Vehicle(VehicleError::Location(e))
    }
}

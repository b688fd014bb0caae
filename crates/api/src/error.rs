//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{DomainError, VehicleError};

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg),
            ApiError::Domain(err) => {
                let status = domain_error_status(&err);
                if status == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(error = %err, "internal server error");
                }
                (status, err.code(), err.to_string())
            }
        };

        let body = serde_json::json!({ "error": { "code": code, "message": message } });
        (status, axum::Json(body)).into_response()
    }
}

fn domain_error_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Vehicle(vehicle_err) => match vehicle_err {
            VehicleError::NotFound { .. } => StatusCode::NOT_FOUND,
            VehicleError::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
            VehicleError::UnauthorizedTransition { .. } | VehicleError::InvalidRole => {
                StatusCode::FORBIDDEN
            }
            VehicleError::InvalidId
            | VehicleError::InvalidUserId
            | VehicleError::InvalidStatus { .. }
            | VehicleError::NotAvailable { .. }
            | VehicleError::NotRented { .. }
            | VehicleError::InvalidRadius { .. }
            | VehicleError::Location(_) => StatusCode::BAD_REQUEST,
        },
        DomainError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<VehicleError> for ApiError {
    fn from(err: VehicleError) -> Self {
        ApiError::Domain(DomainError::Vehicle(err))
    }
}

impl From<domain::RepositoryError> for ApiError {
    fn from(err: domain::RepositoryError) -> Self {
        ApiError::Domain(DomainError::Repository(err))
    }
}

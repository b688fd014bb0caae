//! Vehicle aggregate and related types.

mod aggregate;
mod commands;
mod events;
mod policy;
mod queries;
mod service;
mod status;

pub use aggregate::Vehicle;
pub use commands::{RentVehicle, ReturnVehicle, UpdateVehicleStatus};
pub use events::{LocationUpdatedData, StatusChangedData, VehicleEvent};
pub use policy::{Role, allowed_targets, validate_transition};
pub use queries::{VehicleQueryService, VehicleSummary};
pub use service::VehicleCommandService;
pub use status::VehicleStatus;

use thiserror::Error;

use crate::geo::LocationError;

/// Errors that can occur during vehicle operations.
///
/// Every variant is a recoverable business failure with a stable code
/// for callers (see [`VehicleError::code`]); none of these are raised
/// as panics.
#[derive(Debug, Error)]
pub enum VehicleError {
    /// Vehicle id is empty or whitespace.
    #[error("vehicle id must not be empty")]
    InvalidId,

    /// User id is empty or whitespace.
    #[error("user id must not be empty")]
    InvalidUserId,

    /// No vehicle exists with the given id.
    #[error("vehicle not found: {vehicle_id}")]
    NotFound { vehicle_id: String },

    /// The caller's expected status did not match the stored status.
    /// The caller should re-fetch and retry with the corrected value.
    #[error(
        "concurrency conflict for vehicle {vehicle_id}: expected {expected}, \
         attempted {attempted}, actual {actual}"
    )]
    ConcurrencyConflict {
        vehicle_id: String,
        expected: VehicleStatus,
        attempted: VehicleStatus,
        actual: VehicleStatus,
    },

    /// Target status is undefined or the `Unknown` sentinel.
    #[error("invalid status: {value}")]
    InvalidStatus { value: String },

    /// Rent precondition unmet: the vehicle is not `Available`.
    #[error("vehicle is not available for rent (current status: {current})")]
    NotAvailable { current: VehicleStatus },

    /// Return precondition unmet: the vehicle is not `Rented`.
    #[error("vehicle is not rented (current status: {current})")]
    NotRented { current: VehicleStatus },

    /// Proximity radius must be strictly positive.
    #[error("invalid radius: {radius_km} km (must be greater than 0)")]
    InvalidRadius { radius_km: f64 },

    /// The caller's role does not permit this transition.
    #[error("role {role} may not transition {from} -> {to}")]
    UnauthorizedTransition {
        role: Role,
        from: VehicleStatus,
        to: VehicleStatus,
    },

    /// The caller has no recognized role.
    #[error("caller has no recognized role")]
    InvalidRole,

    /// Out-of-range coordinate.
    #[error(transparent)]
    Location(#[from] LocationError),
}

impl VehicleError {
    /// Stable error code exposed to callers.
    pub fn code(&self) -> &'static str {
        match self {
            VehicleError::InvalidId => "InvalidId",
            VehicleError::InvalidUserId => "InvalidUserId",
            VehicleError::NotFound { .. } => "NotFound",
            VehicleError::ConcurrencyConflict { .. } => "ConcurrencyConflict",
            VehicleError::InvalidStatus { .. } => "InvalidStatus",
            VehicleError::NotAvailable { .. } => "NotAvailable",
            VehicleError::NotRented { .. } => "NotRented",
            VehicleError::InvalidRadius { .. } => "InvalidRadius",
            VehicleError::UnauthorizedTransition { .. } => "UnauthorizedTransition",
            VehicleError::InvalidRole => "InvalidRole",
            VehicleError::Location(e) => e.code(),
        }
    }
}

//! Persistence port for vehicle aggregates.

use async_trait::async_trait;
use common::{UserId, VehicleId};
use thiserror::Error;

use crate::geo::Location;
use crate::vehicle::Vehicle;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The storage backend failed. Carries the driver's message so the
    /// domain crate stays independent of any particular driver.
    #[error("storage backend error: {message}")]
    Backend { message: String },

    /// A stored document could not be mapped back to a valid aggregate.
    #[error("corrupt document for vehicle {vehicle_id}: {reason}")]
    CorruptDocument { vehicle_id: String, reason: String },

    /// A serialization/deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    /// Wraps a backend/driver error.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        RepositoryError::Backend {
            message: err.to_string(),
        }
    }
}

/// The persistence contract the core requires from any backend.
///
/// Implementations are document stores keyed by vehicle id. Documents
/// may carry opaque passenger fields (telemetry, rental association)
/// that the core never reads; [`VehicleRepository::save`] must not
/// clobber them when it can avoid it (see the partial-update rule).
///
/// Cancellation is cooperative: all operations are plain futures and
/// dropping one aborts the in-flight I/O. No aggregate mutation
/// survives a save cancelled before the write.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Looks up a vehicle by id.
    async fn get_by_id(&self, id: &VehicleId) -> Result<Option<Vehicle>, RepositoryError>;

    /// Returns the vehicles associated with a user.
    async fn get_by_user_id(&self, user_id: &UserId) -> Result<Vec<Vehicle>, RepositoryError>;

    /// Returns the vehicles whose location lies within `radius_km` of
    /// `center`. The distance algorithm is implementation-defined; the
    /// reference implementation uses haversine great-circle distance.
    async fn get_nearby(
        &self,
        center: Location,
        radius_km: f64,
    ) -> Result<Vec<Vehicle>, RepositoryError>;

    /// Persists the vehicle's current location and status, then
    /// dispatches all pending domain events exactly once, then clears
    /// them (via [`Vehicle::drain_events`]).
    ///
    /// Partial-update optimization: when the only pending events are
    /// status changes, the backend may patch the status field alone
    /// instead of rewriting the document, falling back to a full
    /// upsert if the record does not exist.
    async fn save(&self, vehicle: &mut Vehicle) -> Result<(), RepositoryError>;
}

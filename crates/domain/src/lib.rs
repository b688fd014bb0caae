//! Fleet domain layer.
//!
//! This crate provides the core of the fleet tracker:
//! - [`Location`] value object with haversine distance
//! - [`Vehicle`] aggregate with its status state machine and pending
//!   domain events
//! - Role-based transition policy for status changes
//! - [`VehicleRepository`] persistence port and an in-memory
//!   implementation
//! - [`EventDispatcher`] for post-save domain event fan-out
//! - Command and query services orchestrating the above

pub mod dispatch;
pub mod error;
pub mod geo;
pub mod memory;
pub mod repository;
pub mod vehicle;

pub use common::{UserId, VehicleId};
pub use dispatch::{EventDispatcher, VehicleEventHandler};
pub use error::DomainError;
pub use geo::{Location, LocationError};
pub use memory::{InMemoryVehicleRepository, VehicleDocument};
pub use repository::{RepositoryError, VehicleRepository};
pub use vehicle::{
    LocationUpdatedData, RentVehicle, ReturnVehicle, Role, StatusChangedData, UpdateVehicleStatus,
    Vehicle, VehicleCommandService, VehicleError, VehicleEvent, VehicleQueryService, VehicleStatus,
    VehicleSummary,
};

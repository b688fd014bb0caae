//! Shared types for the fleet tracker.

mod types;

pub use types::{UserId, VehicleId};

//! Commands accepted by the vehicle command service.

use common::{UserId, VehicleId};

use super::{Role, VehicleStatus};

/// Request to transition a vehicle's status.
///
/// `expected_status` is the optimistic-concurrency token: the caller
/// states what it believes the current status is, and the command
/// fails with a conflict if the store disagrees.
#[derive(Debug, Clone)]
pub struct UpdateVehicleStatus {
    pub vehicle_id: VehicleId,
    pub expected_status: VehicleStatus,
    pub new_status: VehicleStatus,
    /// Externally-resolved caller role; `None` for anonymous callers.
    pub role: Option<Role>,
}

impl UpdateVehicleStatus {
    pub fn new(
        vehicle_id: impl Into<VehicleId>,
        expected_status: VehicleStatus,
        new_status: VehicleStatus,
        role: Option<Role>,
    ) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            expected_status,
            new_status,
            role,
        }
    }
}

/// Request to rent an available vehicle.
#[derive(Debug, Clone)]
pub struct RentVehicle {
    pub vehicle_id: VehicleId,
    pub user_id: UserId,
}

impl RentVehicle {
    pub fn new(vehicle_id: impl Into<VehicleId>, user_id: impl Into<UserId>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Request to return a rented vehicle.
#[derive(Debug, Clone)]
pub struct ReturnVehicle {
    pub vehicle_id: VehicleId,
    pub user_id: UserId,
}

impl ReturnVehicle {
    pub fn new(vehicle_id: impl Into<VehicleId>, user_id: impl Into<UserId>) -> Self {
        Self {
            vehicle_id: vehicle_id.into(),
            user_id: user_id.into(),
        }
    }
}

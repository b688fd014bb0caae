//! Vehicle command service: status update, rent, and return.

use common::VehicleId;

use crate::error::DomainError;
use crate::repository::VehicleRepository;

use super::{
    RentVehicle, ReturnVehicle, UpdateVehicleStatus, Vehicle, VehicleError, VehicleStatus,
    policy::validate_transition,
};

/// Orchestrates load -> validate -> mutate -> save for one vehicle at
/// a time.
///
/// Conflicting writers racing on the same vehicle are adjudicated
/// purely through the expected-status precondition; there is no
/// locking and no retry loop here. A caller receiving
/// `ConcurrencyConflict` re-fetches and retries with the corrected
/// expected value.
pub struct VehicleCommandService<R: VehicleRepository> {
    repository: R,
}

impl<R: VehicleRepository> VehicleCommandService<R> {
    /// Creates a command service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Transitions a vehicle's status under the caller's role and
    /// optimistic-concurrency precondition.
    ///
    /// Authorization precedes data-state validation: an unauthorized
    /// caller gets the policy rejection even when its expected status
    /// is stale.
    #[tracing::instrument(skip(self), fields(vehicle_id = %cmd.vehicle_id))]
    pub async fn update_status(&self, cmd: UpdateVehicleStatus) -> Result<(), DomainError> {
        if cmd.vehicle_id.is_empty() {
            return Err(VehicleError::InvalidId.into());
        }

        let mut vehicle = self.load(&cmd.vehicle_id).await?;

        validate_transition(cmd.role, vehicle.status(), cmd.new_status)?;

        if vehicle.status() != cmd.expected_status {
            metrics::counter!("fleet_command_conflicts_total").increment(1);
            return Err(VehicleError::ConcurrencyConflict {
                vehicle_id: cmd.vehicle_id.to_string(),
                expected: cmd.expected_status,
                attempted: cmd.new_status,
                actual: vehicle.status(),
            }
            .into());
        }

        vehicle.update_status(cmd.new_status)?;
        self.repository.save(&mut vehicle).await?;

        metrics::counter!("fleet_commands_total", "command" => "update_status").increment(1);
        Ok(())
    }

    /// Rents an available vehicle to a user.
    ///
    /// Unlike `update_status` this checks an absolute precondition
    /// (the vehicle must be `Available`), not a caller-supplied
    /// expected value.
    #[tracing::instrument(skip(self), fields(vehicle_id = %cmd.vehicle_id, user_id = %cmd.user_id))]
    pub async fn rent(&self, cmd: RentVehicle) -> Result<(), DomainError> {
        if cmd.vehicle_id.is_empty() {
            return Err(VehicleError::InvalidId.into());
        }
        if cmd.user_id.is_empty() {
            return Err(VehicleError::InvalidUserId.into());
        }

        let mut vehicle = self.load(&cmd.vehicle_id).await?;

        if vehicle.status() != VehicleStatus::Available {
            return Err(VehicleError::NotAvailable {
                current: vehicle.status(),
            }
            .into());
        }

        vehicle.update_status(VehicleStatus::Rented)?;
        self.repository.save(&mut vehicle).await?;

        metrics::counter!("fleet_commands_total", "command" => "rent").increment(1);
        Ok(())
    }

    /// Returns a rented vehicle.
    ///
    /// Deliberately permissive: the vehicle is not checked against the
    /// returning user (fleet-operator model).
    #[tracing::instrument(skip(self), fields(vehicle_id = %cmd.vehicle_id, user_id = %cmd.user_id))]
    pub async fn return_vehicle(&self, cmd: ReturnVehicle) -> Result<(), DomainError> {
        if cmd.vehicle_id.is_empty() {
            return Err(VehicleError::InvalidId.into());
        }
        if cmd.user_id.is_empty() {
            return Err(VehicleError::InvalidUserId.into());
        }

        let mut vehicle = self.load(&cmd.vehicle_id).await?;

        if vehicle.status() != VehicleStatus::Rented {
            return Err(VehicleError::NotRented {
                current: vehicle.status(),
            }
            .into());
        }

        vehicle.update_status(VehicleStatus::Available)?;
        self.repository.save(&mut vehicle).await?;

        metrics::counter!("fleet_commands_total", "command" => "return").increment(1);
        Ok(())
    }

    async fn load(&self, vehicle_id: &VehicleId) -> Result<Vehicle, DomainError> {
        self.repository
            .get_by_id(vehicle_id)
            .await?
            .ok_or_else(|| {
                VehicleError::NotFound {
                    vehicle_id: vehicle_id.to_string(),
                }
                .into()
            })
    }
}

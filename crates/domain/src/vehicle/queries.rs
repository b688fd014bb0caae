//! Vehicle query service: validated lookups mapped to summaries.

use common::UserId;
use serde::Serialize;

use crate::error::DomainError;
use crate::geo::Location;
use crate::repository::VehicleRepository;

use super::{Vehicle, VehicleError};

/// Flat projection of a vehicle for query responses and the map UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleSummary {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub status: String,
}

impl From<&Vehicle> for VehicleSummary {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            id: vehicle.id().as_str().to_string(),
            latitude: vehicle.location().latitude(),
            longitude: vehicle.location().longitude(),
            status: vehicle.status().as_str().to_string(),
        }
    }
}

/// Read-side service over the repository.
pub struct VehicleQueryService<R: VehicleRepository> {
    repository: R,
}

impl<R: VehicleRepository> VehicleQueryService<R> {
    /// Creates a query service over the given repository.
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Finds vehicles within `radius_km` of the given coordinates.
    ///
    /// The coordinate pair is validated up front so an out-of-range
    /// latitude surfaces as `InvalidLatitude` rather than an empty
    /// result.
    #[tracing::instrument(skip(self))]
    pub async fn nearby(
        &self,
        latitude: f64,
        longitude: f64,
        radius_km: f64,
    ) -> Result<Vec<VehicleSummary>, DomainError> {
        let center = Location::new(latitude, longitude)?;

        // Written this way so NaN fails too.
        if !(radius_km > 0.0) {
            return Err(VehicleError::InvalidRadius { radius_km }.into());
        }

        let vehicles = self.repository.get_nearby(center, radius_km).await?;
        Ok(vehicles.iter().map(VehicleSummary::from).collect())
    }

    /// Returns the vehicles associated with a user.
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn by_user(&self, user_id: &UserId) -> Result<Vec<VehicleSummary>, DomainError> {
        if user_id.is_empty() {
            return Err(VehicleError::InvalidUserId.into());
        }

        let vehicles = self.repository.get_by_user_id(user_id).await?;
        Ok(vehicles.iter().map(VehicleSummary::from).collect())
    }
}

//! Vehicle domain events.

use chrono::{DateTime, Utc};
use common::VehicleId;
use serde::{Deserialize, Serialize};

use crate::geo::Location;

use super::VehicleStatus;

/// Events recorded by the vehicle aggregate.
///
/// A closed tagged union: dispatch is an exhaustive match, never a
/// runtime type lookup. Events are transient signals buffered on the
/// aggregate for a single save cycle; the aggregate's current state is
/// the system of record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum VehicleEvent {
    /// The vehicle's status changed.
    StatusChanged(StatusChangedData),

    /// The vehicle reported a (possibly unchanged) position.
    LocationUpdated(LocationUpdatedData),
}

impl VehicleEvent {
    /// Returns the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            VehicleEvent::StatusChanged(_) => "VehicleStatusChanged",
            VehicleEvent::LocationUpdated(_) => "VehicleLocationUpdated",
        }
    }

    /// Creates a status-changed event stamped with the current time.
    pub fn status_changed(vehicle_id: VehicleId, status: VehicleStatus) -> Self {
        VehicleEvent::StatusChanged(StatusChangedData {
            vehicle_id,
            status,
            occurred_at: Utc::now(),
        })
    }

    /// Creates a location-updated event stamped with the current time.
    pub fn location_updated(vehicle_id: VehicleId, location: Location) -> Self {
        VehicleEvent::LocationUpdated(LocationUpdatedData {
            vehicle_id,
            latitude: location.latitude(),
            longitude: location.longitude(),
            occurred_at: Utc::now(),
        })
    }
}

/// Data for the status-changed event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedData {
    /// The vehicle whose status changed.
    pub vehicle_id: VehicleId,

    /// The new status.
    pub status: VehicleStatus,

    /// When the change was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Data for the location-updated event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationUpdatedData {
    /// The vehicle that reported its position.
    pub vehicle_id: VehicleId,

    /// Reported latitude in degrees.
    pub latitude: f64,

    /// Reported longitude in degrees.
    pub longitude: f64,

    /// When the report was recorded.
    pub occurred_at: DateTime<Utc>,
}

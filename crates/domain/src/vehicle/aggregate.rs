//! Vehicle aggregate root.

use common::VehicleId;

use crate::geo::Location;

use super::{VehicleError, VehicleEvent, VehicleStatus};

/// The vehicle aggregate: the unit of consistency and persistence.
///
/// State changes append domain events to a pending buffer. The buffer
/// is not a log: the repository drains it after a successful save via
/// [`Vehicle::drain_events`], dispatches, and the cycle starts over.
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    location: Location,
    status: VehicleStatus,
    pending_events: Vec<VehicleEvent>,
}

impl Vehicle {
    /// Creates a vehicle, validating the id.
    ///
    /// The id is trimmed; an empty result fails with `InvalidId`. No
    /// event is recorded on creation. `Unknown` is accepted here as the
    /// uninitialized status.
    pub fn new(
        id: impl Into<VehicleId>,
        location: Location,
        status: VehicleStatus,
    ) -> Result<Self, VehicleError> {
        let id = id.into();
        if id.is_empty() {
            return Err(VehicleError::InvalidId);
        }
        Ok(Self {
            id,
            location,
            status,
            pending_events: Vec::new(),
        })
    }

    /// Returns the vehicle's identifier.
    pub fn id(&self) -> &VehicleId {
        &self.id
    }

    /// Returns the current location.
    pub fn location(&self) -> Location {
        self.location
    }

    /// Returns the current status.
    pub fn status(&self) -> VehicleStatus {
        self.status
    }

    /// Transitions the vehicle to a new status.
    ///
    /// `Unknown` is rejected with `InvalidStatus`. A same-status call
    /// succeeds without recording an event. Returns the (possibly
    /// unchanged) status.
    pub fn update_status(
        &mut self,
        new_status: VehicleStatus,
    ) -> Result<VehicleStatus, VehicleError> {
        if new_status == VehicleStatus::Unknown {
            return Err(VehicleError::InvalidStatus {
                value: new_status.as_str().to_string(),
            });
        }
        if new_status == self.status {
            return Ok(self.status);
        }

        self.status = new_status;
        self.pending_events
            .push(VehicleEvent::status_changed(self.id.clone(), new_status));
        Ok(new_status)
    }

    /// Moves the vehicle to a new location.
    ///
    /// Always records an event, even for coordinates identical to the
    /// current ones: a repeated position report is still a fresh
    /// observation for downstream consumers.
    pub fn update_location(&mut self, location: Location) {
        self.location = location;
        self.pending_events
            .push(VehicleEvent::location_updated(self.id.clone(), location));
    }

    /// Returns the events recorded since the last drain.
    pub fn pending_events(&self) -> &[VehicleEvent] {
        &self.pending_events
    }

    /// Takes the pending events, leaving the buffer empty.
    ///
    /// Called by the repository after a successful write; the returned
    /// events are then dispatched exactly once.
    pub fn drain_events(&mut self) -> Vec<VehicleEvent> {
        std::mem::take(&mut self.pending_events)
    }
}

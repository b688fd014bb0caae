//! Vehicle status state machine values.

use serde::{Deserialize, Serialize};

use super::VehicleError;

/// The operational status of a vehicle.
///
/// `Unknown` is an uninitialized sentinel: a vehicle may be created
/// with it, but no transition may ever target it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum VehicleStatus {
    /// Uninitialized sentinel; never a legal transition target.
    #[default]
    Unknown = 0,

    /// Ready to be rented.
    Available = 1,

    /// Currently rented by a user.
    Rented = 2,

    /// Undergoing maintenance.
    Maintenance = 3,

    /// Withdrawn from the fleet.
    OutOfService = 4,
}

impl VehicleStatus {
    /// All defined statuses, in numeric order.
    pub const ALL: [VehicleStatus; 5] = [
        VehicleStatus::Unknown,
        VehicleStatus::Available,
        VehicleStatus::Rented,
        VehicleStatus::Maintenance,
        VehicleStatus::OutOfService,
    ];

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Unknown => "Unknown",
            VehicleStatus::Available => "Available",
            VehicleStatus::Rented => "Rented",
            VehicleStatus::Maintenance => "Maintenance",
            VehicleStatus::OutOfService => "OutOfService",
        }
    }

    /// Returns the numeric value of the status.
    pub fn value(&self) -> u8 {
        *self as u8
    }

    /// Parses a status from its stored string form.
    pub fn parse(s: &str) -> Result<Self, VehicleError> {
        match s {
            "Unknown" => Ok(VehicleStatus::Unknown),
            "Available" => Ok(VehicleStatus::Available),
            "Rented" => Ok(VehicleStatus::Rented),
            "Maintenance" => Ok(VehicleStatus::Maintenance),
            "OutOfService" => Ok(VehicleStatus::OutOfService),
            other => Err(VehicleError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<u8> for VehicleStatus {
    type Error = VehicleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(VehicleStatus::Unknown),
            1 => Ok(VehicleStatus::Available),
            2 => Ok(VehicleStatus::Rented),
            3 => Ok(VehicleStatus::Maintenance),
            4 => Ok(VehicleStatus::OutOfService),
            other => Err(VehicleError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

impl std::str::FromStr for VehicleStatus {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

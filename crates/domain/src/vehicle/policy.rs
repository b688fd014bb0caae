//! Role-based status transition policy.
//!
//! A pure function of (role, from, to). Authorization runs before any
//! data-state validation in the command flow, so a caller lacking
//! permission never learns whether the transition would otherwise have
//! been legal.

use serde::{Deserialize, Serialize};

use super::{VehicleError, VehicleStatus};

/// Caller roles recognized by the transition policy.
///
/// Anonymous callers carry no role and are rejected outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Fleet technician: may perform any transition except to `Unknown`.
    Technician,

    /// Renting user: may only rent (`Available -> Rented`) and return
    /// (`Rented -> Available`).
    User,
}

impl Role {
    /// Returns the role name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Technician => "Technician",
            Role::User => "User",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = VehicleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "technician" => Ok(Role::Technician),
            "user" => Ok(Role::User),
            _ => Err(VehicleError::InvalidRole),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validates a single requested transition for a caller.
///
/// An explicit same-status request is not a policy violation for a
/// technician; the aggregate treats it as an idempotent no-op. Users
/// get no such allowance: their permitted pairs are exactly rent and
/// return, and a self-transition is neither.
pub fn validate_transition(
    role: Option<Role>,
    from: VehicleStatus,
    to: VehicleStatus,
) -> Result<(), VehicleError> {
    let Some(role) = role else {
        return Err(VehicleError::InvalidRole);
    };

    let legal = match role {
        Role::Technician => to != VehicleStatus::Unknown,
        Role::User => matches!(
            (from, to),
            (VehicleStatus::Available, VehicleStatus::Rented)
                | (VehicleStatus::Rented, VehicleStatus::Available)
        ),
    };

    if legal {
        Ok(())
    } else {
        Err(VehicleError::UnauthorizedTransition { role, from, to })
    }
}

/// Enumerates the legal transition targets from a state for a role.
///
/// The set excludes the current status itself (transitioning to the
/// same value is vacuous) and never contains `Unknown`. Consistent
/// with [`validate_transition`]: every listed target validates, and
/// every distinct target that validates is listed.
pub fn allowed_targets(role: Role, from: VehicleStatus) -> Vec<VehicleStatus> {
    VehicleStatus::ALL
        .into_iter()
        .filter(|&to| to != from && validate_transition(Some(role), from, to).is_ok())
        .collect()
}

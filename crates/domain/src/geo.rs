//! Geographic primitives: the [`Location`] value object and distance math.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius in kilometers, used for great-circle distance.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Errors from constructing a [`Location`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocationError {
    /// Latitude outside [-90, 90].
    #[error("invalid latitude: {value} (must be within [-90, 90])")]
    InvalidLatitude { value: f64 },

    /// Longitude outside [-180, 180].
    #[error("invalid longitude: {value} (must be within [-180, 180])")]
    InvalidLongitude { value: f64 },
}

impl LocationError {
    /// Stable error code exposed to callers.
    pub fn code(&self) -> &'static str {
        match self {
            LocationError::InvalidLatitude { .. } => "InvalidLatitude",
            LocationError::InvalidLongitude { .. } => "InvalidLongitude",
        }
    }
}

/// A validated geographic coordinate pair.
///
/// Immutable once constructed; equality and hashing are by component
/// values. Construction fails for out-of-range coordinates, so any
/// `Location` in the system is known to be valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    latitude: f64,
    longitude: f64,
}

impl Location {
    /// Creates a location, validating both coordinates.
    ///
    /// Latitude is checked first; an out-of-range latitude is reported
    /// even when the longitude is also invalid.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, LocationError> {
        if !(-90.0..=90.0).contains(&latitude) || latitude.is_nan() {
            return Err(LocationError::InvalidLatitude { value: latitude });
        }
        if !(-180.0..=180.0).contains(&longitude) || longitude.is_nan() {
            return Err(LocationError::InvalidLongitude { value: longitude });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Returns the latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Returns the longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Haversine great-circle distance to another location, in kilometers.
    pub fn distance_km(&self, other: &Location) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }
}

// f64 has no Eq/Hash; validated coordinates are never NaN, so bitwise
// identity matches value identity here.
impl Eq for Location {}

impl std::hash::Hash for Location {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.latitude.to_bits().hash(state);
        self.longitude.to_bits().hash(state);
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.latitude, self.longitude)
    }
}

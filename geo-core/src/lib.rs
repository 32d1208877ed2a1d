//! Geo Core
//!
//! Pure geodesic primitives for location-pegged challenges:
//! - Validated coordinate and challenge-location value types
//! - Great-circle (Haversine) distance
//! - Tolerance-radius admission checks

pub mod distance;
pub mod proximity;

pub use distance::{distance_meters, EARTH_RADIUS_METERS};
pub use proximity::{is_within_tolerance, ProximityCheck, ProximityWarning};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoError {
    #[error("latitude {0} is outside [-90, 90]")]
    InvalidLatitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    InvalidLongitude(f64),
    #[error("tolerance radius must be positive, got {0}")]
    InvalidTolerance(f64),
}

fn check_coordinates(latitude: f64, longitude: f64) -> Result<(), GeoError> {
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(GeoError::InvalidLatitude(latitude));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(GeoError::InvalidLongitude(longitude));
    }
    Ok(())
}

/// A device fix in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPosition {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        check_coordinates(latitude, longitude)?;
        Ok(Self { latitude, longitude })
    }

    /// Great-circle distance to `other`, in meters.
    pub fn distance_to(&self, other: &GeoPosition) -> f64 {
        distance_meters(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// The place a challenge is pegged to, as registered with the challenge registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeLocation {
    pub challenge_id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    #[serde(rename = "toleranceRadius")]
    pub tolerance_radius_meters: f64,
}

impl ChallengeLocation {
    pub fn new(
        challenge_id: i64,
        latitude: f64,
        longitude: f64,
        location_name: impl Into<String>,
        tolerance_radius_meters: f64,
    ) -> Result<Self, GeoError> {
        let location = Self {
            challenge_id,
            latitude,
            longitude,
            location_name: location_name.into(),
            tolerance_radius_meters,
        };
        location.validate()?;
        Ok(location)
    }

    /// Re-checks invariants on a value that arrived over the wire.
    pub fn validate(&self) -> Result<(), GeoError> {
        check_coordinates(self.latitude, self.longitude)?;
        // NaN fails this comparison too
        if !(self.tolerance_radius_meters > 0.0) {
            return Err(GeoError::InvalidTolerance(self.tolerance_radius_meters));
        }
        Ok(())
    }

    pub fn position(&self) -> GeoPosition {
        GeoPosition {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

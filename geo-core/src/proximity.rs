//! Tolerance-radius admission for challenge locations.

use serde::{Deserialize, Serialize};

use crate::{ChallengeLocation, GeoPosition};

/// Distances are compared at whole-meter resolution: a fix that rounds to the
/// registered radius is admitted.
///
/// The backend runs its own check with a plain `distance <= radius`, so a fix
/// less than this far outside the radius can pass here and still be rejected
/// (and recorded) by the server.
pub const ADMISSION_SLACK_METERS: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProximityWarning {
    /// The challenge has no registered location; the check failed open.
    MissingLocation,
}

/// Outcome of a single admission check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityCheck {
    pub is_valid: bool,
    pub distance_meters: f64,
    pub tolerance_radius_meters: f64,
    pub warning: Option<ProximityWarning>,
}

impl ProximityCheck {
    /// Human-readable explanation for a failed check.
    pub fn rejection_message(&self, location_name: &str) -> String {
        format!(
            "You are {:.0}m away from {}; the tolerance radius is {:.0}m. Move closer and try again.",
            self.distance_meters, location_name, self.tolerance_radius_meters
        )
    }
}

/// Decide whether `position` lies inside the challenge's tolerance radius.
///
/// A challenge without a registered location fails open: the check reports
/// valid with zero distance and carries [`ProximityWarning::MissingLocation`]
/// so the caller can surface it.
pub fn is_within_tolerance(
    location: Option<&ChallengeLocation>,
    position: &GeoPosition,
) -> ProximityCheck {
    let Some(location) = location else {
        return ProximityCheck {
            is_valid: true,
            distance_meters: 0.0,
            tolerance_radius_meters: 0.0,
            warning: Some(ProximityWarning::MissingLocation),
        };
    };

    let distance = location.position().distance_to(position);
    let radius = location.tolerance_radius_meters;

    ProximityCheck {
        is_valid: distance <= radius + ADMISSION_SLACK_METERS,
        distance_meters: distance,
        tolerance_radius_meters: radius,
        warning: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance_meters;

    fn plaza(radius: f64) -> ChallengeLocation {
        ChallengeLocation::new(1, -12.0464, -77.0428, "Plaza de Armas", radius).unwrap()
    }

    #[test]
    fn test_exact_boundary_is_inclusive() {
        let user = GeoPosition::new(-12.0464, -77.0418).unwrap();
        let exact = distance_meters(-12.0464, -77.0428, user.latitude, user.longitude);

        let check = is_within_tolerance(Some(&plaza(exact)), &user);
        assert!(check.is_valid);
        assert_eq!(check.distance_meters, exact);
        assert_eq!(check.tolerance_radius_meters, exact);
    }

    #[test]
    fn test_fifty_meters_north_is_admitted() {
        let user = GeoPosition::new(-12.0464 + 0.00045, -77.0428).unwrap();
        let check = is_within_tolerance(Some(&plaza(50.0)), &user);
        assert!(check.is_valid);
        assert!((check.distance_meters - 50.0).abs() < 0.1);
    }

    #[test]
    fn test_one_kilometer_away_is_rejected() {
        let user = GeoPosition::new(-12.0464 + 0.01, -77.0428).unwrap();
        let check = is_within_tolerance(Some(&plaza(50.0)), &user);
        assert!(!check.is_valid);
        assert!((check.distance_meters - 1112.0).abs() < 1.0);
        assert_eq!(
            check.rejection_message("Plaza de Armas"),
            "You are 1112m away from Plaza de Armas; the tolerance radius is 50m. Move closer and try again."
        );
    }

    #[test]
    fn test_just_outside_whole_meter_is_rejected() {
        // ~51.1 m north
        let user = GeoPosition::new(-12.0464 + 0.00046, -77.0428).unwrap();
        assert!(!is_within_tolerance(Some(&plaza(50.0)), &user).is_valid);
    }

    #[test]
    fn test_slack_band_passes_locally_but_not_a_strict_compare() {
        let user = GeoPosition::new(-12.0464, -77.0418).unwrap();
        let exact = distance_meters(-12.0464, -77.0428, user.latitude, user.longitude);
        let radius = exact - 0.3;

        let check = is_within_tolerance(Some(&plaza(radius)), &user);
        assert!(check.is_valid);
        // the backend's own `distance <= radius` would refuse this fix
        assert!(check.distance_meters > check.tolerance_radius_meters);
    }

    #[test]
    fn test_missing_location_fails_open() {
        let user = GeoPosition::new(10.0, 10.0).unwrap();
        let check = is_within_tolerance(None, &user);
        assert!(check.is_valid);
        assert_eq!(check.distance_meters, 0.0);
        assert_eq!(check.warning, Some(ProximityWarning::MissingLocation));
    }
}

//! Great-circle distance on a spherical Earth.

/// Mean Earth radius used by the Haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Haversine distance between two lat/lon pairs given in degrees.
pub fn distance_meters(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    // rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMA: (f64, f64) = (-12.0464, -77.0428);

    #[test]
    fn test_identity() {
        assert_eq!(distance_meters(LIMA.0, LIMA.1, LIMA.0, LIMA.1), 0.0);
        assert_eq!(distance_meters(90.0, 0.0, 90.0, 0.0), 0.0);
    }

    #[test]
    fn test_symmetry() {
        let points = [
            LIMA,
            (48.8584, 2.2945),
            (-33.8568, 151.2153),
            (0.0, 179.9),
            (0.0, -179.9),
            (89.9, 45.0),
        ];
        for a in points {
            for b in points {
                let ab = distance_meters(a.0, a.1, b.0, b.1);
                let ba = distance_meters(b.0, b.1, a.0, a.1);
                assert!((ab - ba).abs() < 1e-6, "{:?} vs {:?}: {} != {}", a, b, ab, ba);
                assert!(ab >= 0.0);
            }
        }
    }

    #[test]
    fn test_small_offsets_near_lima() {
        // 0.00045 degrees of latitude is ~50 m
        let d = distance_meters(LIMA.0, LIMA.1, LIMA.0 + 0.00045, LIMA.1);
        assert!((d - 50.04).abs() < 0.05, "got {}", d);

        // 0.01 degrees of latitude is ~1112 m
        let d = distance_meters(LIMA.0, LIMA.1, LIMA.0 + 0.01, LIMA.1);
        assert!((d - 1111.95).abs() < 0.5, "got {}", d);
    }

    #[test]
    fn test_dateline_crossing_is_short() {
        let d = distance_meters(0.0, 179.9, 0.0, -179.9);
        assert!(d < 25_000.0, "got {}", d);
    }

    #[test]
    fn test_antipodes() {
        let d = distance_meters(0.0, 0.0, 0.0, 180.0);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_METERS;
        assert!((d - half_circumference).abs() < 1.0);
    }

    #[test]
    fn test_longitude_shrinks_with_latitude() {
        let at_equator = distance_meters(0.0, 0.0, 0.0, 0.01);
        let at_sixty = distance_meters(60.0, 0.0, 60.0, 0.01);
        assert!((at_sixty / at_equator - 0.5).abs() < 0.01);
    }
}

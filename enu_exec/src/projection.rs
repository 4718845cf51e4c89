//! # Projection
//!
//! Conversion of geodetic points into the East-North-Up frame tangent to the WGS84 ellipsoid at
//! a datum. Points are first converted to Earth-Centred Earth-Fixed (ECEF) coordinates, the
//! offset from the datum is then rotated into the local frame.
//!
//! All functions in this module are pure.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::eqpt::{
    enu::LocalPoint,
    gnss::{Datum, GeoPoint, GeodeticFix},
};
use nalgebra::{Matrix3, Vector3};

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// WGS84 semi-major axis
///
/// Units: meters
pub const WGS84_A: f64 = 6_378_137.0;

/// WGS84 flattening
pub const WGS84_F: f64 = 1.0 / 298.257_223_563;

/// WGS84 first eccentricity squared
pub const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Project `point` into the ENU frame anchored at `datum`.
pub fn project(point: &GeoPoint, datum: &Datum) -> LocalPoint {
    let enu = project_vector(point, datum);

    LocalPoint {
        east_m: enu.x,
        north_m: enu.y,
        up_m: enu.z,
    }
}

/// Project the position of `fix` into the ENU frame anchored at `datum`.
pub fn project_fix(fix: &GeodeticFix, datum: &Datum) -> LocalPoint {
    project(&fix.position, datum)
}

/// As [`project`] but returning `[east, north, up]` as a vector.
pub fn project_vector(point: &GeoPoint, datum: &Datum) -> Vector3<f64> {
    let delta_ecef = geodetic_to_ecef(point) - geodetic_to_ecef(datum);

    ecef_to_enu_rotation(datum) * delta_ecef
}

/// Convert a geodetic point into ECEF coordinates.
pub fn geodetic_to_ecef(point: &GeoPoint) -> Vector3<f64> {
    let (sin_lat, cos_lat) = point.latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = point.longitude_deg.to_radians().sin_cos();

    // Prime vertical radius of curvature
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Vector3::new(
        (n + point.altitude_m) * cos_lat * cos_lon,
        (n + point.altitude_m) * cos_lat * sin_lon,
        (n * (1.0 - WGS84_E2) + point.altitude_m) * sin_lat,
    )
}

/// Rotation taking ECEF vectors into the ENU frame at `datum`.
pub fn ecef_to_enu_rotation(datum: &Datum) -> Matrix3<f64> {
    let (sin_lat, cos_lat) = datum.latitude_deg.to_radians().sin_cos();
    let (sin_lon, cos_lon) = datum.longitude_deg.to_radians().sin_cos();

    Matrix3::new(
        -sin_lon,
        cos_lon,
        0.0,
        -sin_lat * cos_lon,
        -sin_lat * sin_lon,
        cos_lat,
        cos_lat * cos_lon,
        cos_lat * sin_lon,
        sin_lat,
    )
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    const DATUM: Datum = Datum {
        latitude_deg: 45.0,
        longitude_deg: -75.0,
        altitude_m: 100.0,
    };

    #[test]
    fn test_datum_projects_to_origin() {
        let p = project(&DATUM, &DATUM);

        assert_relative_eq!(p.east_m, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.north_m, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.up_m, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_projection_is_pure() {
        let point = GeoPoint::new(45.0012, -74.9987, 97.5);

        assert_eq!(project(&point, &DATUM), project(&point, &DATUM));
    }

    #[test]
    fn test_axes() {
        // 0.001 deg of latitude at 45 deg is about 111.1 m
        let north = project(&GeoPoint::new(45.001, -75.0, 100.0), &DATUM);
        assert_relative_eq!(north.north_m, 111.13, epsilon = 0.05);
        assert_relative_eq!(north.east_m, 0.0, epsilon = 1e-6);
        assert!(north.up_m < 0.0 && north.up_m > -0.01);

        // 0.001 deg of longitude at 45 deg is about 78.8 m
        let east = project(&GeoPoint::new(45.0, -74.999, 100.0), &DATUM);
        assert_relative_eq!(east.east_m, 78.85, epsilon = 0.05);
        assert_relative_eq!(east.north_m, 0.0, epsilon = 0.01);

        let up = project(&GeoPoint::new(45.0, -75.0, 110.0), &DATUM);
        assert_relative_eq!(up.up_m, 10.0, epsilon = 1e-6);
        assert_relative_eq!(up.east_m, 0.0, epsilon = 1e-6);
        assert_relative_eq!(up.north_m, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_ecef_on_equator() {
        let ecef = geodetic_to_ecef(&GeoPoint::new(0.0, 0.0, 0.0));
        assert_relative_eq!(ecef, Vector3::new(WGS84_A, 0.0, 0.0), epsilon = 1e-6);

        let rot = ecef_to_enu_rotation(&GeoPoint::new(0.0, 0.0, 0.0));
        assert_relative_eq!(
            rot * Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 0.0, 1.0),
            epsilon = 1e-12
        );
        assert_relative_eq!(rot * rot.transpose(), Matrix3::identity(), epsilon = 1e-12);
    }
}

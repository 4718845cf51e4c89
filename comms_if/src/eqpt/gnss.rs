//! # GNSS Equipment Communications Module
//!
//! Position fixes as published by the GNSS receiver, and the geodetic point type shared by fixes
//! and the ENU datum.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A point on (or above) the WGS84 ellipsoid.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    /// Geodetic latitude
    ///
    /// Units: degrees, positive north
    pub latitude_deg: f64,

    /// Geodetic longitude
    ///
    /// Units: degrees, positive east
    pub longitude_deg: f64,

    /// Height above the ellipsoid
    ///
    /// Units: meters
    pub altitude_m: f64,
}

/// The fixed geodetic origin of the local ENU frame.
///
/// Once established the datum never changes for the lifetime of the node.
pub type Datum = GeoPoint;

/// A single position fix from the GNSS receiver.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GeodeticFix {
    /// UTC timestamp at which the fix was acquired
    #[serde(with = "ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    /// Position of the antenna
    pub position: GeoPoint,

    /// Variance of the position along the east, north and up axes.
    ///
    /// Units: meters^2
    pub position_variance_m2: [f64; 3],
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl GeoPoint {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }
}

impl GeodeticFix {
    /// Build a fix at the given position with the current time as the timestamp.
    pub fn now(position: GeoPoint, position_variance_m2: [f64; 3]) -> Self {
        Self {
            timestamp: Utc::now(),
            position,
            position_variance_m2,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

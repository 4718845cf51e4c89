//! # ENU Service Communications Module
//!
//! The ENU node exposes a request-reply service which converts arbitrary geodetic points into the
//! local frame of an arbitrary datum, and which reports the datum the node itself has latched.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::gnss::{Datum, GeoPoint};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A position in a local East-North-Up frame.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
pub struct LocalPoint {
    /// Units: meters
    pub east_m: f64,

    /// Units: meters
    pub north_m: f64,

    /// Units: meters
    pub up_m: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands that can be sent to the ENU service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum EnuCmd {
    /// Project `point` into the ENU frame anchored at `datum`.
    ///
    /// This uses neither the node's datum nor any lever-arm or heading correction.
    ToEnu { point: GeoPoint, datum: Datum },

    /// Get the datum the node is currently using, if one has been established.
    GetDatum,
}

/// Replies that can be sent by the ENU service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum EnuRep {
    /// The projected point
    Enu(LocalPoint),

    /// The node's datum, or `None` if no fix has been received and no datum is configured
    Datum(Option<Datum>),

    /// The request could not be understood
    Error(String),
}

//! # Transform Service Communications Module
//!
//! Requests and replies exchanged with the transform server, which knows the static geometry of
//! the vehicle (where each sensor is mounted relative to the body frame).

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A rigid transform between two frames.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    /// Origin of the source frame expressed in the target frame
    ///
    /// Units: meters
    pub translation_m: [f64; 3],

    /// Rotation from the source frame into the target frame, ordered `[x, y, z, w]`.
    pub rotation_q: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Commands that can be sent to the transform server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum TfCmd {
    /// Look up the latest transform taking points in `source_frame` into `target_frame`
    Lookup {
        target_frame: String,
        source_frame: String,
    },
}

/// Replies that can be sent by the transform server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum TfRep {
    /// The requested transform
    Transform(RigidTransform),

    /// The server has no transform between the requested frames
    NotFound {
        target_frame: String,
        source_frame: String,
    },
}

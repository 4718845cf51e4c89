//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Vector3;

/// Rotate a vector about the vertical (z) axis by `angle_rad`, right-hand rule.
///
/// Only the horizontal components are affected, the vertical component is returned unchanged.
pub fn rotate_about_z(vector: &Vector3<f64>, angle_rad: f64) -> Vector3<f64> {
    let (sin, cos) = angle_rad.sin_cos();

    Vector3::new(
        vector.x * cos - vector.y * sin,
        vector.x * sin + vector.y * cos,
        vector.z,
    )
}

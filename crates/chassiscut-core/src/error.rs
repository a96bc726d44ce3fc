//! Error types for the geometry port.
//!
//! Geometry errors are raised by [`crate::GeometryPort`] implementations when a
//! curve or normal cannot be evaluated. Higher layers wrap them in their own
//! error enums.

use thiserror::Error;

/// Errors raised while evaluating curves and normals.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The normal does not map onto any flange of the part.
    #[error("Unsupported normal ({x:.4}, {y:.4}, {z:.4}): {reason}")]
    UnsupportedNormal {
        /// X component of the offending normal
        x: f64,
        /// Y component of the offending normal
        y: f64,
        /// Z component of the offending normal
        z: f64,
        /// Why the normal was rejected
        reason: String,
    },

    /// A curve has zero length or a zero-radius arc.
    #[error("Degenerate curve: {0}")]
    DegenerateCurve(String),

    /// A point expected on a curve lies off it.
    #[error("Point ({x:.4}, {y:.4}, {z:.4}) is not on the curve")]
    PointNotOnCurve { x: f64, y: f64, z: f64 },
}

/// Result type alias for geometry operations.
pub type GeometryResult<T> = Result<T, GeometryError>;

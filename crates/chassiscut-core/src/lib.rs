//! # ChassisCut Core
//!
//! Shared types for the ChassisCut toolpath planner:
//!
//! - **geometry** - curves, tooling segments, part bounds and the
//!   [`GeometryPort`] trait with its analytic [`Kernel`]
//! - **config** - [`SynthesisConfig`], the explicit parameter set every
//!   planning call receives
//! - **error** - [`GeometryError`]

pub mod config;
pub mod error;
pub mod geometry;

pub use config::SynthesisConfig;
pub use error::{GeometryError, GeometryResult};
pub use geometry::{Bound3, Curve, Flange, GeometryPort, Kernel, LengthFrom, ToolingSegment};

pub use nalgebra::{Point3, Vector3};

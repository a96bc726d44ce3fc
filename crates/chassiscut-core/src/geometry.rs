//! Geometry port and the tooling-segment data model.
//!
//! A profile is an ordered list of [`ToolingSegment`]s. Each one is a line or
//! arc in 3-D plus the outward surface normal at its two ends. All length and
//! containment math goes through the [`GeometryPort`] trait so the planners
//! never depend on a particular kernel; [`Kernel`] is the implementation used
//! by default.
//!
//! Normals are classified against the part frame:
//! - `+Z` is the web flange
//! - `+Y` is the top flange
//! - `-Y` is the bottom flange
//! - anything else is flex; `-Z` is rejected outright

use nalgebra::{Point3, Rotation3, Unit, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

use crate::error::{GeometryError, GeometryResult};

/// A line or circular arc in 3-D.
///
/// Arcs run counter-clockwise about `axis` from `start` to `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Curve {
    Line {
        start: Point3<f64>,
        end: Point3<f64>,
    },
    Arc {
        start: Point3<f64>,
        end: Point3<f64>,
        center: Point3<f64>,
        axis: Vector3<f64>,
    },
}

impl Curve {
    pub fn line(start: Point3<f64>, end: Point3<f64>) -> Self {
        Curve::Line { start, end }
    }

    pub fn arc(
        start: Point3<f64>,
        end: Point3<f64>,
        center: Point3<f64>,
        axis: Vector3<f64>,
    ) -> Self {
        Curve::Arc {
            start,
            end,
            center,
            axis,
        }
    }

    pub fn start(&self) -> Point3<f64> {
        match self {
            Curve::Line { start, .. } | Curve::Arc { start, .. } => *start,
        }
    }

    pub fn end(&self) -> Point3<f64> {
        match self {
            Curve::Line { end, .. } | Curve::Arc { end, .. } => *end,
        }
    }

    pub fn is_arc(&self) -> bool {
        matches!(self, Curve::Arc { .. })
    }

    /// Same curve traversed the other way.
    pub fn reversed(&self) -> Self {
        match *self {
            Curve::Line { start, end } => Curve::Line {
                start: end,
                end: start,
            },
            Curve::Arc {
                start,
                end,
                center,
                axis,
            } => Curve::Arc {
                start: end,
                end: start,
                center,
                axis: -axis,
            },
        }
    }
}

/// One curve of a profile with its outward normals at start and end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolingSegment {
    pub curve: Curve,
    pub start_normal: Vector3<f64>,
    pub end_normal: Vector3<f64>,
}

impl ToolingSegment {
    pub fn new(curve: Curve, start_normal: Vector3<f64>, end_normal: Vector3<f64>) -> Self {
        Self {
            curve,
            start_normal,
            end_normal,
        }
    }

    pub fn start(&self) -> Point3<f64> {
        self.curve.start()
    }

    pub fn end(&self) -> Point3<f64> {
        self.curve.end()
    }

    pub fn reversed(&self) -> Self {
        Self {
            curve: self.curve.reversed(),
            start_normal: self.end_normal,
            end_normal: self.start_normal,
        }
    }
}

/// Flange a segment or normal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flange {
    Web,
    Top,
    Bottom,
    Flex,
}

impl Flange {
    pub fn is_flex(self) -> bool {
        self == Flange::Flex
    }
}

/// Which end of a curve a length is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthFrom {
    Start,
    End,
}

/// Axis-aligned bounding box of a part.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bound3 {
    pub min: Point3<f64>,
    pub max: Point3<f64>,
}

impl Bound3 {
    pub fn new(min: Point3<f64>, max: Point3<f64>) -> Self {
        Self { min, max }
    }

    /// Bound of the segment end points. Arc bulges are not included.
    pub fn from_segments(segments: &[ToolingSegment]) -> Option<Self> {
        let first = segments.first()?.start();
        let mut bound = Self::new(first, first);
        for seg in segments {
            bound.include(&seg.start());
            bound.include(&seg.end());
        }
        Some(bound)
    }

    pub fn include(&mut self, p: &Point3<f64>) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

/// Geometry operations consumed by the toolpath planners.
///
/// Every comparison that needs an epsilon receives it explicitly.
pub trait GeometryPort {
    /// Arc length of the curve.
    fn length(&self, curve: &Curve) -> f64;

    /// Point at `length` measured from the given end, clamped to the curve.
    fn point_at_length(&self, curve: &Curve, length: f64, from: LengthFrom) -> Point3<f64>;

    /// Arc length from the curve start to `point`.
    fn length_to_point(
        &self,
        curve: &Curve,
        point: &Point3<f64>,
        tolerance: f64,
    ) -> GeometryResult<f64>;

    fn is_point_on_curve(&self, curve: &Curve, point: &Point3<f64>, tolerance: f64) -> bool;

    /// Splits at `point`. Returns the curve unchanged when the point is
    /// within `tolerance` of either end.
    fn split_at(
        &self,
        curve: &Curve,
        point: &Point3<f64>,
        tolerance: f64,
    ) -> GeometryResult<Vec<Curve>>;

    fn line(&self, start: Point3<f64>, end: Point3<f64>) -> Curve;

    /// Center and radius for arcs, `None` for lines.
    fn center_and_radius(&self, curve: &Curve) -> Option<(Point3<f64>, f64)>;

    fn classify_normal(&self, normal: &Vector3<f64>, tolerance: f64) -> GeometryResult<Flange>;
}

/// Analytic line/arc kernel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kernel;

impl Kernel {
    pub fn new() -> Self {
        Self
    }

    /// Swept angle of an arc in (0, 2pi].
    fn sweep(
        start: &Point3<f64>,
        end: &Point3<f64>,
        center: &Point3<f64>,
        axis: &Vector3<f64>,
    ) -> f64 {
        let u = start - center;
        let v = end - center;
        let angle = signed_angle(&u, &v, axis);
        if angle <= 0.0 {
            angle + TAU
        } else {
            angle
        }
    }
}

fn signed_angle(u: &Vector3<f64>, v: &Vector3<f64>, axis: &Vector3<f64>) -> f64 {
    let axis = axis.normalize();
    axis.dot(&u.cross(v)).atan2(u.dot(v))
}

fn unsupported(normal: &Vector3<f64>, reason: &str) -> GeometryError {
    GeometryError::UnsupportedNormal {
        x: normal.x,
        y: normal.y,
        z: normal.z,
        reason: reason.to_string(),
    }
}

impl GeometryPort for Kernel {
    fn length(&self, curve: &Curve) -> f64 {
        match curve {
            Curve::Line { start, end } => (end - start).norm(),
            Curve::Arc {
                start,
                end,
                center,
                axis,
            } => (start - center).norm() * Self::sweep(start, end, center, axis),
        }
    }

    fn point_at_length(&self, curve: &Curve, length: f64, from: LengthFrom) -> Point3<f64> {
        let total = self.length(curve);
        let along = match from {
            LengthFrom::Start => length.clamp(0.0, total),
            LengthFrom::End => (total - length).clamp(0.0, total),
        };
        match curve {
            Curve::Line { start, end } => {
                if total <= f64::EPSILON {
                    return *start;
                }
                start + (end - start) * (along / total)
            }
            Curve::Arc {
                start,
                center,
                axis,
                ..
            } => {
                let radius = (start - center).norm();
                if radius <= f64::EPSILON {
                    return *start;
                }
                let rotation =
                    Rotation3::from_axis_angle(&Unit::new_normalize(*axis), along / radius);
                center + rotation * (start - center)
            }
        }
    }

    fn length_to_point(
        &self,
        curve: &Curve,
        point: &Point3<f64>,
        tolerance: f64,
    ) -> GeometryResult<f64> {
        if !self.is_point_on_curve(curve, point, tolerance) {
            return Err(GeometryError::PointNotOnCurve {
                x: point.x,
                y: point.y,
                z: point.z,
            });
        }
        match curve {
            Curve::Line { start, end } => {
                let total = (end - start).norm();
                if total <= f64::EPSILON {
                    return Ok(0.0);
                }
                let t = (point - start).dot(&(end - start)) / total;
                Ok(t.clamp(0.0, total))
            }
            Curve::Arc {
                start,
                end,
                center,
                axis,
            } => {
                let radius = (start - center).norm();
                let sweep = Self::sweep(start, end, center, axis);
                let mut angle = signed_angle(&(start - center), &(point - center), axis);
                if angle < 0.0 {
                    angle += TAU;
                }
                // Start point can come back as a full turn
                if (TAU - angle) * radius <= tolerance {
                    angle = 0.0;
                }
                Ok((angle * radius).min(sweep * radius))
            }
        }
    }

    fn is_point_on_curve(&self, curve: &Curve, point: &Point3<f64>, tolerance: f64) -> bool {
        match curve {
            Curve::Line { start, end } => {
                let dir = end - start;
                let len_sq = dir.norm_squared();
                if len_sq <= f64::EPSILON {
                    return (point - start).norm() <= tolerance;
                }
                let t = ((point - start).dot(&dir) / len_sq).clamp(0.0, 1.0);
                let closest = start + dir * t;
                (point - closest).norm() <= tolerance
            }
            Curve::Arc {
                start,
                end,
                center,
                axis,
            } => {
                if (point - start).norm() <= tolerance || (point - end).norm() <= tolerance {
                    return true;
                }
                let radius = (start - center).norm();
                let offset = point - center;
                let unit_axis = axis.normalize();
                if offset.dot(&unit_axis).abs() > tolerance {
                    return false;
                }
                if (offset.norm() - radius).abs() > tolerance {
                    return false;
                }
                let mut angle = signed_angle(&(start - center), &offset, axis);
                if angle < 0.0 {
                    angle += TAU;
                }
                angle * radius <= Self::sweep(start, end, center, axis) * radius + tolerance
            }
        }
    }

    fn split_at(
        &self,
        curve: &Curve,
        point: &Point3<f64>,
        tolerance: f64,
    ) -> GeometryResult<Vec<Curve>> {
        let along = self.length_to_point(curve, point, tolerance)?;
        let total = self.length(curve);
        if along <= tolerance || total - along <= tolerance {
            return Ok(vec![*curve]);
        }
        let pieces = match *curve {
            Curve::Line { start, end } => {
                vec![Curve::line(start, *point), Curve::line(*point, end)]
            }
            Curve::Arc {
                start,
                end,
                center,
                axis,
            } => vec![
                Curve::arc(start, *point, center, axis),
                Curve::arc(*point, end, center, axis),
            ],
        };
        Ok(pieces)
    }

    fn line(&self, start: Point3<f64>, end: Point3<f64>) -> Curve {
        Curve::line(start, end)
    }

    fn center_and_radius(&self, curve: &Curve) -> Option<(Point3<f64>, f64)> {
        match curve {
            Curve::Line { .. } => None,
            Curve::Arc { start, center, .. } => Some((*center, (start - center).norm())),
        }
    }

    fn classify_normal(&self, normal: &Vector3<f64>, tolerance: f64) -> GeometryResult<Flange> {
        let norm = normal.norm();
        if norm <= f64::EPSILON {
            return Err(unsupported(normal, "zero-length normal"));
        }
        let n = normal / norm;
        let aligned = |axis: Vector3<f64>| 1.0 - n.dot(&axis) <= tolerance;
        if aligned(Vector3::z()) {
            Ok(Flange::Web)
        } else if aligned(Vector3::y()) {
            Ok(Flange::Top)
        } else if aligned(-Vector3::y()) {
            Ok(Flange::Bottom)
        } else if aligned(-Vector3::z()) {
            Err(unsupported(normal, "negative Z normal has no flange"))
        } else {
            Ok(Flange::Flex)
        }
    }
}

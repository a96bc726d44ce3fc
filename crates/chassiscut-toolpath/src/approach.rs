//! Notch approach maneuver and entry order.
//!
//! A notch is first entered from the nearest part boundary with two short
//! strokes that meet the profile at its mid landmark. All points live in the
//! part frame.

use chassiscut_core::{Bound3, Point3, ToolingSegment, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{ToolpathError, ToolpathResult};

/// Which side of the approach point is machined first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryOrder {
    ForwardFirst,
    ReverseFirst,
}

impl EntryOrder {
    /// Forward-first when the profile runs back toward the part end its start
    /// is nearest to.
    pub fn for_profile(segments: &[ToolingSegment], bounds: &Bound3) -> Self {
        let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
            return EntryOrder::ForwardFirst;
        };
        let x0 = first.start().x;
        let x1 = last.end().x;
        let near_min = (x0 - bounds.min.x).abs() < (bounds.max.x - x0).abs();
        let forward = if near_min { x1 < x0 } else { x1 > x0 };
        if forward {
            EntryOrder::ForwardFirst
        } else {
            EntryOrder::ReverseFirst
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "move", rename_all = "snake_case")]
pub enum Stroke {
    Rapid { to: Point3<f64> },
    Cut { from: Point3<f64>, to: Point3<f64> },
}

impl Stroke {
    pub fn cut_length(&self) -> f64 {
        match self {
            Stroke::Rapid { .. } => 0.0,
            Stroke::Cut { from, to } => (to - from).norm(),
        }
    }
}

/// Points of the approach maneuver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApproachGeometry {
    /// Mid landmark on the profile
    pub approach_point: Point3<f64>,
    /// Normal of the profile at `approach_point`
    pub normal: Vector3<f64>,
    /// Where the outward direction meets the part boundary
    pub flange_end: Point3<f64>,
    pub mid1: Point3<f64>,
    pub mid2: Point3<f64>,
    /// Entry beside `mid1`
    pub entry1: Point3<f64>,
    /// Entry beside `mid2`
    pub entry2: Point3<f64>,
}

impl ApproachGeometry {
    /// Builds the maneuver around `point` for a part bounded by `bounds`.
    ///
    /// `min_outward` is the shortest accepted distance from the point to the
    /// boundary; `distance` is the wire-joint distance.
    pub fn compute(
        point: Point3<f64>,
        normal: Vector3<f64>,
        bounds: &Bound3,
        min_outward: f64,
        distance: f64,
        tolerance: f64,
    ) -> ToolpathResult<Self> {
        let normal_axis = dominant_axis(&normal);
        let outward = nearest_boundary_vector(&point, bounds, normal_axis);
        let reach = outward.norm();
        if reach <= tolerance {
            return Err(ToolpathError::UnsupportedTopology(format!(
                "approach point ({:.3}, {:.3}, {:.3}) lies on the part boundary",
                point.x, point.y, point.z
            )));
        }
        if reach < min_outward {
            return Err(ToolpathError::UnsupportedTopology(format!(
                "approach point is {:.3} from the boundary, below the approach length {:.3}",
                reach, min_outward
            )));
        }
        let dir = outward / reach;

        let flange_end = point + outward;
        let mid1 = point + outward * 0.5;
        let mid2 = mid1 - dir * distance;

        let side = if normal_axis == 2 {
            Vector3::y()
        } else {
            Vector3::x()
        };
        let beside = |mid: Point3<f64>| {
            let offset = side * distance;
            if offset.dot(&dir) < 0.0 {
                mid - offset
            } else {
                mid + offset
            }
        };

        Ok(Self {
            approach_point: point,
            normal,
            flange_end,
            mid1,
            mid2,
            entry1: beside(mid1),
            entry2: beside(mid2),
        })
    }

    /// First entry: severs the scrap with two strokes ending on the profile.
    pub fn approach_strokes(&self) -> [Stroke; 6] {
        [
            Stroke::Rapid { to: self.entry1 },
            Stroke::Cut {
                from: self.entry1,
                to: self.mid1,
            },
            Stroke::Cut {
                from: self.mid1,
                to: self.flange_end,
            },
            Stroke::Rapid { to: self.entry2 },
            Stroke::Cut {
                from: self.entry2,
                to: self.mid2,
            },
            Stroke::Cut {
                from: self.mid2,
                to: self.approach_point,
            },
        ]
    }

    /// Return to the approach point after the first side is machined.
    pub fn reentry_strokes(&self) -> [Stroke; 2] {
        [
            Stroke::Rapid { to: self.mid2 },
            Stroke::Cut {
                from: self.mid2,
                to: self.approach_point,
            },
        ]
    }

    pub fn cut_length(&self) -> f64 {
        self.approach_strokes()
            .iter()
            .chain(self.reentry_strokes().iter())
            .map(Stroke::cut_length)
            .sum()
    }
}

fn dominant_axis(v: &Vector3<f64>) -> usize {
    let abs = v.abs();
    if abs.z >= abs.x && abs.z >= abs.y {
        2
    } else if abs.y >= abs.x {
        1
    } else {
        0
    }
}

/// Shortest vector from `p` to a bounding face, ignoring the faces normal to
/// `skip_axis`.
fn nearest_boundary_vector(p: &Point3<f64>, bounds: &Bound3, skip_axis: usize) -> Vector3<f64> {
    let mut best = Vector3::zeros();
    let mut best_len = f64::INFINITY;
    for axis in (0..3).filter(|&a| a != skip_axis) {
        for face in [bounds.min[axis], bounds.max[axis]] {
            let gap = face - p[axis];
            if gap.abs() < best_len {
                best_len = gap.abs();
                best = Vector3::zeros();
                best[axis] = gap;
            }
        }
    }
    best
}

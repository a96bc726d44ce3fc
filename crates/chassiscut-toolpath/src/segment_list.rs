//! Ordered tooling-segment list and continuity repair.
//!
//! The list owns its segments. Splits and merges replace the whole list rather
//! than patching it in place, so a [`ToolingSegmentList`] handed out earlier is
//! never aliased by a later edit.

use chassiscut_core::{GeometryPort, LengthFrom, Point3, ToolingSegment, Vector3};
use tracing::debug;

use crate::error::{ToolpathError, ToolpathResult};

/// A profile as an ordered list of tooling segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ToolingSegmentList {
    segments: Vec<ToolingSegment>,
}

impl ToolingSegmentList {
    pub fn new(segments: Vec<ToolingSegment>) -> Self {
        Self { segments }
    }

    pub fn as_slice(&self) -> &[ToolingSegment] {
        &self.segments
    }

    pub fn into_inner(self) -> Vec<ToolingSegment> {
        self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ToolingSegment> {
        self.segments.get(index)
    }

    pub fn first(&self) -> Option<&ToolingSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&ToolingSegment> {
        self.segments.last()
    }

    /// Whether the last segment ends where the first begins.
    pub fn is_closed(&self, tolerance: f64) -> bool {
        match (self.first(), self.last()) {
            (Some(first), Some(last)) if self.len() > 1 => {
                (last.end() - first.start()).norm() <= tolerance
            }
            _ => false,
        }
    }

    /// Moves the last segment to the front.
    pub fn rotate_last_to_front(&mut self) {
        if !self.segments.is_empty() {
            self.segments.rotate_right(1);
        }
    }

    /// Inserts a connecting line wherever `end[i]` misses `start[i+1]`.
    ///
    /// Returns the number of segments inserted. Running it again on the result
    /// inserts nothing.
    pub fn repair_continuity(&mut self, geometry: &dyn GeometryPort, tolerance: f64) -> usize {
        let mut inserted = 0;
        let mut i = 0;
        while i + 1 < self.segments.len() {
            let current = self.segments[i];
            let next = self.segments[i + 1];
            let gap = (next.start() - current.end()).norm();
            if gap > tolerance {
                let bridge = ToolingSegment::new(
                    geometry.line(current.end(), next.start()),
                    current.end_normal,
                    next.start_normal,
                );
                debug!(after = i, gap, "bridging profile gap");
                self.segments.insert(i + 1, bridge);
                inserted += 1;
            }
            i += 1;
        }
        inserted
    }

    /// Fails on the first gap larger than `tolerance`.
    pub fn check_continuity(&self, tolerance: f64) -> ToolpathResult<()> {
        check_continuity(&self.segments, tolerance)
    }

    pub fn total_length(&self, geometry: &dyn GeometryPort) -> f64 {
        total_length(geometry, &self.segments)
    }

    /// Cumulative arc length at the end of each segment.
    pub fn cumulative_lengths(&self, geometry: &dyn GeometryPort) -> Vec<f64> {
        cumulative_lengths(geometry, &self.segments)
    }

    /// Index of the segment whose end point is `point`.
    pub fn index_ending_at(&self, point: &Point3<f64>, tolerance: f64) -> Option<usize> {
        index_ending_at(&self.segments, point, tolerance)
    }
}

impl From<Vec<ToolingSegment>> for ToolingSegmentList {
    fn from(segments: Vec<ToolingSegment>) -> Self {
        Self::new(segments)
    }
}

pub fn check_continuity(segments: &[ToolingSegment], tolerance: f64) -> ToolpathResult<()> {
    for (index, pair) in segments.windows(2).enumerate() {
        let gap = (pair[1].start() - pair[0].end()).norm();
        if gap > tolerance {
            return Err(ToolpathError::Discontinuity { index, gap });
        }
    }
    Ok(())
}

pub fn total_length(geometry: &dyn GeometryPort, segments: &[ToolingSegment]) -> f64 {
    segments.iter().map(|s| geometry.length(&s.curve)).sum()
}

pub fn cumulative_lengths(geometry: &dyn GeometryPort, segments: &[ToolingSegment]) -> Vec<f64> {
    let mut acc = 0.0;
    segments
        .iter()
        .map(|s| {
            acc += geometry.length(&s.curve);
            acc
        })
        .collect()
}

pub fn index_ending_at(
    segments: &[ToolingSegment],
    point: &Point3<f64>,
    tolerance: f64,
) -> Option<usize> {
    segments
        .iter()
        .position(|s| (s.end() - point).norm() <= tolerance)
}

/// Segment index and point at arc length `along` from the profile start.
///
/// Lengths exactly on a segment boundary resolve to the segment ending there.
pub fn point_at_arc_length(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    along: f64,
    tolerance: f64,
) -> Option<(usize, Point3<f64>)> {
    let mut before = 0.0;
    for (i, seg) in segments.iter().enumerate() {
        let len = geometry.length(&seg.curve);
        if along <= before + len + tolerance {
            let offset = (along - before).max(0.0);
            if len - offset <= tolerance {
                return Some((i, seg.end()));
            }
            return Some((i, geometry.point_at_length(&seg.curve, offset, LengthFrom::Start)));
        }
        before += len;
    }
    None
}

/// Linear blend of two normals, normalized. Falls back to `a` when the
/// blend cancels out.
pub fn interpolate_normal(a: &Vector3<f64>, b: &Vector3<f64>, t: f64) -> Vector3<f64> {
    let blended = a * (1.0 - t) + b * t;
    let norm = blended.norm();
    if norm <= f64::EPSILON {
        *a
    } else {
        blended / norm
    }
}

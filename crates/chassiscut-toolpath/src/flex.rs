//! Flex locator.
//!
//! A segment is flange-resident when both of its normals classify to the same
//! flange; otherwise it sits on a flex (bend). Consecutive flex segments are
//! merged into [`FlexRange`]s.

use chassiscut_core::{Flange, GeometryPort, ToolingSegment};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ToolpathError, ToolpathResult};
use crate::segment_list::ToolingSegmentList;

/// Inclusive index range of a contiguous flex run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexRange {
    pub start: usize,
    pub end: usize,
}

impl FlexRange {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.start <= index && index <= self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }
}

/// Flange of one segment, or [`Flange::Flex`] when its normals disagree.
pub fn classify_segment(
    geometry: &dyn GeometryPort,
    segment: &ToolingSegment,
    tolerance: f64,
) -> ToolpathResult<Flange> {
    let start = geometry.classify_normal(&segment.start_normal, tolerance)?;
    let end = geometry.classify_normal(&segment.end_normal, tolerance)?;
    if start == end {
        Ok(start)
    } else {
        Ok(Flange::Flex)
    }
}

pub fn classify_segments(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    tolerance: f64,
) -> ToolpathResult<Vec<Flange>> {
    segments
        .iter()
        .map(|s| classify_segment(geometry, s, tolerance))
        .collect()
}

/// Groups consecutive flex-resident segments into ranges.
pub fn locate_flex_ranges(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    tolerance: f64,
) -> ToolpathResult<Vec<FlexRange>> {
    let flanges = classify_segments(geometry, segments, tolerance)?;
    Ok(group_flex_runs(&flanges))
}

pub(crate) fn group_flex_runs(flanges: &[Flange]) -> Vec<FlexRange> {
    let mut ranges = Vec::new();
    let mut open: Option<usize> = None;
    for (i, flange) in flanges.iter().enumerate() {
        match (flange.is_flex(), open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                ranges.push(FlexRange::new(start, i - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        ranges.push(FlexRange::new(start, flanges.len() - 1));
    }
    ranges
}

/// Rotates the list until segment 0 lies on a flange.
///
/// Returns the number of rotations applied.
pub fn rotate_to_flange_start(
    geometry: &dyn GeometryPort,
    list: &mut ToolingSegmentList,
    tolerance: f64,
) -> ToolpathResult<usize> {
    rotate_until(geometry, list, tolerance, false)
}

/// Rotates the list until both the first and last segment lie on a flange,
/// so no flex run wraps around the list ends.
pub fn rotate_to_flange_ends(
    geometry: &dyn GeometryPort,
    list: &mut ToolingSegmentList,
    tolerance: f64,
) -> ToolpathResult<usize> {
    rotate_until(geometry, list, tolerance, true)
}

fn rotate_until(
    geometry: &dyn GeometryPort,
    list: &mut ToolingSegmentList,
    tolerance: f64,
    both_ends: bool,
) -> ToolpathResult<usize> {
    let on_flange = |seg: Option<&ToolingSegment>| -> ToolpathResult<bool> {
        match seg {
            Some(s) => Ok(!classify_segment(geometry, s, tolerance)?.is_flex()),
            None => Ok(false),
        }
    };
    for rotations in 0..list.len() {
        let ready = on_flange(list.first())? && (!both_ends || on_flange(list.last())?);
        if ready {
            if rotations > 0 {
                debug!(rotations, "rotated profile onto a flange start");
            }
            return Ok(rotations);
        }
        list.rotate_last_to_front();
    }
    Err(ToolpathError::UnsupportedTopology(
        "profile has no flange-resident segment to start from".to_string(),
    ))
}

//! Segment splitting and index renumbering.
//!
//! Splitting a segment shifts every index after it. [`split_and_renumber`]
//! does the split, shifts the blocks, re-runs the sanity checks and hands back
//! the [`IndexRemap`] for any other indices the caller holds. On error the
//! caller's list and blocks are untouched.

use chassiscut_core::{GeometryError, GeometryPort, Point3, SynthesisConfig, ToolingSegment};
use tracing::debug;

use crate::block::{Block, Direction};
use crate::error::{InvariantRule, ToolpathError, ToolpathResult};
use crate::sanity::{check_coverage, check_sanity};
use crate::segment_list::{
    index_ending_at, interpolate_normal, point_at_arc_length, total_length,
};

/// Index shift produced by one split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexRemap {
    /// Index of the segment that was split
    pub at: usize,
    /// Number of segments added after it
    pub inserted: usize,
}

impl IndexRemap {
    pub fn apply(&self, index: usize) -> usize {
        if index > self.at {
            index + self.inserted
        } else {
            index
        }
    }
}

/// Result of [`split_and_renumber`].
#[derive(Debug, Clone)]
pub struct SplitOutcome {
    pub segments: Vec<ToolingSegment>,
    pub blocks: Vec<Block>,
    pub remap: IndexRemap,
}

/// Splits `segments[index]` at `point` into one or two tooling segments.
///
/// Line pieces get normals interpolated by arc-length fraction. Arc pieces
/// keep the parent's normals.
pub fn split_at(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    index: usize,
    point: &Point3<f64>,
    tolerance: f64,
) -> ToolpathResult<Vec<ToolingSegment>> {
    let parent = segments.get(index).ok_or_else(|| {
        ToolpathError::violation(
            InvariantRule::IndexRange,
            format!("split index {} of {} segments", index, segments.len()),
        )
    })?;
    if !geometry.is_point_on_curve(&parent.curve, point, tolerance) {
        return Err(GeometryError::PointNotOnCurve {
            x: point.x,
            y: point.y,
            z: point.z,
        }
        .into());
    }

    let curves = geometry.split_at(&parent.curve, point, tolerance)?;
    let [first, second] = match curves.as_slice() {
        [first, second] => [*first, *second],
        _ => return Ok(vec![*parent]),
    };

    if parent.curve.is_arc() {
        return Ok(vec![
            ToolingSegment::new(first, parent.start_normal, parent.end_normal),
            ToolingSegment::new(second, parent.start_normal, parent.end_normal),
        ]);
    }

    let total = geometry.length(&parent.curve);
    let t = if total > 0.0 {
        geometry.length(&first) / total
    } else {
        0.5
    };
    let mid = interpolate_normal(&parent.start_normal, &parent.end_normal, t);
    Ok(vec![
        ToolingSegment::new(first, parent.start_normal, mid),
        ToolingSegment::new(second, mid, parent.end_normal),
    ])
}

/// New list with `segments[index]` replaced by `pieces`.
pub fn merge(
    pieces: Vec<ToolingSegment>,
    segments: &[ToolingSegment],
    index: usize,
) -> Vec<ToolingSegment> {
    let mut merged = Vec::with_capacity(segments.len() + pieces.len());
    merged.extend_from_slice(&segments[..index]);
    merged.extend(pieces);
    if index < segments.len() {
        merged.extend_from_slice(&segments[index + 1..]);
    }
    merged
}

/// Splits, merges and renumbers in one step, then re-checks the result.
///
/// Blocks that covered every segment before the split must still do so
/// afterwards.
pub fn split_and_renumber(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    blocks: &[Block],
    index: usize,
    point: &Point3<f64>,
    config: &SynthesisConfig,
) -> ToolpathResult<SplitOutcome> {
    let covered = !blocks.is_empty() && check_coverage(blocks, segments.len()).is_ok();
    let pieces = split_at(geometry, segments, index, point, config.tolerance)?;
    let remap = IndexRemap {
        at: index,
        inserted: pieces.len() - 1,
    };
    let segments = merge(pieces, segments, index);
    let blocks: Vec<Block> = blocks
        .iter()
        .map(|b| b.renumbered(remap.at, remap.inserted))
        .collect();
    check_sanity(geometry, &segments, &blocks, config)?;
    if covered {
        check_coverage(&blocks, segments.len())?;
    }
    if remap.inserted > 0 {
        debug!(at = remap.at, segments = segments.len(), "split segment");
    }
    Ok(SplitOutcome {
        segments,
        blocks,
        remap,
    })
}

/// Splits at arc length `along` and returns the outcome with the index of the
/// segment that now ends at that point.
pub fn split_at_arc_length(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    blocks: &[Block],
    along: f64,
    config: &SynthesisConfig,
) -> ToolpathResult<(SplitOutcome, usize)> {
    let total = total_length(geometry, segments);
    let not_found = |reason: &str| ToolpathError::LandmarkNotFound {
        fraction: if total > 0.0 { along / total } else { 0.0 },
        reason: reason.to_string(),
    };
    let (index, point) = point_at_arc_length(geometry, segments, along, config.tolerance)
        .ok_or_else(|| not_found("length runs past the profile"))?;
    let outcome = split_and_renumber(geometry, segments, blocks, index, &point, config)?;
    let ending = index_ending_at(&outcome.segments, &point, config.tolerance)
        .ok_or_else(|| not_found("split point is not a segment end"))?;
    Ok((outcome, ending))
}

/// Splits at every arc length in `targets`, nearest the start first.
///
/// Returns the new list and, for each target in the order given, the index
/// of the segment that ends there. Equal targets resolve to the same index.
pub fn split_at_arc_lengths(
    geometry: &dyn GeometryPort,
    segments: Vec<ToolingSegment>,
    targets: &[f64],
    config: &SynthesisConfig,
) -> ToolpathResult<(Vec<ToolingSegment>, Vec<usize>)> {
    let mut order: Vec<usize> = (0..targets.len()).collect();
    order.sort_by(|&a, &b| targets[a].total_cmp(&targets[b]));

    let mut segments = segments;
    let mut resolved: Vec<Option<usize>> = vec![None; targets.len()];
    for i in order {
        let (outcome, ending) =
            split_at_arc_length(geometry, &segments, &[], targets[i], config)?;
        for index in resolved.iter_mut().flatten() {
            *index = outcome.remap.apply(*index);
        }
        resolved[i] = Some(ending);
        segments = outcome.segments;
    }
    Ok((segments, resolved.into_iter().flatten().collect()))
}

/// Arc length `distance` away from `from`, walking in `direction`.
pub fn offset_arc_length(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    from: f64,
    distance: f64,
    direction: Direction,
) -> ToolpathResult<f64> {
    let total = total_length(geometry, segments);
    let target = match direction {
        Direction::Forward => from + distance,
        Direction::Reverse => from - distance,
    };
    if target <= 0.0 || target >= total {
        return Err(ToolpathError::UnsupportedTopology(format!(
            "wire joint of {:.3} from {:.3} leaves the profile (length {:.3})",
            distance, from, total
        )));
    }
    Ok(target)
}

//! Sanity checks over a segment list and its block sequence.
//!
//! These run after every structural edit, not only on the final plan. A
//! failure names the broken [`InvariantRule`] and the offending indices.

use chassiscut_core::{GeometryPort, SynthesisConfig, ToolingSegment};

use crate::block::{Block, Direction};
use crate::error::{InvariantRule, ToolpathError, ToolpathResult};
use crate::segment_list::check_continuity;

/// Continuity of the segments followed by every block rule.
pub fn check_sanity(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    blocks: &[Block],
    config: &SynthesisConfig,
) -> ToolpathResult<()> {
    check_continuity(segments, config.tolerance).map_err(|e| match e {
        ToolpathError::Discontinuity { index, gap } => ToolpathError::violation(
            InvariantRule::Continuity,
            format!("segment {} misses segment {} by {:.6}", index, index + 1, gap),
        ),
        other => other,
    })?;
    check_block_invariants(geometry, segments, blocks, config)
}

/// Index range, direction, wire-joint and ordering rules of a block list.
pub fn check_block_invariants(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    blocks: &[Block],
    config: &SynthesisConfig,
) -> ToolpathResult<()> {
    let n = segments.len();
    let distance = config.effective_wire_joint_distance();

    for (i, block) in blocks.iter().enumerate() {
        if block.high() >= n {
            return Err(ToolpathError::violation(
                InvariantRule::IndexRange,
                format!(
                    "block {} ({:?}) reaches index {} of {} segments",
                    i,
                    block.kind,
                    block.high(),
                    n
                ),
            ));
        }

        let direction_ok = match block.kind.direction() {
            Some(Direction::Forward) => block.start_index <= block.end_index,
            Some(Direction::Reverse) => block.start_index >= block.end_index,
            None => !block.kind.is_maneuver() || block.start_index == block.end_index,
        };
        if !direction_ok {
            return Err(ToolpathError::violation(
                InvariantRule::Direction,
                format!(
                    "block {} ({:?}) runs {} -> {}",
                    i, block.kind, block.start_index, block.end_index
                ),
            ));
        }

        if block.kind.is_wire_joint() {
            if block.start_index != block.end_index {
                return Err(ToolpathError::violation(
                    InvariantRule::WireJointSingleSegment,
                    format!(
                        "block {} ({:?}) spans {}..{}",
                        i, block.kind, block.start_index, block.end_index
                    ),
                ));
            }
            check_wire_joint_length(
                geometry,
                segments,
                block.start_index,
                distance,
                config.wire_joint_tolerance,
            )?;
        }
    }

    for (i, pair) in blocks.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        let ordered = match (prev.kind.direction(), next.kind.direction()) {
            (Some(Direction::Forward), Some(Direction::Forward)) => {
                prev.end_index < next.start_index
            }
            (Some(Direction::Reverse), Some(Direction::Reverse)) => {
                prev.end_index > next.start_index
            }
            _ => true,
        };
        if !ordered {
            return Err(ToolpathError::violation(
                InvariantRule::BlockOrder,
                format!(
                    "block {} ends at {} but block {} starts at {}",
                    i,
                    prev.end_index,
                    i + 1,
                    next.start_index
                ),
            ));
        }
    }

    for (i, block) in blocks.iter().enumerate() {
        if !block.kind.is_flex() {
            continue;
        }
        let bracket = |other: Option<&Block>| {
            other.is_some_and(|b| {
                b.kind.is_flex_wire_joint() && b.kind.direction() == block.kind.direction()
            })
        };
        let before = i.checked_sub(1).and_then(|j| blocks.get(j));
        if !bracket(before) || !bracket(blocks.get(i + 1)) {
            return Err(ToolpathError::violation(
                InvariantRule::FlexBracketing,
                format!(
                    "flex block {} ({}..{}) lacks a wire joint on both sides",
                    i, block.start_index, block.end_index
                ),
            ));
        }
    }

    Ok(())
}

/// The segment at `index` must match `distance`, or a run of segments
/// ending (or starting) at `index` must add up to it.
pub fn check_wire_joint_length(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    index: usize,
    distance: f64,
    tolerance: f64,
) -> ToolpathResult<()> {
    let length = |j: usize| geometry.length(&segments[j].curve);
    if (length(index) - distance).abs() <= tolerance {
        return Ok(());
    }

    let reconciles = |order: &mut dyn Iterator<Item = usize>| {
        let mut sum = 0.0;
        for j in order {
            sum += length(j);
            if (sum - distance).abs() <= tolerance {
                return true;
            }
            if sum > distance + tolerance {
                break;
            }
        }
        false
    };
    if reconciles(&mut (0..=index).rev()) || reconciles(&mut (index..segments.len())) {
        return Ok(());
    }

    Err(ToolpathError::violation(
        InvariantRule::WireJointLength,
        format!(
            "segment {} is {:.4} long, expected {:.4} +/- {}",
            index,
            length(index),
            distance,
            tolerance
        ),
    ))
}

/// Every segment must be covered by exactly one covering block.
pub fn check_coverage(blocks: &[Block], segment_count: usize) -> ToolpathResult<()> {
    let mut hits = vec![0usize; segment_count];
    for block in blocks.iter().filter(|b| b.kind.covers_segments()) {
        for idx in block.low()..=block.high() {
            match hits.get_mut(idx) {
                Some(h) => *h += 1,
                None => {
                    return Err(ToolpathError::violation(
                        InvariantRule::IndexRange,
                        format!("index {} of {} segments", idx, segment_count),
                    ))
                }
            }
        }
    }
    if let Some((idx, count)) = hits.iter().enumerate().find(|&(_, &h)| h != 1) {
        return Err(ToolpathError::violation(
            InvariantRule::Coverage,
            format!("segment {} covered {} times", idx, count),
        ));
    }
    Ok(())
}

//! Fractional-length landmarks.
//!
//! Wire joints and the notch approach are anchored at 25%, 50% and 75% of the
//! profile length. A landmark that lands on a flex run, or too close to one,
//! is moved or dropped:
//!
//! - 25% / 75%: moved to 12.5% / 87.5% when enough length remains toward the
//!   nearer profile end, dropped otherwise
//! - 50%: moved to 40% when it lies inside or near a flex run

use chassiscut_core::{GeometryPort, LengthFrom, Point3, SynthesisConfig, ToolingSegment};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ToolpathError, ToolpathResult};
use crate::flex::FlexRange;
use crate::segment_list::total_length;

/// Bounds on the fraction a landmark can be asked for.
const FRACTION_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandmarkPosition {
    Quarter,
    Half,
    ThreeQuarter,
}

impl LandmarkPosition {
    pub const ALL: [LandmarkPosition; 3] = [
        LandmarkPosition::Quarter,
        LandmarkPosition::Half,
        LandmarkPosition::ThreeQuarter,
    ];

    pub fn nominal_fraction(self) -> f64 {
        match self {
            LandmarkPosition::Quarter => 0.25,
            LandmarkPosition::Half => 0.5,
            LandmarkPosition::ThreeQuarter => 0.75,
        }
    }
}

/// A point at a fraction of the profile length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub position: LandmarkPosition,
    /// Fraction actually used, after any relocation
    pub fraction: f64,
    pub point: Point3<f64>,
    /// Segment containing `point`
    pub segment_index: usize,
    /// Arc length from the profile start to `point`
    pub arc_length: f64,
}

/// All landmarks that fall on one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkRecord {
    pub segment_index: usize,
    pub points: Vec<(LandmarkPosition, Point3<f64>)>,
}

/// The three landmarks of a profile; `None` marks a dropped one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    pub quarter: Option<Landmark>,
    pub half: Option<Landmark>,
    pub three_quarter: Option<Landmark>,
}

impl LandmarkSet {
    pub fn get(&self, position: LandmarkPosition) -> Option<&Landmark> {
        match position {
            LandmarkPosition::Quarter => self.quarter.as_ref(),
            LandmarkPosition::Half => self.half.as_ref(),
            LandmarkPosition::ThreeQuarter => self.three_quarter.as_ref(),
        }
    }

    /// Surviving landmarks in profile order.
    pub fn iter(&self) -> impl Iterator<Item = &Landmark> {
        [&self.quarter, &self.half, &self.three_quarter]
            .into_iter()
            .filter_map(Option::as_ref)
    }

    /// One record per segment index, merging landmarks that share a segment.
    pub fn records(&self) -> Vec<LandmarkRecord> {
        let mut records: Vec<LandmarkRecord> = Vec::new();
        for lm in self.iter() {
            match records
                .iter_mut()
                .find(|r| r.segment_index == lm.segment_index)
            {
                Some(record) => record.points.push((lm.position, lm.point)),
                None => records.push(LandmarkRecord {
                    segment_index: lm.segment_index,
                    points: vec![(lm.position, lm.point)],
                }),
            }
        }
        records
    }
}

/// Where an arc-length position sits relative to the flex runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexProximity {
    Inside,
    Near,
    Clear,
}

/// Arc-length interval covered by a flex run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlexSpan {
    pub start: f64,
    pub end: f64,
}

pub fn flex_spans(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    ranges: &[FlexRange],
) -> Vec<FlexSpan> {
    let mut starts = Vec::with_capacity(segments.len());
    let mut acc = 0.0;
    for seg in segments {
        starts.push(acc);
        acc += geometry.length(&seg.curve);
    }
    ranges
        .iter()
        .filter(|r| r.end < segments.len())
        .map(|r| FlexSpan {
            start: starts[r.start],
            end: starts[r.end] + geometry.length(&segments[r.end].curve),
        })
        .collect()
}

pub fn flex_proximity(
    arc_length: f64,
    spans: &[FlexSpan],
    threshold: f64,
    tolerance: f64,
) -> FlexProximity {
    let mut near = false;
    for span in spans {
        if arc_length >= span.start - tolerance && arc_length <= span.end + tolerance {
            return FlexProximity::Inside;
        }
        let before = span.start - arc_length;
        let after = arc_length - span.end;
        if (before > 0.0 && before < threshold) || (after > 0.0 && after < threshold) {
            near = true;
        }
    }
    if near {
        FlexProximity::Near
    } else {
        FlexProximity::Clear
    }
}

/// Point at `fraction` of the total length.
///
/// A point within `least_curve_length` of a segment boundary snaps to that
/// boundary, so no sliver segment is produced when the profile is split
/// there.
pub fn locate_fraction(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    position: LandmarkPosition,
    fraction: f64,
    least_curve_length: f64,
) -> ToolpathResult<Landmark> {
    let not_found = |reason: &str| ToolpathError::LandmarkNotFound {
        fraction,
        reason: reason.to_string(),
    };
    if !(fraction > FRACTION_EPSILON && fraction < 1.0 - FRACTION_EPSILON) {
        return Err(not_found("fraction must lie strictly inside (0, 1)"));
    }
    let total = total_length(geometry, segments);
    if total <= 0.0 {
        return Err(not_found("profile has no length"));
    }

    let target = fraction * total;
    let mut before = 0.0;
    for (i, seg) in segments.iter().enumerate() {
        let len = geometry.length(&seg.curve);
        if target <= before + len {
            let offset = target - before;
            let (segment_index, point, arc_length) = if offset < least_curve_length && i > 0 {
                (i - 1, segments[i - 1].end(), before)
            } else if len - offset < least_curve_length {
                (i, seg.end(), before + len)
            } else {
                let p = geometry.point_at_length(&seg.curve, offset, LengthFrom::Start);
                (i, p, target)
            };
            return Ok(Landmark {
                position,
                fraction,
                point,
                segment_index,
                arc_length,
            });
        }
        before += len;
    }
    Err(not_found("length runs past the last segment"))
}

/// Computes the 25/50/75% landmarks and applies the flex relocation rules.
pub fn compute_landmarks(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    flex_ranges: &[FlexRange],
    config: &SynthesisConfig,
) -> ToolpathResult<LandmarkSet> {
    let spans = flex_spans(geometry, segments, flex_ranges);
    let total = total_length(geometry, segments);
    let locate = |position: LandmarkPosition, fraction: f64| {
        locate_fraction(
            geometry,
            segments,
            position,
            fraction,
            config.least_curve_length,
        )
    };
    let proximity = |lm: &Landmark| {
        flex_proximity(
            lm.arc_length,
            &spans,
            config.flex_proximity_threshold,
            config.tolerance,
        )
    };

    let edge = |position: LandmarkPosition, fallback: f64| -> ToolpathResult<Option<Landmark>> {
        let lm = locate(position, position.nominal_fraction())?;
        if proximity(&lm) == FlexProximity::Clear {
            return Ok(Some(lm));
        }
        let remaining = match position {
            LandmarkPosition::ThreeQuarter => total - lm.arc_length,
            _ => lm.arc_length,
        };
        if remaining <= config.min_notch_length_threshold {
            debug!(?position, remaining, "dropping landmark on flex");
            return Ok(None);
        }
        let moved = locate(position, fallback)?;
        if proximity(&moved) == FlexProximity::Clear {
            debug!(?position, fallback, "relocated landmark off flex");
            Ok(Some(moved))
        } else {
            debug!(?position, fallback, "relocated landmark still on flex, dropping");
            Ok(None)
        }
    };

    let quarter = edge(LandmarkPosition::Quarter, config.edge_landmark_fallbacks.0)?;
    let three_quarter = edge(
        LandmarkPosition::ThreeQuarter,
        config.edge_landmark_fallbacks.1,
    )?;

    // Near counts as on flex: the approach needs a wire joint of room
    let mut half = Some(locate(LandmarkPosition::Half, 0.5)?);
    if let Some(lm) = half.filter(|lm| proximity(lm) != FlexProximity::Clear) {
        let moved = locate(LandmarkPosition::Half, config.mid_landmark_fallback)?;
        if proximity(&moved) == FlexProximity::Inside {
            warn!(
                arc_length = lm.arc_length,
                "mid landmark and its fallback both lie on flex"
            );
            half = None;
        } else {
            half = Some(moved);
        }
    }

    Ok(LandmarkSet {
        quarter,
        half,
        three_quarter,
    })
}

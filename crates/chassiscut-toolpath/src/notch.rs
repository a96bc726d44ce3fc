//! Notch planning.
//!
//! A notch is an open profile cut into the part from an edge. It is entered
//! through the approach maneuver at its mid landmark, machined to one end,
//! re-entered at the mid landmark and machined to the other end.
//!
//! An edge notch runs along the part boundary, or has no room for the
//! approach. It is machined straight through from its first segment.
//!
//! Pipeline:
//!
//! 1. repair continuity and reject unsupported topologies
//! 2. compute landmarks on the unsplit profile
//! 3. split at the approach, landmark and flex wire-joint points
//! 4. synthesize the forward and reverse runs
//! 5. wrap them in the approach, gambit and re-entry maneuvers
//! 6. check the whole block list

use chassiscut_core::{Bound3, GeometryPort, Point3, SynthesisConfig, ToolingSegment};
use tracing::{debug, warn};

use crate::approach::{ApproachGeometry, EntryOrder};
use crate::block::{Block, Direction, SectionKind};
use crate::error::{InvariantRule, ToolpathError, ToolpathResult};
use crate::flex::{group_flex_runs, FlexRange};
use crate::landmarks::{compute_landmarks, flex_spans, FlexSpan, Landmark, LandmarkPosition};
use crate::planner::{classify_profile, prepare_segments, PlannedProfile, ProfileKind};
use crate::sanity::{check_coverage, check_sanity};
use crate::splitter::{offset_arc_length, split_at_arc_lengths};
use crate::synthesizer::{
    ApproachIndices, Entry, FlexIndices, LandmarkIndices, SequenceIndices, SequenceSynthesizer,
};

/// Most flex runs a notch may cross.
const MAX_NOTCH_FLEX_RUNS: usize = 2;

/// What a split point is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Anchor {
    PreApproach,
    Approach,
    PostApproach,
    At(LandmarkPosition),
    Post(LandmarkPosition),
    FlexBoundary,
}

/// Split points plus the arc-length windows they reserve. Two wire joints
/// never share a window.
#[derive(Debug, Default)]
pub(crate) struct SplitTargets {
    targets: Vec<(f64, Anchor)>,
    windows: Vec<(f64, f64)>,
    tolerance: f64,
}

impl SplitTargets {
    pub(crate) fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    /// Claims `[from, to]`; `false` if it touches a claimed window.
    fn reserve(&mut self, from: f64, to: f64) -> bool {
        let tol = self.tolerance;
        if self
            .windows
            .iter()
            .any(|&(a, b)| from <= b + tol && a <= to + tol)
        {
            return false;
        }
        self.windows.push((from, to));
        true
    }

    fn push(&mut self, arc_length: f64, anchor: Anchor) {
        self.targets.push((arc_length, anchor));
    }

    /// Wire-joint points one distance outside every flex span.
    pub(crate) fn add_flex_boundaries(
        &mut self,
        geometry: &dyn GeometryPort,
        segments: &[ToolingSegment],
        spans: &[FlexSpan],
        distance: f64,
    ) -> ToolpathResult<()> {
        for span in spans {
            let before =
                offset_arc_length(geometry, segments, span.start, distance, Direction::Reverse)?;
            let after =
                offset_arc_length(geometry, segments, span.end, distance, Direction::Forward)?;
            if !self.reserve(before, after) {
                return Err(ToolpathError::UnsupportedTopology(format!(
                    "flex runs at {:.3}..{:.3} leave no room for wire joints",
                    span.start, span.end
                )));
            }
            self.push(before, Anchor::FlexBoundary);
            self.push(after, Anchor::FlexBoundary);
        }
        Ok(())
    }

    /// Wire joints at `landmarks`. A landmark whose joint would collide with
    /// one already placed is skipped.
    pub(crate) fn add_landmarks<'a>(
        &mut self,
        geometry: &dyn GeometryPort,
        segments: &[ToolingSegment],
        landmarks: impl IntoIterator<Item = &'a Landmark>,
        distance: f64,
    ) {
        for lm in landmarks {
            let post = match offset_arc_length(
                geometry,
                segments,
                lm.arc_length,
                distance,
                Direction::Forward,
            ) {
                Ok(post) => post,
                Err(e) => {
                    warn!(position = ?lm.position, error = %e, "landmark wire joint skipped");
                    continue;
                }
            };
            if !self.reserve(lm.arc_length, post) {
                warn!(
                    position = ?lm.position,
                    arc_length = lm.arc_length,
                    "landmark wire joint overlaps another, skipped"
                );
                continue;
            }
            self.push(lm.arc_length, Anchor::At(lm.position));
            self.push(post, Anchor::Post(lm.position));
        }
    }

    /// Splits the profile at every target.
    pub(crate) fn apply(
        self,
        geometry: &dyn GeometryPort,
        segments: Vec<ToolingSegment>,
        config: &SynthesisConfig,
    ) -> ToolpathResult<(Vec<ToolingSegment>, ResolvedAnchors)> {
        let arcs: Vec<f64> = self.targets.iter().map(|(arc, _)| *arc).collect();
        let (segments, ends) = split_at_arc_lengths(geometry, segments, &arcs, config)?;
        let resolved = self
            .targets
            .iter()
            .map(|(_, anchor)| *anchor)
            .zip(ends)
            .collect();
        Ok((segments, ResolvedAnchors(resolved)))
    }
}

/// Index of the segment ending at each split point.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedAnchors(Vec<(Anchor, usize)>);

impl ResolvedAnchors {
    fn index(&self, anchor: Anchor) -> ToolpathResult<usize> {
        self.0
            .iter()
            .find(|(a, _)| *a == anchor)
            .map(|(_, i)| *i)
            .ok_or_else(|| {
                ToolpathError::violation(
                    InvariantRule::IndexRange,
                    format!("no segment ends at the {:?} point", anchor),
                )
            })
    }

    pub(crate) fn landmarks(&self) -> ToolpathResult<Vec<LandmarkIndices>> {
        self.0
            .iter()
            .filter_map(|(anchor, at)| match anchor {
                Anchor::At(position) => Some((*position, *at)),
                _ => None,
            })
            .map(|(position, at)| {
                Ok(LandmarkIndices {
                    position,
                    at,
                    post: self.index(Anchor::Post(position))?,
                })
            })
            .collect()
    }
}

/// Flex runs of a split profile with their bracketing wire-joint segments.
pub(crate) fn bracket_flex_runs(
    ranges: &[FlexRange],
    segment_count: usize,
) -> ToolpathResult<Vec<FlexIndices>> {
    ranges
        .iter()
        .map(|r| {
            FlexIndices::bracketing(*r, segment_count).ok_or_else(|| {
                ToolpathError::UnsupportedTopology(format!(
                    "flex run {}..{} touches an end of the profile",
                    r.start, r.end
                ))
            })
        })
        .collect()
}

/// Whether a notch is machined as an edge notch.
///
/// A notch that cuts in from the part edge starts and ends within twice the
/// approach length of the XMin, XMax or ZMin face. Anything else runs along
/// the boundary.
pub fn is_edge_notch(
    segments: &[ToolingSegment],
    bounds: &Bound3,
    config: &SynthesisConfig,
) -> bool {
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return true;
    };
    let reach = 2.0 * config.approach_length;
    let on_edge = |p: Point3<f64>| {
        (p.x - bounds.min.x).abs() <= reach
            || (p.x - bounds.max.x).abs() <= reach
            || (p.z - bounds.min.z).abs() <= reach
    };
    !(on_edge(first.start()) && on_edge(last.end()))
}

/// Splits at `targets` and machines the whole profile in one forward run
/// entered at segment 0.
pub(crate) fn plan_direct_run(
    geometry: &dyn GeometryPort,
    segments: Vec<ToolingSegment>,
    targets: SplitTargets,
    config: &SynthesisConfig,
) -> ToolpathResult<(Vec<ToolingSegment>, Vec<Block>)> {
    let (segments, resolved) = targets.apply(geometry, segments, config)?;
    let n = segments.len();
    let flanges = classify_profile(geometry, &segments, config.tolerance)?;
    let indices = SequenceIndices {
        entry: Entry::Direct,
        landmarks: resolved.landmarks()?,
        flexes: bracket_flex_runs(&group_flex_runs(&flanges), n)?,
        segment_count: n,
    };

    let blocks = SequenceSynthesizer::new(&indices, &flanges)?.synthesize(Direction::Forward)?;
    check_sanity(geometry, &segments, &blocks, config)?;
    check_coverage(&blocks, n)?;
    Ok((segments, blocks))
}

/// Edge notch: flex runs keep their wire joints, nothing else is left
/// uncut.
fn plan_edge_notch(
    geometry: &dyn GeometryPort,
    segments: Vec<ToolingSegment>,
    flex_ranges: &[FlexRange],
    config: &SynthesisConfig,
) -> ToolpathResult<PlannedProfile> {
    let mut targets = SplitTargets::new(config.tolerance);
    let spans = flex_spans(geometry, &segments, flex_ranges);
    targets.add_flex_boundaries(
        geometry,
        &segments,
        &spans,
        config.effective_wire_joint_distance(),
    )?;
    let (segments, blocks) = plan_direct_run(geometry, segments, targets, config)?;
    debug!(segments = segments.len(), blocks = blocks.len(), "edge notch planned");

    Ok(PlannedProfile::new(
        geometry,
        ProfileKind::Notch,
        segments,
        blocks,
        None,
        None,
    ))
}

/// Plans a notch profile.
///
/// `bounds` is the bounding box of the whole part; the approach heads for
/// its nearest face.
pub fn plan_notch(
    geometry: &dyn GeometryPort,
    segments: Vec<ToolingSegment>,
    bounds: &Bound3,
    config: &SynthesisConfig,
) -> ToolpathResult<PlannedProfile> {
    let tol = config.tolerance;
    let segments = prepare_segments(geometry, segments, config, 2)?.into_inner();

    let flanges = classify_profile(geometry, &segments, tol)?;
    let flex_ranges = group_flex_runs(&flanges);
    if flex_ranges.len() > MAX_NOTCH_FLEX_RUNS {
        return Err(ToolpathError::UnsupportedTopology(format!(
            "notch crosses {} flex runs, at most {} supported",
            flex_ranges.len(),
            MAX_NOTCH_FLEX_RUNS
        )));
    }
    bracket_flex_runs(&flex_ranges, segments.len())?;
    if is_edge_notch(&segments, bounds, config) {
        return plan_edge_notch(geometry, segments, &flex_ranges, config);
    }

    let landmarks = compute_landmarks(geometry, &segments, &flex_ranges, config)?;
    let half = landmarks.half.ok_or_else(|| ToolpathError::LandmarkNotFound {
        fraction: config.mid_landmark_fallback,
        reason: "mid landmark and its fallback both lie on flex".to_string(),
    })?;
    let d = config.effective_wire_joint_distance();
    let maneuver = match ApproachGeometry::compute(
        half.point,
        segments[half.segment_index].end_normal,
        bounds,
        config.approach_length,
        d,
        tol,
    ) {
        Ok(maneuver) => maneuver,
        Err(e) => {
            debug!(error = %e, "no approach at the mid landmark");
            return plan_edge_notch(geometry, segments, &flex_ranges, config);
        }
    };

    let mut targets = SplitTargets::new(tol);
    let spans = flex_spans(geometry, &segments, &flex_ranges);
    targets.add_flex_boundaries(geometry, &segments, &spans, d)?;
    let pre = offset_arc_length(geometry, &segments, half.arc_length, d, Direction::Reverse)?;
    let post = offset_arc_length(geometry, &segments, half.arc_length, d, Direction::Forward)?;
    if !targets.reserve(pre, post) {
        return Err(ToolpathError::UnsupportedTopology(format!(
            "approach at {:.3} is within a wire joint of a flex run",
            half.arc_length
        )));
    }
    targets.push(pre, Anchor::PreApproach);
    targets.push(half.arc_length, Anchor::Approach);
    targets.push(post, Anchor::PostApproach);
    if config.landmark_wire_joints() {
        let edges = [&landmarks.quarter, &landmarks.three_quarter];
        targets.add_landmarks(geometry, &segments, edges.into_iter().flatten(), d);
    }

    let (segments, resolved) = targets.apply(geometry, segments, config)?;
    let n = segments.len();
    let approach = ApproachIndices {
        pre: resolved.index(Anchor::PreApproach)?,
        approach: resolved.index(Anchor::Approach)?,
        post: resolved.index(Anchor::PostApproach)?,
    };
    let flanges = classify_profile(geometry, &segments, tol)?;
    let indices = SequenceIndices {
        entry: Entry::Approach(approach),
        landmarks: resolved.landmarks()?,
        flexes: bracket_flex_runs(&group_flex_runs(&flanges), n)?,
        segment_count: n,
    };
    debug!(?indices, "notch sequence indices");

    let synthesizer = SequenceSynthesizer::new(&indices, &flanges)?;
    let forward = synthesizer.synthesize(Direction::Forward)?;
    let reverse = synthesizer.synthesize(Direction::Reverse)?;

    let a = approach.approach;
    let entry = EntryOrder::for_profile(&segments, bounds);

    let single =
        |kind: SectionKind, index: usize| Block::single(kind, index).with_flange(flanges[index]);
    let gambit_pre = Block::new(SectionKind::GambitPreApproach, a, approach.pre + 1)
        .with_flange(flanges[a]);
    let gambit_post = Block::new(SectionKind::GambitPostApproach, a + 1, approach.post)
        .with_flange(flanges[a + 1]);

    let mut blocks = Vec::with_capacity(forward.len() + reverse.len() + 5);
    blocks.push(single(SectionKind::ApproachMachining, a));
    match entry {
        EntryOrder::ForwardFirst => {
            blocks.extend([gambit_pre, gambit_post]);
            blocks.extend(forward);
            blocks.push(single(SectionKind::MoveToMidApproach, n - 1));
            blocks.push(single(SectionKind::ApproachOnReEntry, a));
            blocks.extend(reverse);
        }
        EntryOrder::ReverseFirst => {
            blocks.extend([gambit_post, gambit_pre]);
            blocks.extend(reverse);
            blocks.push(single(SectionKind::MoveToMidApproach, 0));
            blocks.push(single(SectionKind::ApproachOnReEntry, a));
            blocks.extend(forward);
        }
    }

    check_sanity(geometry, &segments, &blocks, config)?;
    check_coverage(&blocks, n)?;
    debug!(segments = n, blocks = blocks.len(), ?entry, "notch planned");

    Ok(PlannedProfile::new(
        geometry,
        ProfileKind::Notch,
        segments,
        blocks,
        Some(maneuver),
        Some(entry),
    ))
}

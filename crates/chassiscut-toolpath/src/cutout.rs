//! Cut-out planning.
//!
//! A cut-out is a closed profile machined in one forward pass from segment 0.
//! The list is rotated so neither end sits on a flex run. Landmark wire
//! joints are only left in large holes lying entirely on the web.

use chassiscut_core::{Bound3, Flange, GeometryPort, SynthesisConfig, ToolingSegment};
use tracing::debug;

use crate::error::ToolpathResult;
use crate::flex::{group_flex_runs, rotate_to_flange_ends};
use crate::landmarks::{compute_landmarks, flex_spans};
use crate::notch::{plan_direct_run, SplitTargets};
use crate::planner::{classify_profile, prepare_segments, PlannedProfile, ProfileKind};

/// Whether landmark wire joints apply: the profile lies on the web and spans
/// at least twice the cut-out length threshold in Y.
pub fn treat_as_cutout(
    segments: &[ToolingSegment],
    flanges: &[Flange],
    config: &SynthesisConfig,
) -> bool {
    let Some(bound) = Bound3::from_segments(segments) else {
        return false;
    };
    bound.size().y >= 2.0 * config.min_cutout_length_threshold
        && flanges.iter().all(|f| *f == Flange::Web)
}

pub fn plan_cutout(
    geometry: &dyn GeometryPort,
    segments: Vec<ToolingSegment>,
    config: &SynthesisConfig,
) -> ToolpathResult<PlannedProfile> {
    let tol = config.tolerance;
    let mut list = prepare_segments(geometry, segments, config, 1)?;
    classify_profile(geometry, list.as_slice(), tol)?;
    let rotations = rotate_to_flange_ends(geometry, &mut list, tol)?;
    if rotations > 0 {
        list.check_continuity(tol)?;
    }
    let segments = list.into_inner();

    let flanges = classify_profile(geometry, &segments, tol)?;
    let flex_ranges = group_flex_runs(&flanges);
    let d = config.effective_wire_joint_distance();

    let mut targets = SplitTargets::new(tol);
    let spans = flex_spans(geometry, &segments, &flex_ranges);
    targets.add_flex_boundaries(geometry, &segments, &spans, d)?;
    let wire_joints =
        config.landmark_wire_joints() && treat_as_cutout(&segments, &flanges, config);
    if wire_joints {
        let landmarks = compute_landmarks(geometry, &segments, &flex_ranges, config)?;
        targets.add_landmarks(geometry, &segments, landmarks.iter(), d);
    }

    let (segments, blocks) = plan_direct_run(geometry, segments, targets, config)?;
    debug!(
        segments = segments.len(),
        blocks = blocks.len(),
        rotations,
        wire_joints,
        "cut-out planned"
    );

    Ok(PlannedProfile::new(
        geometry,
        ProfileKind::CutOut,
        segments,
        blocks,
        None,
        None,
    ))
}

//! Sequential profile planner.
//!
//! Profiles are planned strictly one after another. Each finished profile
//! updates the [`PlanningContext`] that the next one sees: the last segment
//! machined (for chaining the next entry move) and the running cut length.

use chassiscut_core::{
    Bound3, Flange, GeometryError, GeometryPort, SynthesisConfig, ToolingSegment,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::approach::{ApproachGeometry, EntryOrder};
use crate::block::Block;
use crate::cutout::plan_cutout;
use crate::error::{ToolpathError, ToolpathResult};
use crate::flex::classify_segments;
use crate::notch::plan_notch;
use crate::segment_list::ToolingSegmentList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileKind {
    Notch,
    CutOut,
}

/// One profile to plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileInput {
    #[serde(default)]
    pub name: String,
    pub kind: ProfileKind,
    pub segments: Vec<ToolingSegment>,
    /// Bounding box of the whole part
    pub bounds: Bound3,
}

/// Split profile plus its checked block sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedProfile {
    pub name: String,
    pub kind: ProfileKind,
    pub segments: Vec<ToolingSegment>,
    pub blocks: Vec<Block>,
    pub approach: Option<ApproachGeometry>,
    pub entry: Option<EntryOrder>,
    pub cut_length: f64,
}

impl PlannedProfile {
    pub(crate) fn new(
        geometry: &dyn GeometryPort,
        kind: ProfileKind,
        segments: Vec<ToolingSegment>,
        blocks: Vec<Block>,
        approach: Option<ApproachGeometry>,
        entry: Option<EntryOrder>,
    ) -> Self {
        let profile: f64 = blocks
            .iter()
            .filter(|b| b.kind.cuts_segments())
            .flat_map(|b| b.low()..=b.high())
            .filter_map(|i| segments.get(i))
            .map(|s| geometry.length(&s.curve))
            .sum();
        let strokes = approach.as_ref().map_or(0.0, ApproachGeometry::cut_length);
        Self {
            name: String::new(),
            kind,
            segments,
            blocks,
            approach,
            entry,
            cut_length: profile + strokes,
        }
    }

    /// Segment under the end of the last block that cuts the profile.
    pub fn most_recent_segment(&self) -> Option<&ToolingSegment> {
        self.blocks
            .iter()
            .rev()
            .find(|b| b.kind.cuts_segments())
            .and_then(|b| self.segments.get(b.end_index))
    }

    /// Machined profile length plus the approach strokes.
    pub fn cut_length(&self) -> f64 {
        self.cut_length
    }
}

/// State carried from one planned profile to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningContext {
    pub previous_segment: Option<ToolingSegment>,
    pub cut_length: f64,
    pub profiles_planned: usize,
}

pub struct ProfilePlanner<'g> {
    geometry: &'g dyn GeometryPort,
    config: SynthesisConfig,
    context: PlanningContext,
}

impl<'g> ProfilePlanner<'g> {
    pub fn new(geometry: &'g dyn GeometryPort, config: SynthesisConfig) -> ToolpathResult<Self> {
        config.validate().map_err(ToolpathError::InvalidConfig)?;
        Ok(Self {
            geometry,
            config,
            context: PlanningContext::default(),
        })
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    pub fn context(&self) -> &PlanningContext {
        &self.context
    }

    /// Plans one profile. On error the context is left as it was.
    pub fn plan(&mut self, input: ProfileInput) -> ToolpathResult<PlannedProfile> {
        let ProfileInput {
            name,
            kind,
            segments,
            bounds,
        } = input;
        let mut planned = match kind {
            ProfileKind::Notch => plan_notch(self.geometry, segments, &bounds, &self.config)?,
            ProfileKind::CutOut => plan_cutout(self.geometry, segments, &self.config)?,
        };
        planned.name = name;

        self.context.previous_segment = planned.most_recent_segment().copied();
        self.context.cut_length += planned.cut_length;
        self.context.profiles_planned += 1;
        info!(
            name = %planned.name,
            ?kind,
            segments = planned.segments.len(),
            blocks = planned.blocks.len(),
            cut_length = planned.cut_length,
            "planned profile"
        );
        Ok(planned)
    }

    /// Plans every profile in order. A failed profile is reported in place
    /// and does not stop the ones after it.
    pub fn plan_all(
        &mut self,
        inputs: impl IntoIterator<Item = ProfileInput>,
    ) -> Vec<ToolpathResult<PlannedProfile>> {
        inputs
            .into_iter()
            .map(|input| {
                let name = input.name.clone();
                self.plan(input).inspect_err(|e| {
                    warn!(name = %name, error = %e, "profile skipped");
                })
            })
            .collect()
    }
}

/// Validates the config, repairs continuity and checks the result.
pub(crate) fn prepare_segments(
    geometry: &dyn GeometryPort,
    segments: Vec<ToolingSegment>,
    config: &SynthesisConfig,
    min_segments: usize,
) -> ToolpathResult<ToolingSegmentList> {
    config.validate().map_err(ToolpathError::InvalidConfig)?;
    if segments.len() < min_segments {
        return Err(ToolpathError::UnsupportedTopology(format!(
            "profile has {} segments, at least {} required",
            segments.len(),
            min_segments
        )));
    }
    let mut list = ToolingSegmentList::new(segments);
    list.repair_continuity(geometry, config.tolerance);
    list.check_continuity(config.tolerance)?;
    Ok(list)
}

/// Flange of every segment. A normal with no flange is a topology the
/// planners cannot machine.
pub(crate) fn classify_profile(
    geometry: &dyn GeometryPort,
    segments: &[ToolingSegment],
    tolerance: f64,
) -> ToolpathResult<Vec<Flange>> {
    classify_segments(geometry, segments, tolerance).map_err(|e| match e {
        ToolpathError::Geometry(GeometryError::UnsupportedNormal { reason, .. }) => {
            ToolpathError::UnsupportedTopology(format!("segment normal: {}", reason))
        }
        other => other,
    })
}

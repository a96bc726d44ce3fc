//! # ChassisCut Toolpath
//!
//! Profile segmentation and machining-sequence synthesis for notches and
//! cut-outs in formed sheet-metal chassis parts.
//!
//! ## Pipeline
//!
//! 1. **Segment list** - repair gaps between consecutive segments
//! 2. **Flex locator** - classify segments by flange and find bend runs
//! 3. **Landmarks** - 25/50/75% points, moved or dropped near flex runs
//! 4. **Splitter** - split at wire-joint points with atomic renumbering
//! 5. **Synthesizer** - sorted event walk producing typed [`Block`]s
//! 6. **Sanity** - ordering, coverage and wire-joint checks
//!
//! [`ProfilePlanner`] runs the pipeline for a sequence of profiles and
//! threads the previous profile's context into the next.
//!
//! ## Example
//!
//! ```
//! use chassiscut_core::{Bound3, Curve, Kernel, Point3, SynthesisConfig, ToolingSegment, Vector3};
//! use chassiscut_toolpath::{ProfileInput, ProfileKind, ProfilePlanner};
//!
//! let corners = [
//!     Point3::new(100.0, 0.0, 0.0),
//!     Point3::new(200.0, 0.0, 0.0),
//!     Point3::new(200.0, 50.0, 0.0),
//!     Point3::new(100.0, 50.0, 0.0),
//! ];
//! let segments = (0..4)
//!     .map(|i| {
//!         let curve = Curve::line(corners[i], corners[(i + 1) % 4]);
//!         ToolingSegment::new(curve, Vector3::z(), Vector3::z())
//!     })
//!     .collect();
//!
//! let kernel = Kernel::new();
//! let mut planner = ProfilePlanner::new(&kernel, SynthesisConfig::default()).unwrap();
//! let planned = planner
//!     .plan(ProfileInput {
//!         name: "hole".into(),
//!         kind: ProfileKind::CutOut,
//!         segments,
//!         bounds: Bound3::new(Point3::new(0.0, -100.0, 0.0), Point3::new(1000.0, 100.0, 60.0)),
//!     })
//!     .unwrap();
//! assert_eq!(planned.blocks.len(), 1);
//! ```

pub mod approach;
pub mod block;
pub mod cutout;
pub mod error;
pub mod flex;
pub mod landmarks;
pub mod notch;
pub mod planner;
pub mod sanity;
pub mod segment_list;
pub mod splitter;
pub mod synthesizer;

pub use approach::{ApproachGeometry, EntryOrder, Stroke};
pub use block::{Block, Direction, SectionKind};
pub use cutout::{plan_cutout, treat_as_cutout};
pub use error::{InvariantRule, ToolpathError, ToolpathResult};
pub use flex::FlexRange;
pub use landmarks::{Landmark, LandmarkPosition, LandmarkSet};
pub use notch::{is_edge_notch, plan_notch};
pub use planner::{PlannedProfile, PlanningContext, ProfileInput, ProfileKind, ProfilePlanner};
pub use sanity::{check_coverage, check_sanity};
pub use segment_list::ToolingSegmentList;
pub use splitter::{split_and_renumber, IndexRemap, SplitOutcome};
pub use synthesizer::{
    ApproachIndices, Entry, FlexIndices, LandmarkIndices, SequenceIndices, SequenceSynthesizer,
};

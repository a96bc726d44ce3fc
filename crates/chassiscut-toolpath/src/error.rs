//! Error types for profile segmentation and sequence synthesis.
//!
//! Every error is fatal to the profile being planned. Nothing in this crate
//! catches its own errors; they propagate to whoever drives the planner.

use std::fmt;

use chassiscut_core::GeometryError;
use thiserror::Error;

/// Block-sequence rule that a [`ToolpathError::SequenceInvariantViolation`]
/// refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantRule {
    /// A wire-joint block spans more than one segment.
    WireJointSingleSegment,
    /// A wire-joint segment does not match the configured gap.
    WireJointLength,
    /// Adjacent blocks overlap or run out of order.
    BlockOrder,
    /// A forward block runs backward or the reverse.
    Direction,
    /// A flex block is missing its wire-joint bracket.
    FlexBracketing,
    /// A block points past the end of the segment list.
    IndexRange,
    /// Blocks leave segments uncovered or cover one twice.
    Coverage,
    /// Consecutive segments do not meet.
    Continuity,
    /// Two synthesis events appear in an order the walk does not allow.
    EventAdjacency,
    /// Two consecutive synthesis events resolve to one segment.
    DuplicateIndex,
}

impl fmt::Display for InvariantRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvariantRule::WireJointSingleSegment => "wire-joint-single-segment",
            InvariantRule::WireJointLength => "wire-joint-length",
            InvariantRule::BlockOrder => "block-order",
            InvariantRule::Direction => "direction",
            InvariantRule::FlexBracketing => "flex-bracketing",
            InvariantRule::IndexRange => "index-range",
            InvariantRule::Coverage => "coverage",
            InvariantRule::Continuity => "continuity",
            InvariantRule::EventAdjacency => "event-adjacency",
            InvariantRule::DuplicateIndex => "duplicate-index",
        };
        f.write_str(name)
    }
}

/// Errors that abort planning of a single profile.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ToolpathError {
    /// Two consecutive segments do not meet and could not be joined.
    #[error("Discontinuity after segment {index}: gap of {gap:.6}")]
    Discontinuity {
        /// Index of the segment whose end misses the next start
        index: usize,
        /// Distance between the two points
        gap: f64,
    },

    /// A block or event rule was broken.
    #[error("Sequence invariant violated [{rule}]: {detail}")]
    SequenceInvariantViolation { rule: InvariantRule, detail: String },

    /// A fractional-length point could not be placed on the profile.
    #[error("Landmark at {fraction} of length not found: {reason}")]
    LandmarkNotFound { fraction: f64, reason: String },

    /// The profile shape is outside what the planner handles.
    #[error("Unsupported topology: {0}")]
    UnsupportedTopology(String),

    /// The synthesis configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A geometry port call failed.
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

impl ToolpathError {
    pub(crate) fn violation(rule: InvariantRule, detail: impl Into<String>) -> Self {
        ToolpathError::SequenceInvariantViolation {
            rule,
            detail: detail.into(),
        }
    }

    /// The broken rule, for sequence violations.
    pub fn rule(&self) -> Option<InvariantRule> {
        match self {
            ToolpathError::SequenceInvariantViolation { rule, .. } => Some(*rule),
            _ => None,
        }
    }
}

/// Result type alias for toolpath planning.
pub type ToolpathResult<T> = Result<T, ToolpathError>;

//! Typed machining blocks.
//!
//! A [`Block`] is a contiguous range of the segment list plus the maneuver a
//! G-code emitter performs over it. [`SectionKind`] is closed; consumers match
//! on it exhaustively.

use chassiscut_core::Flange;
use serde::{Deserialize, Serialize};

/// Traversal direction of a block over the segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    MachineForward,
    MachineReverse,
    MachineFlexForward,
    MachineFlexReverse,
    WireJointJumpForward,
    WireJointJumpReverse,
    WireJointJumpForwardOnFlex,
    WireJointJumpReverseOnFlex,
    ApproachMachining,
    ApproachOnReEntry,
    GambitPreApproach,
    GambitPostApproach,
    MoveToMidApproach,
}

impl SectionKind {
    /// Direction for profile-walking blocks, `None` for maneuvers and gambits.
    /// A gambit runs away from the approach point, so it may span several
    /// segments when a wire joint crossed a vertex.
    pub fn direction(self) -> Option<Direction> {
        use SectionKind::*;
        match self {
            MachineForward
            | MachineFlexForward
            | WireJointJumpForward
            | WireJointJumpForwardOnFlex => Some(Direction::Forward),
            MachineReverse
            | MachineFlexReverse
            | WireJointJumpReverse
            | WireJointJumpReverseOnFlex => Some(Direction::Reverse),
            ApproachMachining
            | ApproachOnReEntry
            | GambitPreApproach
            | GambitPostApproach
            | MoveToMidApproach => None,
        }
    }

    pub fn is_wire_joint(self) -> bool {
        use SectionKind::*;
        matches!(
            self,
            WireJointJumpForward
                | WireJointJumpReverse
                | WireJointJumpForwardOnFlex
                | WireJointJumpReverseOnFlex
        )
    }

    pub fn is_flex_wire_joint(self) -> bool {
        matches!(
            self,
            SectionKind::WireJointJumpForwardOnFlex | SectionKind::WireJointJumpReverseOnFlex
        )
    }

    pub fn is_flex(self) -> bool {
        matches!(
            self,
            SectionKind::MachineFlexForward | SectionKind::MachineFlexReverse
        )
    }

    /// Moves that do not machine profile segments themselves.
    pub fn is_maneuver(self) -> bool {
        matches!(
            self,
            SectionKind::ApproachMachining
                | SectionKind::ApproachOnReEntry
                | SectionKind::MoveToMidApproach
        )
    }

    /// Whether the block accounts for its segments in the coverage of the
    /// profile. Wire joints count: their segment is left uncut on purpose.
    pub fn covers_segments(self) -> bool {
        !self.is_maneuver()
    }

    /// Whether the head actually cuts the block's segments.
    pub fn cuts_segments(self) -> bool {
        self.covers_segments() && !self.is_wire_joint()
    }
}

/// One typed range of the segment list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: SectionKind,
    pub start_index: usize,
    pub end_index: usize,
    pub flange: Option<Flange>,
}

impl Block {
    pub fn new(kind: SectionKind, start_index: usize, end_index: usize) -> Self {
        Self {
            kind,
            start_index,
            end_index,
            flange: None,
        }
    }

    pub fn single(kind: SectionKind, index: usize) -> Self {
        Self::new(kind, index, index)
    }

    pub fn with_flange(mut self, flange: Flange) -> Self {
        self.flange = Some(flange);
        self
    }

    pub fn low(&self) -> usize {
        self.start_index.min(self.end_index)
    }

    pub fn high(&self) -> usize {
        self.start_index.max(self.end_index)
    }

    /// Segment indices in traversal order.
    pub fn indices(&self) -> Box<dyn Iterator<Item = usize>> {
        if self.start_index <= self.end_index {
            Box::new(self.start_index..=self.end_index)
        } else {
            Box::new((self.end_index..=self.start_index).rev())
        }
    }

    /// Renumbers after segment `at` was split into `inserted + 1` pieces.
    ///
    /// Blocks after `at` shift whole. A covering block that contains `at`
    /// grows its high end so it keeps every piece. Wire joints and maneuvers
    /// stay on their single segment.
    pub fn renumbered(mut self, at: usize, inserted: usize) -> Self {
        if self.low() > at {
            self.start_index += inserted;
            self.end_index += inserted;
        } else if self.high() >= at && self.kind.covers_segments() && !self.kind.is_wire_joint() {
            if self.end_index >= self.start_index {
                self.end_index += inserted;
            } else {
                self.start_index += inserted;
            }
        }
        self
    }
}

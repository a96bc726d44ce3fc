//! Machining-sequence synthesizer.
//!
//! The synthesizer turns resolved segment indices (approach, landmark wire
//! joints, flex boundaries) into an ordered block list for one traversal
//! direction. It builds an event per index, sorts them along the direction of
//! travel and walks them as a state machine:
//!
//! - nothing is sequenced before the entry event (`PreApproach` forward,
//!   `PostApproach` reverse, or the profile end for a direct entry)
//! - every event is validated against the one before it; an adjacency the
//!   walk does not allow is a [`InvariantRule::EventAdjacency`] violation
//! - two consecutive events on one segment are a
//!   [`InvariantRule::DuplicateIndex`] violation, except at index 0, for the
//!   start/end of a one-segment flex run, and at the profile ends
//!
//! Forward emission rules (reverse mirrors them):
//!
//! | event         | emits                                              |
//! |---------------|----------------------------------------------------|
//! | `BeforeStart` | `MachineForward` up to it, `WireJointJumpForwardOnFlex` |
//! | `Start`       | nothing                                            |
//! | `End`         | `MachineFlexForward` from the flex start           |
//! | `AfterEnd`    | `WireJointJumpForwardOnFlex`                       |
//! | `At`          | `MachineForward` through it                        |
//! | `Post`        | `MachineForward` up to it, `WireJointJumpForward`  |
//! | `Max`         | closing `MachineForward`, if anything is left      |

use std::cmp::Reverse;

use chassiscut_core::Flange;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::block::{Block, Direction, SectionKind};
use crate::error::{InvariantRule, ToolpathError, ToolpathResult};
use crate::flex::FlexRange;
use crate::landmarks::LandmarkPosition;

/// Segments around the approach point. The approach segment ends at the
/// approach point; `pre` and `post` end one wire joint before and after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproachIndices {
    pub pre: usize,
    pub approach: usize,
    pub post: usize,
}

/// A landmark wire joint: `at` ends at the landmark, `post` ends one wire
/// joint further along the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandmarkIndices {
    pub position: LandmarkPosition,
    pub at: usize,
    pub post: usize,
}

/// A flex run and the wire-joint segments on either side of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlexIndices {
    pub before_start: usize,
    pub start: usize,
    pub end: usize,
    pub after_end: usize,
}

impl FlexIndices {
    /// Brackets a flex range with its neighbours. `None` when the range
    /// touches either end of the list.
    pub fn bracketing(range: FlexRange, segment_count: usize) -> Option<Self> {
        if range.start == 0 || range.end + 1 >= segment_count {
            return None;
        }
        Some(Self {
            before_start: range.start - 1,
            start: range.start,
            end: range.end,
            after_end: range.end + 1,
        })
    }
}

/// How the head first reaches the profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Entry {
    /// Through the approach maneuver at the mid landmark.
    Approach(ApproachIndices),
    /// Straight onto the profile end (closed profiles).
    Direct,
}

/// Everything the synthesizer needs to know about a split profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceIndices {
    pub entry: Entry,
    pub landmarks: Vec<LandmarkIndices>,
    pub flexes: Vec<FlexIndices>,
    pub segment_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventRole {
    Zero,
    PreApproach,
    Approach,
    PostApproach,
    BeforeStart(usize),
    Start(usize),
    End(usize),
    AfterEnd(usize),
    At(LandmarkPosition),
    Post(LandmarkPosition),
    Max,
}

impl EventRole {
    /// Order among events on the same segment, forward.
    fn rank(self) -> u8 {
        match self {
            EventRole::Zero => 0,
            EventRole::PreApproach => 1,
            EventRole::Approach => 2,
            EventRole::PostApproach => 3,
            EventRole::BeforeStart(_) => 4,
            EventRole::Start(_) => 5,
            EventRole::End(_) => 6,
            EventRole::AfterEnd(_) => 7,
            EventRole::At(_) => 8,
            EventRole::Post(_) => 9,
            EventRole::Max => 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub index: usize,
    pub role: EventRole,
}

/// Builds the block list of one traversal direction.
pub struct SequenceSynthesizer<'a> {
    indices: &'a SequenceIndices,
    flanges: &'a [Flange],
}

impl<'a> SequenceSynthesizer<'a> {
    /// `flanges` holds the flange of every segment.
    pub fn new(indices: &'a SequenceIndices, flanges: &'a [Flange]) -> ToolpathResult<Self> {
        let n = indices.segment_count;
        if n == 0 || flanges.len() != n {
            return Err(ToolpathError::violation(
                InvariantRule::IndexRange,
                format!("{} flange tags for {} segments", flanges.len(), n),
            ));
        }
        let synthesizer = Self { indices, flanges };
        if let Some(bad) = synthesizer.raw_events().iter().find(|e| e.index >= n) {
            return Err(ToolpathError::violation(
                InvariantRule::IndexRange,
                format!("{:?} at index {} of {} segments", bad.role, bad.index, n),
            ));
        }
        Ok(synthesizer)
    }

    fn raw_events(&self) -> Vec<Event> {
        let ix = self.indices;
        let mut events = vec![
            Event {
                index: 0,
                role: EventRole::Zero,
            },
            Event {
                index: ix.segment_count.saturating_sub(1),
                role: EventRole::Max,
            },
        ];
        if let Entry::Approach(a) = ix.entry {
            events.push(Event {
                index: a.pre,
                role: EventRole::PreApproach,
            });
            events.push(Event {
                index: a.approach,
                role: EventRole::Approach,
            });
            events.push(Event {
                index: a.post,
                role: EventRole::PostApproach,
            });
        }
        for lm in &ix.landmarks {
            events.push(Event {
                index: lm.at,
                role: EventRole::At(lm.position),
            });
            events.push(Event {
                index: lm.post,
                role: EventRole::Post(lm.position),
            });
        }
        for (k, f) in ix.flexes.iter().enumerate() {
            events.extend([
                Event {
                    index: f.before_start,
                    role: EventRole::BeforeStart(k),
                },
                Event {
                    index: f.start,
                    role: EventRole::Start(k),
                },
                Event {
                    index: f.end,
                    role: EventRole::End(k),
                },
                Event {
                    index: f.after_end,
                    role: EventRole::AfterEnd(k),
                },
            ]);
        }
        events
    }

    /// Events sorted along the direction of travel.
    pub fn events(&self, direction: Direction) -> Vec<Event> {
        let mut events = self.raw_events();
        match direction {
            Direction::Forward => events.sort_by_key(|e| (e.index, e.role.rank())),
            Direction::Reverse => {
                events.sort_by_key(|e| (Reverse(e.index), Reverse(e.role.rank())))
            }
        }
        events
    }

    /// Two events on one segment are checked before any adjacency rule, so
    /// a collision is reported as such wherever it sits in the list.
    pub fn synthesize(&self, direction: Direction) -> ToolpathResult<Vec<Block>> {
        for pair in self.events(direction).windows(2) {
            check_duplicate(&pair[0], &pair[1])?;
        }
        let blocks = match direction {
            Direction::Forward => self.walk_forward()?,
            Direction::Reverse => self.walk_reverse()?,
        };
        debug!(?direction, blocks = blocks.len(), "synthesized run");
        Ok(blocks)
    }

    fn tag(&self, block: Block) -> Block {
        let flange = if block.kind.is_flex() {
            Flange::Flex
        } else {
            self.flanges[block.start_index]
        };
        block.with_flange(flange)
    }

    fn walk_forward(&self) -> ToolpathResult<Vec<Block>> {
        let direct = self.indices.entry == Entry::Direct;
        let mut blocks = Vec::new();
        let mut cursor = 0usize;
        let mut prev: Option<Event> = None;

        // Cuts cursor..end (exclusive) if non-empty
        let machine = |blocks: &mut Vec<Block>, from: usize, to_exclusive: usize| {
            if from < to_exclusive {
                blocks.push(self.tag(Block::new(
                    SectionKind::MachineForward,
                    from,
                    to_exclusive - 1,
                )));
            }
        };

        for ev in self.events(Direction::Forward) {
            let Some(last) = prev else {
                let opens = match ev.role {
                    EventRole::Zero => direct,
                    EventRole::PreApproach => !direct,
                    _ => false,
                };
                if opens {
                    prev = Some(ev);
                }
                continue;
            };
            check_duplicate(&last, &ev)?;

            use EventRole::*;
            match ev.role {
                Zero | PreApproach => return Err(adjacency(&last, &ev)),
                Approach => expect(&last, &ev, matches!(last.role, PreApproach))?,
                PostApproach => {
                    expect(&last, &ev, matches!(last.role, Approach))?;
                    cursor = ev.index + 1;
                }
                BeforeStart(_) => {
                    expect(&last, &ev, opens_run(last.role))?;
                    machine(&mut blocks, cursor, ev.index);
                    blocks.push(self.tag(Block::single(
                        SectionKind::WireJointJumpForwardOnFlex,
                        ev.index,
                    )));
                    cursor = ev.index + 1;
                }
                Start(k) => expect(
                    &last,
                    &ev,
                    last.role == BeforeStart(k) && ev.index == last.index + 1,
                )?,
                End(k) => {
                    expect(&last, &ev, last.role == Start(k))?;
                    blocks.push(self.tag(Block::new(
                        SectionKind::MachineFlexForward,
                        last.index,
                        ev.index,
                    )));
                    cursor = ev.index + 1;
                }
                AfterEnd(k) => {
                    expect(
                        &last,
                        &ev,
                        last.role == End(k) && ev.index == last.index + 1,
                    )?;
                    blocks.push(self.tag(Block::single(
                        SectionKind::WireJointJumpForwardOnFlex,
                        ev.index,
                    )));
                    cursor = ev.index + 1;
                }
                At(_) => {
                    expect(&last, &ev, opens_run(last.role))?;
                    machine(&mut blocks, cursor, ev.index + 1);
                    cursor = ev.index + 1;
                }
                Post(p) => {
                    expect(&last, &ev, last.role == At(p))?;
                    machine(&mut blocks, cursor, ev.index);
                    blocks.push(
                        self.tag(Block::single(SectionKind::WireJointJumpForward, ev.index)),
                    );
                    cursor = ev.index + 1;
                }
                Max => {
                    expect(&last, &ev, opens_run(last.role))?;
                    machine(&mut blocks, cursor, ev.index + 1);
                    return Ok(blocks);
                }
            }
            prev = Some(ev);
        }

        Err(ToolpathError::violation(
            InvariantRule::EventAdjacency,
            "forward walk never reached the profile end",
        ))
    }

    fn walk_reverse(&self) -> ToolpathResult<Vec<Block>> {
        let direct = self.indices.entry == Entry::Direct;
        let mut blocks = Vec::new();
        // Next uncut index going down; None once index 0 is consumed
        let mut cursor: Option<usize> = Some(self.indices.segment_count - 1);
        let mut prev: Option<Event> = None;

        // Cuts cursor down to `low` inclusive if non-empty
        let machine = |blocks: &mut Vec<Block>, from: Option<usize>, low: usize| {
            if let Some(from) = from.filter(|&f| f >= low) {
                blocks.push(self.tag(Block::new(SectionKind::MachineReverse, from, low)));
            }
        };

        for ev in self.events(Direction::Reverse) {
            let Some(last) = prev else {
                let opens = match ev.role {
                    EventRole::Max => direct,
                    EventRole::PostApproach => !direct,
                    _ => false,
                };
                if opens {
                    prev = Some(ev);
                }
                continue;
            };
            check_duplicate(&last, &ev)?;

            use EventRole::*;
            match ev.role {
                Max | PostApproach => return Err(adjacency(&last, &ev)),
                Approach => expect(&last, &ev, matches!(last.role, PostApproach))?,
                PreApproach => {
                    expect(&last, &ev, matches!(last.role, Approach))?;
                    cursor = Some(ev.index);
                }
                AfterEnd(_) => {
                    expect(&last, &ev, opens_reverse_run(last.role))?;
                    machine(&mut blocks, cursor, ev.index + 1);
                    blocks.push(self.tag(Block::single(
                        SectionKind::WireJointJumpReverseOnFlex,
                        ev.index,
                    )));
                    cursor = ev.index.checked_sub(1);
                }
                End(k) => expect(
                    &last,
                    &ev,
                    last.role == AfterEnd(k) && ev.index + 1 == last.index,
                )?,
                Start(k) => {
                    expect(&last, &ev, last.role == End(k))?;
                    blocks.push(self.tag(Block::new(
                        SectionKind::MachineFlexReverse,
                        last.index,
                        ev.index,
                    )));
                    cursor = ev.index.checked_sub(1);
                }
                BeforeStart(k) => {
                    expect(
                        &last,
                        &ev,
                        last.role == Start(k) && ev.index + 1 == last.index,
                    )?;
                    blocks.push(self.tag(Block::single(
                        SectionKind::WireJointJumpReverseOnFlex,
                        ev.index,
                    )));
                    cursor = ev.index.checked_sub(1);
                }
                Post(_) => {
                    expect(&last, &ev, opens_reverse_run(last.role))?;
                    machine(&mut blocks, cursor, ev.index + 1);
                    blocks.push(
                        self.tag(Block::single(SectionKind::WireJointJumpReverse, ev.index)),
                    );
                    cursor = ev.index.checked_sub(1);
                }
                At(p) => expect(&last, &ev, last.role == Post(p))?,
                Zero => {
                    expect(&last, &ev, opens_reverse_run(last.role))?;
                    machine(&mut blocks, cursor, 0);
                    return Ok(blocks);
                }
            }
            prev = Some(ev);
        }

        Err(ToolpathError::violation(
            InvariantRule::EventAdjacency,
            "reverse walk never reached the profile start",
        ))
    }
}

/// Events after which a forward walk may start a new machining stretch.
fn opens_run(role: EventRole) -> bool {
    matches!(
        role,
        EventRole::Zero | EventRole::PostApproach | EventRole::Post(_) | EventRole::AfterEnd(_)
    )
}

fn opens_reverse_run(role: EventRole) -> bool {
    matches!(
        role,
        EventRole::Max | EventRole::PreApproach | EventRole::At(_) | EventRole::BeforeStart(_)
    )
}

fn check_duplicate(last: &Event, ev: &Event) -> ToolpathResult<()> {
    if last.index != ev.index {
        return Ok(());
    }
    let allowed = ev.index == 0
        || matches!(
            (last.role, ev.role),
            (EventRole::Start(a), EventRole::End(b)) | (EventRole::End(a), EventRole::Start(b)) if a == b
        )
        || matches!(ev.role, EventRole::Max | EventRole::Zero)
        || matches!(last.role, EventRole::Max | EventRole::Zero);
    if allowed {
        Ok(())
    } else {
        Err(ToolpathError::violation(
            InvariantRule::DuplicateIndex,
            format!(
                "{:?} and {:?} both resolve to segment {}",
                last.role, ev.role, ev.index
            ),
        ))
    }
}

fn adjacency(last: &Event, ev: &Event) -> ToolpathError {
    ToolpathError::violation(
        InvariantRule::EventAdjacency,
        format!(
            "{:?} at {} cannot follow {:?} at {}",
            ev.role, ev.index, last.role, last.index
        ),
    )
}

fn expect(last: &Event, ev: &Event, ok: bool) -> ToolpathResult<()> {
    if ok {
        Ok(())
    } else {
        Err(adjacency(last, ev))
    }
}

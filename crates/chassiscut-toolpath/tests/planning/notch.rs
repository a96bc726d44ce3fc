use chassiscut_core::{
    Bound3, Curve, GeometryPort, Kernel, Point3, SynthesisConfig, ToolingSegment, Vector3,
};
use chassiscut_toolpath::segment_list::{check_continuity, total_length};
use chassiscut_toolpath::{
    check_coverage, is_edge_notch, plan_notch, EntryOrder, SectionKind::*, ToolpathError,
};

use crate::fixtures::{chain, part, reversed, summary, Piece};

/// Web, bend over 10%..40%, web. Total length 400.
fn bent_notch() -> Vec<ToolingSegment> {
    chain(&[Piece::Web(40.0), Piece::Bend(120.0), Piece::Web(240.0)])
}

/// Straight runs joined by a half circle dipping to y = -30. The mid point is
/// the bottom of the arc.
fn arc_notch() -> Vec<ToolingSegment> {
    let web = |curve: Curve| ToolingSegment::new(curve, Vector3::z(), Vector3::z());
    vec![
        web(Curve::line(Point3::new(0.0, 0.0, 0.0), Point3::new(150.0, 0.0, 0.0))),
        web(Curve::arc(
            Point3::new(150.0, 0.0, 0.0),
            Point3::new(210.0, 0.0, 0.0),
            Point3::new(180.0, 0.0, 0.0),
            Vector3::z(),
        )),
        web(Curve::line(Point3::new(210.0, 0.0, 0.0), Point3::new(360.0, 0.0, 0.0))),
    ]
}

#[test]
fn test_notch_with_flex_before_approach_goes_reverse_first() {
    let k = Kernel::new();
    let planned = plan_notch(&k, bent_notch(), &part(), &SynthesisConfig::default()).unwrap();

    assert_eq!(planned.entry, Some(EntryOrder::ReverseFirst));
    assert_eq!(planned.segments.len(), 10);
    // The 25% landmark sits inside the bend with too little length before
    // it, so only the 75% wire joint (segment 8) remains
    assert_eq!(
        summary(&planned.blocks),
        vec![
            (ApproachMachining, 5, 5),
            (GambitPostApproach, 6, 6),
            (GambitPreApproach, 5, 5),
            (MachineReverse, 4, 4),
            (WireJointJumpReverseOnFlex, 3, 3),
            (MachineFlexReverse, 2, 2),
            (WireJointJumpReverseOnFlex, 1, 1),
            (MachineReverse, 0, 0),
            (MoveToMidApproach, 0, 0),
            (ApproachOnReEntry, 5, 5),
            (MachineForward, 7, 7),
            (WireJointJumpForward, 8, 8),
            (MachineForward, 9, 9),
        ]
    );
    assert_eq!(planned.segments[5].end(), Point3::new(200.0, 0.0, 0.0));
}

#[test]
fn test_notch_cut_length_adds_approach_strokes() {
    let k = Kernel::new();
    let planned = plan_notch(&k, bent_notch(), &part(), &SynthesisConfig::default()).unwrap();
    // 400 minus three 2-unit wire joints, plus 45 of approach strokes
    assert!((planned.cut_length() - 439.0).abs() < 1e-6);

    let approach = planned.approach.unwrap();
    assert_eq!(approach.flange_end, Point3::new(200.0, 30.0, 0.0));
    assert_eq!(approach.mid1, Point3::new(200.0, 15.0, 0.0));
}

#[test]
fn test_mirrored_notch_goes_forward_first() {
    let k = Kernel::new();
    let segs = reversed(&bent_notch());
    let planned = plan_notch(&k, segs, &part(), &SynthesisConfig::default()).unwrap();

    assert_eq!(planned.entry, Some(EntryOrder::ForwardFirst));
    assert_eq!(
        summary(&planned.blocks),
        vec![
            (ApproachMachining, 3, 3),
            (GambitPreApproach, 3, 3),
            (GambitPostApproach, 4, 4),
            (MachineForward, 5, 5),
            (WireJointJumpForwardOnFlex, 6, 6),
            (MachineFlexForward, 7, 7),
            (WireJointJumpForwardOnFlex, 8, 8),
            (MachineForward, 9, 9),
            (MoveToMidApproach, 9, 9),
            (ApproachOnReEntry, 3, 3),
            (MachineReverse, 2, 2),
            (WireJointJumpReverse, 1, 1),
            (MachineReverse, 0, 0),
        ]
    );
}

#[test]
fn test_disabled_wire_joints_keep_flex_joints() {
    let k = Kernel::new();
    let config = SynthesisConfig::default().with_wire_joints(false);
    let planned = plan_notch(&k, bent_notch(), &part(), &config).unwrap();
    assert_eq!(planned.segments.len(), 8);
    assert!(planned
        .blocks
        .iter()
        .all(|b| !matches!(b.kind, WireJointJumpForward | WireJointJumpReverse)));
    let flex_joints = planned
        .blocks
        .iter()
        .filter(|b| b.kind.is_flex_wire_joint())
        .count();
    assert_eq!(flex_joints, 2);
}

#[test]
fn test_split_profile_keeps_length_and_continuity() {
    let k = Kernel::new();
    let before = total_length(&k, &bent_notch());
    let planned = plan_notch(&k, bent_notch(), &part(), &SynthesisConfig::default()).unwrap();
    assert!((total_length(&k, &planned.segments) - before).abs() < 1e-6);
    check_continuity(&planned.segments, 1e-6).unwrap();
    check_coverage(&planned.blocks, planned.segments.len()).unwrap();
}

#[test]
fn test_approach_splits_an_arc() {
    let k = Kernel::new();
    let before = total_length(&k, &arc_notch());
    let planned = plan_notch(&k, arc_notch(), &part(), &SynthesisConfig::default()).unwrap();

    // Pre-approach, approach and post-approach points all lie on the arc
    let arcs = planned.segments.iter().filter(|s| s.curve.is_arc()).count();
    assert_eq!(arcs, 4);
    let approach = planned.approach.unwrap();
    assert!((approach.approach_point - Point3::new(180.0, -30.0, 0.0)).norm() < 1e-6);
    assert!((approach.flange_end - Point3::new(180.0, -50.0, 0.0)).norm() < 1e-6);

    assert!((total_length(&k, &planned.segments) - before).abs() < 1e-6);
    check_continuity(&planned.segments, 1e-6).unwrap();
    check_coverage(&planned.blocks, planned.segments.len()).unwrap();
    for block in planned.blocks.iter().filter(|b| b.kind.is_wire_joint()) {
        let len = k.length(&planned.segments[block.start_index].curve);
        assert!((len - 2.0).abs() < 1e-6, "{:?} is {}", block, len);
    }
    let a = planned.blocks[0].start_index;
    assert!(planned.segments[a].curve.is_arc());
    assert!(planned.segments[a + 1].curve.is_arc());
}

#[test]
fn test_gap_is_bridged_before_planning() {
    let k = Kernel::new();
    let mut segs = chain(&[Piece::Web(200.0), Piece::Web(200.0)]);
    segs[1] = ToolingSegment::new(
        Curve::line(
            Point3::new(200.5, 0.0, 0.0),
            Point3::new(400.5, 0.0, 0.0),
        ),
        segs[1].start_normal,
        segs[1].end_normal,
    );
    let planned = plan_notch(&k, segs, &part(), &SynthesisConfig::default()).unwrap();
    check_continuity(&planned.segments, 1e-6).unwrap();
    let total: f64 = planned.segments.iter().map(|s| k.length(&s.curve)).sum();
    assert!((total - 400.5).abs() < 1e-6);
}

#[test]
fn test_three_flex_runs_unsupported() {
    let k = Kernel::new();
    let segs = chain(&[
        Piece::Web(100.0),
        Piece::Bend(20.0),
        Piece::Web(100.0),
        Piece::Bend(20.0),
        Piece::Web(100.0),
        Piece::Bend(20.0),
        Piece::Web(100.0),
    ]);
    let err = plan_notch(&k, segs, &part(), &SynthesisConfig::default()).unwrap_err();
    assert!(matches!(err, ToolpathError::UnsupportedTopology(_)));
}

#[test]
fn test_flex_on_last_segment_unsupported() {
    let k = Kernel::new();
    let segs = chain(&[Piece::Web(300.0), Piece::Bend(100.0)]);
    let err = plan_notch(&k, segs, &part(), &SynthesisConfig::default()).unwrap_err();
    assert!(matches!(err, ToolpathError::UnsupportedTopology(_)));
}

#[test]
fn test_mid_landmark_and_fallback_on_flex() {
    let k = Kernel::new();
    // Bend covers 35%..65%, so both 50% and 40% fall inside it
    let segs = chain(&[Piece::Web(140.0), Piece::Bend(120.0), Piece::Web(140.0)]);
    let err = plan_notch(&k, segs, &part(), &SynthesisConfig::default()).unwrap_err();
    assert!(matches!(err, ToolpathError::LandmarkNotFound { .. }));
}

#[test]
fn test_approach_next_to_flex_moves_to_forty_percent() {
    let k = Kernel::new();
    // Bend starts 3 units after the 50% point
    let segs = chain(&[Piece::Web(203.0), Piece::Bend(50.0), Piece::Web(147.0)]);
    let planned = plan_notch(&k, segs, &part(), &SynthesisConfig::default()).unwrap();

    let approach = planned.approach.unwrap();
    assert!((approach.approach_point.x - 160.0).abs() < 1e-9);
    assert_eq!(planned.blocks[0].kind, ApproachMachining);
    let a = planned.blocks[0].start_index;
    assert_eq!(planned.segments[a].end(), Point3::new(160.0, 0.0, 0.0));
    check_coverage(&planned.blocks, planned.segments.len()).unwrap();
}

#[test]
fn test_notch_on_part_boundary_is_edge_notch() {
    let k = Kernel::new();
    // The mid point sits on the Y min face, so there is no room to approach
    let bounds = Bound3::new(
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2000.0, 30.0, 80.0),
    );
    let planned = plan_notch(&k, bent_notch(), &bounds, &SynthesisConfig::default()).unwrap();

    assert!(planned.approach.is_none());
    assert!(planned.entry.is_none());
    assert_eq!(
        summary(&planned.blocks),
        vec![
            (MachineForward, 0, 0),
            (WireJointJumpForwardOnFlex, 1, 1),
            (MachineFlexForward, 2, 2),
            (WireJointJumpForwardOnFlex, 3, 3),
            (MachineForward, 4, 4),
        ]
    );
    assert!((planned.cut_length() - 396.0).abs() < 1e-6);
}

#[test]
fn test_notch_ending_inside_part_is_edge_notch() {
    let k = Kernel::new();
    // Ends 400 from XMin and 100 above ZMin
    let bounds = Bound3::new(
        Point3::new(0.0, -50.0, -100.0),
        Point3::new(2000.0, 30.0, 80.0),
    );
    let segs = chain(&[Piece::Web(200.0), Piece::Web(200.0)]);
    assert!(is_edge_notch(&segs, &bounds, &SynthesisConfig::default()));
    assert!(!is_edge_notch(&segs, &part(), &SynthesisConfig::default()));

    let planned = plan_notch(&k, segs, &bounds, &SynthesisConfig::default()).unwrap();
    assert_eq!(summary(&planned.blocks), vec![(MachineForward, 0, 1)]);
    assert!(planned
        .blocks
        .iter()
        .all(|b| !matches!(b.kind, ApproachMachining | GambitPreApproach | GambitPostApproach)));
    assert!((planned.cut_length() - 400.0).abs() < 1e-9);
}

#[test]
fn test_zero_wire_joint_distance_keeps_only_flex_joints() {
    let k = Kernel::new();
    let config = SynthesisConfig::default().with_wire_joint_distance(0.0);
    let planned = plan_notch(&k, bent_notch(), &part(), &config).unwrap();
    assert_eq!(planned.segments.len(), 8);
    for block in planned.blocks.iter().filter(|b| b.kind.is_wire_joint()) {
        assert!(block.kind.is_flex_wire_joint(), "{:?}", block);
        let len = k.length(&planned.segments[block.start_index].curve);
        assert!((len - 2.0).abs() < 1e-6);
    }
}

#[test]
fn test_short_profile_cannot_fit_wire_joints() {
    let k = Kernel::new();
    let segs = chain(&[Piece::Web(1.0), Piece::Web(1.0)]);
    let err = plan_notch(&k, segs, &part(), &SynthesisConfig::default()).unwrap_err();
    assert!(err.rule().is_none());
    assert!(matches!(err, ToolpathError::UnsupportedTopology(_)));
}

#[test]
fn test_every_wire_joint_has_configured_length() {
    let k = Kernel::new();
    let config = SynthesisConfig::default().with_wire_joint_distance(3.0);
    let planned = plan_notch(&k, bent_notch(), &part(), &config).unwrap();
    for block in planned.blocks.iter().filter(|b| b.kind.is_wire_joint()) {
        let len = k.length(&planned.segments[block.start_index].curve);
        assert!((len - 3.0).abs() < 0.1, "{:?} is {}", block, len);
    }
    assert_eq!(planned.blocks[0].kind, ApproachMachining);
}

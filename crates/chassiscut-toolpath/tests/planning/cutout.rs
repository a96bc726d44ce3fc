use chassiscut_core::{
    Curve, Flange, GeometryPort, Kernel, Point3, SynthesisConfig, ToolingSegment, Vector3,
};
use chassiscut_toolpath::segment_list::{check_continuity, total_length};
use chassiscut_toolpath::{check_coverage, plan_cutout, SectionKind::*, ToolpathError};

use crate::fixtures::{rectangle, rounded_rectangle, summary};

#[test]
fn test_small_hole_is_one_forward_pass() {
    let k = Kernel::new();
    let segs = rectangle(Point3::new(300.0, -20.0, 0.0), 100.0, 50.0);
    let planned = plan_cutout(&k, segs, &SynthesisConfig::default()).unwrap();
    assert_eq!(summary(&planned.blocks), vec![(MachineForward, 0, 3)]);
    assert_eq!(planned.blocks[0].flange, Some(Flange::Web));
    assert!(planned.approach.is_none());
    assert!(planned.entry.is_none());
    assert!((planned.cut_length() - 300.0).abs() < 1e-9);
}

#[test]
fn test_tall_web_hole_gets_landmark_joints() {
    let k = Kernel::new();
    // 1200 around; landmarks at 300, 600 (a corner) and 900
    let segs = rectangle(Point3::origin(), 100.0, 500.0);
    let planned = plan_cutout(&k, segs, &SynthesisConfig::default()).unwrap();
    assert_eq!(planned.segments.len(), 9);
    assert_eq!(
        summary(&planned.blocks),
        vec![
            (MachineForward, 0, 1),
            (WireJointJumpForward, 2, 2),
            (MachineForward, 3, 3),
            (WireJointJumpForward, 4, 4),
            (MachineForward, 5, 6),
            (WireJointJumpForward, 7, 7),
            (MachineForward, 8, 8),
        ]
    );
    assert!((planned.cut_length() - 1194.0).abs() < 1e-6);
}

#[test]
fn test_tall_hole_without_wire_joints() {
    let k = Kernel::new();
    let segs = rectangle(Point3::origin(), 100.0, 500.0);
    let config = SynthesisConfig::default().with_wire_joints(false);
    let planned = plan_cutout(&k, segs, &config).unwrap();
    assert_eq!(summary(&planned.blocks), vec![(MachineForward, 0, 3)]);
}

#[test]
fn test_tall_hole_with_zero_wire_joint_distance() {
    let k = Kernel::new();
    let segs = rectangle(Point3::origin(), 100.0, 500.0);
    let config = SynthesisConfig::default().with_wire_joint_distance(0.0);
    let planned = plan_cutout(&k, segs, &config).unwrap();
    assert_eq!(summary(&planned.blocks), vec![(MachineForward, 0, 3)]);
}

#[test]
fn test_rounded_hole_is_one_forward_pass() {
    let k = Kernel::new();
    let segs = rounded_rectangle(Point3::new(300.0, -20.0, 0.0), 100.0, 50.0, 10.0);
    let perimeter = 2.0 * 80.0 + 2.0 * 30.0 + 20.0 * std::f64::consts::PI;
    let planned = plan_cutout(&k, segs, &SynthesisConfig::default()).unwrap();
    assert_eq!(summary(&planned.blocks), vec![(MachineForward, 0, 7)]);
    assert!((planned.cut_length() - perimeter).abs() < 1e-6);
}

#[test]
fn test_tall_rounded_hole_keeps_arcs_and_joints() {
    let k = Kernel::new();
    let segs = rounded_rectangle(Point3::origin(), 300.0, 500.0, 140.0);
    let before = total_length(&k, &segs);
    let planned = plan_cutout(&k, segs, &SynthesisConfig::default()).unwrap();

    assert!((total_length(&k, &planned.segments) - before).abs() < 1e-6);
    check_continuity(&planned.segments, 1e-6).unwrap();
    check_coverage(&planned.blocks, planned.segments.len()).unwrap();
    assert_eq!(planned.segments.iter().filter(|s| s.curve.is_arc()).count(), 4);
    let joints: Vec<_> = planned
        .blocks
        .iter()
        .filter(|b| b.kind.is_wire_joint())
        .collect();
    assert_eq!(joints.len(), 3);
    for block in joints {
        let len = k.length(&planned.segments[block.start_index].curve);
        assert!((len - 2.0).abs() < 1e-6, "{:?} is {}", block, len);
    }
    assert!((planned.cut_length() - (before - 6.0)).abs() < 1e-6);
}

#[test]
fn test_profile_starting_on_bend_is_rotated() {
    let k = Kernel::new();
    let mut segs = rectangle(Point3::origin(), 100.0, 50.0);
    segs[0].end_normal = Vector3::y();
    let planned = plan_cutout(&k, segs, &SynthesisConfig::default()).unwrap();
    // The last side now leads, so the cut starts at (0, 50)
    assert_eq!(planned.segments[0].start(), Point3::new(0.0, 50.0, 0.0));
    assert_eq!(
        summary(&planned.blocks),
        vec![
            (MachineForward, 0, 0),
            (WireJointJumpForwardOnFlex, 1, 1),
            (MachineFlexForward, 2, 2),
            (WireJointJumpForwardOnFlex, 3, 3),
            (MachineForward, 4, 5),
        ]
    );
    assert_eq!(planned.blocks[2].flange, Some(Flange::Flex));
}

#[test]
fn test_negative_z_normal_unsupported() {
    let k = Kernel::new();
    let segs = vec![ToolingSegment::new(
        Curve::line(Point3::origin(), Point3::new(10.0, 0.0, 0.0)),
        -Vector3::z(),
        -Vector3::z(),
    )];
    let err = plan_cutout(&k, segs, &SynthesisConfig::default()).unwrap_err();
    assert!(matches!(err, ToolpathError::UnsupportedTopology(_)));
}

use chassiscut_core::{Curve, GeometryPort, Kernel, LengthFrom, Point3, Vector3};
use proptest::prelude::*;

const TOL: f64 = 1e-6;

#[test]
fn test_reversed_arc_has_same_length() {
    let k = Kernel::new();
    let arc = Curve::arc(
        Point3::new(10.0, 0.0, 5.0),
        Point3::new(0.0, 10.0, 5.0),
        Point3::new(0.0, 0.0, 5.0),
        Vector3::z(),
    );
    let rev = arc.reversed();
    assert!((k.length(&arc) - k.length(&rev)).abs() < TOL);
    assert_eq!(rev.start(), arc.end());
}

#[test]
fn test_point_from_end_matches_reversed_from_start() {
    let k = Kernel::new();
    let arc = Curve::arc(
        Point3::new(0.0, 3.0, 0.0),
        Point3::new(0.0, 0.0, 3.0),
        Point3::origin(),
        Vector3::x(),
    );
    let a = k.point_at_length(&arc, 1.25, LengthFrom::End);
    let b = k.point_at_length(&arc.reversed(), 1.25, LengthFrom::Start);
    assert!((a - b).norm() < TOL);
}

proptest! {
    #[test]
    fn prop_line_split_preserves_length(
        x in 1.0f64..200.0,
        y in -50.0f64..50.0,
        frac in 0.05f64..0.95,
    ) {
        let k = Kernel::new();
        let line = Curve::line(Point3::origin(), Point3::new(x, y, 0.0));
        let p = k.point_at_length(&line, k.length(&line) * frac, LengthFrom::Start);
        let pieces = k.split_at(&line, &p, TOL).unwrap();
        prop_assert_eq!(pieces.len(), 2);
        let total: f64 = pieces.iter().map(|c| k.length(c)).sum();
        prop_assert!((total - k.length(&line)).abs() < TOL);
    }

    #[test]
    fn prop_arc_point_round_trips_length(radius in 1.0f64..100.0, along in 0.0f64..1.5) {
        let k = Kernel::new();
        let arc = Curve::arc(
            Point3::new(radius, 0.0, 0.0),
            Point3::new(0.0, radius, 0.0),
            Point3::origin(),
            Vector3::z(),
        );
        let s = along * radius;
        let p = k.point_at_length(&arc, s, LengthFrom::Start);
        let back = k.length_to_point(&arc, &p, 1e-6 * radius).unwrap();
        prop_assert!((back - s).abs() < 1e-6 * radius);
    }
}

//! Property tests of the trajectory generator and the kinematics solver.

use hex_lib::kinematics::{self, LimbGeometry, LinkGeometry};
use hex_lib::trajectory::{interpolate, PathDescriptor, PathShape};
use nalgebra::Point3;
use proptest::prelude::*;

const SHAPES: [PathShape; 5] = [
    PathShape::Linear,
    PathShape::ArcXzLinearY,
    PathShape::ArcXzSinusY,
    PathShape::EllipticalXzSinusY,
    PathShape::EllipticalYzSinusX,
];

fn link(length_mm: f64, zero_rotate_deg: f64) -> LinkGeometry {
    LinkGeometry {
        length_mm,
        zero_rotate_deg,
        min_angle_deg: -90.0,
        max_angle_deg: 90.0,
    }
}

fn geometry() -> LimbGeometry {
    LimbGeometry {
        coxa: link(40.0, 0.0),
        femur: link(80.0, 0.0),
        tibia: link(120.0, 90.0),
    }
}

/// Distance of the target from the femur joint, for `geometry()`.
fn femur_distance(p: &Point3<f64>) -> f64 {
    (p.x.hypot(p.z) - 40.0).hypot(p.y)
}

fn point(range: f64) -> impl Strategy<Value = Point3<f64>> {
    (-range..range, -range..range, -range..range).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

proptest! {
    #[test]
    fn path_ends_are_exact(
        shape_idx in 0usize..5,
        start in point(300.0),
        dest in point(300.0),
        total in 1u32..1000,
    ) {
        let desc = PathDescriptor::new(SHAPES[shape_idx], start, dest);

        prop_assert_eq!(interpolate(&desc, 0, total).unwrap(), start);
        prop_assert_eq!(interpolate(&desc, total, total).unwrap(), dest);
    }

    #[test]
    fn path_points_are_finite(
        shape_idx in 0usize..5,
        start in point(300.0),
        dest in point(300.0),
        total in 1u32..200,
        frac in 0.0f64..1.0,
    ) {
        let desc = PathDescriptor::new(SHAPES[shape_idx], start, dest);
        let step = (frac * total as f64) as u32;
        let p = interpolate(&desc, step, total).unwrap();

        prop_assert!(p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
    }

    #[test]
    fn solver_is_total(target in point(500.0)) {
        let geom = geometry();
        let d = femur_distance(&target);

        match kinematics::solve(&target, &geom) {
            Ok(a) => {
                prop_assert!(d <= 200.0 + 1e-9);
                prop_assert!(a.coxa_deg.is_finite());
                prop_assert!(a.femur_deg.is_finite());
                prop_assert!(a.tibia_deg.is_finite());
            }
            Err(e) => {
                prop_assert!(e.is_unreachable());
                prop_assert!(d > 200.0 - 1e-9 || d < 1e-6);
            }
        }
    }

    #[test]
    fn solver_round_trip(target in point(220.0)) {
        let d = femur_distance(&target);
        prop_assume!(d > 1.0 && d < 199.0);

        let geom = geometry();
        let angles = kinematics::solve(&target, &geom).unwrap();
        let p = kinematics::forward(&angles, &geom);

        prop_assert!((p - target).norm() < 1e-6, "{} != {}", p, target);
    }
}

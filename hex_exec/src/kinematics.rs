//! # Limb kinematics
//!
//! Closed form inverse kinematics for a three link (coxa, femur, tibia) limb,
//! plus the matching forward solution.
//!
//! Foot positions are given in millimetres in a frame centred on the coxa
//! joint and aligned with the body: X points to the right, Y up and Z
//! forwards. The coxa zero-rotation turns this frame into the limb's own
//! frame before solving.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Geometry of a single link of a limb.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkGeometry {
    /// Length of the link.
    ///
    /// Units: millimetres
    pub length_mm: f64,

    /// Angle of the link's servo at which the link is considered straight.
    ///
    /// Units: degrees, in [-360, 360]
    pub zero_rotate_deg: f64,

    /// Lowest allowed joint angle.
    ///
    /// Units: degrees
    pub min_angle_deg: f64,

    /// Highest allowed joint angle.
    ///
    /// Units: degrees
    pub max_angle_deg: f64,
}

/// Geometry of a complete limb.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbGeometry {
    pub coxa: LinkGeometry,
    pub femur: LinkGeometry,
    pub tibia: LinkGeometry,
}

/// Solved joint angles of one limb.
///
/// Units: degrees
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointAngles {
    pub coxa_deg: f64,
    pub femur_deg: f64,
    pub tibia_deg: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Joint of a limb, in servo order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Joint {
    Coxa,
    Femur,
    Tibia,
}

/// What to do with a solved angle outside of its joint's limits.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AngleLimitPolicy {
    /// Log the violation and keep the angle.
    Advisory,

    /// Clamp the angle into the limits.
    Clamp,

    /// Reject the solution.
    Reject,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum KinematicsError {
    #[error(
        "Target is out of reach: {distance_mm:.2} mm from the femur joint, \
         the limb reaches {reach_mm:.2} mm"
    )]
    Unreachable { distance_mm: f64, reach_mm: f64 },

    #[error("Target lies on the femur joint and has no unique solution")]
    Degenerate,

    #[error("Target is not a finite point")]
    NonFinite,

    #[error("{0:?} angle of {1:.2} deg is outside of [{2}, {3}] deg")]
    AngleLimit(Joint, f64, f64, f64),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for AngleLimitPolicy {
    fn default() -> Self {
        AngleLimitPolicy::Advisory
    }
}

impl KinematicsError {
    /// True if the solver could not place the foot at the target at all, as
    /// opposed to placing it with an out-of-limit angle.
    pub fn is_unreachable(&self) -> bool {
        !matches!(self, KinematicsError::AngleLimit(..))
    }
}

impl LinkGeometry {
    fn in_limits(&self, angle_deg: f64) -> bool {
        angle_deg >= self.min_angle_deg && angle_deg <= self.max_angle_deg
    }
}

impl JointAngles {
    /// The angles as an array in servo order.
    pub fn as_array(&self) -> [f64; 3] {
        [self.coxa_deg, self.femur_deg, self.tibia_deg]
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the joint angles which place the foot at `target`.
///
/// Never panics and never returns NaN angles. A target further than
/// `femur + tibia` from the femur joint, or exactly on it, is reported as an
/// error. Angle limits are not checked here, see [`apply_limits`].
pub fn solve(target: &Point3<f64>, geom: &LimbGeometry) -> Result<JointAngles, KinematicsError> {
    if !(target.x.is_finite() && target.y.is_finite() && target.z.is_finite()) {
        return Err(KinematicsError::NonFinite);
    }

    // Rotate into the limb frame
    let r = geom.coxa.zero_rotate_deg.to_radians();
    let x1 = target.x * r.cos() + target.z * r.sin();
    let y1 = target.y;
    let z1 = -target.x * r.sin() + target.z * r.cos();

    let coxa_rad = z1.atan2(x1);

    // Project into the plane of the limb and remove the coxa
    let x2 = x1 * coxa_rad.cos() + z1 * coxa_rad.sin() - geom.coxa.length_mm;

    let fi = y1.atan2(x2);
    let d = x2.hypot(y1);

    let femur = geom.femur.length_mm;
    let tibia = geom.tibia.length_mm;
    let reach = femur + tibia;

    if d > reach {
        return Err(KinematicsError::Unreachable {
            distance_mm: d,
            reach_mm: reach,
        });
    }
    if d <= std::f64::EPSILON {
        return Err(KinematicsError::Degenerate);
    }

    // Law of cosines on the femur/tibia/target triangle. The arguments are
    // clamped as rounding can push them just outside [-1, 1] when the limb
    // is fully stretched or folded.
    let alpha = clamp(
        (femur.powi(2) + d.powi(2) - tibia.powi(2)) / (2.0 * femur * d),
        -1.0,
        1.0,
    )
    .acos();
    let gamma = clamp(
        (tibia.powi(2) + femur.powi(2) - d.powi(2)) / (2.0 * tibia * femur),
        -1.0,
        1.0,
    )
    .acos();

    Ok(JointAngles {
        coxa_deg: coxa_rad.to_degrees(),
        femur_deg: geom.femur.zero_rotate_deg - alpha.to_degrees() - fi.to_degrees(),
        tibia_deg: gamma.to_degrees() - geom.tibia.zero_rotate_deg,
    })
}

/// Compute the foot position reached with the given joint angles.
pub fn forward(angles: &JointAngles, geom: &LimbGeometry) -> Point3<f64> {
    let femur = geom.femur.length_mm;
    let tibia = geom.tibia.length_mm;

    // Femur direction in the limb plane, measured from the horizontal
    let theta = (geom.femur.zero_rotate_deg - angles.femur_deg).to_radians();
    let gamma = (angles.tibia_deg + geom.tibia.zero_rotate_deg).to_radians();
    let tibia_dir = theta + gamma - std::f64::consts::PI;

    let u = femur * theta.cos() + tibia * tibia_dir.cos();
    let v = femur * theta.sin() + tibia * tibia_dir.sin();

    // Back out of the limb plane
    let rho = u + geom.coxa.length_mm;
    let coxa = angles.coxa_deg.to_radians();
    let x1 = rho * coxa.cos();
    let z1 = rho * coxa.sin();

    // And out of the limb frame
    let r = geom.coxa.zero_rotate_deg.to_radians();
    Point3::new(x1 * r.cos() - z1 * r.sin(), v, x1 * r.sin() + z1 * r.cos())
}

/// Check solved angles against the joint limits.
///
/// Returns the (possibly clamped) angles and a flag per joint which is set
/// when that joint was outside of its limits.
pub fn apply_limits(
    angles: JointAngles,
    geom: &LimbGeometry,
    policy: AngleLimitPolicy,
) -> Result<(JointAngles, [bool; 3]), KinematicsError> {
    let links = [
        (Joint::Coxa, &geom.coxa),
        (Joint::Femur, &geom.femur),
        (Joint::Tibia, &geom.tibia),
    ];
    let mut out = angles.as_array();
    let mut limited = [false; 3];

    for (i, (joint, link)) in links.iter().enumerate() {
        if link.in_limits(out[i]) {
            continue;
        }

        limited[i] = true;
        match policy {
            AngleLimitPolicy::Advisory => (),
            AngleLimitPolicy::Clamp => {
                out[i] = clamp(out[i], link.min_angle_deg, link.max_angle_deg)
            }
            AngleLimitPolicy::Reject => {
                return Err(KinematicsError::AngleLimit(
                    *joint,
                    out[i],
                    link.min_angle_deg,
                    link.max_angle_deg,
                ))
            }
        }
    }

    Ok((
        JointAngles {
            coxa_deg: out[0],
            femur_deg: out[1],
            tibia_deg: out[2],
        },
        limited,
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    fn link(length_mm: f64, zero_rotate_deg: f64) -> LinkGeometry {
        LinkGeometry {
            length_mm,
            zero_rotate_deg,
            min_angle_deg: -90.0,
            max_angle_deg: 90.0,
        }
    }

    fn assert_point_eq(a: &Point3<f64>, b: &Point3<f64>) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-9);
    }

    fn zero_geom() -> LimbGeometry {
        LimbGeometry {
            coxa: link(40.0, 0.0),
            femur: link(80.0, 0.0),
            tibia: link(120.0, 0.0),
        }
    }

    #[test]
    fn test_straight_limb() {
        // Fully stretched horizontally along X
        let a = solve(&Point3::new(240.0, 0.0, 0.0), &zero_geom()).unwrap();
        assert_relative_eq!(a.coxa_deg, 0.0);
        assert_relative_eq!(a.femur_deg, 0.0, epsilon = 1e-6);
        assert_relative_eq!(a.tibia_deg, 180.0, epsilon = 1e-6);
    }

    #[test]
    fn test_coxa_bearing() {
        // Coxa angle is atan2(z', x') in the rotated limb frame
        let geom = zero_geom();
        let a = solve(&Point3::new(100.0, -50.0, 100.0), &geom).unwrap();
        assert_relative_eq!(a.coxa_deg, 45.0, epsilon = 1e-9);
        let a = solve(&Point3::new(100.0, -50.0, -100.0), &geom).unwrap();
        assert_relative_eq!(a.coxa_deg, -45.0, epsilon = 1e-9);

        let mut geom = zero_geom();
        geom.coxa.zero_rotate_deg = 90.0;
        let a = solve(&Point3::new(0.0, -50.0, 150.0), &geom).unwrap();
        assert_relative_eq!(a.coxa_deg, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_reachability() {
        let geom = zero_geom();

        // Exactly at full reach is fine
        assert!(solve(&Point3::new(240.0, 0.0, 0.0), &geom).is_ok());

        assert!(matches!(
            solve(&Point3::new(240.1, 0.0, 0.0), &geom),
            Err(KinematicsError::Unreachable { .. })
        ));
        assert_eq!(
            solve(&Point3::new(40.0, 0.0, 0.0), &geom),
            Err(KinematicsError::Degenerate)
        );
        assert_eq!(
            solve(&Point3::new(std::f64::NAN, 0.0, 0.0), &geom),
            Err(KinematicsError::NonFinite)
        );
    }

    #[test]
    fn test_folded_limb_has_no_nan() {
        // Closer than |tibia - femur| cannot be reached exactly but must not
        // produce NaNs
        let a = solve(&Point3::new(50.0, -10.0, 0.0), &zero_geom()).unwrap();
        assert!(a.coxa_deg.is_finite());
        assert!(a.femur_deg.is_finite());
        assert!(a.tibia_deg.is_finite());
    }

    #[test]
    fn test_round_trip() {
        let geom = zero_geom();
        let targets = [
            Point3::new(130.0, -100.0, 0.0),
            Point3::new(120.0, -90.0, 60.0),
            Point3::new(150.0, -30.0, -40.0),
            Point3::new(100.0, 20.0, 100.0),
        ];

        for p in targets.iter() {
            let a = solve(p, &geom).unwrap();
            assert_point_eq(&forward(&a, &geom), p);
        }
    }

    #[test]
    fn test_round_trip_mirrored_limb() {
        let mut geom = zero_geom();
        geom.coxa.zero_rotate_deg = 180.0;
        geom.femur.zero_rotate_deg = 10.0;
        geom.tibia.zero_rotate_deg = 90.0;

        let p = Point3::new(-130.0, -100.0, 60.0);
        let a = solve(&p, &geom).unwrap();
        assert_point_eq(&forward(&a, &geom), &p);

        // Mirrored limb pointing forwards turns its coxa the other way
        assert!(a.coxa_deg < 0.0);
    }

    #[test]
    fn test_limit_policies() {
        let geom = zero_geom();
        let angles = JointAngles {
            coxa_deg: 10.0,
            femur_deg: -100.0,
            tibia_deg: 95.0,
        };

        let (a, limited) = apply_limits(angles, &geom, AngleLimitPolicy::Advisory).unwrap();
        assert_eq!(a, angles);
        assert_eq!(limited, [false, true, true]);

        let (a, limited) = apply_limits(angles, &geom, AngleLimitPolicy::Clamp).unwrap();
        assert_eq!(a.as_array(), [10.0, -90.0, 90.0]);
        assert_eq!(limited, [false, true, true]);

        assert_eq!(
            apply_limits(angles, &geom, AngleLimitPolicy::Reject),
            Err(KinematicsError::AngleLimit(Joint::Femur, -100.0, -90.0, 90.0))
        );
    }
}

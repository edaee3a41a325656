//! Built-in sequence library
//!
//! Positions match the default limb layout of `params/limbs_driver.toml`: each
//! foot position is relative to its coxa joint, left limbs at negative X.
//! Walking gaits are tripod gaits, the front and rear limbs of one side moving
//! together with the middle limb of the other side.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::{Point3, Vector3};
use std::collections::HashMap;

use super::{Iteration, Sequence};
use crate::trajectory::PathShape;
use crate::NUM_LIMBS;
use comms_if::tc::gait::SequenceId;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Forward offset of the front, middle and rear feet.
///
/// Units: millimetres
const LIMB_Z_MM: [f64; 3] = [60.0, 0.0, -60.0];

/// Foot position resting on the ground, as `(|x|, y)`.
///
/// Units: millimetres
const REST_MM: (f64, f64) = (150.0, -30.0);

/// Foot position when standing, as `(|x|, y)`.
///
/// Units: millimetres
const STAND_MM: (f64, f64) = (130.0, -100.0);

/// Foot position when standing with the limbs spread, as `(|x|, y)`.
///
/// Units: millimetres
const WIDE_MM: (f64, f64) = (150.0, -100.0);

/// Height of a foot above the ground half way through a swing.
///
/// Units: millimetres
const LIFT_MM: f64 = 30.0;

/// Limbs of the first tripod, the second one is made of the others.
const TRIPOD_A: [usize; 3] = [0, 2, 4];

// ---- WALKING ----

/// Units: millimetres
const WALK_STRIDE_MM: f64 = 30.0;
/// Units: millimetres
const RUN_STRIDE_MM: f64 = 40.0;
/// Units: millimetres
const SHIFT_STRIDE_MM: f64 = 25.0;
/// Units: degrees
const ROTATE_STRIDE_DEG: f64 = 12.0;

const WALK_SMOOTHNESS: u32 = 20;
const SLOW_SMOOTHNESS: u32 = 40;
const RUN_SMOOTHNESS: u32 = 12;

// ---- POSTURE ----

const POSTURE_SMOOTHNESS: u32 = 30;

// ---- ATTACK ----

/// Attacking foot raised, as `(|x|, y, z)`.
///
/// Units: millimetres
const ATTACK_RAISED_MM: (f64, f64, f64) = (130.0, -20.0, 120.0);

/// Attacking foot after the strike, as `(|x|, y, z)`.
///
/// Units: millimetres
const ATTACK_STRIKE_MM: (f64, f64, f64) = (130.0, -60.0, 110.0);

// ---- BODY MOTION ----

/// Units: millimetres
const SWAY_MM: f64 = 20.0;
/// Units: millimetres
const TILT_MM: f64 = 20.0;
/// Units: degrees
const YAW_DEG: f64 = 10.0;

const BODY_SMOOTHNESS: u32 = 25;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build every sequence the hexapod can run.
pub fn build_library() -> HashMap<SequenceId, Sequence> {
    let mut lib = HashMap::new();

    lib.insert(SequenceId::Up, up());
    lib.insert(SequenceId::Down, down());

    lib.insert(
        SequenceId::DirectMovement,
        walk(WALK_STRIDE_MM, WALK_SMOOTHNESS),
    );
    lib.insert(
        SequenceId::ReverseMovement,
        walk(-WALK_STRIDE_MM, WALK_SMOOTHNESS),
    );
    lib.insert(
        SequenceId::DirectMovementSlow,
        walk(WALK_STRIDE_MM, SLOW_SMOOTHNESS),
    );
    lib.insert(
        SequenceId::ReverseMovementSlow,
        walk(-WALK_STRIDE_MM, SLOW_SMOOTHNESS),
    );
    lib.insert(SequenceId::Run, walk(RUN_STRIDE_MM, RUN_SMOOTHNESS));

    lib.insert(SequenceId::ShiftLeft, shift(-SHIFT_STRIDE_MM));
    lib.insert(SequenceId::ShiftRight, shift(SHIFT_STRIDE_MM));

    lib.insert(SequenceId::RotateLeft, rotate(-ROTATE_STRIDE_DEG));
    lib.insert(SequenceId::RotateRight, rotate(ROTATE_STRIDE_DEG));

    lib.insert(SequenceId::AttackLeft, attack(0));
    lib.insert(SequenceId::AttackRight, attack(3));

    lib.insert(SequenceId::Dance, dance());
    lib.insert(SequenceId::RotateX, rotate_x());
    lib.insert(SequenceId::RotateZ, rotate_z());

    lib
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// -1 for the left limbs, 1 for the right ones.
fn side(limb: usize) -> f64 {
    if limb < NUM_LIMBS / 2 {
        -1.0
    } else {
        1.0
    }
}

/// Foot position of `limb` in a symmetrical pose.
fn foot(limb: usize, (x, y): (f64, f64)) -> Point3<f64> {
    Point3::new(side(limb) * x, y, LIMB_Z_MM[limb % 3])
}

fn pose(xy: (f64, f64)) -> [Point3<f64>; NUM_LIMBS] {
    let mut points = [Point3::origin(); NUM_LIMBS];
    for (i, p) in points.iter_mut().enumerate() {
        *p = foot(i, xy);
    }
    points
}

fn stand() -> [Point3<f64>; NUM_LIMBS] {
    pose(STAND_MM)
}

/// Rotate a point about the limb origin in the XZ plane.
fn rotated(p: &Point3<f64>, angle_deg: f64) -> Point3<f64> {
    if angle_deg == 0.0 {
        return *p;
    }

    let r = p.x.hypot(p.z);
    let bearing = p.x.atan2(p.z) + angle_deg.to_radians();
    Point3::new(r * bearing.sin(), p.y, r * bearing.cos())
}

fn iteration<F>(smoothness: u32, mut limb_move: F) -> Iteration
where
    F: FnMut(usize) -> (Point3<f64>, PathShape),
{
    let mut points = [Point3::origin(); NUM_LIMBS];
    let mut shapes = [PathShape::Linear; NUM_LIMBS];

    for i in 0..NUM_LIMBS {
        let (p, s) = limb_move(i);
        points[i] = p;
        shapes[i] = s;
    }

    Iteration {
        points,
        shapes,
        smoothness,
    }
}

/// Iteration moving every limb along a straight line.
fn linear(smoothness: u32, points: [Point3<f64>; NUM_LIMBS]) -> Iteration {
    Iteration {
        points,
        shapes: [PathShape::Linear; NUM_LIMBS],
        smoothness,
    }
}

fn up() -> Sequence {
    Sequence {
        iterations: vec![
            linear(POSTURE_SMOOTHNESS, pose(WIDE_MM)),
            linear(POSTURE_SMOOTHNESS, stand()),
        ],
        main_begin: 0,
        finalize_begin: 2,
        total_count: 2,
        is_looped: false,
    }
}

fn down() -> Sequence {
    Sequence {
        iterations: vec![linear(POSTURE_SMOOTHNESS, pose(REST_MM))],
        main_begin: 0,
        finalize_begin: 1,
        total_count: 1,
        is_looped: false,
    }
}

/// Build a tripod gait.
///
/// `stride(limb, phase)` gives the ground position of a limb at a phase of
/// its stride, from -1 (end of the stroke) to 1 (end of the swing), phase 0
/// being the standing position. Each tripod alternately swings through the
/// air and strokes along the ground.
fn tripod<F>(stride: F, swing: PathShape, stroke: PathShape, smoothness: u32) -> Sequence
where
    F: Fn(usize, f64) -> Point3<f64>,
{
    // (lifted, phase, shape) of tripod A then tripod B
    let plan = [
        // Prepare
        ((true, 0.5, swing), (false, -0.5, stroke)),
        ((false, 1.0, swing), (false, -1.0, stroke)),
        // Main
        ((false, 0.0, stroke), (true, 0.0, swing)),
        ((false, -1.0, stroke), (false, 1.0, swing)),
        ((true, 0.0, swing), (false, 0.0, stroke)),
        ((false, 1.0, swing), (false, -1.0, stroke)),
        // Finalize
        ((false, 0.0, stroke), (true, 0.0, swing)),
        ((false, 0.0, stroke), (false, 0.0, swing)),
    ];

    let iterations = plan
        .iter()
        .map(|(a, b)| {
            iteration(smoothness, |limb| {
                let (lifted, phase, shape) = if TRIPOD_A.contains(&limb) { a } else { b };

                let mut p = stride(limb, *phase);
                if *lifted {
                    p.y += LIFT_MM;
                }
                (p, *shape)
            })
        })
        .collect();

    Sequence {
        iterations,
        main_begin: 2,
        finalize_begin: 6,
        total_count: 8,
        is_looped: true,
    }
}

/// Walk along Z, backwards for a negative stride.
fn walk(stride_mm: f64, smoothness: u32) -> Sequence {
    let neutral = stand();
    tripod(
        |limb, phase| neutral[limb] + Vector3::new(0.0, 0.0, stride_mm * phase),
        PathShape::EllipticalXzSinusY,
        PathShape::Linear,
        smoothness,
    )
}

/// Walk along X, to the left for a negative stride.
fn shift(stride_mm: f64) -> Sequence {
    let neutral = stand();
    tripod(
        |limb, phase| neutral[limb] + Vector3::new(stride_mm * phase, 0.0, 0.0),
        PathShape::EllipticalYzSinusX,
        PathShape::Linear,
        WALK_SMOOTHNESS,
    )
}

/// Turn on the spot, to the left for a negative stride.
fn rotate(stride_deg: f64) -> Sequence {
    let neutral = stand();
    tripod(
        |limb, phase| rotated(&neutral[limb], stride_deg * phase),
        PathShape::ArcXzSinusY,
        PathShape::ArcXzLinearY,
        WALK_SMOOTHNESS,
    )
}

/// Raise one front limb, strike and put it back down.
fn attack(attacker: usize) -> Sequence {
    let neutral = stand();
    let s = side(attacker);
    let raised = Point3::new(s * ATTACK_RAISED_MM.0, ATTACK_RAISED_MM.1, ATTACK_RAISED_MM.2);
    let strike = Point3::new(s * ATTACK_STRIKE_MM.0, ATTACK_STRIKE_MM.1, ATTACK_STRIKE_MM.2);

    let with_attacker = |smoothness: u32, p: Point3<f64>, shape: PathShape| {
        iteration(smoothness, |limb| {
            if limb == attacker {
                (p, shape)
            } else {
                (neutral[limb], PathShape::Linear)
            }
        })
    };

    Sequence {
        iterations: vec![
            with_attacker(20, raised, PathShape::EllipticalXzSinusY),
            with_attacker(8, strike, PathShape::Linear),
            with_attacker(20, neutral[attacker], PathShape::Linear),
        ],
        main_begin: 0,
        finalize_begin: 3,
        total_count: 3,
        is_looped: false,
    }
}

/// Sway the body from side to side.
fn dance() -> Sequence {
    let sway = |dx: f64| {
        iteration(BODY_SMOOTHNESS, |limb| {
            let mut p = foot(limb, STAND_MM);
            p.x += dx;
            (p, PathShape::Linear)
        })
    };

    Sequence {
        iterations: vec![
            sway(SWAY_MM),
            sway(-SWAY_MM),
            sway(SWAY_MM),
            linear(BODY_SMOOTHNESS, stand()),
        ],
        main_begin: 1,
        finalize_begin: 3,
        total_count: 4,
        is_looped: true,
    }
}

/// Pitch and roll the body in turn.
fn rotate_x() -> Sequence {
    let pitch = |dy: f64| {
        iteration(BODY_SMOOTHNESS, |limb| {
            let mut p = foot(limb, STAND_MM);
            match limb % 3 {
                0 => p.y -= dy,
                2 => p.y += dy,
                _ => (),
            }
            (p, PathShape::Linear)
        })
    };
    let roll = |dy: f64| {
        iteration(BODY_SMOOTHNESS, |limb| {
            let mut p = foot(limb, STAND_MM);
            p.y += side(limb) * dy;
            (p, PathShape::Linear)
        })
    };

    Sequence {
        iterations: vec![
            pitch(TILT_MM),
            roll(TILT_MM),
            pitch(-TILT_MM),
            roll(-TILT_MM),
            pitch(TILT_MM),
            linear(BODY_SMOOTHNESS, stand()),
        ],
        main_begin: 1,
        finalize_begin: 5,
        total_count: 6,
        is_looped: true,
    }
}

/// Yaw the body with the feet planted.
fn rotate_z() -> Sequence {
    let neutral = stand();
    let yaw = |angle_deg: f64| {
        iteration(BODY_SMOOTHNESS, |limb| {
            (rotated(&neutral[limb], angle_deg), PathShape::ArcXzLinearY)
        })
    };

    Sequence {
        iterations: vec![
            yaw(YAW_DEG),
            yaw(-YAW_DEG),
            yaw(YAW_DEG),
            iteration(BODY_SMOOTHNESS, |limb| (neutral[limb], PathShape::ArcXzLinearY)),
        ],
        main_begin: 1,
        finalize_begin: 3,
        total_count: 4,
        is_looped: true,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kinematics::{self, AngleLimitPolicy};
    use crate::test_utils::limbs_params;
    use crate::trajectory::PathDescriptor;

    fn assert_pose_eq(a: &[Point3<f64>; NUM_LIMBS], b: &[Point3<f64>; NUM_LIMBS]) {
        for (p, q) in a.iter().zip(b.iter()) {
            assert!((p - q).norm() < 1e-9, "{} != {}", p, q);
        }
    }

    #[test]
    fn test_library_complete_and_valid() {
        let lib = build_library();

        for id in SequenceId::ALL.iter() {
            if *id == SequenceId::None {
                assert!(!lib.contains_key(id));
            } else {
                let seq = lib.get(id).unwrap();
                assert_eq!(seq.validate(), Ok(()), "{:?}", id);
            }
        }
    }

    #[test]
    fn test_rest_pose_is_start_position() {
        let config = limbs_params().limbs_config().unwrap();
        let lib = build_library();
        let down = &lib[&SequenceId::Down];

        for (i, (_, start)) in config.iter().enumerate() {
            assert_eq!(down.iterations[0].points[i], *start);
        }
    }

    /// Every point of every path of every sequence solves within the joint
    /// limits, and every sequence ends standing (or resting).
    #[test]
    fn test_sequences_reachable() {
        let config = limbs_params().limbs_config().unwrap();
        let mut rest = [Point3::origin(); NUM_LIMBS];
        for (i, (_, start)) in config.iter().enumerate() {
            rest[i] = *start;
        }

        for (id, seq) in build_library().iter() {
            let mut pos = if *id == SequenceId::Up { rest } else { stand() };

            for (it_idx, it) in seq.iterations.iter().enumerate() {
                for limb in 0..NUM_LIMBS {
                    let geom = &config[limb].0;
                    let path = PathDescriptor::new(it.shapes[limb], pos[limb], it.points[limb]);

                    for step in 0..=it.smoothness {
                        let p = path.point_at(step, it.smoothness).unwrap();
                        let angles = kinematics::solve(&p, geom).unwrap_or_else(|e| {
                            panic!("{:?} iteration {} limb {}: {}", id, it_idx, limb, e)
                        });
                        kinematics::apply_limits(angles, geom, AngleLimitPolicy::Reject)
                            .unwrap_or_else(|e| {
                                panic!("{:?} iteration {} limb {}: {}", id, it_idx, limb, e)
                            });
                    }
                }
                pos = it.points;
            }

            if *id == SequenceId::Down {
                assert_pose_eq(&pos, &rest);
            } else {
                assert_pose_eq(&pos, &stand());
            }
        }
    }

    #[test]
    fn test_tripods_alternate() {
        let lib = build_library();
        let walk = &lib[&SequenceId::DirectMovement];

        // Main stage, first iteration: tripod B is in the air
        let it = &walk.iterations[walk.main_begin];
        for limb in 0..NUM_LIMBS {
            let lifted = it.points[limb].y > STAND_MM.1;
            assert_eq!(lifted, !TRIPOD_A.contains(&limb));
        }

        // Forward walking swings the feet forwards
        let it = &walk.iterations[walk.main_begin + 1];
        assert!(it.points[1].z > stand()[1].z);
        assert!(it.points[0].z < stand()[0].z);
    }
}

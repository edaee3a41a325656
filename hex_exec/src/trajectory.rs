//! # Trajectory generation
//!
//! Computes the intermediate foot positions of a limb moving from a start
//! point to a destination point along one of several path shapes.
//!
//! Progress along a path is given as a step index out of a total number of
//! steps. Internally this is mapped onto a parameter `t` running from 0 to
//! 180 degrees.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::f64::consts::PI;

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use util::maths::{lerp, wrap_to_pi};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Value of the path parameter at the destination.
///
/// Units: degrees
pub const T_MAX_DEG: f64 = 180.0;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A path followed by one limb during a move.
///
/// The start and destination are fixed when the move is issued.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathDescriptor {
    pub shape: PathShape,
    pub start: Point3<f64>,
    pub dest: Point3<f64>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Shape of the path between two points.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PathShape {
    /// Straight line.
    Linear,

    /// Circular arc about the limb origin in XZ, linear in Y.
    ArcXzLinearY,

    /// Circular arc about the limb origin in XZ, sine eased in Y.
    ArcXzSinusY,

    /// Ellipse in XZ with Z along the major axis, sine eased in Y.
    EllipticalXzSinusY,

    /// Ellipse in XZ with X along the major axis, sine eased in Y.
    EllipticalYzSinusX,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TrajectoryError {
    #[error("A path must have at least one step")]
    ZeroTotalSteps,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for PathShape {
    fn default() -> Self {
        PathShape::Linear
    }
}

impl Default for PathDescriptor {
    fn default() -> Self {
        Self {
            shape: PathShape::Linear,
            start: Point3::origin(),
            dest: Point3::origin(),
        }
    }
}

impl PathDescriptor {
    pub fn new(shape: PathShape, start: Point3<f64>, dest: Point3<f64>) -> Self {
        Self { shape, start, dest }
    }

    /// Point at `step_index` out of `total_steps`, see [`interpolate`].
    pub fn point_at(&self, step_index: u32, total_steps: u32) -> Result<Point3<f64>, TrajectoryError> {
        interpolate(self, step_index, total_steps)
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the point at `step_index` along the path.
///
/// Step 0 is exactly the start point and any step at or beyond
/// `total_steps` is exactly the destination, whatever the shape.
pub fn interpolate(
    desc: &PathDescriptor,
    step_index: u32,
    total_steps: u32,
) -> Result<Point3<f64>, TrajectoryError> {
    if total_steps == 0 {
        return Err(TrajectoryError::ZeroTotalSteps);
    }
    if step_index == 0 {
        return Ok(desc.start);
    }
    if step_index >= total_steps {
        return Ok(desc.dest);
    }

    let frac = step_index as f64 / total_steps as f64;
    let t = (frac * T_MAX_DEG).to_radians();

    let p0 = &desc.start;
    let p1 = &desc.dest;

    let point = match desc.shape {
        PathShape::Linear => Point3::new(
            lerp(p0.x, p1.x, frac),
            lerp(p0.y, p1.y, frac),
            lerp(p0.z, p1.z, frac),
        ),
        PathShape::ArcXzLinearY => {
            let (x, z) = arc_xz(p0, p1, frac);
            Point3::new(x, lerp(p0.y, p1.y, frac), z)
        }
        PathShape::ArcXzSinusY => {
            let (x, z) = arc_xz(p0, p1, frac);
            Point3::new(x, sine_ease(p0.y, p1.y, t), z)
        }
        PathShape::EllipticalXzSinusY => Point3::new(
            p0.x + (p1.x - p0.x) * (t / 2.0).sin(),
            sine_ease(p0.y, p1.y, t),
            ellipse_major(p0.z, p1.z, t),
        ),
        PathShape::EllipticalYzSinusX => Point3::new(
            ellipse_major(p0.x, p1.x, t),
            sine_ease(p0.y, p1.y, t),
            p0.z + (p1.z - p0.z) * (t / 2.0).sin(),
        ),
    };

    Ok(point)
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Ease from `a` to `b` following half a cosine, `t` in radians on [0, pi].
fn sine_ease(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * (1.0 - t.cos()) / 2.0
}

/// Major axis of the ellipse, the semi-axis is half the span between the
/// points and the angle runs from `pi` down to zero.
fn ellipse_major(a: f64, b: f64, t: f64) -> f64 {
    let semi = (b - a) / 2.0;
    semi * (PI - t).cos() + a + semi
}

/// Sweep around the limb origin between the bearings of the two points.
///
/// The radius is interpolated too so that the arc lands on the destination
/// when both points are not on the same circle.
fn arc_xz(p0: &Point3<f64>, p1: &Point3<f64>, frac: f64) -> (f64, f64) {
    let r0 = p0.x.hypot(p0.z);
    let r1 = p1.x.hypot(p1.z);
    let b0 = p0.x.atan2(p0.z);
    let b1 = p1.x.atan2(p1.z);

    let bearing = b0 + wrap_to_pi(b1 - b0) * frac;
    let radius = lerp(r0, r1, frac);

    (radius * bearing.sin(), radius * bearing.cos())
}

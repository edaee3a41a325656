//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Linear interpolation between `a` and `b`, `frac` in [0, 1].
///
/// Written as `a + (b - a) * frac` so that `frac == 0` returns `a` exactly.
pub fn lerp<T>(a: T, b: T, frac: T) -> T
where
    T: Float,
{
    a + (b - a) * frac
}

/// Clamp a value into `[min, max]`.
pub fn clamp<T>(value: T, min: T, max: T) -> T
where
    T: Float,
{
    if value > max {
        max
    } else if value < min {
        min
    } else {
        value
    }
}

/// Wrap an angle in radians into `[-pi, pi)`.
///
/// Used to take the short way round when sweeping between two bearings.
pub fn wrap_to_pi<T>(angle: T) -> T
where
    T: Float,
{
    let pi = T::from(std::f64::consts::PI).unwrap_or_else(T::zero);
    let tau = pi + pi;
    let r = (angle + pi) % tau;
    if r < T::zero() {
        r + tau - pi
    } else {
        r - pi
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(3.0, 7.0, 0.0), 3.0);
        assert_eq!(lerp(3.0, 7.0, 0.5), 5.0);
        assert_eq!(lerp(-2.0, 2.0, 1.0), 2.0);
    }

    #[test]
    fn test_wrap_to_pi() {
        use std::f64::consts::PI;

        assert!((wrap_to_pi(0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_to_pi(2.0 * PI + 0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_to_pi(PI + 0.1) - (-PI + 0.1)).abs() < 1e-12);
        assert!((wrap_to_pi(-PI - 0.1) - (PI - 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(5.0, -1.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, -1.0, 1.0), -1.0);
        assert_eq!(clamp(0.25, -1.0, 1.0), 0.25);
    }
}

//! Simulated servo driver

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::trace;

use super::{ServoDriver, ServoError};
use crate::NUM_JOINTS;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A servo driver with no hardware behind it.
///
/// Writes are staged while updates are disabled and applied all at once when
/// updates are enabled.
#[derive(Debug, Clone)]
pub struct SimServoDriver {
    staged_deg: [f64; NUM_JOINTS],
    latched_deg: [f64; NUM_JOINTS],
    update_enabled: bool,
    num_latches: u64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SimServoDriver {
    fn default() -> Self {
        Self {
            staged_deg: [0.0; NUM_JOINTS],
            latched_deg: [0.0; NUM_JOINTS],
            update_enabled: true,
            num_latches: 0,
        }
    }
}

impl SimServoDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Angles currently applied to the servos.
    pub fn latched_deg(&self) -> &[f64; NUM_JOINTS] {
        &self.latched_deg
    }

    /// Number of times staged angles were applied.
    pub fn num_latches(&self) -> u64 {
        self.num_latches
    }

    pub fn is_update_enabled(&self) -> bool {
        self.update_enabled
    }
}

impl ServoDriver for SimServoDriver {
    fn set_joint_angle(&mut self, joint: usize, angle_deg: f64) -> Result<(), ServoError> {
        if joint >= NUM_JOINTS {
            return Err(ServoError::InvalidJoint(joint));
        }
        if !angle_deg.is_finite() {
            return Err(ServoError::InvalidAngle(angle_deg));
        }

        self.staged_deg[joint] = angle_deg;

        if self.update_enabled {
            self.latched_deg[joint] = angle_deg;
        }

        Ok(())
    }

    fn set_update_enabled(&mut self, enabled: bool) -> Result<(), ServoError> {
        if enabled && !self.update_enabled {
            self.latched_deg = self.staged_deg;
            self.num_latches += 1;
            trace!("Servo angles latched: {:?}", self.latched_deg);
        }

        self.update_enabled = enabled;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::super::publish;
    use super::*;

    #[test]
    fn test_staging() {
        let mut d = SimServoDriver::new();

        d.set_update_enabled(false).unwrap();
        d.set_joint_angle(4, 12.5).unwrap();
        assert_eq!(d.latched_deg()[4], 0.0);

        d.set_update_enabled(true).unwrap();
        assert_eq!(d.latched_deg()[4], 12.5);
        assert_eq!(d.num_latches(), 1);
    }

    #[test]
    fn test_publish() {
        let mut d = SimServoDriver::new();
        let mut angles = [0.0; NUM_JOINTS];
        angles[17] = -45.0;

        publish(&mut d, &angles).unwrap();

        assert_eq!(d.latched_deg(), &angles);
        assert_eq!(d.num_latches(), 1);
        assert!(d.is_update_enabled());
    }

    #[test]
    fn test_invalid_writes() {
        let mut d = SimServoDriver::new();
        assert_eq!(d.set_joint_angle(18, 0.0), Err(ServoError::InvalidJoint(18)));
        assert!(d.set_joint_angle(0, std::f64::NAN).is_err());
    }
}

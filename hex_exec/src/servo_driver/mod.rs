//! # Servo Driver Module
//!
//! Interface to the actuation layer, which turns joint angles into servo
//! pulses. Angles written while updates are disabled are staged and only
//! applied together once updates are enabled again, so that all 18 joints of
//! a tick change at the same PWM period.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// [`ServoDriver`] implementation which records the latched angles, used on hosts.
pub mod sim;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

pub use sim::SimServoDriver;

use crate::fault::Fault;
use crate::NUM_JOINTS;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Trait to provide a unified API for the actuation layer.
pub trait ServoDriver {
    /// Set the angle of a joint.
    ///
    /// ## Arguments
    /// - `joint` - Joint index, `limb * 3 + link`, must be less than 18.
    /// - `angle_deg` - The angle to move the joint to.
    fn set_joint_angle(&mut self, joint: usize, angle_deg: f64) -> Result<(), ServoError>;

    /// Enable or disable applying new angles to the servos.
    fn set_update_enabled(&mut self, enabled: bool) -> Result<(), ServoError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ServoError {
    #[error("Joint index {0} is out of range, there are {} joints", NUM_JOINTS)]
    InvalidJoint(usize),

    #[error("Angle {0} deg is not a finite number")]
    InvalidAngle(f64),
}

impl ServoError {
    /// The kind of fault this error raises.
    pub fn fault(&self) -> Fault {
        Fault::Internal
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Write all joint angles to the driver as a single update.
pub fn publish<D: ServoDriver + ?Sized>(
    driver: &mut D,
    angles_deg: &[f64; NUM_JOINTS],
) -> Result<(), ServoError> {
    driver.set_update_enabled(false)?;

    for (joint, angle) in angles_deg.iter().enumerate() {
        driver.set_joint_angle(joint, *angle)?;
    }

    driver.set_update_enabled(true)
}

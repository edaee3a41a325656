//! # Hexapod Executable Parameters
//!
//! This module provide parameters for the hexapod executable.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HexExecParams {
    /// Period of the PWM cycle, one synchronisation tick is produced per period.
    ///
    /// Units: seconds
    pub pwm_period_s: Option<f64>,

    /// Target period of one cycle of the main loop, must be shorter than the
    /// PWM period for no tick to be missed.
    ///
    /// Units: seconds
    pub cycle_period_s: Option<f64>,

    /// Write the module archives into the session directory.
    pub archive: Option<bool>,
}

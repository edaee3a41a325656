//! # Hexapod library.
//!
//! This library allows other crates in the workspace, the integration tests
//! and the benchmarks to access items defined inside the hexapod executable.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Data store - holds the state of every module and runs the motion cycle
pub mod data_store;

/// Fault handling - error status register and module fault states
pub mod fault;

/// Kinematics - solves the joint angles of a limb for a foot position
pub mod kinematics;

/// Limbs driver - moves all limbs along their paths, one step per sync tick
pub mod limbs_driver;

/// Movement engine - runs gait sequences and arbitrates sequence changes
pub mod movement_engine;

/// Executable parameters
pub mod params;

/// RAM map - the register interface exposed to the command layer
pub mod ram_map;

/// Special command register processing
pub mod scr_processor;

/// Servo driver - publishes joint angles to the actuation layer
pub mod servo_driver;

/// Synchronisation with the PWM cycle
pub mod sync;

/// Telecommand processor - applies script telecommands to the data store
pub mod tc_processor;

/// Trajectory generation - intermediate points of a limb's path
pub mod trajectory;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Number of limbs of the hexapod.
pub const NUM_LIMBS: usize = 6;

/// Number of joints of each limb.
pub const NUM_JOINTS_PER_LIMB: usize = 3;

/// Total number of joints (and servos).
pub const NUM_JOINTS: usize = NUM_LIMBS * NUM_JOINTS_PER_LIMB;

// ------------------------------------------------------------------------------------------------
// TEST UTILITIES
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod test_utils {
    use std::path::PathBuf;

    /// Path to a file in the workspace's params directory.
    pub fn params_path(file: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("params")
            .join(file)
    }

    /// The default limbs driver parameters.
    pub fn limbs_params() -> crate::limbs_driver::Params {
        util::params::load_from_path(params_path("limbs_driver.toml")).unwrap()
    }
}

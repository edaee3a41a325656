//! # Limbs driver module
//!
//! Owns the state of the six limbs and moves all of them together, one
//! trajectory step per synchronisation tick.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use params::*;
pub use state::*;

use crate::fault::Fault;
use crate::kinematics::KinematicsError;
use crate::trajectory::TrajectoryError;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during LimbsDriver operation.
#[derive(Debug, thiserror::Error)]
pub enum LimbsDriverError {
    #[error("LimbsDriver used before initialisation")]
    NotInitialised,

    #[error("Invalid LimbsDriver parameters: {0}")]
    InvalidParams(String),

    #[error("Start position of limb {0} cannot be solved: {1}")]
    UnreachableStart(usize, KinematicsError),

    #[error("Cannot solve limb {0}: {1}")]
    Kinematics(usize, KinematicsError),

    #[error("Trajectory error: {0}")]
    Trajectory(TrajectoryError),

    #[error("The number of steps in a move must be at least 1")]
    ZeroSmoothness,

    #[error("A new move was started before the previous one completed")]
    MoveInProgress,

    #[error("{0} synchronisation ticks were missed")]
    MissedTicks(u32),
}

impl LimbsDriverError {
    /// The kind of fault this error raises.
    pub fn fault(&self) -> Fault {
        match self {
            LimbsDriverError::InvalidParams(_) | LimbsDriverError::UnreachableStart(..) => {
                Fault::Config
            }
            LimbsDriverError::Kinematics(..) => Fault::Math,
            LimbsDriverError::MissedTicks(_) => Fault::Sync,
            LimbsDriverError::NotInitialised
            | LimbsDriverError::Trajectory(_)
            | LimbsDriverError::ZeroSmoothness
            | LimbsDriverError::MoveInProgress => Fault::Internal,
        }
    }
}

//! # Movement engine module
//!
//! Runs gait sequences. A sequence is a list of iterations, each of which
//! moves all six limbs to new targets through the limbs driver. The engine
//! also arbitrates requests to change sequence, which only take effect at the
//! end of the running sequence's main stage.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod library;
mod params;
mod sequence;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

pub use library::*;
pub use params::*;
pub use sequence::*;
pub use state::*;

use crate::fault::Fault;
use comms_if::tc::gait::SequenceId;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during MovementEngine operation.
#[derive(Debug, thiserror::Error)]
pub enum MovementEngineError {
    #[error("MovementEngine used before initialisation")]
    NotInitialised,

    #[error("Invalid MovementEngine parameters: {0}")]
    InvalidParams(String),

    #[error("Sequence {0:?} is invalid: {1}")]
    InvalidSequence(SequenceId, SequenceError),

    #[error("Sequence {0:?} is not in the library")]
    UnknownSequence(SequenceId),
}

impl MovementEngineError {
    /// The kind of fault this error raises.
    ///
    /// A sequence missing at runtime has passed initialisation so it is an
    /// internal fault, not a configuration one.
    pub fn fault(&self) -> Fault {
        match self {
            MovementEngineError::InvalidParams(_) | MovementEngineError::InvalidSequence(..) => {
                Fault::Config
            }
            MovementEngineError::NotInitialised | MovementEngineError::UnknownSequence(_) => {
                Fault::Internal
            }
        }
    }
}

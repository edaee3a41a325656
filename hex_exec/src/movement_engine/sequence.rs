//! Gait sequence definitions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use nalgebra::Point3;
use serde::{Deserialize, Serialize};

use crate::trajectory::PathShape;
use crate::NUM_LIMBS;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One synchronised move of all limbs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Iteration {
    /// Target of each limb.
    ///
    /// Units: millimetres
    pub points: [Point3<f64>; NUM_LIMBS],

    /// Path shape of each limb.
    pub shapes: [PathShape; NUM_LIMBS],

    /// Number of trajectory steps of the move.
    pub smoothness: u32,
}

/// A gait sequence.
///
/// Iterations `0..main_begin` are the prepare stage, `main_begin..finalize_begin`
/// the main stage and `finalize_begin..total_count` the finalize stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub iterations: Vec<Iteration>,
    pub main_begin: usize,
    pub finalize_begin: usize,
    pub total_count: usize,

    /// Repeat the main stage until another sequence is requested.
    pub is_looped: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SequenceError {
    #[error(
        "stage boundaries must satisfy main_begin ({0}) <= finalize_begin ({1}) \
         <= total_count ({2})"
    )]
    BoundsOrder(usize, usize, usize),

    #[error("total_count is {0} but there are {1} iterations")]
    CountMismatch(usize, usize),

    #[error("iteration {0} has zero smoothness")]
    ZeroSmoothness(usize),

    #[error("a looped sequence needs at least one main stage iteration")]
    EmptyLoop,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Sequence {
    pub fn validate(&self) -> Result<(), SequenceError> {
        if !(self.main_begin <= self.finalize_begin && self.finalize_begin <= self.total_count) {
            return Err(SequenceError::BoundsOrder(
                self.main_begin,
                self.finalize_begin,
                self.total_count,
            ));
        }
        if self.total_count != self.iterations.len() {
            return Err(SequenceError::CountMismatch(
                self.total_count,
                self.iterations.len(),
            ));
        }
        if let Some(i) = self.iterations.iter().position(|it| it.smoothness == 0) {
            return Err(SequenceError::ZeroSmoothness(i));
        }
        if self.is_looped && self.main_begin == self.finalize_begin {
            return Err(SequenceError::EmptyLoop);
        }

        Ok(())
    }
}

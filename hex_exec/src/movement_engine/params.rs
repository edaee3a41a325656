//! Parameters structure for MovementEngine

use serde::{Deserialize, Serialize};

/// Parameters for the movement engine.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// Minimum distance to an obstacle in front of the hexapod for forward
    /// walking gaits to run.
    ///
    /// Units: millimetres
    pub front_distance_low_limit_mm: Option<u32>,
}

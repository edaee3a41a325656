//! # Special command register processor
//!
//! Executes the command written to the special command register, then clears
//! the register to signal the command layer that it can write the next one.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};

// Internal
use crate::data_store::DataStore;
use comms_if::tc::gait::ScrCommand;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Process the pending special command, if any.
pub fn process(ds: &mut DataStore) {
    if ds.scr == 0 {
        return;
    }

    match ScrCommand::from_u8(ds.scr) {
        Some(ScrCommand::Sequence(id)) => {
            let accepted = ds.request_sequence(id);
            debug!("SCR sequence {:?} accepted: {}", id, accepted);
        }
        Some(ScrCommand::EnableFrontSensor) => {
            info!("Front distance sensor enabled");
            ds.orientation.front_sensor_enabled = true;
        }
        Some(ScrCommand::DisableFrontSensor) => {
            info!("Front distance sensor disabled");
            ds.orientation.front_sensor_enabled = false;
        }
        Some(ScrCommand::Reset) => {
            info!("Reset requested");
            ds.reset_requested = true;
        }
        None => warn!(
            "Unknown special command {:#04x} (argument {})",
            ds.scr, ds.scr_argument
        ),
    }

    ds.scr = 0;
}

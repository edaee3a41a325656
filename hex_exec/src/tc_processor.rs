//! # Telecommand processor module
//!
//! The telecommand processor applies the telecommands read from scripts to
//! the data store, standing in for the command and sensor layers.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use crate::{data_store::DataStore, ram_map};
use comms_if::{ram::SCR_ADDR, tc::Tc};

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Execute a telecommand.
///
/// Mutates the datastore to send commands to different modules.
pub fn exec(ds: &mut DataStore, tc: &Tc) {
    debug!("Executing {:?}", tc);

    match tc {
        Tc::RamWrite { address, data } => {
            if let Err(e) = ram_map::write(ds, *address, data) {
                warn!("Invalid RamWrite TC: {}", e);
            }
        }
        Tc::Scr { cmd, argument } => {
            let mut bytes = [0u8; 5];
            bytes[0] = *cmd;
            bytes[1..].copy_from_slice(&argument.to_be_bytes());

            if let Err(e) = ram_map::write(ds, SCR_ADDR, &bytes) {
                warn!("Invalid Scr TC: {}", e);
            }
        }
        Tc::FrontDistance { distance_mm } => {
            ds.orientation.front_distance_mm = *distance_mm;
        }
        Tc::VoltageError => ds.error_status.set_voltage_error(),
    }
}

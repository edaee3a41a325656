//! # RAM map
//!
//! Byte addressed view of the data store exposed to the command layer. Reads
//! are assembled from the live state on every access and writes are applied
//! straight to it.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use comms_if::ram::*;
use log::trace;

use crate::data_store::DataStore;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RamMapError {
    #[error("Access of {len} bytes at {addr:#06x} is outside of the {} byte map", RAM_MAP_SIZE)]
    OutOfRange { addr: usize, len: usize },
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Read `buf.len()` bytes starting at `addr`.
///
/// Unmapped bytes read as zero.
pub fn read(ds: &DataStore, addr: usize, buf: &mut [u8]) -> Result<(), RamMapError> {
    check_range(addr, buf.len())?;

    for (i, b) in buf.iter_mut().enumerate() {
        *b = read_byte(ds, addr + i);
    }

    Ok(())
}

/// Write `data` starting at `addr`.
///
/// Writes to read-only or unmapped bytes are ignored.
pub fn write(ds: &mut DataStore, addr: usize, data: &[u8]) -> Result<(), RamMapError> {
    check_range(addr, data.len())?;

    trace!("RAM map write at {:#06x}: {:02x?}", addr, data);

    for (i, b) in data.iter().enumerate() {
        write_byte(ds, addr + i, *b);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn check_range(addr: usize, len: usize) -> Result<(), RamMapError> {
    match addr.checked_add(len) {
        Some(end) if end <= RAM_MAP_SIZE => Ok(()),
        _ => Err(RamMapError::OutOfRange { addr, len }),
    }
}

/// Byte `addr - base` of a big-endian value if `addr` falls inside it.
fn be_byte<const N: usize>(bytes: [u8; N], base: usize, addr: usize) -> Option<u8> {
    if addr >= base && addr < base + N {
        Some(bytes[addr - base])
    } else {
        None
    }
}

fn read_byte(ds: &DataStore, addr: usize) -> u8 {
    let distance = ds.orientation.front_distance_mm.unwrap_or(NO_DISTANCE);

    if let Some(b) = be_byte(DEVICE_ID.to_be_bytes(), DEVICE_ID_ADDR, addr)
        .or_else(|| be_byte(ds.error_status.bits().to_be_bytes(), ERROR_STATUS_ADDR, addr))
        .or_else(|| be_byte(distance.to_be_bytes(), FRONT_DISTANCE_ADDR, addr))
        .or_else(|| be_byte(ds.scr_argument.to_be_bytes(), SCR_ARGUMENT_ADDR, addr))
    {
        return b;
    }

    match addr {
        VERSION_MAIN_ADDR => VERSION.0,
        VERSION_SUB_ADDR => VERSION.1,
        VERSION_AUX_ADDR => VERSION.2,
        ORIENTATION_STATUS_ADDR => ds.orientation.front_sensor_enabled as u8,
        SCR_ADDR => ds.scr,
        a if (LINK_ANGLES_ADDR..LINK_ANGLES_ADDR + NUM_JOINTS).contains(&a) => {
            let angle = ds.limbs_driver_output.angles_deg[a - LINK_ANGLES_ADDR];
            // Saturating cast
            angle.round() as i8 as u8
        }
        a if (LINK_OVERRIDES_ADDR..LINK_OVERRIDES_ADDR + NUM_JOINTS).contains(&a) => {
            ds.limbs_driver_input.overrides[a - LINK_OVERRIDES_ADDR]
                .unwrap_or(OVERRIDE_DISABLED) as u8
        }
        _ => 0,
    }
}

fn write_byte(ds: &mut DataStore, addr: usize, value: u8) {
    match addr {
        SCR_ADDR => ds.scr = value,
        a if (SCR_ARGUMENT_ADDR..SCR_ARGUMENT_ADDR + 4).contains(&a) => {
            let mut bytes = ds.scr_argument.to_be_bytes();
            bytes[a - SCR_ARGUMENT_ADDR] = value;
            ds.scr_argument = i32::from_be_bytes(bytes);
        }
        a if (LINK_OVERRIDES_ADDR..LINK_OVERRIDES_ADDR + NUM_JOINTS).contains(&a) => {
            let value = value as i8;
            ds.limbs_driver_input.overrides[a - LINK_OVERRIDES_ADDR] = if value == OVERRIDE_DISABLED {
                None
            } else {
                Some(value)
            };
        }
        _ => (),
    }
}

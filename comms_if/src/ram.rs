//! # Register map addresses
//!
//! The register interface is a 512 byte address space. Multi-byte values are
//! stored big-endian.

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// Size of the register address space in bytes.
pub const RAM_MAP_SIZE: usize = 0x200;

/// Device identifier (u32, read-only).
pub const DEVICE_ID_ADDR: usize = 0x0000;

/// Value of the device identifier register.
pub const DEVICE_ID: u32 = 0xABCD_EFFF;

/// Firmware version main/sub/aux (u8 each, read-only).
pub const VERSION_MAIN_ADDR: usize = 0x000D;
pub const VERSION_SUB_ADDR: usize = 0x000E;
pub const VERSION_AUX_ADDR: usize = 0x000F;

/// Firmware version numbers.
pub const VERSION: (u8, u8, u8) = (1, 0, 0);

/// Error status register (u16, read-only).
pub const ERROR_STATUS_ADDR: usize = 0x0010;

/// Orientation sensors status (u8, read-only), bit 0 is the front sensor
/// enabled flag.
pub const ORIENTATION_STATUS_ADDR: usize = 0x0015;

/// Front distance in mm (u32, read-only), `0xFFFF_FFFF` when there is no
/// reading.
pub const FRONT_DISTANCE_ADDR: usize = 0x0016;

/// Special command register (u8, write to trigger).
pub const SCR_ADDR: usize = 0x0060;

/// Special command argument (i32).
pub const SCR_ARGUMENT_ADDR: usize = 0x0061;

/// First of the 18 current link angles (i8, read-only).
///
/// Angles are rounded and saturate to `-128..=127`, so a joint at or past
/// 127 degrees (a straight tibia at 180 for example) reads `0x7F`, the same
/// byte as [`OVERRIDE_DISABLED`].
pub const LINK_ANGLES_ADDR: usize = 0x00C0;

/// First of the 18 link angle overrides (i8).
pub const LINK_OVERRIDES_ADDR: usize = 0x00E0;

/// Number of joints exposed by the angle and override tables.
pub const NUM_JOINTS: usize = 18;

/// Override byte meaning "no override".
pub const OVERRIDE_DISABLED: i8 = 0x7F;

/// Front distance value meaning "no reading".
pub const NO_DISTANCE: u32 = 0xFFFF_FFFF;

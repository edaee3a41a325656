//! # Communications interface crate.
//!
//! Provides the command vocabulary shared by the hexapod software: the gait
//! sequence identifiers, the special command register codes, the register
//! map addresses and the telecommands used by scripts.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Telecommands and special commands
pub mod tc;

/// Addresses of the RAM-mapped register interface
pub mod ram;

//! # Fault handling
//!
//! Faults are fail-stop: the module which raised one is marked as faulted and
//! is no longer processed. Every fault is recorded in the error status
//! register, config and internal faults additionally raise the emergency
//! flag which stops all motion.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::error;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

pub const ERROR_MASK_EMERGENCY: u16 = 0x0001;
pub const ERROR_MASK_INTERNAL: u16 = 0x0002;
pub const ERROR_MASK_CONFIG: u16 = 0x0004;
pub const ERROR_MASK_MEMORY: u16 = 0x0008;
pub const ERROR_MASK_VOLTAGE: u16 = 0x0010;
pub const ERROR_MASK_SYNC: u16 = 0x0020;
pub const ERROR_MASK_MATH: u16 = 0x0040;
pub const ERROR_MASK_I2C: u16 = 0x0080;

pub const MODULE_MASK_SERVO_DRIVER: u16 = 0x0200;
pub const MODULE_MASK_LIMBS_DRIVER: u16 = 0x0400;
pub const MODULE_MASK_MOVEMENT_ENGINE: u16 = 0x0800;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The 16 bit error status register.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorStatus(u16);

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Kinds of fault.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fault {
    /// Missing or invalid configuration.
    Config,
    /// A computation could not produce a result.
    Math,
    /// Synchronisation ticks were missed.
    Sync,
    /// A module was used in a way it does not support.
    Internal,
}

/// Modules which can be faulted.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleId {
    ServoDriver,
    LimbsDriver,
    MovementEngine,
}

/// Run status of a module.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStatus {
    Running,
    Faulted(Fault),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Fault {
    /// Bit of the error status register for this fault.
    pub fn mask(&self) -> u16 {
        match self {
            Fault::Config => ERROR_MASK_CONFIG,
            Fault::Math => ERROR_MASK_MATH,
            Fault::Sync => ERROR_MASK_SYNC,
            Fault::Internal => ERROR_MASK_INTERNAL,
        }
    }

    /// True if the fault also raises the emergency flag.
    pub fn is_emergency(&self) -> bool {
        matches!(self, Fault::Config | Fault::Internal)
    }
}

impl ModuleId {
    pub fn mask(&self) -> u16 {
        match self {
            ModuleId::ServoDriver => MODULE_MASK_SERVO_DRIVER,
            ModuleId::LimbsDriver => MODULE_MASK_LIMBS_DRIVER,
            ModuleId::MovementEngine => MODULE_MASK_MOVEMENT_ENGINE,
        }
    }
}

impl Default for ModuleStatus {
    fn default() -> Self {
        ModuleStatus::Running
    }
}

impl ModuleStatus {
    pub fn is_running(&self) -> bool {
        *self == ModuleStatus::Running
    }
}

impl ErrorStatus {
    /// Raw register value.
    pub fn bits(&self) -> u16 {
        self.0
    }

    pub fn contains(&self, mask: u16) -> bool {
        self.0 & mask == mask
    }

    pub fn is_emergency(&self) -> bool {
        self.contains(ERROR_MASK_EMERGENCY)
    }

    /// Record a fault raised by the given module.
    pub fn record(&mut self, module: ModuleId, fault: Fault) {
        self.0 |= module.mask() | fault.mask();

        if fault.is_emergency() {
            self.0 |= ERROR_MASK_EMERGENCY;
        }
    }

    /// Record a supply voltage problem reported by the monitoring layer.
    pub fn set_voltage_error(&mut self) {
        if !self.contains(ERROR_MASK_VOLTAGE) {
            error!("Supply voltage error reported");
        }
        self.0 |= ERROR_MASK_VOLTAGE;
    }

    pub fn is_voltage_error(&self) -> bool {
        self.contains(ERROR_MASK_VOLTAGE)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_record() {
        let mut es = ErrorStatus::default();

        es.record(ModuleId::LimbsDriver, Fault::Sync);
        assert_eq!(es.bits(), 0x0420);
        assert!(!es.is_emergency());

        es.record(ModuleId::MovementEngine, Fault::Math);
        assert_eq!(es.bits(), 0x0C60);
        assert!(!es.is_emergency());

        es.record(ModuleId::MovementEngine, Fault::Internal);
        assert_eq!(es.bits(), 0x0C63);
        assert!(es.is_emergency());
    }

    #[test]
    fn test_config_is_emergency() {
        let mut es = ErrorStatus::default();
        es.record(ModuleId::LimbsDriver, Fault::Config);
        assert_eq!(es.bits(), 0x0405);
    }

    #[test]
    fn test_voltage() {
        let mut es = ErrorStatus::default();
        assert!(!es.is_voltage_error());
        es.set_voltage_error();
        assert!(es.is_voltage_error());
        assert!(!es.is_emergency());
    }
}

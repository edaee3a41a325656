//! # Telecommand module
//!
//! Telecommands are the instructions given to the hexapod by the command
//! layer. On the host they are read from scripts as JSON.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod gait;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand.
///
/// Serialised as `{"type": "<variant>", "payload": {...}}`, variants without
/// data have no payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum Tc {
    /// Write raw bytes into the register map starting at `address`.
    RamWrite { address: usize, data: Vec<u8> },

    /// Write a special command and its argument.
    Scr { cmd: u8, argument: i32 },

    /// Simulated front distance reading, `None` for no echo.
    FrontDistance { distance_mm: Option<u32> },

    /// Simulated supply voltage error.
    VoltageError,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        assert_eq!(
            Tc::from_json(r#"{"type": "RamWrite", "payload": {"address": 96, "data": [1]}}"#)
                .unwrap(),
            Tc::RamWrite {
                address: 0x60,
                data: vec![1]
            }
        );
        assert_eq!(
            Tc::from_json(r#"{"type": "FrontDistance", "payload": {"distance_mm": null}}"#)
                .unwrap(),
            Tc::FrontDistance { distance_mm: None }
        );
        assert!(Tc::from_json(r#"{"type": "Scr"}"#).is_err());
        assert!(Tc::from_json("not json").is_err());
    }
}

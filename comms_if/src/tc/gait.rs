//! # Gait telecommands
//!
//! Identifiers of the sequences known to the movement engine and the codes
//! written to the special command register.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A named gait sequence.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SequenceId {
    /// No sequence, the hexapod holds its current pose.
    None,
    /// Raise the body from the ground.
    Up,
    /// Lower the body to the ground.
    Down,
    /// Fast forward walk.
    Run,
    /// Forward walk.
    DirectMovement,
    /// Backward walk.
    ReverseMovement,
    /// Turn on the spot to the left.
    RotateLeft,
    /// Turn on the spot to the right.
    RotateRight,
    /// Slow forward walk.
    DirectMovementSlow,
    /// Slow backward walk.
    ReverseMovementSlow,
    /// Strafe to the left.
    ShiftLeft,
    /// Strafe to the right.
    ShiftRight,
    /// Raise and strike with the front left limb.
    AttackLeft,
    /// Raise and strike with the front right limb.
    AttackRight,
    /// Body sway.
    Dance,
    /// Pitch and roll of the body.
    RotateX,
    /// Yaw of the body with feet planted.
    RotateZ,
}

/// A command written to the special command register.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScrCommand {
    /// Request a gait sequence.
    Sequence(SequenceId),
    /// Enable the front distance sensor.
    EnableFrontSensor,
    /// Disable the front distance sensor.
    DisableFrontSensor,
    /// Stop the executable.
    Reset,
}

// ------------------------------------------------------------------------------------------------
// IMPLEMENTATIONS
// ------------------------------------------------------------------------------------------------

impl SequenceId {
    /// Every sequence identifier, in register code order.
    pub const ALL: [SequenceId; 17] = [
        SequenceId::None,
        SequenceId::Up,
        SequenceId::Down,
        SequenceId::Run,
        SequenceId::DirectMovement,
        SequenceId::ReverseMovement,
        SequenceId::RotateLeft,
        SequenceId::RotateRight,
        SequenceId::DirectMovementSlow,
        SequenceId::ReverseMovementSlow,
        SequenceId::ShiftLeft,
        SequenceId::ShiftRight,
        SequenceId::AttackLeft,
        SequenceId::AttackRight,
        SequenceId::Dance,
        SequenceId::RotateX,
        SequenceId::RotateZ,
    ];

    /// True for the sequences which walk the hexapod forwards and therefore
    /// need a clear path ahead.
    pub fn is_forward_walk(&self) -> bool {
        matches!(
            self,
            SequenceId::Run | SequenceId::DirectMovement | SequenceId::DirectMovementSlow
        )
    }
}

impl Default for SequenceId {
    fn default() -> Self {
        SequenceId::None
    }
}

impl ScrCommand {
    /// Decode a special command register value.
    ///
    /// `0x00` (register idle) and unknown codes return `None`.
    pub fn from_u8(code: u8) -> Option<Self> {
        use SequenceId::*;

        let seq = match code {
            0x01 => Up,
            0x02 => Down,
            0x03 => Run,
            0x04 => DirectMovement,
            0x05 => ReverseMovement,
            0x06 => RotateLeft,
            0x07 => RotateRight,
            0x08 => DirectMovementSlow,
            0x09 => ReverseMovementSlow,
            0x10 => ShiftLeft,
            0x11 => ShiftRight,
            0x20 => AttackLeft,
            0x21 => AttackRight,
            0x30 => Dance,
            0x31 => RotateX,
            0x33 => RotateZ,
            0x90 => None,
            0xB1 => return Some(ScrCommand::EnableFrontSensor),
            0xB2 => return Some(ScrCommand::DisableFrontSensor),
            0xFE => return Some(ScrCommand::Reset),
            _ => return Option::None,
        };

        Some(ScrCommand::Sequence(seq))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scr_decoding() {
        assert_eq!(ScrCommand::from_u8(0x00), None);
        assert_eq!(ScrCommand::from_u8(0x32), None);
        assert_eq!(
            ScrCommand::from_u8(0x01),
            Some(ScrCommand::Sequence(SequenceId::Up))
        );
        assert_eq!(
            ScrCommand::from_u8(0x90),
            Some(ScrCommand::Sequence(SequenceId::None))
        );
        assert_eq!(
            ScrCommand::from_u8(0x33),
            Some(ScrCommand::Sequence(SequenceId::RotateZ))
        );
        assert_eq!(ScrCommand::from_u8(0xB1), Some(ScrCommand::EnableFrontSensor));
        assert_eq!(ScrCommand::from_u8(0xFE), Some(ScrCommand::Reset));
    }

    #[test]
    fn test_forward_walks() {
        let fwd: Vec<SequenceId> = SequenceId::ALL
            .iter()
            .copied()
            .filter(|s| s.is_forward_walk())
            .collect();
        assert_eq!(
            fwd,
            vec![
                SequenceId::Run,
                SequenceId::DirectMovement,
                SequenceId::DirectMovementSlow
            ]
        );
    }
}

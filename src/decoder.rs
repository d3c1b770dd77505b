//! Pure instruction decoding.
//!
//! A raw instruction value encodes the opcode in its low two decimal digits
//! and one parameter-mode digit per operand slot above them. Decoding is
//! re-derived every cycle from the value under the instruction pointer;
//! nothing here survives between cycles.

use crate::encoding::Opcode;
use crate::fault::Fault;

/// Per-operand access modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ParameterMode {
    /// The operand is the address of the value.
    #[default]
    Position,
    /// The operand is the value itself.
    Immediate,
    /// The operand is an offset from the relative base.
    Relative,
}

impl ParameterMode {
    /// Converts a decimal mode digit into a parameter mode.
    #[must_use]
    pub const fn from_digit(digit: i64) -> Option<Self> {
        match digit {
            0 => Some(Self::Position),
            1 => Some(Self::Immediate),
            2 => Some(Self::Relative),
            _ => None,
        }
    }
}

/// A fully decoded instruction: opcode plus one mode per operand slot.
///
/// Not every opcode uses all three slots; unused slots keep their decoded
/// (or defaulted) mode and are simply never resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    /// The instruction-set member selected by the low two digits.
    pub opcode: Opcode,
    /// Access modes for operand slots 1 through 3.
    pub modes: [ParameterMode; 3],
}

impl DecodedInstruction {
    /// Returns the access mode for the 1-indexed operand `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is outside `1..=3`.
    #[must_use]
    pub const fn mode(&self, slot: usize) -> ParameterMode {
        self.modes[slot - 1]
    }
}

/// Instruction decoder for the Denary instruction set.
pub struct Decoder;

impl Decoder {
    /// Splits a raw instruction value into an opcode and parameter modes.
    ///
    /// The opcode identifier is the value modulo 100; the mode for operand
    /// slot `k` (1-indexed) is the decimal digit at position `k + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::IllegalOpcode`] when the identifier is not part of
    /// the instruction set and [`Fault::IllegalParameterMode`] when a mode
    /// digit falls outside the defined set.
    pub fn decode(raw: i64) -> Result<DecodedInstruction, Fault> {
        let code = raw % 100;
        let Some(opcode) = Opcode::from_i64(code) else {
            return Err(Fault::IllegalOpcode(code));
        };

        let mut modes = [ParameterMode::Position; 3];
        let mut digits = raw / 100;
        for mode in &mut modes {
            let digit = digits % 10;
            *mode = ParameterMode::from_digit(digit).ok_or(Fault::IllegalParameterMode(digit))?;
            digits /= 10;
        }

        Ok(DecodedInstruction { opcode, modes })
    }
}

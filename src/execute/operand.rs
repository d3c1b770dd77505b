//! Operand resolution for the three parameter-access modes.
//!
//! The checked signed-to-address conversion here is the single place
//! negative-address faults originate; the memory store itself never sees a
//! negative address.

use crate::decoder::{DecodedInstruction, ParameterMode};
use crate::fault::Fault;
use crate::state::MachineState;

/// Converts a signed effective address into a store address.
///
/// # Errors
///
/// Returns [`Fault::NegativeAddress`] when the value is below zero.
pub fn checked_address(value: i64) -> Result<usize, Fault> {
    usize::try_from(value).map_err(|_| Fault::NegativeAddress(value))
}

/// Reads the value of the 1-indexed operand `slot`.
///
/// Position and relative modes dereference the effective address; immediate
/// mode yields the raw operand cell directly.
///
/// # Errors
///
/// Returns [`Fault::NegativeAddress`] when the effective address resolves
/// below zero.
pub fn read_operand(
    state: &MachineState,
    instr: &DecodedInstruction,
    slot: usize,
) -> Result<i64, Fault> {
    let raw = state.memory.read(state.instruction_pointer + slot);
    match instr.mode(slot) {
        ParameterMode::Immediate => Ok(raw),
        ParameterMode::Position => Ok(state.memory.read(checked_address(raw)?)),
        ParameterMode::Relative => Ok(state
            .memory
            .read(checked_address(state.relative_base.wrapping_add(raw))?)),
    }
}

/// Resolves the destination address of the 1-indexed operand `slot`.
///
/// # Errors
///
/// Returns [`Fault::ImmediateWriteTarget`] for immediate mode, which has no
/// write semantics, and [`Fault::NegativeAddress`] when the effective
/// address resolves below zero.
pub fn write_target(
    state: &MachineState,
    instr: &DecodedInstruction,
    slot: usize,
) -> Result<usize, Fault> {
    let raw = state.memory.read(state.instruction_pointer + slot);
    match instr.mode(slot) {
        ParameterMode::Position => checked_address(raw),
        ParameterMode::Relative => checked_address(state.relative_base.wrapping_add(raw)),
        ParameterMode::Immediate => Err(Fault::ImmediateWriteTarget),
    }
}

#[cfg(test)]
#[allow(clippy::unreadable_literal)]
mod tests {
    use super::{checked_address, read_operand, write_target};
    use crate::decoder::Decoder;
    use crate::fault::Fault;
    use crate::state::MachineState;

    #[test]
    fn checked_address_accepts_zero_and_positive_values() {
        assert_eq!(checked_address(0), Ok(0));
        assert_eq!(checked_address(1234), Ok(1234));
    }

    #[test]
    fn checked_address_rejects_negative_values() {
        assert_eq!(checked_address(-1), Err(Fault::NegativeAddress(-1)));
    }

    #[test]
    fn position_mode_dereferences_the_operand_cell() {
        let state = MachineState::new(&[1, 3, 0, 42]);
        let instr = Decoder::decode(1).expect("valid instruction");
        assert_eq!(read_operand(&state, &instr, 1), Ok(42));
    }

    #[test]
    fn immediate_mode_yields_the_operand_cell_itself() {
        let state = MachineState::new(&[101, 3, 0, 42]);
        let instr = Decoder::decode(101).expect("valid instruction");
        assert_eq!(read_operand(&state, &instr, 1), Ok(3));
    }

    #[test]
    fn relative_mode_offsets_from_the_relative_base() {
        let mut state = MachineState::new(&[201, 1, 0, 42]);
        state.relative_base = 2;
        let instr = Decoder::decode(201).expect("valid instruction");
        assert_eq!(read_operand(&state, &instr, 1), Ok(42));
    }

    #[test]
    fn relative_mode_with_negative_effective_address_faults() {
        let mut state = MachineState::new(&[201, 1, 99]);
        state.relative_base = -5;
        let instr = Decoder::decode(201).expect("valid instruction");
        assert_eq!(
            read_operand(&state, &instr, 1),
            Err(Fault::NegativeAddress(-4))
        );
    }

    #[test]
    fn position_mode_write_targets_the_operand_value() {
        let state = MachineState::new(&[1, 0, 0, 7, 99]);
        let instr = Decoder::decode(1).expect("valid instruction");
        assert_eq!(write_target(&state, &instr, 3), Ok(7));
    }

    #[test]
    fn relative_mode_write_shifts_by_the_base() {
        let mut state = MachineState::new(&[21101, 1, 2, 4, 99]);
        state.relative_base = 6;
        let instr = Decoder::decode(21101).expect("valid instruction");
        assert_eq!(write_target(&state, &instr, 3), Ok(10));
    }

    #[test]
    fn immediate_mode_write_target_faults() {
        let state = MachineState::new(&[11101, 1, 2, 0, 99]);
        let instr = Decoder::decode(11101).expect("valid instruction");
        assert_eq!(
            write_target(&state, &instr, 3),
            Err(Fault::ImmediateWriteTarget)
        );
    }
}

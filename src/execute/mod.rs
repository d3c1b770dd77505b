//! Fetch-decode-execute stepping and per-opcode handlers.
//!
//! Handlers resolve every source operand and the write target before
//! committing any effect, so a faulting instruction leaves memory, the
//! instruction pointer, and the relative base untouched.

pub mod operand;
pub use operand::{checked_address, read_operand, write_target};

use crate::decoder::{DecodedInstruction, Decoder};
use crate::encoding::Opcode;
use crate::fault::Fault;
use crate::state::{MachineState, RunState};

/// Outcome of one fetch-decode-execute cycle.
///
/// Blocking handshake work is signalled rather than performed, keeping the
/// handlers pure: the engine loop owns the channels and completes the
/// `AwaitInput` commit (destination write plus pointer advance) after the
/// handshake receive succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction committed; the pointer has advanced or jumped.
    Retired,
    /// Input instruction decoded; the received value must be written to
    /// `target` before the pointer advances.
    AwaitInput {
        /// Resolved destination address for the incoming value.
        target: usize,
    },
    /// Output instruction produced a value for the pending buffer.
    Emitted(i64),
    /// The run state is terminal after a halt.
    Halted,
}

/// Executes a single instruction cycle.
///
/// Stepping a halted machine returns [`StepOutcome::Halted`] without
/// touching any state; stepping a faulted machine returns the latched
/// fault.
///
/// # Errors
///
/// Propagates decode and operand-resolution faults. The state is unchanged
/// when an error is returned.
pub fn step_one(state: &mut MachineState) -> Result<StepOutcome, Fault> {
    match state.run_state {
        RunState::Faulted(fault) => return Err(fault),
        RunState::Halted => return Ok(StepOutcome::Halted),
        RunState::Running => {}
    }

    let raw = state.memory.read(state.instruction_pointer);
    let instr = Decoder::decode(raw)?;

    match instr.opcode {
        Opcode::Add => binary_op(state, &instr, i64::wrapping_add),
        Opcode::Multiply => binary_op(state, &instr, i64::wrapping_mul),
        Opcode::LessThan => compare_op(state, &instr, |lhs, rhs| lhs < rhs),
        Opcode::Equals => compare_op(state, &instr, |lhs, rhs| lhs == rhs),
        Opcode::JumpIfTrue => conditional_jump(state, &instr, |condition| condition != 0),
        Opcode::JumpIfFalse => conditional_jump(state, &instr, |condition| condition == 0),
        Opcode::AdjustRelativeBase => adjust_relative_base(state, &instr),
        Opcode::Input => await_input(state, &instr),
        Opcode::Output => emit_output(state, &instr),
        Opcode::Halt => {
            state.run_state = RunState::Halted;
            Ok(StepOutcome::Halted)
        }
    }
}

fn advance(state: &mut MachineState, opcode: Opcode) {
    state.instruction_pointer += opcode.width();
}

fn binary_op(
    state: &mut MachineState,
    instr: &DecodedInstruction,
    op: fn(i64, i64) -> i64,
) -> Result<StepOutcome, Fault> {
    let lhs = read_operand(state, instr, 1)?;
    let rhs = read_operand(state, instr, 2)?;
    let target = write_target(state, instr, 3)?;
    state.memory.write(target, op(lhs, rhs));
    advance(state, instr.opcode);
    Ok(StepOutcome::Retired)
}

fn compare_op(
    state: &mut MachineState,
    instr: &DecodedInstruction,
    predicate: fn(i64, i64) -> bool,
) -> Result<StepOutcome, Fault> {
    let lhs = read_operand(state, instr, 1)?;
    let rhs = read_operand(state, instr, 2)?;
    let target = write_target(state, instr, 3)?;
    state.memory.write(target, i64::from(predicate(lhs, rhs)));
    advance(state, instr.opcode);
    Ok(StepOutcome::Retired)
}

fn conditional_jump(
    state: &mut MachineState,
    instr: &DecodedInstruction,
    taken: fn(i64) -> bool,
) -> Result<StepOutcome, Fault> {
    let condition = read_operand(state, instr, 1)?;
    if taken(condition) {
        let target = read_operand(state, instr, 2)?;
        state.instruction_pointer = checked_address(target)?;
    } else {
        advance(state, instr.opcode);
    }
    Ok(StepOutcome::Retired)
}

fn adjust_relative_base(
    state: &mut MachineState,
    instr: &DecodedInstruction,
) -> Result<StepOutcome, Fault> {
    let offset = read_operand(state, instr, 1)?;
    state.relative_base = state.relative_base.wrapping_add(offset);
    advance(state, instr.opcode);
    Ok(StepOutcome::Retired)
}

fn await_input(
    state: &mut MachineState,
    instr: &DecodedInstruction,
) -> Result<StepOutcome, Fault> {
    let target = write_target(state, instr, 1)?;
    Ok(StepOutcome::AwaitInput { target })
}

fn emit_output(
    state: &mut MachineState,
    instr: &DecodedInstruction,
) -> Result<StepOutcome, Fault> {
    let value = read_operand(state, instr, 1)?;
    advance(state, instr.opcode);
    Ok(StepOutcome::Emitted(value))
}

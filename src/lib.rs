//! Core interpreter engine for the Denary integer machine.
//!
//! A Denary program is an ordered sequence of signed integers executed
//! against sparse, unbounded memory. The engine runs on its own thread and
//! exchanges values with its controller through a batched producer/consumer
//! handshake: every output accumulates in a pending buffer that is flushed
//! as one batch immediately before each input is consumed and once after
//! the program terminates. Controllers must always receive a batch before
//! sending input and treat channel closure as end-of-program; that
//! discipline is the entire synchronization contract.

/// Sparse program memory with default-zero reads.
pub mod memory;
pub use memory::Memory;

/// Fault taxonomy for fatal engine conditions.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Instruction-set identifiers, operand counts, and widths.
pub mod encoding;
pub use encoding::{Opcode, OPCODE_TABLE};

/// Pure instruction decoding.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder, ParameterMode};

/// Execution-state model.
pub mod state;
pub use state::{MachineState, RunState};

/// Instruction stepping and operand resolution.
pub mod execute;
pub use execute::{checked_address, read_operand, step_one, write_target, StepOutcome};

/// Engine-side half of the batched I/O handshake.
pub mod io;
pub use io::IoPort;

/// Host-facing machine API.
pub mod machine;
pub use machine::Machine;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;

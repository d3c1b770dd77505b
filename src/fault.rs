use thiserror::Error;

/// Coarse fault grouping used by hosts for reporting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// The decoder rejected the value under the instruction pointer.
    Decode,
    /// Operand resolution produced an unusable value or target.
    Operand,
    /// A handshake channel end was dropped by the controller.
    Channel,
}

/// Fatal conditions that terminate the engine.
///
/// Every fault is terminal. The engine aborts before committing any effect
/// of the in-flight instruction, latches the fault into the run state, and
/// closes both handshake channels. There are no retries: the instruction
/// stream is deterministic, so none of these conditions is transient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Decoded opcode identifier is not part of the instruction set.
    #[error("illegal opcode {0}")]
    IllegalOpcode(i64),
    /// Parameter mode digit outside the defined set.
    #[error("illegal parameter mode {0}")]
    IllegalParameterMode(i64),
    /// Immediate mode used as a write destination.
    #[error("immediate mode is not a writable target")]
    ImmediateWriteTarget,
    /// Effective address resolved below zero.
    #[error("negative address {0}")]
    NegativeAddress(i64),
    /// Controller dropped the input sender while a value was required.
    #[error("input channel disconnected")]
    InputDisconnected,
    /// Controller dropped the output receiver while a flush was due.
    #[error("output channel disconnected")]
    OutputDisconnected,
}

impl Fault {
    /// Returns the fault class for this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::IllegalOpcode(_) | Self::IllegalParameterMode(_) => FaultClass::Decode,
            Self::ImmediateWriteTarget | Self::NegativeAddress(_) => FaultClass::Operand,
            Self::InputDisconnected | Self::OutputDisconnected => FaultClass::Channel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Fault, FaultClass};

    #[test]
    fn class_mapping_matches_fault_taxonomy() {
        assert_eq!(Fault::IllegalOpcode(50).class(), FaultClass::Decode);
        assert_eq!(Fault::IllegalParameterMode(3).class(), FaultClass::Decode);
        assert_eq!(Fault::ImmediateWriteTarget.class(), FaultClass::Operand);
        assert_eq!(Fault::NegativeAddress(-1).class(), FaultClass::Operand);
        assert_eq!(Fault::InputDisconnected.class(), FaultClass::Channel);
        assert_eq!(Fault::OutputDisconnected.class(), FaultClass::Channel);
    }

    #[test]
    fn display_includes_offending_value() {
        assert_eq!(Fault::IllegalOpcode(50).to_string(), "illegal opcode 50");
        assert_eq!(
            Fault::NegativeAddress(-7).to_string(),
            "negative address -7"
        );
    }
}

//! Error taxonomy shared by the assembler and the simulator.
//!
//! The assembler never propagates these as `Err` — every fault becomes an
//! [`crate::issue::Issue`] in the returned issues list and assembly continues
//! best-effort. The simulator uses [`SimulatorFault`] to halt and to record
//! the last fault for inspection.

use thiserror::Error;

/// The fault taxonomy from which both assembler issues and simulator faults
/// are drawn.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum M68kError {
    /// Parsing/tokenization failed outright.
    #[error("bad syntax: {0}")]
    BadSyntax(String),
    /// An operand did not parse as a legal effective address or literal.
    #[error("bad operand: {0}")]
    BadOperand(String),
    /// An opcode was used with a disallowed size suffix.
    #[error("size mismatch: {0}")]
    SizeMismatch(String),
    /// A label was declared more than once in pass 1.
    #[error("duplicate label: {0}")]
    DuplicateLabel(String),
    /// No opcode in the registry matched the mnemonic.
    #[error("unknown opcode: {0}")]
    UnknownOpcode(String),
    /// A literal or address exceeded the field width that holds it.
    #[error("out of range: {0}")]
    OutOfRange(String),
}

impl M68kError {
    /// Reconstruct the closest-matching simulator fault for a failure that
    /// surfaced while executing (not assembling) an instruction at `pc`.
    /// Mirrors the forward mapping in `simulator::to_m68k_error`, since
    /// `EAMode::read`/`write` are typed against this error for reuse
    /// between assembly-time validation and execution.
    #[must_use]
    pub fn into_simulator_fault(self, pc: u32) -> SimulatorFault {
        match self {
            Self::OutOfRange(_) => SimulatorFault::BusError { address: pc },
            Self::BadOperand(_) | Self::SizeMismatch(_) => {
                SimulatorFault::AddressError { address: pc, size_bits: 32 }
            }
            Self::BadSyntax(_) | Self::UnknownOpcode(_) | Self::DuplicateLabel(_) => {
                SimulatorFault::DecodeError { opword: 0, pc }
            }
        }
    }
}

/// Faults the simulator can hit while stepping. Unlike [`M68kError`], these
/// are fatal: the simulator sets `halted` and records the fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SimulatorFault {
    /// An opword did not map to any known instruction.
    #[error("decode error: opword {opword:#06x} at {pc:#08x}")]
    DecodeError {
        /// The undecodable opword.
        opword: u16,
        /// The program counter at which the fetch occurred.
        pc: u32,
    },
    /// A memory access fell outside the addressable range.
    #[error("bus error: address {address:#08x}")]
    BusError {
        /// The offending address.
        address: u32,
    },
    /// A word/long access occurred at an odd address.
    #[error("address error: unaligned {size_bits}-bit access at {address:#08x}")]
    AddressError {
        /// The offending address.
        address: u32,
        /// The width, in bits, of the attempted access (16 or 32).
        size_bits: u32,
    },
}

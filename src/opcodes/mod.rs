//! The opcode registry: a pluggable table of handlers keyed by mnemonic,
//! each satisfying the contract in spec.md §4.2 — `matches`, `is_valid`,
//! `get_word_length`, `from_str`, `assemble`, `execute`. Populated once at
//! startup as a `const` slice; no runtime name-based reflection (see
//! spec.md §9's "dynamic opcode dispatch by module-name lookup" redesign
//! note).

mod dc;
mod lea;
mod mov;
mod simhalt;

use std::fmt;

use crate::error::{M68kError, SimulatorFault};
use crate::issue::Issue;
use crate::op_size::OpSize;
use crate::simulator::Simulator;

pub use dc::Dc;
pub use lea::Lea;
pub use mov::Move;
pub use simhalt::SimHalt;

/// A fully-parsed, ready-to-emit instance of some opcode.
pub trait Instruction: fmt::Debug {
    /// Deterministic bit layout for this instance.
    fn assemble(&self) -> Vec<u8>;

    /// Mutate simulator state. `DC` (not an executable instruction) and any
    /// opcode without runtime effect use the default no-op.
    fn execute(&self, _sim: &mut Simulator) -> Result<(), SimulatorFault> {
        Ok(())
    }
}

/// A handler for one opcode family, satisfying spec.md §4.2's contract.
pub trait OpcodeHandler: Sync {
    /// Case-insensitive prefix match on mnemonic, tolerating an optional
    /// `.size` suffix.
    fn matches(&self, command: &str) -> bool;

    /// Parse and constrain the operands, without materializing an
    /// instance.
    fn is_valid(&self, command: &str, params: &str) -> (bool, Vec<Issue>);

    /// How many 16-bit words the emitted encoding will occupy, including
    /// extension words. Computable without knowing label addresses.
    fn get_word_length(&self, command: &str, params: &str) -> (u32, Vec<Issue>);

    /// Materialize the opcode object.
    fn from_str(&self, command: &str, params: &str) -> (Option<Box<dyn Instruction>>, Vec<Issue>);

    /// True if this handler recognizes the opword at the binary level.
    /// Unlike `matches`, this is used by the simulator's fetch/decode loop,
    /// which has no access to source text. `DC` never overrides this: it
    /// is never executed as itself, only ever laid down as raw data.
    fn matches_binary(&self, _opword: u16) -> bool {
        false
    }

    /// Decode an opword (plus any extension words already available at
    /// `pc + 2`) into an instance, returning how many *words* beyond the
    /// opword itself were consumed.
    fn decode_binary(&self, _opword: u16, _ext: &[u16]) -> Result<(Box<dyn Instruction>, u32), M68kError> {
        Err(M68kError::UnknownOpcode("this handler does not decode binary opwords".into()))
    }
}

/// The opcode registry. Opcodes are tried in this order; the first match
/// wins. Directives (`ORG`, `EQU`, `END`) are not opcodes — the assembler
/// driver special-cases them directly (spec.md §4.3).
pub const REGISTRY: &[&dyn OpcodeHandler] = &[&Move, &Dc, &Lea, &SimHalt];

/// Find the handler whose mnemonic matches `command`'s text.
#[must_use]
pub fn find_handler(command: &str) -> Option<&'static dyn OpcodeHandler> {
    REGISTRY.iter().copied().find(|h| h.matches(command))
}

/// Decode a fetched opword against every handler that can decode binary.
/// Returns the decoded instruction and how many extra words (beyond the
/// opword) it consumed.
pub fn decode_binary(opword: u16, ext: &[u16]) -> Result<(Box<dyn Instruction>, u32), SimulatorFault> {
    for handler in REGISTRY {
        if handler.matches_binary(opword) {
            return handler
                .decode_binary(opword, ext)
                .map_err(|_| SimulatorFault::DecodeError { opword, pc: 0 });
        }
    }
    Err(SimulatorFault::DecodeError { opword, pc: 0 })
}

/// Split `"MOVE.B"` into `("MOVE", Some(OpSize::Byte))`, defaulting to
/// `WORD` when no suffix is present, per spec.md §3.4.
#[must_use]
pub fn split_size_suffix(command: &str) -> (&str, OpSize) {
    match command.split_once('.') {
        Some((mnemonic, suffix)) => {
            let size = suffix.chars().next().and_then(OpSize::from_suffix).unwrap_or(OpSize::Word);
            (mnemonic, size)
        }
        None => (command, OpSize::Word),
    }
}

/// Case-insensitive mnemonic-prefix match, e.g. `command_matches("MOVE.B",
/// "MOVE")`.
#[must_use]
pub fn command_matches(command: &str, mnemonic: &str) -> bool {
    let (name, _) = split_size_suffix(command);
    name.eq_ignore_ascii_case(mnemonic)
}

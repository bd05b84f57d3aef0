//! `SIMHALT` — a simulator-only halt instruction with no 68000 ISA
//! counterpart. Spec.md §4.2.4: takes no operands, halts the simulator
//! when executed, and occupies a single opword reserved for this purpose.

use crate::error::{M68kError, SimulatorFault};
use crate::issue::Issue;
use crate::opcodes::{command_matches, Instruction, OpcodeHandler};

/// The reserved opword. `1111` is an unimplemented-instruction line on real
/// 68000 hardware, so this value can never collide with a decoded
/// real-ISA opcode this core supports.
pub const SIMHALT_OPWORD: u16 = 0xFFFF;

/// Handler for `SIMHALT`.
#[derive(Debug)]
pub struct SimHalt;

/// The sole `SIMHALT` instance — it carries no fields.
#[derive(Debug, Clone, Copy)]
pub struct SimHaltInstruction;

impl OpcodeHandler for SimHalt {
    fn matches(&self, command: &str) -> bool {
        command_matches(command, "SIMHALT")
    }

    fn is_valid(&self, _command: &str, params: &str) -> (bool, Vec<Issue>) {
        if params.trim().is_empty() {
            (true, Vec::new())
        } else {
            (false, vec![Issue::error(M68kError::BadSyntax("SIMHALT takes no operands".into()))])
        }
    }

    fn get_word_length(&self, command: &str, params: &str) -> (u32, Vec<Issue>) {
        let (valid, issues) = self.is_valid(command, params);
        (u32::from(valid), issues)
    }

    fn from_str(&self, command: &str, params: &str) -> (Option<Box<dyn Instruction>>, Vec<Issue>) {
        let (valid, issues) = self.is_valid(command, params);
        if valid {
            (Some(Box::new(SimHaltInstruction)), issues)
        } else {
            (None, issues)
        }
    }

    fn matches_binary(&self, opword: u16) -> bool {
        opword == SIMHALT_OPWORD
    }

    fn decode_binary(&self, opword: u16, _ext: &[u16]) -> Result<(Box<dyn Instruction>, u32), M68kError> {
        if opword == SIMHALT_OPWORD {
            Ok((Box::new(SimHaltInstruction), 0))
        } else {
            Err(M68kError::UnknownOpcode(format!("{opword:#06x} is not SIMHALT")))
        }
    }
}

impl Instruction for SimHaltInstruction {
    fn assemble(&self) -> Vec<u8> {
        SIMHALT_OPWORD.to_be_bytes().to_vec()
    }

    fn execute(&self, sim: &mut crate::simulator::Simulator) -> Result<(), SimulatorFault> {
        sim.trigger_halt();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_operands() {
        let (valid, issues) = SimHalt.is_valid("SIMHALT", "D0");
        assert!(!valid);
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn assembles_to_reserved_opword() {
        let (instr, _) = SimHalt.from_str("SIMHALT", "");
        assert_eq!(instr.unwrap().assemble(), vec![0xFF, 0xFF]);
    }

    #[test]
    fn binary_round_trip() {
        assert!(SimHalt.matches_binary(SIMHALT_OPWORD));
        let (decoded, used) = SimHalt.decode_binary(SIMHALT_OPWORD, &[]).unwrap();
        assert_eq!(used, 0);
        assert_eq!(decoded.assemble(), vec![0xFF, 0xFF]);
    }
}

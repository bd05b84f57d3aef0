//! `LEA <ea>, An` — load effective address. Spec.md §4.2.3.
//!
//! Binary layout: `0100 | An(3) | 111 | mode(3) | reg(3)`, the real 68000
//! encoding for this instruction (the `111` mid-field is fixed, not a
//! generic addressing-mode slot). Source is restricted to the
//! memory-referencing subset that has an effective address at all: `(An)`,
//! `($xxxx).W`, `($xxxxxx).L`. CCR is unaffected.

use crate::ea::EAMode;
use crate::error::{M68kError, SimulatorFault};
use crate::issue::Issue;
use crate::op_size::OpSize;
use crate::opcodes::{command_matches, Instruction, OpcodeHandler};
use crate::parsing::parse_assembly_parameter;
use crate::registers::Register;
use crate::simulator::Simulator;

const LEA_BASE: u16 = 0b0100_0001_1100_0000;

/// Handler for `LEA`.
#[derive(Debug)]
pub struct Lea;

/// A parsed `LEA` instance.
#[derive(Debug, Clone, Copy)]
pub struct LeaInstruction {
    src: EAMode,
    dest: u8,
}

fn is_lea_source(ea: EAMode) -> bool {
    matches!(ea, EAMode::Ari(_) | EAMode::Ala(_) | EAMode::Awa(_))
}

fn split_operands(params: &str) -> Result<(EAMode, u8), M68kError> {
    let parts: Vec<&str> = params.splitn(2, ',').collect();
    if parts.len() != 2 {
        return Err(M68kError::BadSyntax("LEA requires exactly two operands".into()));
    }
    let src = parse_assembly_parameter(parts[0].trim())?;
    match Register::parse(parts[1].trim()) {
        Some(Register::Addr(n)) => Ok((src, n)),
        _ => Err(M68kError::BadOperand("LEA destination must be an address register".into())),
    }
}

fn validate(src: EAMode) -> Result<(), M68kError> {
    if !is_lea_source(src) {
        return Err(M68kError::BadOperand("Invalid addressing mode".into()));
    }
    Ok(())
}

impl OpcodeHandler for Lea {
    fn matches(&self, command: &str) -> bool {
        command_matches(command, "LEA")
    }

    fn is_valid(&self, _command: &str, params: &str) -> (bool, Vec<Issue>) {
        match split_operands(params).and_then(|(src, _)| validate(src)) {
            Ok(()) => (true, Vec::new()),
            Err(e) => (false, vec![Issue::error(e)]),
        }
    }

    fn get_word_length(&self, command: &str, params: &str) -> (u32, Vec<Issue>) {
        let (valid, issues) = self.is_valid(command, params);
        if !valid {
            return (0, issues);
        }
        let (src, _) = split_operands(params).expect("validated above");
        (1 + src.extension_word_count(OpSize::Long), issues)
    }

    fn from_str(&self, command: &str, params: &str) -> (Option<Box<dyn Instruction>>, Vec<Issue>) {
        let (valid, issues) = self.is_valid(command, params);
        if !valid {
            return (None, issues);
        }
        let (src, dest) = split_operands(params).expect("validated above");
        (Some(Box::new(LeaInstruction { src, dest })), issues)
    }

    fn matches_binary(&self, opword: u16) -> bool {
        opword & 0b1111_0001_1100_0000 == LEA_BASE
    }

    fn decode_binary(&self, opword: u16, ext: &[u16]) -> Result<(Box<dyn Instruction>, u32), M68kError> {
        let dest = ((opword >> 9) & 0b111) as u8;
        let mode = ((opword >> 3) & 0b111) as u8;
        let reg = (opword & 0b111) as u8;
        let (src, used) = EAMode::decode(mode, reg, OpSize::Long, true, ext)?;
        validate(src)?;
        Ok((Box::new(LeaInstruction { src, dest }), used))
    }
}

impl Instruction for LeaInstruction {
    fn assemble(&self) -> Vec<u8> {
        let (mode, reg) = self.src.fields();
        let opword = LEA_BASE | (u16::from(self.dest) << 9) | (u16::from(mode) << 3) | u16::from(reg);
        let mut words = vec![opword];
        words.extend(self.src.extension_words(OpSize::Long));
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn execute(&self, sim: &mut Simulator) -> Result<(), SimulatorFault> {
        let pc = sim.registers().pc;
        let addr = self.src.effective_address(sim, OpSize::Long).map_err(|e| e.into_simulator_fault(pc))?;
        sim.registers_mut().set_a(self.dest as usize, addr);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip() {
        let instr = LeaInstruction { src: EAMode::Ala(0x001000), dest: 3 };
        let bytes = instr.assemble();
        let opword = u16::from_be_bytes([bytes[0], bytes[1]]);
        let ext: Vec<u16> = bytes[2..]
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        assert!(Lea.matches_binary(opword));
        let (decoded, used) = Lea.decode_binary(opword, &ext).unwrap();
        assert_eq!(used, 2);
        assert_eq!(decoded.assemble(), bytes);
    }

    #[test]
    fn data_register_source_is_rejected() {
        let (valid, issues) = Lea.is_valid("LEA", "D0, A1");
        assert!(!valid);
        assert_eq!(issues.len(), 1);
    }
}

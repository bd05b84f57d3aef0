//! `EAMode`: the eight effective-address addressing modes this core
//! supports, their textual parser, binary encoder (both operand orderings
//! MOVE needs), and binary decoder.

use std::fmt;

use crate::error::M68kError;
use crate::memory_value::MemoryValue;
use crate::op_size::OpSize;
use crate::parsing::parse_literal;
use crate::registers::Register;
use crate::simulator::Simulator;

/// One of the eight addressing modes covered by this core (spec.md §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EAMode {
    /// Data register direct: `Dn`.
    Drd(u8),
    /// Address register direct: `An`.
    Ard(u8),
    /// Address register indirect: `(An)`.
    Ari(u8),
    /// Address register indirect, post-increment: `(An)+`.
    Aripi(u8),
    /// Address register indirect, pre-decrement: `-(An)`.
    Aripd(u8),
    /// Immediate: `#<literal>`.
    Imm(u32),
    /// Absolute long address: `($XXXXXX).L`.
    Ala(u32),
    /// Absolute word address: `($XXXX).W`.
    Awa(u16),
}

/// The mode-field bits (3 bits) used when encoding/decoding `mode, reg`.
fn mode_bits(ea: EAMode) -> u8 {
    match ea {
        EAMode::Drd(_) => 0b000,
        EAMode::Ard(_) => 0b001,
        EAMode::Ari(_) => 0b010,
        EAMode::Aripi(_) => 0b011,
        EAMode::Aripd(_) => 0b100,
        EAMode::Imm(_) | EAMode::Ala(_) | EAMode::Awa(_) => 0b111,
    }
}

/// The register-field bits (3 bits).
fn reg_bits(ea: EAMode) -> u8 {
    match ea {
        EAMode::Drd(n) | EAMode::Ard(n) | EAMode::Ari(n) | EAMode::Aripi(n) | EAMode::Aripd(n) => {
            n
        }
        EAMode::Imm(_) => 0b100,
        EAMode::Ala(_) => 0b001,
        EAMode::Awa(_) => 0b000,
    }
}

impl EAMode {
    /// 6-bit (mode, register) pair as encoded on the wire.
    #[must_use]
    pub fn fields(self) -> (u8, u8) {
        (mode_bits(self), reg_bits(self))
    }

    /// Encode as `mode(3) reg(3)`, the ordering MOVE uses for its
    /// destination operand.
    #[must_use]
    pub fn encode_mode_first(self) -> u8 {
        (mode_bits(self) << 3) | reg_bits(self)
    }

    /// Encode as `reg(3) mode(3)`, the ordering MOVE uses for its source
    /// operand.
    #[must_use]
    pub fn encode_reg_first(self) -> u8 {
        (reg_bits(self) << 3) | mode_bits(self)
    }

    /// The extension words (big-endian 16-bit halves) this mode appends
    /// after the opword, for the given operation size.
    #[must_use]
    pub fn extension_words(self, size: OpSize) -> Vec<u16> {
        match self {
            EAMode::Awa(addr) => vec![addr],
            EAMode::Ala(addr) => vec![(addr >> 16) as u16, addr as u16],
            EAMode::Imm(value) => match size {
                // A byte-sized immediate still consumes a full,
                // zero-padded word (spec.md §9, resolved).
                OpSize::Byte | OpSize::Word => vec![value as u16],
                OpSize::Long => vec![(value >> 16) as u16, value as u16],
            },
            _ => Vec::new(),
        }
    }

    /// Number of 16-bit extension words this mode consumes for `size`.
    #[must_use]
    pub fn extension_word_count(self, size: OpSize) -> u32 {
        match self {
            EAMode::Awa(_) => 1,
            EAMode::Ala(_) => 2,
            EAMode::Imm(_) => match size {
                OpSize::Byte | OpSize::Word => 1,
                OpSize::Long => 2,
            },
            _ => 0,
        }
    }

    /// Destination restriction MOVE (and similarly-shaped opcodes) apply:
    /// neither an immediate nor an address register may be written.
    #[must_use]
    pub fn is_valid_move_destination(self) -> bool {
        !matches!(self, EAMode::Imm(_) | EAMode::Ard(_))
    }

    /// Source restriction MOVE applies: address register direct cannot be
    /// read as a byte/word/long move source (use MOVEA instead — out of
    /// scope for this subset, so this mode is simply never produced here).
    #[must_use]
    pub fn is_valid_move_source(self) -> bool {
        !matches!(self, EAMode::Ard(_))
    }

    /// Decode from 6-bit `(mode, register)` fields plus any extension
    /// words already consumed from the instruction stream. Returns the
    /// decoded mode and how many *words* of `ext` it consumed. Mirrors
    /// `easier68k.core.enum.ea_mode_bin.parse_ea_from_binary`.
    pub fn decode(mode: u8, register: u8, size: OpSize, is_source: bool, ext: &[u16]) -> Result<(Self, u32), M68kError> {
        if mode != 0b111 {
            let reg = register & 0b111;
            return Ok((
                match mode & 0b111 {
                    0b000 => EAMode::Drd(reg),
                    0b001 => EAMode::Ard(reg),
                    0b010 => EAMode::Ari(reg),
                    0b011 => EAMode::Aripi(reg),
                    0b100 => EAMode::Aripd(reg),
                    _ => return Err(M68kError::BadOperand(format!("invalid mode bits {mode:#05b}"))),
                },
                0,
            ));
        }

        match register & 0b111 {
            0b000 => {
                let word = *ext.first().ok_or_else(|| M68kError::BadOperand("missing AWA extension word".into()))?;
                Ok((EAMode::Awa(word), 1))
            }
            0b001 => {
                let hi = *ext.first().ok_or_else(|| M68kError::BadOperand("missing ALA extension word".into()))?;
                let lo = *ext.get(1).ok_or_else(|| M68kError::BadOperand("missing ALA extension word".into()))?;
                Ok((EAMode::Ala((u32::from(hi) << 16) | u32::from(lo)), 2))
            }
            0b100 if is_source => match size {
                OpSize::Byte | OpSize::Word => {
                    let word = *ext.first().ok_or_else(|| M68kError::BadOperand("missing immediate extension word".into()))?;
                    Ok((EAMode::Imm(u32::from(word)), 1))
                }
                OpSize::Long => {
                    let hi = *ext.first().ok_or_else(|| M68kError::BadOperand("missing immediate extension word".into()))?;
                    let lo = *ext.get(1).ok_or_else(|| M68kError::BadOperand("missing immediate extension word".into()))?;
                    Ok((EAMode::Imm((u32::from(hi) << 16) | u32::from(lo)), 2))
                }
            },
            _ => Err(M68kError::BadOperand(format!(
                "mode 111 with register {register:#05b} is not a supported addressing mode"
            ))),
        }
    }

    /// Parse a textual operand (e.g. `D0`, `(A3)+`, `#$10`, `($AAAA).L`).
    pub fn parse(text: &str) -> Result<Self, M68kError> {
        let t = text.trim();
        if let Some(rest) = t.strip_prefix('#') {
            let value = parse_literal(rest)?;
            return Ok(EAMode::Imm(value));
        }
        if let Some(rest) = t.strip_prefix("-(").and_then(|r| r.strip_suffix(')')) {
            return Ok(EAMode::Aripd(parse_addr_reg(rest)?));
        }
        if let Some(rest) = t.strip_prefix('(') {
            if let Some(inner) = rest.strip_suffix(")+") {
                return Ok(EAMode::Aripi(parse_addr_reg(inner)?));
            }
            if let Some(inner) = rest.strip_suffix(')') {
                return Ok(EAMode::Ari(parse_addr_reg(inner)?));
            }
            // ($XXXX).W / ($XXXXXX).L
            if let Some((addr_text, suffix)) = rest.split_once(").") {
                let value = parse_literal(addr_text)?;
                return match suffix.to_ascii_uppercase().as_str() {
                    "W" => {
                        if value > u32::from(u16::MAX) {
                            return Err(M68kError::OutOfRange(format!("{value:#x} does not fit in a 16-bit absolute address")));
                        }
                        Ok(EAMode::Awa(value as u16))
                    }
                    "L" => {
                        if value >= 1 << 24 {
                            return Err(M68kError::OutOfRange(format!("{value:#x} does not fit in a 24-bit absolute address")));
                        }
                        Ok(EAMode::Ala(value))
                    }
                    other => Err(M68kError::BadOperand(format!("unknown absolute-address size suffix '{other}'"))),
                };
            }
            return Err(M68kError::BadOperand(format!("unrecognized parenthesized operand '{t}'")));
        }
        match Register::parse(t) {
            Some(Register::Data(n)) => Ok(EAMode::Drd(n)),
            Some(Register::Addr(n)) => Ok(EAMode::Ard(n)),
            _ => Err(M68kError::BadOperand(format!("unrecognized operand '{t}'"))),
        }
    }

    /// Read this operand's value from the simulator, applying any
    /// post-increment side effect. `simulator` is mutated because a
    /// register-indirect read may post-increment its address register.
    pub fn read(self, sim: &mut Simulator, size: OpSize) -> Result<MemoryValue, M68kError> {
        match self {
            EAMode::Drd(n) => Ok(sim.registers().get(Register::Data(n)).resize(size)),
            EAMode::Ard(n) => Ok(sim.registers().get(Register::Addr(n)).resize(size)),
            EAMode::Imm(value) => MemoryValue::from_unsigned(value & size_mask(size), size),
            other => {
                let addr = self.effective_address(sim, size)?;
                sim.read_memory(addr, size)
            }
        }
    }

    /// Write a value to this operand, applying any pre-decrement side
    /// effect. Panics (caller error) if called on [`EAMode::Imm`].
    pub fn write(self, sim: &mut Simulator, value: MemoryValue) -> Result<(), M68kError> {
        match self {
            EAMode::Drd(n) => {
                sim.registers_mut().set(Register::Data(n), value);
                Ok(())
            }
            EAMode::Ard(n) => {
                sim.registers_mut().set(Register::Addr(n), value);
                Ok(())
            }
            EAMode::Imm(_) => Err(M68kError::BadOperand("cannot write to an immediate operand".into())),
            other => {
                let addr = other.effective_address(sim, value.width())?;
                sim.write_memory(addr, value)
            }
        }
    }

    /// Resolve this mode to a 24-bit memory address, applying
    /// post-increment/pre-decrement to the referenced address register as
    /// a side effect. Only meaningful for the memory-referencing modes.
    pub fn effective_address(self, sim: &mut Simulator, size: OpSize) -> Result<u32, M68kError> {
        match self {
            EAMode::Ari(n) => Ok(sim.registers().a(n as usize)),
            EAMode::Aripi(n) => {
                let addr = sim.registers().a(n as usize);
                let step = post_inc_step(n, size);
                sim.registers_mut().set_a(n as usize, addr.wrapping_add(step));
                Ok(addr)
            }
            EAMode::Aripd(n) => {
                let step = post_inc_step(n, size);
                let addr = sim.registers().a(n as usize).wrapping_sub(step);
                sim.registers_mut().set_a(n as usize, addr);
                Ok(addr)
            }
            EAMode::Awa(addr) => Ok(i32::from(addr as i16) as u32 & 0x00FF_FFFF),
            EAMode::Ala(addr) => Ok(addr),
            _ => Err(M68kError::BadOperand(format!("{self} does not have an effective address"))),
        }
    }
}

/// A7 byte accesses step by 2 to keep the stack word-aligned (spec.md §4.4).
fn post_inc_step(reg: u8, size: OpSize) -> u32 {
    if reg == 7 && size == OpSize::Byte {
        2
    } else {
        size.bytes()
    }
}

fn size_mask(size: OpSize) -> u32 {
    match size {
        OpSize::Byte => 0xFF,
        OpSize::Word => 0xFFFF,
        OpSize::Long => 0xFFFF_FFFF,
    }
}

fn parse_addr_reg(text: &str) -> Result<u8, M68kError> {
    match Register::parse(text) {
        Some(Register::Addr(n)) => Ok(n),
        _ => Err(M68kError::BadOperand(format!("expected an address register, got '{text}'"))),
    }
}

impl fmt::Display for EAMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EAMode::Drd(n) => write!(f, "D{n}"),
            EAMode::Ard(n) => write!(f, "A{n}"),
            EAMode::Ari(n) => write!(f, "(A{n})"),
            EAMode::Aripi(n) => write!(f, "(A{n})+"),
            EAMode::Aripd(n) => write!(f, "-(A{n})"),
            EAMode::Imm(v) => write!(f, "#${v:X}"),
            EAMode::Ala(v) => write!(f, "(${v:06X}).L"),
            EAMode::Awa(v) => write!(f, "(${v:04X}).W"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_fields_round_trip() {
        let cases = [
            ("D3", EAMode::Drd(3)),
            ("A5", EAMode::Ard(5)),
            ("(A2)", EAMode::Ari(2)),
            ("(A0)+", EAMode::Aripi(0)),
            ("-(A6)", EAMode::Aripd(6)),
            ("#$10", EAMode::Imm(0x10)),
            ("($AAAA).L", EAMode::Ala(0xAAAA)),
            ("($BBBB).W", EAMode::Awa(0xBBBB)),
        ];
        for (text, expected) in cases {
            assert_eq!(EAMode::parse(text).unwrap(), expected, "parsing {text}");
        }
    }

    #[test]
    fn mode_bits_match_spec_table() {
        assert_eq!(mode_bits(EAMode::Drd(0)), 0b000);
        assert_eq!(mode_bits(EAMode::Ard(0)), 0b001);
        assert_eq!(mode_bits(EAMode::Ari(0)), 0b010);
        assert_eq!(mode_bits(EAMode::Aripi(0)), 0b011);
        assert_eq!(mode_bits(EAMode::Aripd(0)), 0b100);
        assert_eq!((mode_bits(EAMode::Imm(0)), reg_bits(EAMode::Imm(0))), (0b111, 0b100));
        assert_eq!((mode_bits(EAMode::Ala(0)), reg_bits(EAMode::Ala(0))), (0b111, 0b001));
        assert_eq!((mode_bits(EAMode::Awa(0)), reg_bits(EAMode::Awa(0))), (0b111, 0b000));
    }

    #[test]
    fn byte_immediate_still_consumes_a_full_word() {
        assert_eq!(EAMode::Imm(5).extension_word_count(OpSize::Byte), 1);
    }

    #[test]
    fn decode_round_trips_encode() {
        let ea = EAMode::Ala(0x001234);
        let (mode, reg) = ea.fields();
        let ext = ea.extension_words(OpSize::Long);
        let (decoded, used) = EAMode::decode(mode, reg, OpSize::Long, false, &ext).unwrap();
        assert_eq!(decoded, ea);
        assert_eq!(used as usize, ext.len());
    }

    #[test]
    fn absolute_word_out_of_range_rejected() {
        assert!(EAMode::parse("($1FFFF).W").is_err());
    }
}

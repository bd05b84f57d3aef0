//! `DC` — define constant: emits literal data directly into the list file
//! rather than executing as an instruction. Spec.md §4.2.2.
//!
//! Grounded on `original_source/src/easier68k/core/opcodes/dc.py`: string
//! literals are split into individual bytes and zero-padded out to a size
//! boundary; numeric literals are each padded to exactly one element's
//! width. The LONG padding rounds *up* to the next multiple of 4, per
//! spec.md §9's resolution of the original's rounding defect.

use crate::error::M68kError;
use crate::issue::Issue;
use crate::op_size::OpSize;
use crate::opcodes::{command_matches, split_size_suffix, Instruction};
use crate::opcodes::OpcodeHandler;
use crate::parsing::parse_literal;

/// Handler for `DC.B` / `DC.W` / `DC.L`.
#[derive(Debug)]
pub struct Dc;

/// A parsed `DC` instance: the raw bytes it will emit.
#[derive(Debug, Clone)]
pub struct DcInstruction {
    bytes: Vec<u8>,
}

fn split_tokens(params: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in params.chars() {
        match c {
            '\'' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            ',' if !in_quotes => {
                tokens.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        tokens.push(current.trim().to_string());
    }
    tokens
}

fn element_width(size: OpSize) -> usize {
    match size {
        OpSize::Byte => 1,
        OpSize::Word => 2,
        OpSize::Long => 4,
    }
}

/// Pad `len` up to the next multiple of `boundary` (a no-op if already
/// aligned).
fn round_up(len: usize, boundary: usize) -> usize {
    let remainder = len % boundary;
    if remainder == 0 {
        len
    } else {
        len + (boundary - remainder)
    }
}

fn encode_token(token: &str, size: OpSize) -> Result<Vec<u8>, M68kError> {
    if let Some(inner) = token.strip_prefix('\'').and_then(|r| r.strip_suffix('\'')) {
        let mut bytes: Vec<u8> = inner.bytes().collect();
        let target = match size {
            OpSize::Byte => bytes.len(),
            OpSize::Word => round_up(bytes.len(), 2),
            OpSize::Long => round_up(bytes.len(), 4),
        };
        bytes.resize(target, 0);
        return Ok(bytes);
    }
    let value = parse_literal(token)?;
    let width = element_width(size);
    let full = value.to_be_bytes();
    Ok(full[4 - width..].to_vec())
}

fn assemble_tokens(command: &str, params: &str) -> Result<Vec<u8>, M68kError> {
    let (_, size) = split_size_suffix(command);
    let tokens = split_tokens(params);
    if tokens.is_empty() {
        return Err(M68kError::BadSyntax("DC requires at least one operand".into()));
    }
    let mut out = Vec::new();
    for token in &tokens {
        out.extend(encode_token(token, size)?);
    }
    Ok(out)
}

impl OpcodeHandler for Dc {
    fn matches(&self, command: &str) -> bool {
        command_matches(command, "DC")
    }

    fn is_valid(&self, command: &str, params: &str) -> (bool, Vec<Issue>) {
        match assemble_tokens(command, params) {
            Ok(_) => (true, Vec::new()),
            Err(e) => (false, vec![Issue::error(e)]),
        }
    }

    fn get_word_length(&self, command: &str, params: &str) -> (u32, Vec<Issue>) {
        match assemble_tokens(command, params) {
            Ok(bytes) => (round_up(bytes.len(), 2) as u32 / 2, Vec::new()),
            Err(e) => (0, vec![Issue::error(e)]),
        }
    }

    fn from_str(&self, command: &str, params: &str) -> (Option<Box<dyn Instruction>>, Vec<Issue>) {
        match assemble_tokens(command, params) {
            Ok(bytes) => (Some(Box::new(DcInstruction { bytes })), Vec::new()),
            Err(e) => (None, vec![Issue::error(e)]),
        }
    }

    // DC is pure data: it is never fetched and decoded as an opword, so
    // `matches_binary`/`decode_binary` keep their default (unreachable)
    // implementations.
}

impl Instruction for DcInstruction {
    fn assemble(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_literal_pads_to_word_boundary() {
        let (instr, issues) = Dc.from_str("DC.B", "'Hai!'");
        assert!(issues.is_empty());
        assert_eq!(instr.unwrap().assemble(), vec![0x48, 0x61, 0x69, 0x21]);
    }

    #[test]
    fn long_padding_rounds_up_to_multiple_of_four() {
        let (instr, _) = Dc.from_str("DC.L", "1, 2, 3");
        let bytes = instr.unwrap().assemble();
        assert_eq!(bytes.len(), 12);
    }

    #[test]
    fn numeric_literal_is_padded_to_element_width() {
        let (instr, _) = Dc.from_str("DC.W", "$FF");
        assert_eq!(instr.unwrap().assemble(), vec![0x00, 0xFF]);
    }

    #[test]
    fn word_length_counts_16_bit_words() {
        assert_eq!(Dc.get_word_length("DC.B", "'Hai!'").0, 2);
        assert_eq!(Dc.get_word_length("DC.L", "1, 2, 3").0, 6);
    }
}

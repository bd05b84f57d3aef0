//! Line-level tokenization: labels, opcodes, literals, and operands.
//!
//! Mirrors `original_source/src/assembler/parsing_util.py`, adapted to
//! return `Result`s instead of asserting.

use crate::ea::EAMode;
use crate::error::M68kError;

/// Truncate a source line at the first `;` or `*`, whichever comes first,
/// and strip any trailing line terminator.
#[must_use]
pub fn strip_comments(line: &str) -> &str {
    let semicolon = line.find(';');
    let asterisk = line.find('*');
    let end = match (semicolon, asterisk) {
        (Some(s), Some(a)) => s.min(a),
        (Some(s), None) => s,
        (None, Some(a)) => a,
        (None, None) => line.len(),
    };
    line[..end].trim_end_matches(['\r', '\n'])
}

/// True if the (already comment-stripped) line begins a label in column 0.
#[must_use]
pub fn has_label(line: &str) -> bool {
    !line.starts_with(' ') && !line.is_empty()
}

/// Read the label from column 0 up to the first space or `:`. Returns
/// `None` if the line has no label (starts with a space).
#[must_use]
pub fn get_label(line: &str) -> Option<String> {
    if !has_label(line) {
        return None;
    }
    let label: String = line.chars().take_while(|&c| c != ' ' && c != ':').collect();
    if label.is_empty() {
        None
    } else {
        Some(label)
    }
}

/// Remove the label and its trailing whitespace/`:`, leaving
/// opcode-plus-operands.
#[must_use]
pub fn strip_label(line: &str) -> &str {
    if line.starts_with(' ') {
        return line.trim_start();
    }
    match line.find([' ', ':']) {
        Some(idx) => line[idx..].trim_start_matches([' ', ':']),
        None => "",
    }
}

/// The opcode token (mnemonic plus any `.B`/`.W`/`.L` suffix) of an
/// already-label-stripped line.
#[must_use]
pub fn get_opcode(body: &str) -> &str {
    body.split_whitespace().next().unwrap_or("")
}

/// Everything in an already-label-stripped line after the opcode token.
#[must_use]
pub fn strip_opcode(body: &str) -> &str {
    let trimmed = body.trim_start();
    match trimmed.find(char::is_whitespace) {
        Some(idx) => trimmed[idx..].trim(),
        None => "",
    }
}

/// Parse `$hex`, `%bin`, `#<decimal-or-nested-literal>`, or a bare decimal
/// into a non-negative integer. Negative values are never produced here;
/// encoding a negative operand as two's complement is the caller's job at
/// the point of use.
pub fn parse_literal(text: &str) -> Result<u32, M68kError> {
    let t = text.trim();
    if t.is_empty() {
        return Err(M68kError::BadSyntax("empty literal".into()));
    }
    if let Some(rest) = t.strip_prefix('$') {
        return u32::from_str_radix(rest, 16)
            .map_err(|_| M68kError::BadSyntax(format!("invalid hex literal '{t}'")));
    }
    if let Some(rest) = t.strip_prefix('%') {
        return u32::from_str_radix(rest, 2)
            .map_err(|_| M68kError::BadSyntax(format!("invalid binary literal '{t}'")));
    }
    if let Some(rest) = t.strip_prefix('#') {
        // A `#` may itself wrap another literal form (`#$10`) or a bare
        // decimal (`#42`).
        return parse_literal(rest);
    }
    t.parse::<u32>()
        .map_err(|_| M68kError::BadSyntax(format!("invalid decimal literal '{t}'")))
}

/// Tokenize a single operand into an [`EAMode`].
pub fn parse_assembly_parameter(text: &str) -> Result<EAMode, M68kError> {
    EAMode::parse(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_comments_picks_earliest_marker() {
        assert_eq!(strip_comments(" MOVE.B D0, D1 ; a comment"), " MOVE.B D0, D1 ");
        assert_eq!(strip_comments("* whole line comment"), "");
        assert_eq!(strip_comments(" MOVE.B D0, D1\r\n"), " MOVE.B D0, D1");
    }

    #[test]
    fn label_extraction() {
        assert_eq!(get_label("START ORG $1000"), Some("START".to_string()));
        assert_eq!(get_label(" MOVE.B D0, D1"), None);
        assert_eq!(strip_label("START ORG $1000"), "ORG $1000");
        assert_eq!(strip_label(" MOVE.B D0, D1"), "MOVE.B D0, D1");
    }

    #[test]
    fn opcode_extraction() {
        let body = "MOVE.B #$05, D0";
        assert_eq!(get_opcode(body), "MOVE.B");
        assert_eq!(strip_opcode(body), "#$05, D0");
    }

    #[test]
    fn literal_forms() {
        assert_eq!(parse_literal("$1F").unwrap(), 0x1F);
        assert_eq!(parse_literal("%101").unwrap(), 0b101);
        assert_eq!(parse_literal("#42").unwrap(), 42);
        assert_eq!(parse_literal("#$10").unwrap(), 0x10);
        assert_eq!(parse_literal("7").unwrap(), 7);
        assert!(parse_literal("").is_err());
    }
}

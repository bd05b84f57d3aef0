//! The three-pass assembler driver: label/equate discovery, layout, and
//! emission. Spec.md §4.3, grounded on
//! `original_source/src/easier68k/assembler/assembler.py`'s `find_labels` /
//! layout / emission structure — reworked from its reflection-based
//! `valid_opcodes` dispatch list onto the static [`crate::opcodes::REGISTRY`]
//! (spec.md §9's redesign note).
//!
//! Labels are substituted textually, as the original does: wherever a bare
//! identifier names a label in an opcode's operands, it is rewritten in
//! source form as an absolute long address (`($XXXXXX).L`) before the line
//! is handed to the matching opcode handler. Because that addressing mode's
//! word length never depends on the address's actual value, layout can
//! assign a real label address the first time it's defined and simply use a
//! zero placeholder for any later line that references it before its own
//! definition is reached. `END`'s target address names a label directly,
//! not through an addressing mode, so it substitutes to a bare literal
//! instead.

use std::collections::{HashMap, HashSet};

use tracing::instrument;

use crate::error::M68kError;
use crate::issue::Issue;
use crate::list_file::ListFile;
use crate::memory::MEMORY_SIZE;
use crate::opcodes::find_handler;
use crate::parsing::{get_label, get_opcode, parse_literal, strip_comments, strip_label, strip_opcode};
use crate::registers::Register;

const MAX_MEMORY_LOCATION: u32 = MEMORY_SIZE as u32;
/// The highest address `ORG` may legally target. One less than the naive
/// ceiling: spec.md §8 requires `ORG $FFFFFF` (2^24 − 1) itself be rejected,
/// reserving the top address.
const ORG_MAX: u32 = MAX_MEMORY_LOCATION - 2;

fn substitute_tokens<F: FnMut(&str) -> Option<String>>(text: &str, mut replace: F) -> String {
    let mut out = String::new();
    let mut ident = String::new();
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
        } else {
            if !ident.is_empty() {
                out.push_str(&replace(&ident).unwrap_or_else(|| ident.clone()));
                ident.clear();
            }
            out.push(c);
        }
    }
    if !ident.is_empty() {
        out.push_str(&replace(&ident).unwrap_or_else(|| ident.clone()));
    }
    out
}

fn substitute_equates(text: &str, equates: &HashMap<String, u32>) -> String {
    substitute_tokens(text, |tok| {
        if Register::parse(tok).is_some() {
            None
        } else {
            equates.get(tok).map(|v| v.to_string())
        }
    })
}

fn substitute_labels_placeholder(text: &str, equates: &HashMap<String, u32>, label_names: &HashSet<String>) -> String {
    substitute_tokens(text, |tok| {
        if Register::parse(tok).is_some() {
            None
        } else if let Some(v) = equates.get(tok) {
            Some(v.to_string())
        } else if label_names.contains(tok) {
            Some("($000000).L".to_string())
        } else {
            None
        }
    })
}

fn substitute_labels_real(text: &str, equates: &HashMap<String, u32>, labels: &HashMap<String, u32>) -> String {
    substitute_tokens(text, |tok| {
        if Register::parse(tok).is_some() {
            None
        } else if let Some(v) = equates.get(tok) {
            Some(v.to_string())
        } else if let Some(addr) = labels.get(tok) {
            Some(format!("(${addr:06X}).L"))
        } else {
            None
        }
    })
}

/// Like [`substitute_labels_real`], but for contexts expecting a bare
/// numeric literal rather than an effective-address operand — `END`'s
/// target address, which names a label directly rather than through an
/// addressing mode.
fn substitute_labels_as_literal(text: &str, equates: &HashMap<String, u32>, labels: &HashMap<String, u32>) -> String {
    substitute_tokens(text, |tok| {
        if Register::parse(tok).is_some() {
            None
        } else if let Some(v) = equates.get(tok) {
            Some(v.to_string())
        } else {
            labels.get(tok).map(|addr| addr.to_string())
        }
    })
}

struct Line {
    number: usize,
    label: Option<String>,
    opcode: String,
    params: String,
}

fn split_lines(source: &str) -> Vec<Line> {
    source
        .lines()
        .enumerate()
        .filter_map(|(i, raw)| {
            let stripped = strip_comments(raw);
            if stripped.trim().is_empty() {
                return None;
            }
            let label = get_label(stripped);
            let body = strip_label(stripped);
            let opcode = get_opcode(body).to_string();
            if opcode.is_empty() {
                return None;
            }
            let params = strip_opcode(body).to_string();
            Some(Line { number: i + 1, label, opcode, params })
        })
        .collect()
}

fn is_directive(opcode: &str, name: &str) -> bool {
    opcode.eq_ignore_ascii_case(name)
}

/// Pass 1: collect equates (resolved in source order) and the set of label
/// names, flagging duplicates.
fn discover(lines: &[Line]) -> (HashMap<String, u32>, HashSet<String>, Vec<Issue>) {
    let mut equates = HashMap::new();
    let mut label_names = HashSet::new();
    let mut seen = HashSet::new();
    let mut issues = Vec::new();

    for line in lines {
        if is_directive(&line.opcode, "EQU") {
            if let Some(name) = &line.label {
                let substituted = substitute_equates(&line.params, &equates);
                match parse_literal(&substituted) {
                    Ok(value) => {
                        equates.insert(name.clone(), value);
                    }
                    Err(e) => issues.push(Issue::error(e).at_line(line.number)),
                }
            } else {
                issues.push(Issue::error(M68kError::BadSyntax("EQU requires a label".into())).at_line(line.number));
            }
            continue;
        }

        if let Some(name) = &line.label {
            if !seen.insert(name.clone()) {
                issues.push(Issue::error(M68kError::DuplicateLabel(name.clone())).at_line(line.number));
            }
            if !is_directive(&line.opcode, "ORG") {
                label_names.insert(name.clone());
            }
        }
    }

    (equates, label_names, issues)
}

/// Pass 2: walk the program computing real addresses for every label.
/// Issues from invalid lines are discarded here — pass 3 is the sole
/// authority for diagnostics, since it performs the identical validity
/// check and must agree with pass 2 on which lines advance the cursor.
fn layout(lines: &[Line], equates: &HashMap<String, u32>, label_names: &HashSet<String>) -> HashMap<String, u32> {
    let mut labels = HashMap::new();
    let mut cursor: u32 = 0;

    for line in lines {
        if is_directive(&line.opcode, "EQU") {
            continue;
        }

        if is_directive(&line.opcode, "ORG") {
            let substituted = substitute_equates(&line.params, equates);
            if let Ok(value) = parse_literal(&substituted) {
                if value <= ORG_MAX {
                    cursor = value;
                }
            }
            // Bind after applying the new cursor: a label on an `ORG` line
            // names the address `ORG` just moved to, not wherever the
            // cursor was beforehand.
            if let Some(name) = &line.label {
                labels.entry(name.clone()).or_insert(cursor);
            }
            continue;
        }

        if let Some(name) = &line.label {
            labels.entry(name.clone()).or_insert(cursor);
        }

        if is_directive(&line.opcode, "END") {
            continue;
        }

        let Some(handler) = find_handler(&line.opcode) else {
            continue;
        };
        let substituted = substitute_labels_placeholder(&line.params, equates, label_names);
        let (length, issues) = handler.get_word_length(&line.opcode, &substituted);
        if issues.iter().any(Issue::is_error) {
            continue;
        }
        let end = u64::from(cursor) + u64::from(length) * 2;
        if end > u64::from(MAX_MEMORY_LOCATION) {
            continue;
        }
        cursor += length * 2;
    }

    labels
}

/// Pass 3: replay the program with every label now resolved, materializing
/// and emitting real instructions.
fn emit(lines: &[Line], equates: &HashMap<String, u32>, labels: &HashMap<String, u32>) -> (ListFile, Vec<Issue>) {
    let mut list_file = ListFile::new();
    for (name, &addr) in labels {
        list_file.define_symbol(name.clone(), addr);
    }

    let mut issues = Vec::new();
    let mut cursor: u32 = 0;
    let mut end_address: Option<u32> = None;

    for line in lines {
        if is_directive(&line.opcode, "EQU") {
            continue;
        }

        if is_directive(&line.opcode, "ORG") {
            let substituted = substitute_equates(&line.params, equates);
            match parse_literal(&substituted) {
                Ok(value) if value <= ORG_MAX => cursor = value,
                Ok(value) => issues.push(
                    Issue::error(M68kError::OutOfRange(format!("{value:#x} exceeds the addressable space")))
                        .at_line(line.number),
                ),
                Err(e) => issues.push(Issue::error(e).at_line(line.number)),
            }
            continue;
        }

        if is_directive(&line.opcode, "END") {
            let substituted = substitute_labels_as_literal(&line.params, equates, labels);
            end_address = if substituted.trim().is_empty() {
                Some(cursor)
            } else {
                match parse_literal(&substituted) {
                    Ok(value) => Some(value),
                    Err(e) => {
                        issues.push(Issue::error(e).at_line(line.number));
                        Some(cursor)
                    }
                }
            };
            continue;
        }

        let Some(handler) = find_handler(&line.opcode) else {
            issues.push(Issue::error(M68kError::UnknownOpcode(line.opcode.clone())).at_line(line.number));
            continue;
        };

        let substituted = substitute_labels_real(&line.params, equates, labels);
        let (instruction, line_issues) = handler.from_str(&line.opcode, &substituted);
        for issue in line_issues {
            issues.push(issue.at_line(line.number));
        }

        let Some(instruction) = instruction else {
            continue;
        };

        let bytes = instruction.assemble();
        let end = u64::from(cursor) + bytes.len() as u64;
        if end > u64::from(MAX_MEMORY_LOCATION) {
            issues.push(
                Issue::error(M68kError::OutOfRange(format!(
                    "emitting {} bytes at {cursor:#x} would cross the 24-bit address space",
                    bytes.len()
                )))
                .at_line(line.number),
            );
            continue;
        }

        list_file.insert_run(cursor, &bytes);
        cursor += bytes.len() as u32;
    }

    list_file.set_starting_execution_address(end_address.unwrap_or(0));
    (list_file, issues)
}

/// Assemble `source_text` into a [`ListFile`] plus the diagnostics produced
/// along the way. Never fails outright: a line with an unrecoverable
/// problem contributes no bytes and an `ERROR`-severity [`Issue`], and
/// assembly of the remaining program continues best-effort.
#[instrument(skip_all)]
pub fn assemble(source_text: &str) -> (ListFile, Vec<Issue>) {
    let lines = split_lines(source_text);
    let (equates, label_names, mut issues) = discover(&lines);
    let labels = layout(&lines, &equates, &label_names);
    let (list_file, emit_issues) = emit(&lines, &equates, &labels);
    issues.extend(emit_issues);
    (list_file, issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_move_and_halt() {
        let (lf, issues) = assemble("      MOVE.B #$05, D0\n      SIMHALT\n      END $0\n");
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(lf.starting_execution_address, 0);
        assert_eq!(lf.byte_count(), 6);
    }

    #[test]
    fn labeled_program_resolves_symbol_table() {
        let source = "START ORG $1000\n      MOVE.L #$DEADBEEF, D0\n      SIMHALT\n      END START\n";
        let (lf, issues) = assemble(source);
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(lf.symbols.get("START"), Some(&0x1000));
        assert_eq!(lf.starting_execution_address, 0x1000);
    }

    #[test]
    fn dc_emits_exact_bytes() {
        let source = "      ORG $2000\nDATA  DC.B 'Hai!'\n      END $2000\n";
        let (lf, issues) = assemble(source);
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(lf.memory.get(&0x2000).unwrap(), "48616921");
    }

    #[test]
    fn invalid_move_destination_reports_one_error_and_emits_nothing() {
        let (lf, issues) = assemble("      MOVE.W D0, A0\n");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].is_error());
        assert_eq!(lf.byte_count(), 0);
    }

    #[test]
    fn duplicate_label_is_flagged_but_assembly_continues() {
        let source = "A MOVE.B #$01, D0\nA MOVE.B #$02, D1\n      SIMHALT\n";
        let (lf, issues) = assemble(source);
        assert!(issues.iter().any(|i| matches!(i.kind, M68kError::DuplicateLabel(_))));
        assert!(lf.byte_count() > 0);
    }

    #[test]
    fn org_past_boundary_is_out_of_range() {
        let (_, issues) = assemble("      ORG $FFFFFF\n      DC.B $00\n");
        assert!(issues.iter().any(|i| matches!(i.kind, M68kError::OutOfRange(_))));
    }

    #[test]
    fn dc_long_three_items_pads_to_twelve_bytes() {
        let (lf, issues) = assemble("      DC.L 1, 2, 3\n");
        assert!(issues.is_empty(), "{issues:?}");
        assert_eq!(lf.memory.get(&0).unwrap().len(), 24);
    }
}

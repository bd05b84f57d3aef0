//! End-to-end scenarios assembling a program and running it to completion,
//! covering spec.md §8's testable properties.

use m68k_workbench::{assemble, EAMode, M68kError, OpSize, Register, Simulator};

fn assemble_clean(source: &str) -> m68k_workbench::ListFile {
    let (lf, issues) = assemble(source);
    assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    lf
}

#[test]
fn move_immediate_then_halt() {
    let lf = assemble_clean("      MOVE.B #$05, D0\n      SIMHALT\n      END $0\n");
    let mut sim = Simulator::new();
    sim.load_list_file(&lf).unwrap();
    sim.run();

    assert!(sim.halted());
    assert_eq!(sim.get_register_value(Register::Data(0)).unsigned() & 0xFF, 5);
    let sr = sim.get_register_value(Register::Sr);
    assert_eq!(sr.unsigned() & m68k_workbench::flags::N, 0);
    assert_eq!(sr.unsigned() & m68k_workbench::flags::Z, 0);
}

#[test]
fn labeled_long_move_sets_negative_flag() {
    let source = "START ORG $1000\n      MOVE.L #$DEADBEEF, D0\n      SIMHALT\n      END START\n";
    let lf = assemble_clean(source);
    assert_eq!(lf.symbols.get("START"), Some(&0x1000));

    let mut sim = Simulator::new();
    sim.load_list_file(&lf).unwrap();
    sim.run();

    assert!(sim.halted());
    assert_eq!(sim.get_register_value(Register::Data(0)).unsigned(), 0xDEAD_BEEF);
    let sr = sim.get_register_value(Register::Sr);
    assert_ne!(sr.unsigned() & m68k_workbench::flags::N, 0);
}

#[test]
fn dc_string_literal_lands_at_org_address() {
    let source = "      ORG $2000\nGREET DC.B 'Hai!'\n      END $2000\n";
    let lf = assemble_clean(source);
    assert_eq!(lf.memory.get(&0x2000).unwrap(), "48616921");
}

#[test]
fn invalid_addressing_mode_reports_single_error_and_emits_nothing() {
    let (lf, issues) = assemble("      MOVE.W D0, A0\n");
    assert_eq!(issues.len(), 1);
    assert!(issues[0].is_error());
    assert!(matches!(issues[0].kind, M68kError::BadOperand(_)));
    assert_eq!(lf.byte_count(), 0);
}

#[test]
fn duplicate_label_still_produces_a_usable_list_file() {
    let source = "A MOVE.B #$01, D0\nA MOVE.B #$02, D1\n      SIMHALT\n";
    let (lf, issues) = assemble(source);
    assert!(issues.iter().any(|i| matches!(i.kind, M68kError::DuplicateLabel(_))));
    assert!(lf.byte_count() > 0);
}

#[test]
fn org_beyond_addressable_space_is_out_of_range() {
    let (_, issues) = assemble("      ORG $FFFFFF\n      DC.B $00\n");
    assert!(issues.iter().any(|i| matches!(i.kind, M68kError::OutOfRange(_))));
}

#[test]
fn org_at_zero_is_accepted() {
    let (_, issues) = assemble("      ORG $0\n      DC.B $00\n");
    assert!(issues.is_empty(), "{issues:?}");
}

#[test]
fn lea_loads_absolute_address_into_address_register() {
    let source = "      LEA ($003000).L, A1\n      SIMHALT\n      END $0\n";
    let lf = assemble_clean(source);
    let mut sim = Simulator::new();
    sim.load_list_file(&lf).unwrap();
    sim.step();
    assert_eq!(sim.get_register_value(Register::Addr(1)).unsigned(), 0x003000);
}

#[test]
fn byte_immediate_still_consumes_a_full_extension_word() {
    assert_eq!(EAMode::Imm(5).extension_word_count(OpSize::Byte), 1);
    let lf = assemble_clean("      MOVE.B #$05, D0\n      SIMHALT\n");
    // opword (2 bytes) + one full extension word (2 bytes), never one byte.
    assert_eq!(lf.memory.get(&0).unwrap().len(), 8);
}

#[test]
fn address_register_indirect_post_increment_walks_memory() {
    let source = "      ORG $3000\nTABLE DC.W $1111, $2222\n      ORG $4000\n      LEA TABLE, A0\n      MOVE.W (A0)+, D0\n      MOVE.W (A0)+, D1\n      SIMHALT\n      END $4000\n";
    let lf = assemble_clean(source);
    let mut sim = Simulator::new();
    sim.load_list_file(&lf).unwrap();
    sim.run();

    assert!(sim.halted());
    assert_eq!(sim.get_register_value(Register::Data(0)).unsigned() & 0xFFFF, 0x1111);
    assert_eq!(sim.get_register_value(Register::Data(1)).unsigned() & 0xFFFF, 0x2222);
    assert_eq!(sim.get_register_value(Register::Addr(0)).unsigned(), 0x3004);
}

#[test]
fn unknown_opcode_is_rejected_with_unknown_opcode_issue() {
    let (_, issues) = assemble("      FROB D0, D1\n");
    assert!(issues.iter().any(|i| matches!(i.kind, M68kError::UnknownOpcode(_))));
}

#[test]
fn request_stop_prevents_run_from_stepping() {
    let source = "      MOVE.B #$01, D0\n      SIMHALT\n";
    let lf = assemble_clean(source);
    let mut sim = Simulator::new();
    sim.load_list_file(&lf).unwrap();

    sim.request_stop();
    sim.run();
    assert!(!sim.halted());
    assert_eq!(sim.get_register_value(Register::Data(0)).unsigned() & 0xFF, 0);

    sim.clear_stop_request();
    sim.run();
    assert!(sim.halted());
    assert_eq!(sim.get_register_value(Register::Data(0)).unsigned() & 0xFF, 1);
}

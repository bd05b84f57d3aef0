//! The `M68K` simulator: fetch/decode/execute loop over a flat 16 MiB
//! memory and a full 68000 register file. Spec.md §5.
//!
//! Grounded on `emu198x-emu198x/crates/emu-m68k/src/m68000/mod.rs`'s
//! `Cpu68000` (state machine over a register file plus a bus), simplified
//! to this core's synchronous, non-pipelined execution model: no
//! micro-op queue, no deferred post-increment — each `step()` fully
//! retires one instruction.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::error::{M68kError, SimulatorFault};
use crate::list_file::ListFile;
use crate::memory::Memory;
use crate::memory_value::MemoryValue;
use crate::op_size::OpSize;
use crate::opcodes;
use crate::registers::{Register, Registers};

fn to_m68k_error(fault: SimulatorFault) -> M68kError {
    match fault {
        SimulatorFault::BusError { address } => {
            M68kError::OutOfRange(format!("bus error accessing {address:#08x}"))
        }
        SimulatorFault::AddressError { address, size_bits } => {
            M68kError::BadOperand(format!("misaligned {size_bits}-bit access at {address:#08x}"))
        }
        SimulatorFault::DecodeError { opword, pc } => {
            M68kError::UnknownOpcode(format!("opword {opword:#06x} at {pc:#08x}"))
        }
    }
}

/// A 68000-family simulator executing an assembled program against a flat
/// 24-bit address space.
pub struct Simulator {
    registers: Registers,
    memory: Memory,
    halted: bool,
    stop_requested: AtomicBool,
    last_fault: Option<SimulatorFault>,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// A fresh simulator: all registers zeroed, memory cleared, not halted.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            memory: Memory::new(),
            halted: false,
            stop_requested: AtomicBool::new(false),
            last_fault: None,
        }
    }

    /// Borrow the register file.
    #[must_use]
    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    /// Mutably borrow the register file.
    pub fn registers_mut(&mut self) -> &mut Registers {
        &mut self.registers
    }

    /// Load an assembled program into memory and set `PC` to its starting
    /// execution address.
    pub fn load_list_file(&mut self, list_file: &ListFile) -> Result<(), M68kError> {
        list_file.load_into(&mut self.memory).map_err(to_m68k_error)?;
        self.registers.pc = list_file.starting_execution_address;
        self.halted = false;
        self.last_fault = None;
        Ok(())
    }

    /// Read a register's current value.
    #[must_use]
    pub fn get_register_value(&self, reg: Register) -> MemoryValue {
        self.registers.get(reg)
    }

    /// Write a register's value.
    pub fn set_register_value(&mut self, reg: Register, value: MemoryValue) {
        self.registers.set(reg, value);
    }

    /// Read from memory, used by addressing-mode resolution. Faults surface
    /// as [`M68kError`] rather than [`SimulatorFault`] because `EAMode`'s
    /// read/write contract predates the simulator-level fault type and is
    /// shared with assembly-time validation.
    pub fn read_memory(&mut self, addr: u32, size: OpSize) -> Result<MemoryValue, M68kError> {
        self.memory.read(addr, size).map_err(to_m68k_error)
    }

    /// Write to memory.
    pub fn write_memory(&mut self, addr: u32, value: MemoryValue) -> Result<(), M68kError> {
        self.memory.write(addr, value).map_err(to_m68k_error)
    }

    /// Ask the running simulator to stop after the current instruction.
    /// Cooperative: only observed between `step()` calls inside `run()`, so
    /// callers on another thread can interrupt a long-running program.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Relaxed);
    }

    /// Set by `SIMHALT`: unlike `request_stop`, this takes effect
    /// immediately, the instant the halting instruction retires.
    pub(crate) fn trigger_halt(&mut self) {
        self.halted = true;
    }

    /// True once `SIMHALT` has executed or a fault has occurred.
    #[must_use]
    pub fn halted(&self) -> bool {
        self.halted
    }

    /// The most recent fault to halt the simulator, if any.
    #[must_use]
    pub fn last_fault(&self) -> Option<SimulatorFault> {
        self.last_fault
    }

    /// Fetch, decode, and execute a single instruction. No-op if already
    /// halted.
    pub fn step(&mut self) {
        if self.halted {
            return;
        }

        let pc = self.registers.pc;
        let opword = match self.memory.read(pc, OpSize::Word) {
            Ok(value) => value.unsigned() as u16,
            Err(fault) => {
                warn!(?fault, pc, "fetch failed");
                self.halted = true;
                self.last_fault = Some(fault);
                return;
            }
        };

        // Extension words live immediately after the opword; hand the
        // decoder a generous look-ahead window and let it report how many
        // it actually consumed.
        let mut ext = Vec::new();
        for i in 0..5u32 {
            let addr = pc.wrapping_add(2 + i * 2);
            match self.memory.read(addr, OpSize::Word) {
                Ok(value) => ext.push(value.unsigned() as u16),
                Err(_) => break,
            }
        }

        let (instruction, used) = match opcodes::decode_binary(opword, &ext) {
            Ok(result) => result,
            Err(fault) => {
                let fault = match fault {
                    SimulatorFault::DecodeError { opword, pc: _ } => SimulatorFault::DecodeError { opword, pc },
                    other => other,
                };
                warn!(?fault, pc, "decode failed");
                self.halted = true;
                self.last_fault = Some(fault);
                return;
            }
        };

        self.registers.pc = pc.wrapping_add(2 + used * 2);
        debug!(pc, opword, "executing");

        if let Err(fault) = instruction.execute(self) {
            warn!(?fault, pc, "execution faulted");
            self.halted = true;
            self.last_fault = Some(fault);
        }
    }

    /// Step until halted or a stop is requested. `request_stop` is sticky:
    /// a caller (typically on another thread, mid-run) sets it once and
    /// `run` will not step again until it is cleared.
    pub fn run(&mut self) {
        while !self.halted && !self.stop_requested.load(Ordering::Relaxed) {
            self.step();
        }
    }

    /// Clear a previously requested stop, allowing `run` to proceed again.
    pub fn clear_stop_request(&mut self) {
        self.stop_requested.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simple_program() -> ListFile {
        let mut lf = ListFile::new();
        // MOVE.B #$05, D0
        lf.insert_run(0x1000, &[0x10, 0x3C, 0x00, 0x05]);
        // SIMHALT
        lf.insert_run(0x1004, &[0xFF, 0xFF]);
        lf.set_starting_execution_address(0x1000);
        lf
    }

    #[test]
    fn runs_move_then_halts() {
        let mut sim = Simulator::new();
        sim.load_list_file(&simple_program()).unwrap();
        sim.run();
        assert!(sim.halted());
        assert_eq!(sim.get_register_value(Register::Data(0)).unsigned(), 5);
    }

    #[test]
    fn unknown_opword_halts_with_decode_fault() {
        let mut lf = ListFile::new();
        lf.insert_run(0, &[0xA0, 0x00]);
        let mut sim = Simulator::new();
        sim.load_list_file(&lf).unwrap();
        sim.step();
        assert!(sim.halted());
        assert!(matches!(sim.last_fault(), Some(SimulatorFault::DecodeError { .. })));
    }
}

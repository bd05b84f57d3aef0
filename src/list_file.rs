//! The assembler's output artifact: starting execution address, resolved
//! symbol table, and a sparse memory image. Spec.md §3.5/§6.1 — a
//! JSON-equivalent document with exactly three top-level keys,
//! so the simulator (or any other consumer) can load a previously-assembled
//! program without re-running the assembler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SimulatorFault;
use crate::memory::Memory;

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() % 2 != 0 {
        return None;
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).ok())
        .collect()
}

/// The complete output of assembling a program: starting execution address,
/// the resolved symbol table, and a sparse memory image — each contiguous
/// run of emitted bytes keyed by the address its first byte landed at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFile {
    /// Where the simulator should set `PC` before running this program,
    /// set by `END`'s operand.
    pub starting_execution_address: u32,
    /// Label/equate name to resolved address.
    pub symbols: BTreeMap<String, u32>,
    /// Address → hex-encoded byte run, one entry per assembled line.
    pub memory: BTreeMap<u32, String>,
}

impl ListFile {
    /// An empty list file with no memory and execution starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a resolved label or equate.
    pub fn define_symbol(&mut self, name: impl Into<String>, address: u32) {
        self.symbols.insert(name.into(), address);
    }

    /// Record a contiguous run of bytes starting at `address`, as produced
    /// by assembling one source line.
    pub fn insert_run(&mut self, address: u32, bytes: &[u8]) {
        if !bytes.is_empty() {
            self.memory.insert(address, bytes_to_hex(bytes));
        }
    }

    /// Set where the simulator resumes execution.
    pub fn set_starting_execution_address(&mut self, address: u32) {
        self.starting_execution_address = address;
    }

    /// Total bytes recorded across all runs.
    #[must_use]
    pub fn byte_count(&self) -> usize {
        self.memory.values().map(|hex| hex.len() / 2).sum()
    }

    /// Copy every run's bytes into `memory` at their recorded addresses.
    pub fn load_into(&self, memory: &mut Memory) -> Result<(), SimulatorFault> {
        for (&address, hex) in &self.memory {
            let bytes = hex_to_bytes(hex).expect("list file produced valid hex");
            memory.load(address, &bytes)?;
        }
        Ok(())
    }

    /// Serialize to the on-disk JSON form.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse a previously-serialized list file.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let mut lf = ListFile::new();
        lf.define_symbol("START", 0x1000);
        lf.insert_run(0x1000, &[0x11, 0x22]);
        lf.set_starting_execution_address(0x1000);

        let json = lf.to_json_string().unwrap();
        assert!(json.contains("\"starting_execution_address\""));
        assert!(json.contains("\"symbols\""));
        assert!(json.contains("\"memory\""));
        let back = ListFile::from_json_str(&json).unwrap();
        assert_eq!(back, lf);
    }

    #[test]
    fn load_into_places_bytes_at_recorded_addresses() {
        let mut lf = ListFile::new();
        lf.insert_run(0x2000, &[0x48, 0x61, 0x69, 0x21]);
        let mut mem = Memory::new();
        lf.load_into(&mut mem).unwrap();
        assert_eq!(mem.read_raw_byte(0x2000).unwrap(), 0x48);
        assert_eq!(mem.read_raw_byte(0x2003).unwrap(), 0x21);
    }

    #[test]
    fn empty_run_is_not_recorded() {
        let mut lf = ListFile::new();
        lf.insert_run(0x3000, &[]);
        assert!(lf.memory.is_empty());
    }
}

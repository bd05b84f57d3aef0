//! An educational Motorola 68000 toolchain: an assembler that lowers a
//! small but real subset of M68K assembly into a machine-code list file,
//! and a simulator that loads that list file and steps a modeled CPU
//! through it.
//!
//! # Architecture
//!
//! Two pipelines share one instruction-representation layer:
//!
//! - [`op_size`], [`memory_value`], [`ea`] — operand sizing, a fixed-width
//!   value carrier with wrapping arithmetic, and the eight addressing
//!   modes this core covers.
//! - [`opcodes`] — a static registry of opcode handlers (`MOVE`, `DC`,
//!   `LEA`, `SIMHALT`), each both a textual assembler contract and, where
//!   applicable, a binary decoder the simulator's fetch loop uses.
//! - [`assembler`] — the three-pass driver: label/equate discovery,
//!   layout, emission.
//! - [`list_file`] — the assembler's output artifact, serializable to
//!   JSON for a clean handoff to the simulator.
//! - [`simulator`] — the CPU: registers, flat memory, fetch/decode/execute.
//!
//! `error`/`issue` carry the fault taxonomy both pipelines draw from:
//! assembler faults become [`issue::Issue`]s and never abort assembly;
//! simulator faults are fatal and halt execution.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod assembler;
pub mod ea;
pub mod error;
pub mod flags;
pub mod issue;
pub mod list_file;
pub mod memory;
pub mod memory_value;
pub mod op_size;
pub mod opcodes;
pub mod parsing;
pub mod registers;
pub mod simulator;

pub use assembler::assemble;
pub use ea::EAMode;
pub use error::{M68kError, SimulatorFault};
pub use issue::{Issue, Severity};
pub use list_file::ListFile;
pub use memory_value::MemoryValue;
pub use op_size::OpSize;
pub use registers::Register;
pub use simulator::Simulator;

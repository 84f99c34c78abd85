//! Minimal bytecode layer
//!
//! Just enough structure for the effect walker: a linear-sweep disassembler
//! and a dispatcher scan that recovers the public function table. This is
//! not a decompiler; no stack or value modelling happens here.

pub mod disasm;
pub mod opcode;
pub mod table;

pub use disasm::{disassemble, Instruction};
pub use table::{Function, FunctionTable};

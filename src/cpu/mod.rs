//! 6502 CPU emulation for the NES.
//!
//! Table-driven: every opcode maps to an operation, an addressing mode and a base cycle count,
//! including the undocumented opcodes. The CPU runs against any [`CpuBus`](crate::bus::CpuBus)
//! passed into each step, so the same core drives the console and the unit tests.

pub mod cpu;
pub mod disasm;
pub mod flags;
pub mod instructions;

pub use cpu::Cpu;
pub use flags::Status;

//! Side-effect-free disassembler for debuggers and the CPU trace log.

use crate::{
    bus::CpuBus,
    cpu::instructions::{INSTRUCTIONS, Mode},
};

/// Disassemble the instruction at `addr`. Returns the text and the address of the next
/// instruction. Undocumented opcodes are prefixed with `*` as in nestest logs.
///
/// Only inspection reads are issued, so disassembling across PPU or controller registers does
/// not disturb them.
pub fn disassemble<B: CpuBus>(bus: &mut B, addr: u16) -> (String, u16) {
    let opcode = bus.read(addr, false);
    let instruction = INSTRUCTIONS[opcode as usize];
    let lo = bus.read(addr.wrapping_add(1), false);
    let hi = bus.read(addr.wrapping_add(2), false);
    let word = u16::from_le_bytes([lo, hi]);
    let next = addr
        .wrapping_add(1)
        .wrapping_add(instruction.mode.operand_len());

    let operand = match instruction.mode {
        Mode::Implied => String::new(),
        Mode::Accumulator => "A".to_string(),
        Mode::Immediate => format!("#${lo:02X}"),
        Mode::ZeroPage => format!("${lo:02X}"),
        Mode::ZeroPageX => format!("${lo:02X},X"),
        Mode::ZeroPageY => format!("${lo:02X},Y"),
        Mode::Absolute => format!("${word:04X}"),
        Mode::AbsoluteX => format!("${word:04X},X"),
        Mode::AbsoluteY => format!("${word:04X},Y"),
        Mode::Indirect => format!("(${word:04X})"),
        Mode::IndirectX => format!("(${lo:02X},X)"),
        Mode::IndirectY => format!("(${lo:02X}),Y"),
        Mode::Relative => format!("${:04X}", next.wrapping_add(lo as i8 as u16)),
    };

    let prefix = if instruction.is_undocumented(opcode) { "*" } else { " " };
    let text = format!("{prefix}{} {operand}", instruction.op.mnemonic());
    (text.trim_end().to_string(), next)
}

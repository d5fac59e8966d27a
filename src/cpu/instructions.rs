//! Opcode table: operation, addressing mode and base cycle count for all 256 opcodes.
//!
//! Sources: [CPU unofficial opcodes](https://www.nesdev.org/wiki/CPU_unofficial_opcodes) and
//! [6502 instruction reference](https://www.nesdev.org/obelisk-6502-guide/reference.html).
//! Read instructions that cross a page while indexing take one extra cycle (see
//! [`Op::page_penalty`]); branches add their own cycles when taken.

use Mode::*;
use Op::*;

/// How the operand of an instruction is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    /// JMP only; reproduces the page-wrap bug.
    Indirect,
    /// (zp,X)
    IndirectX,
    /// (zp),Y
    IndirectY,
    Relative,
}

impl Mode {
    /// Operand bytes following the opcode.
    pub fn operand_len(self) -> u16 {
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | IndirectX | IndirectY | Relative => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // Undocumented
    Ahx, Alr, Anc, Arr, Axs, Dcp, Isc, Jam, Las, Lax, Rla, Rra, Sax, Shx,
    Shy, Slo, Sre, Tas, Xaa,
}

impl Op {
    /// Upper-case mnemonic as used by disassemblers.
    pub fn mnemonic(self) -> String {
        format!("{self:?}").to_uppercase()
    }

    /// Instructions that only read their operand pay a cycle when indexing crosses a page.
    pub fn page_penalty(self) -> bool {
        matches!(
            self,
            Adc | And | Cmp | Eor | Lda | Ldx | Ldy | Ora | Sbc | Lax | Las | Nop
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub mode: Mode,
    pub cycles: u8,
}

impl Instruction {
    /// True for opcodes outside the documented 151 (including the $EB SBC alias and extra NOPs).
    pub fn is_undocumented(&self, opcode: u8) -> bool {
        match self.op {
            Ahx | Alr | Anc | Arr | Axs | Dcp | Isc | Jam | Las | Lax | Rla | Rra | Sax | Shx
            | Shy | Slo | Sre | Tas | Xaa => true,
            Nop => opcode != 0xEA,
            Sbc => opcode == 0xEB,
            _ => false,
        }
    }
}

const fn i(op: Op, mode: Mode, cycles: u8) -> Instruction {
    Instruction { op, mode, cycles }
}

#[rustfmt::skip]
pub static INSTRUCTIONS: [Instruction; 256] = [
    // 0x00
    i(Brk, Implied, 7),   i(Ora, IndirectX, 6), i(Jam, Implied, 2),   i(Slo, IndirectX, 8),
    i(Nop, ZeroPage, 3),  i(Ora, ZeroPage, 3),  i(Asl, ZeroPage, 5),  i(Slo, ZeroPage, 5),
    i(Php, Implied, 3),   i(Ora, Immediate, 2), i(Asl, Accumulator, 2), i(Anc, Immediate, 2),
    i(Nop, Absolute, 4),  i(Ora, Absolute, 4),  i(Asl, Absolute, 6),  i(Slo, Absolute, 6),
    // 0x10
    i(Bpl, Relative, 2),  i(Ora, IndirectY, 5), i(Jam, Implied, 2),   i(Slo, IndirectY, 8),
    i(Nop, ZeroPageX, 4), i(Ora, ZeroPageX, 4), i(Asl, ZeroPageX, 6), i(Slo, ZeroPageX, 6),
    i(Clc, Implied, 2),   i(Ora, AbsoluteY, 4), i(Nop, Implied, 2),   i(Slo, AbsoluteY, 7),
    i(Nop, AbsoluteX, 4), i(Ora, AbsoluteX, 4), i(Asl, AbsoluteX, 7), i(Slo, AbsoluteX, 7),
    // 0x20
    i(Jsr, Absolute, 6),  i(And, IndirectX, 6), i(Jam, Implied, 2),   i(Rla, IndirectX, 8),
    i(Bit, ZeroPage, 3),  i(And, ZeroPage, 3),  i(Rol, ZeroPage, 5),  i(Rla, ZeroPage, 5),
    i(Plp, Implied, 4),   i(And, Immediate, 2), i(Rol, Accumulator, 2), i(Anc, Immediate, 2),
    i(Bit, Absolute, 4),  i(And, Absolute, 4),  i(Rol, Absolute, 6),  i(Rla, Absolute, 6),
    // 0x30
    i(Bmi, Relative, 2),  i(And, IndirectY, 5), i(Jam, Implied, 2),   i(Rla, IndirectY, 8),
    i(Nop, ZeroPageX, 4), i(And, ZeroPageX, 4), i(Rol, ZeroPageX, 6), i(Rla, ZeroPageX, 6),
    i(Sec, Implied, 2),   i(And, AbsoluteY, 4), i(Nop, Implied, 2),   i(Rla, AbsoluteY, 7),
    i(Nop, AbsoluteX, 4), i(And, AbsoluteX, 4), i(Rol, AbsoluteX, 7), i(Rla, AbsoluteX, 7),
    // 0x40
    i(Rti, Implied, 6),   i(Eor, IndirectX, 6), i(Jam, Implied, 2),   i(Sre, IndirectX, 8),
    i(Nop, ZeroPage, 3),  i(Eor, ZeroPage, 3),  i(Lsr, ZeroPage, 5),  i(Sre, ZeroPage, 5),
    i(Pha, Implied, 3),   i(Eor, Immediate, 2), i(Lsr, Accumulator, 2), i(Alr, Immediate, 2),
    i(Jmp, Absolute, 3),  i(Eor, Absolute, 4),  i(Lsr, Absolute, 6),  i(Sre, Absolute, 6),
    // 0x50
    i(Bvc, Relative, 2),  i(Eor, IndirectY, 5), i(Jam, Implied, 2),   i(Sre, IndirectY, 8),
    i(Nop, ZeroPageX, 4), i(Eor, ZeroPageX, 4), i(Lsr, ZeroPageX, 6), i(Sre, ZeroPageX, 6),
    i(Cli, Implied, 2),   i(Eor, AbsoluteY, 4), i(Nop, Implied, 2),   i(Sre, AbsoluteY, 7),
    i(Nop, AbsoluteX, 4), i(Eor, AbsoluteX, 4), i(Lsr, AbsoluteX, 7), i(Sre, AbsoluteX, 7),
    // 0x60
    i(Rts, Implied, 6),   i(Adc, IndirectX, 6), i(Jam, Implied, 2),   i(Rra, IndirectX, 8),
    i(Nop, ZeroPage, 3),  i(Adc, ZeroPage, 3),  i(Ror, ZeroPage, 5),  i(Rra, ZeroPage, 5),
    i(Pla, Implied, 4),   i(Adc, Immediate, 2), i(Ror, Accumulator, 2), i(Arr, Immediate, 2),
    i(Jmp, Indirect, 5),  i(Adc, Absolute, 4),  i(Ror, Absolute, 6),  i(Rra, Absolute, 6),
    // 0x70
    i(Bvs, Relative, 2),  i(Adc, IndirectY, 5), i(Jam, Implied, 2),   i(Rra, IndirectY, 8),
    i(Nop, ZeroPageX, 4), i(Adc, ZeroPageX, 4), i(Ror, ZeroPageX, 6), i(Rra, ZeroPageX, 6),
    i(Sei, Implied, 2),   i(Adc, AbsoluteY, 4), i(Nop, Implied, 2),   i(Rra, AbsoluteY, 7),
    i(Nop, AbsoluteX, 4), i(Adc, AbsoluteX, 4), i(Ror, AbsoluteX, 7), i(Rra, AbsoluteX, 7),
    // 0x80
    i(Nop, Immediate, 2), i(Sta, IndirectX, 6), i(Nop, Immediate, 2), i(Sax, IndirectX, 6),
    i(Sty, ZeroPage, 3),  i(Sta, ZeroPage, 3),  i(Stx, ZeroPage, 3),  i(Sax, ZeroPage, 3),
    i(Dey, Implied, 2),   i(Nop, Immediate, 2), i(Txa, Implied, 2),   i(Xaa, Immediate, 2),
    i(Sty, Absolute, 4),  i(Sta, Absolute, 4),  i(Stx, Absolute, 4),  i(Sax, Absolute, 4),
    // 0x90
    i(Bcc, Relative, 2),  i(Sta, IndirectY, 6), i(Jam, Implied, 2),   i(Ahx, IndirectY, 6),
    i(Sty, ZeroPageX, 4), i(Sta, ZeroPageX, 4), i(Stx, ZeroPageY, 4), i(Sax, ZeroPageY, 4),
    i(Tya, Implied, 2),   i(Sta, AbsoluteY, 5), i(Txs, Implied, 2),   i(Tas, AbsoluteY, 5),
    i(Shy, AbsoluteX, 5), i(Sta, AbsoluteX, 5), i(Shx, AbsoluteY, 5), i(Ahx, AbsoluteY, 5),
    // 0xA0
    i(Ldy, Immediate, 2), i(Lda, IndirectX, 6), i(Ldx, Immediate, 2), i(Lax, IndirectX, 6),
    i(Ldy, ZeroPage, 3),  i(Lda, ZeroPage, 3),  i(Ldx, ZeroPage, 3),  i(Lax, ZeroPage, 3),
    i(Tay, Implied, 2),   i(Lda, Immediate, 2), i(Tax, Implied, 2),   i(Lax, Immediate, 2),
    i(Ldy, Absolute, 4),  i(Lda, Absolute, 4),  i(Ldx, Absolute, 4),  i(Lax, Absolute, 4),
    // 0xB0
    i(Bcs, Relative, 2),  i(Lda, IndirectY, 5), i(Jam, Implied, 2),   i(Lax, IndirectY, 5),
    i(Ldy, ZeroPageX, 4), i(Lda, ZeroPageX, 4), i(Ldx, ZeroPageY, 4), i(Lax, ZeroPageY, 4),
    i(Clv, Implied, 2),   i(Lda, AbsoluteY, 4), i(Tsx, Implied, 2),   i(Las, AbsoluteY, 4),
    i(Ldy, AbsoluteX, 4), i(Lda, AbsoluteX, 4), i(Ldx, AbsoluteY, 4), i(Lax, AbsoluteY, 4),
    // 0xC0
    i(Cpy, Immediate, 2), i(Cmp, IndirectX, 6), i(Nop, Immediate, 2), i(Dcp, IndirectX, 8),
    i(Cpy, ZeroPage, 3),  i(Cmp, ZeroPage, 3),  i(Dec, ZeroPage, 5),  i(Dcp, ZeroPage, 5),
    i(Iny, Implied, 2),   i(Cmp, Immediate, 2), i(Dex, Implied, 2),   i(Axs, Immediate, 2),
    i(Cpy, Absolute, 4),  i(Cmp, Absolute, 4),  i(Dec, Absolute, 6),  i(Dcp, Absolute, 6),
    // 0xD0
    i(Bne, Relative, 2),  i(Cmp, IndirectY, 5), i(Jam, Implied, 2),   i(Dcp, IndirectY, 8),
    i(Nop, ZeroPageX, 4), i(Cmp, ZeroPageX, 4), i(Dec, ZeroPageX, 6), i(Dcp, ZeroPageX, 6),
    i(Cld, Implied, 2),   i(Cmp, AbsoluteY, 4), i(Nop, Implied, 2),   i(Dcp, AbsoluteY, 7),
    i(Nop, AbsoluteX, 4), i(Cmp, AbsoluteX, 4), i(Dec, AbsoluteX, 7), i(Dcp, AbsoluteX, 7),
    // 0xE0
    i(Cpx, Immediate, 2), i(Sbc, IndirectX, 6), i(Nop, Immediate, 2), i(Isc, IndirectX, 8),
    i(Cpx, ZeroPage, 3),  i(Sbc, ZeroPage, 3),  i(Inc, ZeroPage, 5),  i(Isc, ZeroPage, 5),
    i(Inx, Implied, 2),   i(Sbc, Immediate, 2), i(Nop, Implied, 2),   i(Sbc, Immediate, 2),
    i(Cpx, Absolute, 4),  i(Sbc, Absolute, 4),  i(Inc, Absolute, 6),  i(Isc, Absolute, 6),
    // 0xF0
    i(Beq, Relative, 2),  i(Sbc, IndirectY, 5), i(Jam, Implied, 2),   i(Isc, IndirectY, 8),
    i(Nop, ZeroPageX, 4), i(Sbc, ZeroPageX, 4), i(Inc, ZeroPageX, 6), i(Isc, ZeroPageX, 6),
    i(Sed, Implied, 2),   i(Sbc, AbsoluteY, 4), i(Nop, Implied, 2),   i(Isc, AbsoluteY, 7),
    i(Nop, AbsoluteX, 4), i(Sbc, AbsoluteX, 4), i(Inc, AbsoluteX, 7), i(Isc, AbsoluteX, 7),
];

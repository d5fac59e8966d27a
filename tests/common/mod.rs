//! In-memory iNES images for driving the console.

#![allow(dead_code)]

use famicore::{Cartridge, Nes};

pub const PRG_LEN: usize = 0x8000;
pub const CHR_LEN: usize = 0x2000;
pub const NMI_HANDLER: u16 = 0x9000;
pub const IRQ_HANDLER: u16 = 0x9100;

/// NROM-256 image: `program` at $8000, `nmi` at $9000, an RTI at $9100, CHR filled with $C5.
pub fn nrom(program: &[u8], nmi: &[u8]) -> Vec<u8> {
    let mut prg = vec![0xEA; PRG_LEN];
    prg[..program.len()].copy_from_slice(program);
    let nmi_offset = (NMI_HANDLER - 0x8000) as usize;
    prg[nmi_offset..nmi_offset + nmi.len()].copy_from_slice(nmi);
    prg[(IRQ_HANDLER - 0x8000) as usize] = 0x40;

    let vectors = [NMI_HANDLER, 0x8000, IRQ_HANDLER];
    for (i, vector) in vectors.iter().enumerate() {
        prg[0x7FFA + i * 2..0x7FFC + i * 2].copy_from_slice(&vector.to_le_bytes());
    }

    let mut rom = b"NES\x1A".to_vec();
    rom.extend([2, 1, 0, 0]);
    rom.resize(16, 0);
    rom.extend(prg);
    rom.extend(std::iter::repeat_n(0xC5, CHR_LEN));
    rom
}

/// Append `JMP` to its own address so the program parks there.
pub fn park(mut program: Vec<u8>) -> Vec<u8> {
    let here = 0x8000 + program.len() as u16;
    program.push(0x4C);
    program.extend(here.to_le_bytes());
    program
}

pub fn console(program: &[u8], nmi: &[u8]) -> Nes {
    let cart = Cartridge::from_bytes(nrom(program, nmi)).unwrap();
    let mut nes = Nes::new();
    nes.load_cart(cart);
    nes
}

/// Step whole instructions until the CPU is about to execute `pc`.
pub fn run_to_pc(nes: &mut Nes, pc: u16) {
    for _ in 0..100_000 {
        nes.clock_instruction();
        if nes.cpu.pc == pc {
            return;
        }
    }
    panic!("never reached ${pc:04X}");
}

pub fn run_to_dot(nes: &mut Nes, scanline: u16, dot: u16) {
    while !(nes.ppu.scanline() == scanline && nes.ppu.dot() == dot) {
        nes.clock();
    }
}

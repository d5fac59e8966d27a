//! Mapper 4 (MMC3): bank switching, switchable mirroring, scanline IRQ.
//!
//! [MMC3](https://www.nesdev.org/wiki/MMC3): Bank select at $8000–$9FFE (even), bank data at
//! $8001–$9FFF (odd). R0/R1 = 2 KiB CHR, R2–R5 = 1 KiB CHR, R6/R7 = 8 KiB PRG. Mirroring at
//! $A000–$BFFE (even). IRQ latch $C000, reload $C001, disable $E000, enable $E001. The IRQ
//! counter is clocked once per rendered scanline by the PPU.

use crate::cartridge::{
    cartridge::CartMemory,
    mapper::{Mapper, Mirroring},
};

pub struct Mapper4 {
    /// Bank select ($8000): bits 0–2 = register index, bit 6 = PRG mode, bit 7 = CHR A12 invert.
    bank_select: u8,
    /// R0–R5 CHR, R6–R7 PRG.
    regs: [u8; 8],
    /// `None` until the game writes $A000; the header setting applies until then.
    mirroring: Option<Mirroring>,
    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,
}

impl Mapper4 {
    pub fn new() -> Self {
        Self {
            bank_select: 0,
            regs: [0; 8],
            mirroring: None,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
        }
    }

    fn prg_bank(&self, mem: &CartMemory, addr: u16) -> usize {
        let count = mem.prg_banks(0x2000);
        let last = count - 1;
        let second_last = count.saturating_sub(2);
        let r6 = (self.regs[6] & 0x3F) as usize;
        let r7 = (self.regs[7] & 0x3F) as usize;
        let swap = self.bank_select & 0x40 != 0;
        match (addr >> 13) & 3 {
            0 if swap => second_last,
            0 => r6,
            1 => r7,
            2 if swap => r6,
            2 => second_last,
            _ => last,
        }
    }

    /// 1 KiB CHR bank for a PPU address, after applying the A12 inversion.
    fn chr_bank_1k(&self, addr: u16) -> usize {
        let addr = if self.bank_select & 0x80 != 0 {
            addr ^ 0x1000
        } else {
            addr
        };
        let slot = (addr >> 10) as usize & 7;
        match slot {
            0 | 1 => (self.regs[0] & 0xFE) as usize + slot,
            2 | 3 => (self.regs[1] & 0xFE) as usize + (slot - 2),
            _ => self.regs[slot - 2] as usize,
        }
    }
}

impl Default for Mapper4 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper4 {
    fn cpu_read(&self, mem: &CartMemory, addr: u16) -> Option<u8> {
        let bank = self.prg_bank(mem, addr);
        Some(mem.read_prg(bank * 0x2000 + (addr as usize & 0x1FFF)))
    }

    fn cpu_write(&mut self, _mem: &CartMemory, addr: u16, data: u8) -> bool {
        let even = addr & 1 == 0;
        match addr {
            0x8000..=0x9FFF if even => self.bank_select = data,
            0x8000..=0x9FFF => self.regs[(self.bank_select & 7) as usize] = data,
            0xA000..=0xBFFF if even => {
                self.mirroring = Some(if data & 1 == 0 {
                    Mirroring::Vertical
                } else {
                    Mirroring::Horizontal
                });
            }
            // PRG RAM protect; RAM stays enabled.
            0xA000..=0xBFFF => {}
            0xC000..=0xDFFF if even => self.irq_latch = data,
            0xC000..=0xDFFF => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            0xE000..=0xFFFF if even => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            0xE000..=0xFFFF => self.irq_enabled = true,
            _ => return false,
        }
        true
    }

    fn chr_offset(&self, _mem: &CartMemory, addr: u16) -> usize {
        self.chr_bank_1k(addr) * 0x400 + (addr as usize & 0x3FF)
    }

    fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    /// Reload from the latch when the counter is zero or a reload was requested, otherwise count
    /// down; reaching zero with IRQs enabled asserts the IRQ line.
    fn scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn irq(&self) -> bool {
        self.irq_pending
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

//! Mapper 1 (MMC1): bank switching via 5-bit shift register.
//!
//! [MMC1](https://www.nesdev.org/wiki/MMC1): writes to $8000–$9FFF (control), $A000–$BFFF (CHR0),
//! $C000–$DFFF (CHR1), $E000–$FFFF (PRG bank). Any write with bit 7 set resets the shift register
//! and forces PRG mode 3. Otherwise bit 0 is shifted in, LSB first; the fifth write latches the
//! value into the register selected by the address of that write.
//!
//! Control: bits 0–1 mirroring, bits 2–3 PRG mode, bit 4 CHR mode (0 = one 8 KiB bank, 1 = two
//! 4 KiB banks).

use crate::cartridge::{
    cartridge::CartMemory,
    mapper::{Mapper, Mirroring},
};

/// Shift register value with only the sentinel bit set; the sentinel reaching bit 0 marks the
/// fifth write.
const SHIFT_EMPTY: u8 = 0x10;
const CONTROL_POWER_ON: u8 = 0x0C;

pub struct Mapper1 {
    shift: u8,
    control: u8,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: u8,
}

impl Mapper1 {
    pub fn new() -> Self {
        Self {
            shift: SHIFT_EMPTY,
            control: CONTROL_POWER_ON,
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: 0,
        }
    }

    /// PRG bank mode from control bits 2–3: 0/1 = 32 KiB; 2 = $8000 fixed first, $C000
    /// switchable; 3 = $8000 switchable, $C000 fixed last.
    fn prg_mode(&self) -> u8 {
        (self.control >> 2) & 0b11
    }

    fn prg_offset(&self, mem: &CartMemory, addr: u16) -> usize {
        let addr = addr as usize;
        let bank = (self.prg_bank & 0x0F) as usize;
        match self.prg_mode() {
            0 | 1 => (bank & !1) * 0x4000 + (addr & 0x7FFF),
            2 if addr < 0xC000 => addr & 0x3FFF,
            2 => bank * 0x4000 + (addr & 0x3FFF),
            _ if addr < 0xC000 => bank * 0x4000 + (addr & 0x3FFF),
            _ => (mem.prg_banks(0x4000) - 1) * 0x4000 + (addr & 0x3FFF),
        }
    }
}

impl Default for Mapper1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper1 {
    fn cpu_read(&self, mem: &CartMemory, addr: u16) -> Option<u8> {
        Some(mem.read_prg(self.prg_offset(mem, addr)))
    }

    fn cpu_write(&mut self, _mem: &CartMemory, addr: u16, data: u8) -> bool {
        if data & 0x80 != 0 {
            self.shift = SHIFT_EMPTY;
            self.control |= CONTROL_POWER_ON;
            return true;
        }

        let complete = self.shift & 1 != 0;
        self.shift = (self.shift >> 1) | ((data & 1) << 4);
        if !complete {
            return true;
        }

        let value = self.shift;
        self.shift = SHIFT_EMPTY;
        match addr {
            0x8000..=0x9FFF => self.control = value,
            0xA000..=0xBFFF => self.chr_bank0 = value,
            0xC000..=0xDFFF => self.chr_bank1 = value,
            _ => self.prg_bank = value & 0x0F,
        }
        true
    }

    fn chr_offset(&self, _mem: &CartMemory, addr: u16) -> usize {
        let addr = addr as usize;
        let bank = if self.control & 0x10 == 0 {
            // 8 KiB mode ignores the low bit of CHR0.
            (self.chr_bank0 & 0x1E) as usize + (addr >> 12)
        } else if addr < 0x1000 {
            self.chr_bank0 as usize
        } else {
            self.chr_bank1 as usize
        };
        bank * 0x1000 + (addr & 0x0FFF)
    }

    /// Mirroring from control bits 0–1: 0 = one-screen lower, 1 = one-screen upper, 2 = vertical,
    /// 3 = horizontal.
    fn mirroring(&self) -> Option<Mirroring> {
        Some(match self.control & 0b11 {
            0 => Mirroring::OneScreenLower,
            1 => Mirroring::OneScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        })
    }

    fn reset(&mut self) {
        *self = Self::new();
    }
}

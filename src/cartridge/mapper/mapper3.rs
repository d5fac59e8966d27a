//! Mapper 3 (CNROM): fixed PRG, switchable 8 KiB CHR bank.
//!
//! [CNROM](https://www.nesdev.org/wiki/INES_Mapper_003): any write to $8000–$FFFF selects the
//! CHR bank. PRG is 16 or 32 KiB like NROM.

use crate::cartridge::{cartridge::CartMemory, mapper::Mapper};

pub struct Mapper3 {
    chr_bank: u8,
}

impl Mapper3 {
    pub fn new() -> Self {
        Self { chr_bank: 0 }
    }
}

impl Default for Mapper3 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper3 {
    fn cpu_read(&self, mem: &CartMemory, addr: u16) -> Option<u8> {
        Some(mem.read_prg((addr - 0x8000) as usize))
    }

    fn cpu_write(&mut self, _mem: &CartMemory, _addr: u16, data: u8) -> bool {
        self.chr_bank = data;
        true
    }

    fn chr_offset(&self, mem: &CartMemory, addr: u16) -> usize {
        let bank = self.chr_bank as usize % mem.chr_banks(0x2000);
        bank * 0x2000 + addr as usize
    }

    fn reset(&mut self) {
        self.chr_bank = 0;
    }
}

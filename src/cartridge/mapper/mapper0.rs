//! Mapper 0 (NROM): no bank switching, 16/32KB PRG, 8KB CHR.

use crate::cartridge::{cartridge::CartMemory, mapper::Mapper};

/// NROM has no registers; a 16 KiB PRG image is mirrored into $C000–$FFFF.
pub struct Mapper0;

impl Mapper for Mapper0 {
    fn cpu_read(&self, mem: &CartMemory, addr: u16) -> Option<u8> {
        Some(mem.read_prg((addr - 0x8000) as usize))
    }

    fn cpu_write(&mut self, _mem: &CartMemory, _addr: u16, _data: u8) -> bool {
        false
    }

    fn chr_offset(&self, _mem: &CartMemory, addr: u16) -> usize {
        addr as usize
    }

    fn reset(&mut self) {}
}

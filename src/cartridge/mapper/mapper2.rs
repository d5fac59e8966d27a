//! Mapper 2 (UxROM): switchable 16 KiB PRG bank at $8000, last bank fixed at $C000.
//!
//! [UxROM](https://www.nesdev.org/wiki/UxROM): any write to $8000–$FFFF selects the bank.
//! CHR is normally 8 KiB of RAM.

use crate::cartridge::{cartridge::CartMemory, mapper::Mapper};

pub struct Mapper2 {
    prg_bank: u8,
}

impl Mapper2 {
    pub fn new() -> Self {
        Self { prg_bank: 0 }
    }
}

impl Default for Mapper2 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper2 {
    fn cpu_read(&self, mem: &CartMemory, addr: u16) -> Option<u8> {
        let bank = match addr {
            0x8000..=0xBFFF => self.prg_bank as usize,
            _ => mem.prg_banks(0x4000) - 1,
        };
        Some(mem.read_prg(bank * 0x4000 + (addr as usize & 0x3FFF)))
    }

    fn cpu_write(&mut self, _mem: &CartMemory, _addr: u16, data: u8) -> bool {
        self.prg_bank = data;
        true
    }

    fn chr_offset(&self, _mem: &CartMemory, addr: u16) -> usize {
        addr as usize
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::cartridge::cartridge::{CHR_CHUNK, Cartridge, HEADER_LEN, PRG_CHUNK};

    #[test]
    fn switches_low_window_keeps_last_bank() {
        let mut rom = vec![0; HEADER_LEN];
        rom[..4].copy_from_slice(b"NES\x1A");
        rom[4] = 4;
        rom[6] = 0x20;
        for bank in 0..4u8 {
            rom.extend(std::iter::repeat_n(bank, PRG_CHUNK));
        }
        rom.extend(std::iter::repeat_n(0, CHR_CHUNK));
        let mut cart = Cartridge::from_bytes(rom).unwrap();

        assert_eq!(cart.cpu_read(0x8000), Some(0));
        assert_eq!(cart.cpu_read(0xC000), Some(3));
        cart.cpu_write(0x8000, 2);
        assert_eq!(cart.cpu_read(0xBFFF), Some(2));
        assert_eq!(cart.cpu_read(0xFFFF), Some(3));
        cart.reset();
        assert_eq!(cart.cpu_read(0x8000), Some(0));
    }
}

//! Mapper 7 (AxROM): 32 KiB PRG banks and one-screen mirroring.
//!
//! [AxROM](https://www.nesdev.org/wiki/AxROM): writes to $8000–$FFFF select the PRG bank (bits
//! 0–2) and the nametable page (bit 4: 0 = lower, 1 = upper).

use crate::cartridge::{
    cartridge::CartMemory,
    mapper::{Mapper, Mirroring},
};

pub struct Mapper7 {
    bank_select: u8,
}

impl Mapper7 {
    pub fn new() -> Self {
        Self { bank_select: 0 }
    }
}

impl Default for Mapper7 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper7 {
    fn cpu_read(&self, mem: &CartMemory, addr: u16) -> Option<u8> {
        let bank = (self.bank_select & 0x07) as usize;
        Some(mem.read_prg(bank * 0x8000 + (addr as usize & 0x7FFF)))
    }

    fn cpu_write(&mut self, _mem: &CartMemory, _addr: u16, data: u8) -> bool {
        self.bank_select = data;
        true
    }

    fn chr_offset(&self, _mem: &CartMemory, addr: u16) -> usize {
        addr as usize
    }

    fn mirroring(&self) -> Option<Mirroring> {
        Some(if self.bank_select & 0x10 != 0 {
            Mirroring::OneScreenUpper
        } else {
            Mirroring::OneScreenLower
        })
    }

    fn reset(&mut self) {
        self.bank_select = 0;
    }
}

#[cfg(test)]
mod tests {
    use crate::cartridge::cartridge::{Cartridge, HEADER_LEN, PRG_CHUNK};
    use crate::cartridge::mapper::Mirroring;

    #[test]
    fn switches_32k_bank_and_screen() {
        let mut rom = vec![0; HEADER_LEN];
        rom[..4].copy_from_slice(b"NES\x1A");
        rom[4] = 8;
        rom[6] = 0x70;
        for bank in 0..8u8 {
            rom.extend(std::iter::repeat_n(bank, PRG_CHUNK));
        }
        let mut cart = Cartridge::from_bytes(rom).unwrap();

        assert_eq!(cart.cpu_read(0x8000), Some(0));
        assert_eq!(cart.cpu_read(0xC000), Some(1));
        assert_eq!(cart.mirroring(), Mirroring::OneScreenLower);

        cart.cpu_write(0x8000, 0x02);
        assert_eq!(cart.cpu_read(0x8000), Some(4));
        assert_eq!(cart.cpu_read(0xFFFF), Some(5));
        assert_eq!(cart.mirroring(), Mirroring::OneScreenLower);

        cart.cpu_write(0xC000, 0x12);
        assert_eq!(cart.cpu_read(0x8000), Some(4));
        assert_eq!(cart.mirroring(), Mirroring::OneScreenUpper);

        cart.reset();
        assert_eq!(cart.cpu_read(0x8000), Some(0));
        assert_eq!(cart.mirroring(), Mirroring::OneScreenLower);
    }
}

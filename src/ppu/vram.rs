//! Console-side picture memory: 2 KiB nametable RAM and 32 bytes of palette RAM, plus the 2 KiB a
//! four-screen board adds.
//!
//! Claims $2000–$3FFF on the picture bus; the cartridge claims the pattern tables below it.
//! Nametables are folded into the physical kilobytes by the cartridge's
//! [mirroring](https://www.nesdev.org/wiki/Mirroring), $3000–$3EFF mirrors $2000–$2EFF, and
//! palette RAM repeats every 32 bytes with the sprite backdrop entries aliasing the background
//! ones.

use crate::cartridge::Mirroring;

/// The upper 2 KiB is only addressed with four-screen mirroring.
pub const NAMETABLE_RAM_SIZE: usize = 0x1000;
pub const PALETTE_RAM_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct Vram {
    pub nametables: [u8; NAMETABLE_RAM_SIZE],
    pub palette: [u8; PALETTE_RAM_SIZE],
}

impl Default for Vram {
    fn default() -> Self {
        Self::new()
    }
}

impl Vram {
    pub fn new() -> Self {
        Self {
            nametables: [0; NAMETABLE_RAM_SIZE],
            palette: [0; PALETTE_RAM_SIZE],
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn read(&self, addr: u16, mirroring: Mirroring) -> Option<u8> {
        match addr {
            0x2000..=0x3EFF => Some(self.nametables[nametable_index(addr, mirroring)]),
            0x3F00..=0x3FFF => Some(self.palette[palette_index(addr)]),
            _ => None,
        }
    }

    /// Palette entries are six bits wide; the top two bits of a write are dropped.
    pub fn write(&mut self, addr: u16, data: u8, mirroring: Mirroring) -> bool {
        match addr {
            0x2000..=0x3EFF => self.nametables[nametable_index(addr, mirroring)] = data,
            0x3F00..=0x3FFF => self.palette[palette_index(addr)] = data & 0x3F,
            _ => return false,
        }
        true
    }
}

/// Map a nametable address ($2000–$3EFF) to an offset into nametable RAM.
pub fn nametable_index(addr: u16, mirroring: Mirroring) -> usize {
    let addr = (addr - 0x2000) & 0x0FFF;
    let table = addr / 0x400;
    let offset = (addr & 0x3FF) as usize;

    let physical = match mirroring {
        Mirroring::Vertical => table & 1,
        Mirroring::Horizontal => table >> 1,
        Mirroring::OneScreenLower => 0,
        Mirroring::OneScreenUpper => 1,
        Mirroring::FourScreen => table,
    };
    physical as usize * 0x400 + offset
}

/// Map a palette address ($3F00–$3FFF) to one of the 32 entries. $3F10/$3F14/$3F18/$3F1C are
/// the same cells as $3F00/$3F04/$3F08/$3F0C.
pub fn palette_index(addr: u16) -> usize {
    let index = (addr & 0x1F) as usize;
    if index >= 0x10 && index & 3 == 0 {
        index - 0x10
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nametable_mirroring_modes() {
        assert_eq!(nametable_index(0x2400, Mirroring::Horizontal), 0);
        assert_eq!(nametable_index(0x2800, Mirroring::Horizontal), 0x400);
        assert_eq!(nametable_index(0x2400, Mirroring::Vertical), 0x400);
        assert_eq!(nametable_index(0x2800, Mirroring::Vertical), 0);
        assert_eq!(nametable_index(0x2C05, Mirroring::OneScreenUpper), 0x405);
        assert_eq!(nametable_index(0x3005, Mirroring::Vertical), 5);
        assert_eq!(nametable_index(0x2C05, Mirroring::FourScreen), 0xC05);
        assert_eq!(nametable_index(0x2805, Mirroring::FourScreen), 0x805);
    }

    #[test]
    fn sprite_backdrops_alias_background() {
        let mut vram = Vram::new();
        vram.write(0x3F10, 0x2A, Mirroring::Horizontal);
        assert_eq!(vram.read(0x3F00, Mirroring::Horizontal), Some(0x2A));
        vram.write(0x3F04, 0x11, Mirroring::Horizontal);
        assert_eq!(vram.read(0x3F14, Mirroring::Horizontal), Some(0x11));
        vram.write(0x3F11, 0xFF, Mirroring::Horizontal);
        assert_eq!(vram.read(0x3F31, Mirroring::Horizontal), Some(0x3F));
        assert_ne!(vram.read(0x3F01, Mirroring::Horizontal), Some(0x3F));
    }

    #[test]
    fn pattern_tables_are_not_claimed() {
        let mut vram = Vram::new();
        assert_eq!(vram.read(0x1FFF, Mirroring::Vertical), None);
        assert!(!vram.write(0x0000, 1, Mirroring::Vertical));
    }
}

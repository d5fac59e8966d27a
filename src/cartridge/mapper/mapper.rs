//! Mapper trait: PRG/CHR address translation, mirroring, and IRQ.

use crate::cartridge::{cartridge::CartMemory, mapper::Mirroring};

/// Bank-switching logic of one cartridge board. The cartridge owns the storage and passes it in;
/// PRG RAM at $6000–$7FFF is handled by the cartridge for every board.
pub trait Mapper {
    /// Read PRG space ($8000–$FFFF).
    fn cpu_read(&self, mem: &CartMemory, addr: u16) -> Option<u8>;
    /// Write to mapper registers in $8000–$FFFF. Returns `false` if the board has none there.
    fn cpu_write(&mut self, mem: &CartMemory, addr: u16, data: u8) -> bool;
    /// Offset into CHR storage for a PPU address in $0000–$1FFF.
    fn chr_offset(&self, mem: &CartMemory, addr: u16) -> usize;
    /// Mirroring override; `None` keeps the header's (solder pad) setting.
    fn mirroring(&self) -> Option<Mirroring> {
        None
    }
    /// Called once per rendered scanline.
    fn scanline(&mut self) {}
    /// Level of the cartridge IRQ line.
    fn irq(&self) -> bool {
        false
    }
    /// Restore power-on register state.
    fn reset(&mut self);
}

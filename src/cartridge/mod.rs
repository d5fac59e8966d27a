//! NES cartridge loading and mapper support.
//!
//! - **cartridge**: Parses iNES (.nes) images, owns PRG/CHR storage, PRG RAM and the mapper.
//! - **mapper**: NROM (0), MMC1 (1), UxROM (2), CNROM (3), MMC3 (4), AxROM (7); PRG/CHR bank
//!   switching, nametable mirroring, and the MMC3 scanline IRQ.

pub mod cartridge;
pub mod mapper;

pub use cartridge::{Cartridge, Header};
pub use mapper::Mirroring;

//! NES mappers for PRG/CHR memory mapping.
//!
//! One type per supported [mapper number](https://www.nesdev.org/wiki/Mapper), selected at load
//! time by [`create`].

use anyhow::{Result, bail};

use crate::cartridge::cartridge::Header;

pub mod mapper;
pub mod mapper0;
pub mod mapper1;
pub mod mapper2;
pub mod mapper3;
pub mod mapper4;
pub mod mapper7;

pub use mapper::Mapper;

/// Nametable mirroring mode for the PPU. See [Mirroring](https://www.nesdev.org/wiki/Mirroring).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000/$2400 share the first table, $2800/$2C00 the second.
    Horizontal,
    /// $2000/$2800 share the first table, $2400/$2C00 the second.
    Vertical,
    /// All four nametables map to the first 1 KiB.
    OneScreenLower,
    /// All four nametables map to the second 1 KiB.
    OneScreenUpper,
    /// Each nametable has its own 1 KiB; the board supplies the extra 2 KiB.
    FourScreen,
}

/// Build the mapper for `header.mapper`. Unknown numbers are a load failure.
pub fn create(header: &Header) -> Result<Box<dyn Mapper>> {
    let mapper: Box<dyn Mapper> = match header.mapper {
        0 => Box::new(mapper0::Mapper0),
        1 => Box::new(mapper1::Mapper1::new()),
        2 => Box::new(mapper2::Mapper2::new()),
        3 => Box::new(mapper3::Mapper3::new()),
        4 => Box::new(mapper4::Mapper4::new()),
        7 => Box::new(mapper7::Mapper7::new()),
        n => bail!("unsupported mapper {n} ({})", name(n)),
    };
    Ok(mapper)
}

/// Board name for a mapper number, for logs and frontends.
pub fn name(number: u8) -> &'static str {
    match number {
        0 => "NROM",
        1 => "MMC1",
        2 => "UxROM",
        3 => "CNROM",
        4 => "MMC3",
        5 => "MMC5",
        7 => "AxROM",
        9 => "MMC2",
        10 => "MMC4",
        11 => "Color Dreams",
        66 => "GxROM",
        71 => "Camerica",
        _ => "unknown",
    }
}

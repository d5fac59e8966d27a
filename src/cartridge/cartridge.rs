//! NES cartridge loading from iNES format (.nes images).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mirroring, trainer, battery and
//! mapper number), an optional 512-byte trainer, then PRG ROM, then CHR ROM. A CHR size of zero
//! means the board carries 8 KiB of CHR RAM instead. [NES 2.0](https://www.nesdev.org/wiki/NES_2.0)
//! images are detected but parsed with the iNES field layout.

use std::fmt;
use std::ops::Range;

use anyhow::{Result, bail};

use crate::cartridge::mapper::{self, Mapper, Mirroring};

pub const HEADER_LEN: usize = 16;
pub const TRAINER_LEN: usize = 512;
/// PRG ROM chunk size (header byte 4 unit).
pub const PRG_CHUNK: usize = 0x4000;
/// CHR ROM chunk size (header byte 5 unit).
pub const CHR_CHUNK: usize = 0x2000;
const PRG_RAM_CHUNK: usize = 0x2000;
const CHR_RAM_LEN: usize = 0x2000;
const SIGNATURE: [u8; 4] = *b"NES\x1A";

/// Parsed 16-byte iNES header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub signature: [u8; 4],
    pub prg_chunks: u8,
    pub chr_chunks: u8,
    /// Flags 6 bit 0: 0 = horizontal, 1 = vertical. Four-screen overrides both.
    pub mirroring: Mirroring,
    /// Flags 6 bit 1: battery-backed PRG RAM at $6000–$7FFF.
    pub has_battery: bool,
    /// Flags 6 bit 2: 512-byte trainer precedes PRG data.
    pub has_trainer: bool,
    /// Flags 6 bit 3: board provides its own four-screen VRAM.
    pub four_screen: bool,
    /// Low nibble from flags 6, high nibble from flags 7.
    pub mapper: u8,
    /// Flags 7 bits 2–3 == 0b10.
    pub nes2: bool,
    /// Byte 8, in 8 KiB units (0 is treated as one unit).
    pub prg_ram_chunks: u8,
}

impl Header {
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let flags6 = bytes[6];
        let flags7 = bytes[7];
        Self {
            signature: [bytes[0], bytes[1], bytes[2], bytes[3]],
            prg_chunks: bytes[4],
            chr_chunks: bytes[5],
            mirroring: if flags6 & 0x08 != 0 {
                Mirroring::FourScreen
            } else if flags6 & 0x01 != 0 {
                Mirroring::Vertical
            } else {
                Mirroring::Horizontal
            },
            has_battery: flags6 & 0x02 != 0,
            has_trainer: flags6 & 0x04 != 0,
            four_screen: flags6 & 0x08 != 0,
            mapper: (flags6 >> 4) | (flags7 & 0xF0),
            nes2: flags7 & 0x0C == 0x08,
            prg_ram_chunks: bytes[8],
        }
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_chunks as usize * PRG_CHUNK
    }

    pub fn chr_rom_len(&self) -> usize {
        self.chr_chunks as usize * CHR_CHUNK
    }

    pub fn prg_ram_len(&self) -> usize {
        self.prg_ram_chunks.max(1) as usize * PRG_RAM_CHUNK
    }
}

/// ROM image plus the RAM the board carries. Mappers translate addresses into offsets here.
pub struct CartMemory {
    rom: Vec<u8>,
    prg: Range<usize>,
    chr: Range<usize>,
    chr_ram: Option<Vec<u8>>,
    prg_ram: Vec<u8>,
}

impl CartMemory {
    pub fn prg_rom(&self) -> &[u8] {
        &self.rom[self.prg.clone()]
    }

    /// CHR ROM, or the CHR RAM that replaces it.
    pub fn chr(&self) -> &[u8] {
        match &self.chr_ram {
            Some(ram) => ram,
            None => &self.rom[self.chr.clone()],
        }
    }

    pub fn chr_is_ram(&self) -> bool {
        self.chr_ram.is_some()
    }

    /// Number of `bank_size` banks in PRG ROM (at least 1).
    pub fn prg_banks(&self, bank_size: usize) -> usize {
        (self.prg.len() / bank_size).max(1)
    }

    /// Number of `bank_size` banks in CHR ROM/RAM (at least 1).
    pub fn chr_banks(&self, bank_size: usize) -> usize {
        (self.chr().len() / bank_size).max(1)
    }

    /// Read PRG ROM at a mapped offset; offsets past the end wrap.
    pub fn read_prg(&self, offset: usize) -> u8 {
        let prg = self.prg_rom();
        prg[offset % prg.len()]
    }

    /// Read CHR at a mapped offset; offsets past the end wrap.
    pub fn read_chr(&self, offset: usize) -> u8 {
        let chr = self.chr();
        chr[offset % chr.len()]
    }

    /// Write CHR RAM. CHR ROM is read-only, so the write is dropped and `false` returned.
    pub fn write_chr(&mut self, offset: usize, data: u8) -> bool {
        match &mut self.chr_ram {
            Some(ram) => {
                let len = ram.len();
                ram[offset % len] = data;
                true
            }
            None => false,
        }
    }

    pub fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }

    fn read_prg_ram(&self, addr: u16) -> u8 {
        self.prg_ram[(addr as usize - 0x6000) % self.prg_ram.len()]
    }

    fn write_prg_ram(&mut self, addr: u16, data: u8) {
        let len = self.prg_ram.len();
        self.prg_ram[(addr as usize - 0x6000) % len] = data;
    }
}

/// A loaded cartridge: header, storage, and the mapper selected by the header.
///
/// CPU side: PRG RAM at $6000–$7FFF, PRG ROM (bank-mapped) at $8000–$FFFF.
/// PPU side: CHR (bank-mapped) at $0000–$1FFF.
pub struct Cartridge {
    header: Header,
    memory: CartMemory,
    mapper: Box<dyn Mapper>,
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("header", &self.header)
            .field("mapper", &self.mapper_name())
            .finish_non_exhaustive()
    }
}

impl Cartridge {
    /// Parse and validate an iNES image. Fails on a short file, bad magic, truncated trainer,
    /// PRG or CHR, a zero PRG size, or an unsupported mapper.
    pub fn from_bytes(rom: Vec<u8>) -> Result<Self> {
        let Some(header_bytes) = rom.first_chunk::<HEADER_LEN>() else {
            bail!("invalid ROM: too small ({} bytes)", rom.len());
        };
        let header = Header::parse(header_bytes);
        if header.signature != SIGNATURE {
            bail!("invalid ROM: bad signature {:02X?}", header.signature);
        }

        let mut offset = HEADER_LEN;
        if header.has_trainer {
            if rom.len() < offset + TRAINER_LEN {
                bail!("invalid ROM: trainer too short");
            }
            offset += TRAINER_LEN;
        }

        if header.prg_chunks == 0 {
            bail!("invalid ROM: no PRG ROM");
        }
        let prg = offset..offset + header.prg_rom_len();
        if rom.len() < prg.end {
            bail!(
                "invalid ROM: PRG ROM too short (want {} bytes, have {})",
                header.prg_rom_len(),
                rom.len().saturating_sub(offset)
            );
        }

        let chr = prg.end..prg.end + header.chr_rom_len();
        if rom.len() < chr.end {
            bail!(
                "invalid ROM: CHR ROM too short (want {} bytes, have {})",
                header.chr_rom_len(),
                rom.len() - prg.end
            );
        }
        let chr_ram = (header.chr_chunks == 0).then(|| vec![0; CHR_RAM_LEN]);

        let mapper = mapper::create(&header)?;
        let memory = CartMemory {
            rom,
            prg,
            chr,
            chr_ram,
            prg_ram: vec![0; header.prg_ram_len()],
        };

        log::info!("Loaded ROM");
        log::info!("    Mapper:       {} ({})", header.mapper, mapper::name(header.mapper));
        log::info!("    PRG ROM size: {}KB", header.prg_chunks as usize * 16);
        log::info!(
            "    CHR ROM size: {}KB{}",
            header.chr_chunks as usize * 8,
            if memory.chr_is_ram() { " (8KB CHR RAM)" } else { "" }
        );
        log::info!("    Mirroring:    {:?}", header.mirroring);
        log::info!("    Battery:      {}", if header.has_battery { "Yes" } else { "No" });
        log::info!("    PRG RAM size: {}KB", header.prg_ram_len() / 1024);
        if header.nes2 {
            log::info!("    Format:       NES 2.0 (loaded with iNES fields)");
        }

        Ok(Self {
            header,
            memory,
            mapper,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn prg_rom(&self) -> &[u8] {
        self.memory.prg_rom()
    }

    pub fn chr(&self) -> &[u8] {
        self.memory.chr()
    }

    /// True when the board carries CHR RAM instead of CHR ROM.
    pub fn has_chr_ram(&self) -> bool {
        self.memory.chr_is_ram()
    }

    pub fn prg_ram(&self) -> &[u8] {
        self.memory.prg_ram()
    }

    pub fn mapper_name(&self) -> &'static str {
        mapper::name(self.header.mapper)
    }

    /// Return the mapper to its power-on register state. ROM and RAM contents are kept.
    pub fn reset(&mut self) {
        self.mapper.reset();
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x6000..=0x7FFF => Some(self.memory.read_prg_ram(addr)),
            0x8000..=0xFFFF => self.mapper.cpu_read(&self.memory, addr),
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, addr: u16, data: u8) -> bool {
        match addr {
            0x6000..=0x7FFF => {
                self.memory.write_prg_ram(addr, data);
                true
            }
            0x8000..=0xFFFF => self.mapper.cpu_write(&self.memory, addr, data),
            _ => false,
        }
    }

    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x0000..=0x1FFF => Some(self.memory.read_chr(self.mapper.chr_offset(&self.memory, addr))),
            _ => None,
        }
    }

    pub fn ppu_write(&mut self, addr: u16, data: u8) -> bool {
        match addr {
            0x0000..=0x1FFF => {
                let offset = self.mapper.chr_offset(&self.memory, addr);
                // CHR ROM ignores writes but still owns the address range.
                self.memory.write_chr(offset, data);
                true
            }
            _ => false,
        }
    }

    /// Four-screen boards hard-wire their nametables; otherwise the mapper may override the header.
    pub fn mirroring(&self) -> Mirroring {
        if self.header.four_screen {
            return Mirroring::FourScreen;
        }
        self.mapper.mirroring().unwrap_or(self.header.mirroring)
    }

    /// Scanline notification from the PPU (MMC3 IRQ counter).
    pub fn scanline(&mut self) {
        self.mapper.scanline();
    }

    /// Cartridge IRQ line.
    pub fn irq(&self) -> bool {
        self.mapper.irq()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg_chunks: u8, chr_chunks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut rom = vec![0; HEADER_LEN];
        rom[..4].copy_from_slice(b"NES\x1A");
        rom[4] = prg_chunks;
        rom[5] = chr_chunks;
        rom[6] = flags6;
        rom[7] = flags7;
        if flags6 & 0x04 != 0 {
            rom.extend(std::iter::repeat_n(0xEE, TRAINER_LEN));
        }
        for i in 0..prg_chunks as usize * PRG_CHUNK {
            rom.push((i / PRG_CHUNK) as u8);
        }
        rom.extend(std::iter::repeat_n(0xC5, chr_chunks as usize * CHR_CHUNK));
        rom
    }

    #[test]
    fn nrom_32k_exposes_views() {
        let cart = Cartridge::from_bytes(image(2, 1, 0, 0)).unwrap();
        assert_eq!(cart.prg_rom().len(), 0x8000);
        assert_eq!(cart.chr().len(), 0x2000);
        assert_eq!(cart.header().mapper, 0);
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        assert_eq!(cart.cpu_read(0x8000), Some(0));
        assert_eq!(cart.cpu_read(0xC000), Some(1));
        assert_eq!(cart.ppu_read(0x0123), Some(0xC5));
    }

    #[test]
    fn nrom_16k_mirrors_upper_half() {
        let mut rom = image(1, 1, 0x01, 0);
        rom[HEADER_LEN + 0x10] = 0x77;
        let cart = Cartridge::from_bytes(rom).unwrap();
        assert_eq!(cart.cpu_read(0xC010), Some(0x77));
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut rom = image(1, 1, 0, 0);
        rom[3] = 0x00;
        let err = Cartridge::from_bytes(rom).unwrap_err();
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn rejects_short_file() {
        assert!(Cartridge::from_bytes(b"NES\x1A".to_vec()).is_err());
    }

    #[test]
    fn rejects_truncated_prg_and_chr() {
        let mut rom = image(2, 0, 0, 0);
        rom.truncate(HEADER_LEN + PRG_CHUNK);
        assert!(Cartridge::from_bytes(rom).unwrap_err().to_string().contains("PRG"));

        let mut rom = image(1, 1, 0, 0);
        rom.truncate(rom.len() - 1);
        assert!(Cartridge::from_bytes(rom).unwrap_err().to_string().contains("CHR"));
    }

    #[test]
    fn rejects_truncated_trainer() {
        let mut rom = image(0, 0, 0x04, 0);
        rom.truncate(HEADER_LEN + 100);
        assert!(Cartridge::from_bytes(rom).unwrap_err().to_string().contains("trainer"));
    }

    #[test]
    fn rejects_missing_prg() {
        assert!(Cartridge::from_bytes(image(0, 1, 0, 0)).is_err());
    }

    #[test]
    fn rejects_unknown_mapper() {
        // Mapper 99 = 0x63: low nibble 3 in flags 6, high nibble 6 in flags 7.
        let err = Cartridge::from_bytes(image(1, 1, 0x30, 0x60)).unwrap_err();
        assert!(err.to_string().contains("99"));
    }

    #[test]
    fn trainer_is_skipped() {
        let cart = Cartridge::from_bytes(image(1, 1, 0x04, 0)).unwrap();
        assert_eq!(cart.cpu_read(0x8000), Some(0));
    }

    #[test]
    fn zero_chr_gets_writable_ram() {
        let mut cart = Cartridge::from_bytes(image(1, 0, 0, 0)).unwrap();
        assert_eq!(cart.chr().len(), 0x2000);
        assert!(cart.has_chr_ram());
        assert!(cart.ppu_write(0x0042, 0x99));
        assert_eq!(cart.ppu_read(0x0042), Some(0x99));
    }

    #[test]
    fn chr_rom_ignores_writes() {
        let mut cart = Cartridge::from_bytes(image(1, 1, 0, 0)).unwrap();
        assert!(!cart.has_chr_ram());
        cart.ppu_write(0x0042, 0x99);
        assert_eq!(cart.ppu_read(0x0042), Some(0xC5));
    }

    #[test]
    fn prg_ram_round_trips() {
        let mut cart = Cartridge::from_bytes(image(1, 1, 0x02, 0)).unwrap();
        assert!(cart.header().has_battery);
        assert!(cart.cpu_write(0x6123, 0x5A));
        assert_eq!(cart.cpu_read(0x6123), Some(0x5A));
        assert_eq!(cart.prg_ram()[0x123], 0x5A);
    }

    #[test]
    fn four_screen_overrides_header_and_mapper_mirroring() {
        let cart = Cartridge::from_bytes(image(1, 1, 0x09, 0)).unwrap();
        assert!(cart.header().four_screen);
        assert_eq!(cart.header().mirroring, Mirroring::FourScreen);
        assert_eq!(cart.mirroring(), Mirroring::FourScreen);

        // MMC3 with the four-screen bit: the mirroring register has no effect.
        let mut cart = Cartridge::from_bytes(image(2, 1, 0x48, 0)).unwrap();
        cart.cpu_write(0xA000, 1);
        assert_eq!(cart.mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn detects_nes2() {
        let cart = Cartridge::from_bytes(image(1, 1, 0, 0x08)).unwrap();
        assert!(cart.header().nes2);
    }
}

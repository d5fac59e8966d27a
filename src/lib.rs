//! famicore: a cycle-stepped NES emulator core.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): Ricoh 2A03 (CPU+APU),
//! 2C02 PPU, cartridge mappers, and controller I/O. [`Nes`] owns every component and advances
//! them one master tick (one PPU dot) at a time.
//!
//! ## Modules (NESdev references)
//!
//! - **apu** – [APU](https://www.nesdev.org/wiki/APU): pulse×2, triangle, noise, DMC, frame
//!   counter, [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer)
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map) and
//!   [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map) as ordered device lists with an
//!   [open bus](https://www.nesdev.org/wiki/Open_bus_behavior) latch
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading; [Mapper](https://www.nesdev.org/wiki/Mapper)
//!   NROM (0), MMC1 (1), UxROM (2), CNROM (3), MMC3 (4), AxROM (7)
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): $4016 latch, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: full + undocumented opcodes, [NMI](https://www.nesdev.org/wiki/NMI), disassembler
//! - **dma** – [OAM DMA](https://www.nesdev.org/wiki/PPU_registers#OAMDMA) via $4014
//! - **nes** – the console: bus wiring and clock division
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering), OAM, nametables, 256×240
//! - **ram** – 2KB work RAM, mirrored to $1FFF

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod controller;
pub mod cpu;
pub mod dma;
pub mod nes;
pub mod ppu;
pub mod ram;

pub use cartridge::Cartridge;
pub use controller::Buttons;
pub use nes::Nes;

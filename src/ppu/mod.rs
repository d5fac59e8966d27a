//! PPU (Picture Processing Unit) emulation.
//!
//! See [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers),
//! [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map). Handles 341-dot scanlines, 262
//! scanlines per frame, vblank NMI, the background fetch pipeline, sprite evaluation, OAM,
//! nametables, and palette.

pub mod ppu;
pub mod registers;
pub mod vram;

pub use ppu::{PALETTE_RGB, Ppu, SCREEN_HEIGHT, SCREEN_WIDTH};
pub use vram::Vram;

#[cfg(test)]
mod tests;

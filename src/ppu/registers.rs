//! PPU register bit layouts and the internal scroll register.
//!
//! See [PPU registers](https://www.nesdev.org/wiki/PPU_registers) and
//! [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling).

use bitflags::bitflags;

bitflags! {
    /// PPUCTRL ($2000).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Control: u8 {
        const NAMETABLE_X = 1 << 0;
        const NAMETABLE_Y = 1 << 1;
        /// VRAM address increment per $2007 access: 0 = +1, 1 = +32.
        const INCREMENT_32 = 1 << 2;
        /// Sprite pattern table for 8x8 sprites.
        const SPRITE_TABLE = 1 << 3;
        const BACKGROUND_TABLE = 1 << 4;
        const TALL_SPRITES = 1 << 5;
        const MASTER_SLAVE = 1 << 6;
        const NMI_ENABLE = 1 << 7;
    }
}

impl Control {
    pub fn increment(self) -> u16 {
        if self.contains(Self::INCREMENT_32) { 32 } else { 1 }
    }

    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::TALL_SPRITES) { 16 } else { 8 }
    }

    pub fn background_table(self) -> u16 {
        if self.contains(Self::BACKGROUND_TABLE) { 0x1000 } else { 0 }
    }

    pub fn sprite_table(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0 }
    }
}

bitflags! {
    /// PPUMASK ($2001).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Mask: u8 {
        const GREYSCALE = 1 << 0;
        const BACKGROUND_LEFT = 1 << 1;
        const SPRITES_LEFT = 1 << 2;
        const SHOW_BACKGROUND = 1 << 3;
        const SHOW_SPRITES = 1 << 4;
        const EMPHASIZE_RED = 1 << 5;
        const EMPHASIZE_GREEN = 1 << 6;
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

impl Mask {
    pub fn rendering(self) -> bool {
        self.intersects(Self::SHOW_BACKGROUND | Self::SHOW_SPRITES)
    }
}

bitflags! {
    /// PPUSTATUS ($2002). The low five bits read back as open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        const SPRITE_OVERFLOW = 1 << 5;
        const SPRITE_ZERO_HIT = 1 << 6;
        const VBLANK = 1 << 7;
    }
}

/// 15-bit VRAM address / scroll register (`v` and `t`).
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X
/// ||| || +++++-------- coarse Y
/// ||| ++-------------- nametable select
/// +++----------------- fine Y
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loopy(pub u16);

impl Loopy {
    const COARSE_X: u16 = 0x001F;
    const COARSE_Y: u16 = 0x03E0;
    const NAMETABLE: u16 = 0x0C00;
    const FINE_Y: u16 = 0x7000;
    /// Bits copied from `t` at dot 257.
    pub const HORIZONTAL: u16 = Self::COARSE_X | 0x0400;
    /// Bits copied from `t` during the pre-render scanline.
    pub const VERTICAL: u16 = Self::COARSE_Y | 0x0800 | Self::FINE_Y;

    pub fn coarse_x(self) -> u16 {
        self.0 & Self::COARSE_X
    }

    pub fn coarse_y(self) -> u16 {
        (self.0 & Self::COARSE_Y) >> 5
    }

    pub fn fine_y(self) -> u16 {
        (self.0 & Self::FINE_Y) >> 12
    }

    pub fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_X) | (value as u16 & 0x1F);
    }

    pub fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_Y) | ((value as u16 & 0x1F) << 5);
    }

    pub fn set_nametable(&mut self, value: u8) {
        self.0 = (self.0 & !Self::NAMETABLE) | ((value as u16 & 3) << 10);
    }

    pub fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::FINE_Y) | ((value as u16 & 7) << 12);
    }

    /// Copy the bits selected by `mask` from `other`.
    pub fn copy_from(&mut self, other: Loopy, mask: u16) {
        self.0 = (self.0 & !mask) | (other.0 & mask);
    }

    /// Step to the next tile column, switching horizontal nametable at the edge.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !Self::COARSE_X;
            self.0 ^= 0x0400;
        } else {
            self.0 += 1;
        }
    }

    /// Step to the next pixel row. Row 29 wraps into the other vertical nametable; rows 30 and 31
    /// (attribute memory) wrap without switching.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !Self::FINE_Y;
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= 0x0800;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y as u8 + 1),
        }
    }

    /// Nametable byte for the current tile.
    pub fn tile_addr(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Attribute byte covering the current tile.
    pub fn attribute_addr(self) -> u16 {
        0x23C0 | (self.0 & Self::NAMETABLE) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Shift selecting the current tile's quadrant within its attribute byte.
    pub fn attribute_shift(self) -> u8 {
        (((self.coarse_y() & 2) << 1) | (self.coarse_x() & 2)) as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increment_x_wraps_into_next_nametable() {
        let mut v = Loopy(0);
        v.set_coarse_x(31);
        v.increment_x();
        assert_eq!(v.coarse_x(), 0);
        assert_eq!(v.0 & 0x0400, 0x0400);
    }

    #[test]
    fn increment_y_wraps_at_row_29() {
        let mut v = Loopy(0);
        v.set_coarse_y(29);
        v.set_fine_y(7);
        v.increment_y();
        assert_eq!((v.coarse_y(), v.fine_y()), (0, 0));
        assert_eq!(v.0 & 0x0800, 0x0800);

        v.set_coarse_y(31);
        v.set_fine_y(7);
        v.increment_y();
        assert_eq!(v.coarse_y(), 0);
        assert_eq!(v.0 & 0x0800, 0x0800);
    }

    #[test]
    fn attribute_address() {
        let mut v = Loopy(0);
        v.set_nametable(1);
        v.set_coarse_x(6);
        v.set_coarse_y(10);
        assert_eq!(v.attribute_addr(), 0x27C0 + 2 * 8 + 1);
        assert_eq!(v.attribute_shift(), 6);
    }
}

//! 2C02 picture processor, clocked one dot at a time.
//!
//! A frame is 262 scanlines of 341 dots: 0–239 visible, 240 idle, 241–260 vertical blank and
//! 261 pre-render. Background tiles flow through 16-bit shift registers fed by a fetch pipeline
//! that runs eight dots ahead of the beam; sprites for the next line are chosen at dot 257. Each
//! visible dot writes one palette index into [`Ppu::screen`]. See
//! [PPU rendering](https://www.nesdev.org/wiki/PPU_rendering) and
//! [PPU sprite evaluation](https://www.nesdev.org/wiki/PPU_sprite_evaluation).
//!
//! All memory goes through a [`PpuBus`] passed into each call; the PPU owns only its registers,
//! OAM and the output buffer.

use crate::{
    bus::PpuBus,
    ppu::registers::{Control, Loopy, Mask, Status},
};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;
pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;
/// Dot at which the cartridge is told a scanline has been rendered.
pub const SCANLINE_HOOK_DOT: u16 = 260;

/// OAM (Object Attribute Memory): 64 sprites × 4 bytes. Each entry: Y, tile, attr, X.
pub const OAM_LEN: usize = 256;
const MAX_SPRITES_PER_LINE: usize = 8;

/// 2C02-style 64-color palette (0xRRGGBB), indexed by the values in [`Ppu::screen`].
pub const PALETTE_RGB: [u32; 64] = [
    0x545454, 0x001E74, 0x081090, 0x300088, 0x440064, 0x5C0030, 0x540400, 0x3C1800, 0x202A00,
    0x083A00, 0x004000, 0x003C00, 0x00302C, 0x000000, 0x000000, 0x000000, 0x989698, 0x084CC4,
    0x3032EC, 0x5C1EE4, 0x8814B0, 0xA01464, 0x982220, 0x783C00, 0x545A00, 0x287200, 0x087C00,
    0x007628, 0x006678, 0x000000, 0x000000, 0x000000, 0xECEEEC, 0x3C7EEC, 0x5C5CEC, 0x8844EC,
    0xB02CEC, 0xE028B0, 0xD83C50, 0xC45400, 0xAC7000, 0x808800, 0x409C30, 0x20A458, 0x209A88,
    0x404040, 0x000000, 0x000000, 0xECEEEC, 0xA8BCEC, 0xBCACEC, 0xD4A0EC, 0xEC94EC, 0xEC90D4,
    0xEC9CB4, 0xE4B090, 0xDCC878, 0xD4DC78, 0xB8EC98, 0xA8ECBC, 0xA0E4E4, 0xA0A0A0, 0x000000,
    0x000000,
];

/// Picture bus address of a palette entry. `palette` 0–3 are background, 4–7 sprites.
pub fn palette_addr(palette: u8, pixel: u8) -> u16 {
    0x3F00 + ((palette as u16 & 7) << 2) + (pixel as u16 & 3)
}

/// Picture bus address of the low plane of `row` in `tile`; the high plane is 8 bytes later.
pub fn pattern_addr(table: u16, tile: u8, row: u16) -> u16 {
    table + tile as u16 * 16 + row
}

/// Mirror a byte; sprites flipped horizontally use reversed pattern planes.
pub fn reverse_bits(byte: u8) -> u8 {
    byte.reverse_bits()
}

/// A sprite selected for the next scanline, with its pattern row already fetched.
#[derive(Debug, Clone, Copy, Default)]
struct Sprite {
    x: u8,
    attr: u8,
    pattern_lo: u8,
    pattern_hi: u8,
}

impl Sprite {
    /// 2-bit pixel at screen column `x`, or 0 if the sprite does not cover it.
    fn pixel(&self, x: u16) -> u8 {
        let offset = x.wrapping_sub(self.x as u16);
        if offset >= 8 {
            return 0;
        }
        let bit = 7 - offset;
        (((self.pattern_hi >> bit) & 1) << 1) | ((self.pattern_lo >> bit) & 1)
    }

    fn palette(&self) -> u8 {
        4 + (self.attr & 3)
    }

    fn behind_background(&self) -> bool {
        self.attr & 0x20 != 0
    }
}

/// Register, pipeline and raster state.
pub struct Ppu {
    pub ctrl: Control,
    pub mask: Mask,
    pub status: Status,
    /// OAM address for $2003/$2004.
    pub oam_addr: u8,
    pub oam: [u8; OAM_LEN],
    /// Current VRAM address.
    v: Loopy,
    /// Temporary VRAM address (top-left of the screen during rendering).
    t: Loopy,
    fine_x: u8,
    /// First/second write flip-flop shared by $2005 and $2006.
    write_toggle: bool,
    /// $2007 read-delay buffer.
    read_buffer: u8,
    /// Last value driven on the register I/O bus; write-only registers read it back.
    io_latch: u8,

    // Background fetch latches and shifters
    next_tile: u8,
    next_attribute: u8,
    next_pattern_lo: u8,
    next_pattern_hi: u8,
    pattern_shift_lo: u16,
    pattern_shift_hi: u16,
    attribute_shift_lo: u16,
    attribute_shift_hi: u16,

    sprites: [Sprite; MAX_SPRITES_PER_LINE],
    sprite_count: usize,
    sprite_zero_on_line: bool,

    dot: u16,
    scanline: u16,
    frame: u64,
    odd_frame: bool,
    nmi_pending: bool,
    /// Palette indices, row-major, 256×240.
    pub screen: Box<[u8; SCREEN_WIDTH * SCREEN_HEIGHT]>,
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Create a PPU at scanline 0, dot 0 with rendering disabled.
    pub fn new() -> Self {
        Self {
            ctrl: Control::empty(),
            mask: Mask::empty(),
            status: Status::empty(),
            oam_addr: 0,
            oam: [0; OAM_LEN],
            v: Loopy::default(),
            t: Loopy::default(),
            fine_x: 0,
            write_toggle: false,
            read_buffer: 0,
            io_latch: 0,
            next_tile: 0,
            next_attribute: 0,
            next_pattern_lo: 0,
            next_pattern_hi: 0,
            pattern_shift_lo: 0,
            pattern_shift_hi: 0,
            attribute_shift_lo: 0,
            attribute_shift_hi: 0,
            sprites: [Sprite::default(); MAX_SPRITES_PER_LINE],
            sprite_count: 0,
            sprite_zero_on_line: false,
            dot: 0,
            scanline: 0,
            frame: 0,
            odd_frame: false,
            nmi_pending: false,
            screen: Box::new([0; SCREEN_WIDTH * SCREEN_HEIGHT]),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    /// Frames completed since reset.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Current VRAM address, for debuggers.
    pub fn vram_addr(&self) -> u16 {
        self.v.0
    }

    /// Consume a pending NMI request.
    pub fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    // -------------------------------------------------------------------------
    // CPU-facing registers ($2000–$2007)
    // -------------------------------------------------------------------------

    /// Read a PPU register. `addr` is any mirror of $2000–$2007. With side effects suppressed the
    /// vblank flag, write toggle, read buffer and VRAM address are left alone.
    pub fn read_register<B: PpuBus>(&mut self, bus: &mut B, addr: u16, allow_side_effects: bool) -> u8 {
        let value = match addr & 7 {
            2 => {
                let value = self.status.bits() | (self.io_latch & 0x1F);
                if allow_side_effects {
                    self.status.remove(Status::VBLANK);
                    self.write_toggle = false;
                }
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => self.read_data(bus, allow_side_effects),
            _ => self.io_latch,
        };
        if allow_side_effects {
            self.io_latch = value;
        }
        value
    }

    fn read_data<B: PpuBus>(&mut self, bus: &mut B, allow_side_effects: bool) -> u8 {
        let addr = self.v.0 & 0x3FFF;
        let value = if addr >= 0x3F00 {
            // Palette reads bypass the buffer, which picks up the nametable byte underneath.
            let value = bus.read(addr, allow_side_effects);
            if allow_side_effects {
                self.read_buffer = bus.read(addr - 0x1000, true);
            }
            value
        } else {
            let value = self.read_buffer;
            if allow_side_effects {
                self.read_buffer = bus.read(addr, true);
            }
            value
        };
        if allow_side_effects {
            self.advance_vram_addr();
        }
        value
    }

    pub fn write_register<B: PpuBus>(&mut self, bus: &mut B, addr: u16, data: u8) {
        self.io_latch = data;
        match addr & 7 {
            0 => {
                let was_enabled = self.ctrl.contains(Control::NMI_ENABLE);
                self.ctrl = Control::from_bits_retain(data);
                self.t.set_nametable(data);
                if !was_enabled
                    && self.ctrl.contains(Control::NMI_ENABLE)
                    && self.status.contains(Status::VBLANK)
                {
                    self.nmi_pending = true;
                }
            }
            1 => self.mask = Mask::from_bits_retain(data),
            2 => {}
            3 => self.oam_addr = data,
            4 => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            5 => {
                if !self.write_toggle {
                    self.t.set_coarse_x(data >> 3);
                    self.fine_x = data & 7;
                } else {
                    self.t.set_coarse_y(data >> 3);
                    self.t.set_fine_y(data & 7);
                }
                self.write_toggle = !self.write_toggle;
            }
            6 => {
                if !self.write_toggle {
                    self.t.0 = (self.t.0 & 0x00FF) | ((data as u16 & 0x3F) << 8);
                } else {
                    self.t.0 = (self.t.0 & 0xFF00) | data as u16;
                    self.v = self.t;
                }
                self.write_toggle = !self.write_toggle;
            }
            _ => {
                bus.write(self.v.0 & 0x3FFF, data);
                self.advance_vram_addr();
            }
        }
    }

    fn advance_vram_addr(&mut self) {
        self.v.0 = self.v.0.wrapping_add(self.ctrl.increment()) & 0x7FFF;
    }

    // -------------------------------------------------------------------------
    // Dot clock
    // -------------------------------------------------------------------------

    /// Advance one dot.
    pub fn clock<B: PpuBus>(&mut self, bus: &mut B) {
        let visible = self.scanline < SCREEN_HEIGHT as u16;
        let pre_render = self.scanline == PRE_RENDER_SCANLINE;

        if pre_render && self.dot == 1 {
            self.status
                .remove(Status::VBLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW);
        }

        if (visible || pre_render) && self.mask.rendering() {
            self.render_pipeline(bus, visible, pre_render);
        }

        if visible && (1..=SCREEN_WIDTH as u16).contains(&self.dot) {
            self.output_pixel(bus);
        }

        if self.scanline == VBLANK_SCANLINE && self.dot == 1 {
            self.status.insert(Status::VBLANK);
            if self.ctrl.contains(Control::NMI_ENABLE) {
                self.nmi_pending = true;
            }
        }

        self.advance_raster();
    }

    fn advance_raster(&mut self) {
        // Odd frames drop the last dot of the pre-render line while rendering.
        let skip = self.scanline == PRE_RENDER_SCANLINE
            && self.dot == DOTS_PER_SCANLINE - 2
            && self.odd_frame
            && self.mask.rendering();

        self.dot += 1;
        if self.dot == DOTS_PER_SCANLINE || skip {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame += 1;
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    fn render_pipeline<B: PpuBus>(&mut self, bus: &mut B, visible: bool, pre_render: bool) {
        let dot = self.dot;

        if (2..=257).contains(&dot) || (322..=337).contains(&dot) {
            self.shift_background();
        }
        if ((9..=257).contains(&dot) || dot == 329 || dot == 337) && (dot - 1) % 8 == 0 {
            self.reload_background();
        }

        if (1..=256).contains(&dot) || (321..=336).contains(&dot) {
            match dot % 8 {
                2 => self.next_tile = bus.read(self.v.tile_addr(), true),
                4 => {
                    let attribute = bus.read(self.v.attribute_addr(), true);
                    self.next_attribute = (attribute >> self.v.attribute_shift()) & 3;
                }
                6 => {
                    let addr = self.background_pattern_addr();
                    self.next_pattern_lo = bus.read(addr, true);
                }
                0 => {
                    let addr = self.background_pattern_addr();
                    self.next_pattern_hi = bus.read(addr + 8, true);
                    self.v.increment_x();
                }
                _ => {}
            }
        }

        match dot {
            256 => self.v.increment_y(),
            257 => {
                self.v.copy_from(self.t, Loopy::HORIZONTAL);
                if visible {
                    self.evaluate_sprites(bus);
                } else {
                    self.sprite_count = 0;
                    self.sprite_zero_on_line = false;
                }
            }
            280..=304 if pre_render => self.v.copy_from(self.t, Loopy::VERTICAL),
            SCANLINE_HOOK_DOT => bus.scanline(),
            _ => {}
        }
    }

    fn background_pattern_addr(&self) -> u16 {
        pattern_addr(self.ctrl.background_table(), self.next_tile, self.v.fine_y())
    }

    fn shift_background(&mut self) {
        self.pattern_shift_lo <<= 1;
        self.pattern_shift_hi <<= 1;
        self.attribute_shift_lo <<= 1;
        self.attribute_shift_hi <<= 1;
    }

    fn reload_background(&mut self) {
        self.pattern_shift_lo = (self.pattern_shift_lo & 0xFF00) | self.next_pattern_lo as u16;
        self.pattern_shift_hi = (self.pattern_shift_hi & 0xFF00) | self.next_pattern_hi as u16;
        let attribute = self.next_attribute;
        let fill = |bit: u8| if attribute & bit != 0 { 0xFF } else { 0x00 };
        self.attribute_shift_lo = (self.attribute_shift_lo & 0xFF00) | fill(1);
        self.attribute_shift_hi = (self.attribute_shift_hi & 0xFF00) | fill(2);
    }

    /// Select up to eight sprites covering the next scanline, in OAM order, and fetch their
    /// pattern rows. A ninth match sets the overflow flag, found with the hardware's
    /// misaligned scan.
    fn evaluate_sprites<B: PpuBus>(&mut self, bus: &mut B) {
        let height = self.ctrl.sprite_height();
        let line = self.scanline;
        let in_range = |y: u8| line.wrapping_sub(y as u16) < height;

        self.sprite_count = 0;
        self.sprite_zero_on_line = false;

        let mut n = 0;
        while n < 64 && self.sprite_count < MAX_SPRITES_PER_LINE {
            let entry = &self.oam[n * 4..n * 4 + 4];
            if in_range(entry[0]) {
                let (y, tile, attr, x) = (entry[0], entry[1], entry[2], entry[3]);
                let row = line - y as u16;
                let (pattern_lo, pattern_hi) = self.fetch_sprite_row(bus, tile, attr, row);
                self.sprites[self.sprite_count] = Sprite {
                    x,
                    attr,
                    pattern_lo,
                    pattern_hi,
                };
                if n == 0 {
                    self.sprite_zero_on_line = true;
                }
                self.sprite_count += 1;
            }
            n += 1;
        }

        // After eight hits the PPU keeps comparing, but steps the byte offset along with the
        // sprite index, so it tests tile/attribute/X bytes as if they were Y coordinates.
        let mut m = 0;
        while n < 64 {
            if in_range(self.oam[n * 4 + m]) {
                self.status.insert(Status::SPRITE_OVERFLOW);
                break;
            }
            n += 1;
            m = (m + 1) & 3;
        }
    }

    fn fetch_sprite_row<B: PpuBus>(&self, bus: &mut B, tile: u8, attr: u8, row: u16) -> (u8, u8) {
        let height = self.ctrl.sprite_height();
        let row = if attr & 0x80 != 0 { height - 1 - row } else { row };

        let addr = if height == 8 {
            pattern_addr(self.ctrl.sprite_table(), tile, row)
        } else {
            let table = (tile & 1) as u16 * 0x1000;
            let top = tile & 0xFE;
            if row < 8 {
                pattern_addr(table, top, row)
            } else {
                pattern_addr(table, top + 1, row - 8)
            }
        };

        let lo = bus.read(addr, true);
        let hi = bus.read(addr + 8, true);
        if attr & 0x40 != 0 {
            (reverse_bits(lo), reverse_bits(hi))
        } else {
            (lo, hi)
        }
    }

    fn output_pixel<B: PpuBus>(&mut self, bus: &mut B) {
        let x = self.dot - 1;
        let left_edge = x < 8;

        let (mut bg_pixel, mut bg_palette) = (0, 0);
        if self.mask.contains(Mask::SHOW_BACKGROUND)
            && (!left_edge || self.mask.contains(Mask::BACKGROUND_LEFT))
        {
            let bit = 0x8000 >> self.fine_x;
            let p0 = u8::from(self.pattern_shift_lo & bit != 0);
            let p1 = u8::from(self.pattern_shift_hi & bit != 0);
            bg_pixel = (p1 << 1) | p0;
            let a0 = u8::from(self.attribute_shift_lo & bit != 0);
            let a1 = u8::from(self.attribute_shift_hi & bit != 0);
            bg_palette = (a1 << 1) | a0;
        }

        let mut sprite = None;
        if self.mask.contains(Mask::SHOW_SPRITES)
            && (!left_edge || self.mask.contains(Mask::SPRITES_LEFT))
        {
            sprite = self.sprites[..self.sprite_count]
                .iter()
                .enumerate()
                .find_map(|(slot, s)| match s.pixel(x) {
                    0 => None,
                    pixel => Some((slot, pixel, *s)),
                });
        }

        let addr = match (bg_pixel, sprite) {
            (0, None) => palette_addr(0, 0),
            (_, None) => palette_addr(bg_palette, bg_pixel),
            (0, Some((_, pixel, s))) => palette_addr(s.palette(), pixel),
            (_, Some((slot, pixel, s))) => {
                if slot == 0 && self.sprite_zero_on_line && x != 255 {
                    self.status.insert(Status::SPRITE_ZERO_HIT);
                }
                if s.behind_background() {
                    palette_addr(bg_palette, bg_pixel)
                } else {
                    palette_addr(s.palette(), pixel)
                }
            }
        };

        let mut color = bus.read(addr, true) & 0x3F;
        if self.mask.contains(Mask::GREYSCALE) {
            color &= 0x30;
        }
        self.screen[self.scanline as usize * SCREEN_WIDTH + x as usize] = color;
    }
}

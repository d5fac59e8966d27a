use crate::{
    bus::PpuBus,
    cartridge::Mirroring,
    ppu::{
        Ppu, SCREEN_WIDTH, Vram,
        ppu::{DOTS_PER_SCANLINE, SCANLINES_PER_FRAME},
        registers::{Control, Mask, Status},
    },
};

/// 8 KiB of CHR RAM in front of the console's nametable and palette memory.
struct TestBus {
    chr: [u8; 0x2000],
    vram: Vram,
    scanlines: usize,
}

impl TestBus {
    fn new() -> Self {
        Self {
            chr: [0; 0x2000],
            vram: Vram::new(),
            scanlines: 0,
        }
    }

    /// Fill every row of `tile`'s low plane so all its pixels are color 1.
    fn solid_tile(&mut self, table: usize, tile: usize) {
        let base = table + tile * 16;
        self.chr[base..base + 8].fill(0xFF);
    }
}

impl PpuBus for TestBus {
    fn read(&mut self, addr: u16, _allow_side_effects: bool) -> u8 {
        match addr {
            0x0000..=0x1FFF => self.chr[addr as usize],
            _ => self.vram.read(addr, Mirroring::Vertical).unwrap_or(0),
        }
    }

    fn write(&mut self, addr: u16, data: u8) {
        match addr {
            0x0000..=0x1FFF => self.chr[addr as usize] = data,
            _ => {
                self.vram.write(addr, data, Mirroring::Vertical);
            }
        }
    }

    fn scanline(&mut self) {
        self.scanlines += 1;
    }
}

fn run_to(ppu: &mut Ppu, bus: &mut TestBus, scanline: u16, dot: u16) {
    while !(ppu.scanline() == scanline && ppu.dot() == dot) {
        ppu.clock(bus);
    }
}

fn set_vram_addr(ppu: &mut Ppu, bus: &mut TestBus, addr: u16) {
    ppu.write_register(bus, 0x2006, (addr >> 8) as u8);
    ppu.write_register(bus, 0x2006, addr as u8);
}

#[test]
fn full_frame_returns_to_origin() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    for _ in 0..DOTS_PER_SCANLINE as usize * SCANLINES_PER_FRAME as usize {
        ppu.clock(&mut bus);
    }
    assert_eq!((ppu.scanline(), ppu.dot()), (0, 0));
    assert_eq!(ppu.frame(), 1);
}

#[test]
fn vblank_sets_at_241_1_and_clears_on_pre_render() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    ppu.write_register(&mut bus, 0x2000, Control::NMI_ENABLE.bits());

    run_to(&mut ppu, &mut bus, 241, 1);
    assert!(!ppu.status.contains(Status::VBLANK));
    assert!(!ppu.take_nmi());
    ppu.clock(&mut bus);
    assert!(ppu.status.contains(Status::VBLANK));
    assert!(ppu.take_nmi());
    assert!(!ppu.take_nmi());

    run_to(&mut ppu, &mut bus, 261, 2);
    assert!(!ppu.status.contains(Status::VBLANK));
}

#[test]
fn no_nmi_when_disabled() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    run_to(&mut ppu, &mut bus, 241, 2);
    assert!(ppu.status.contains(Status::VBLANK));
    assert!(!ppu.take_nmi());
}

#[test]
fn enabling_nmi_during_vblank_fires() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    run_to(&mut ppu, &mut bus, 245, 0);
    ppu.write_register(&mut bus, 0x2000, Control::NMI_ENABLE.bits());
    assert!(ppu.take_nmi());
    // Rewriting the same value is not a rising edge.
    ppu.write_register(&mut bus, 0x2000, Control::NMI_ENABLE.bits());
    assert!(!ppu.take_nmi());
}

#[test]
fn status_inspection_keeps_vblank() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    ppu.status.insert(Status::VBLANK);

    assert_eq!(ppu.read_register(&mut bus, 0x2002, false) & 0x80, 0x80);
    assert!(ppu.status.contains(Status::VBLANK));
    assert_eq!(ppu.read_register(&mut bus, 0x2002, true) & 0x80, 0x80);
    assert!(!ppu.status.contains(Status::VBLANK));
    assert_eq!(ppu.read_register(&mut bus, 0x2002, true) & 0x80, 0);
}

#[test]
fn status_read_resets_write_toggle() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    ppu.write_register(&mut bus, 0x2006, 0x21);
    ppu.read_register(&mut bus, 0x2002, true);
    set_vram_addr(&mut ppu, &mut bus, 0x2345);
    assert_eq!(ppu.vram_addr(), 0x2345);
}

#[test]
fn status_low_bits_are_open_bus() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    ppu.write_register(&mut bus, 0x2001, 0x1F);
    assert_eq!(ppu.read_register(&mut bus, 0x2002, true), 0x1F);
    assert_eq!(ppu.read_register(&mut bus, 0x2005, true), 0x1F);
}

#[test]
fn data_reads_are_buffered() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    set_vram_addr(&mut ppu, &mut bus, 0x2400);
    ppu.write_register(&mut bus, 0x2007, 0x55);
    ppu.write_register(&mut bus, 0x2007, 0x66);

    set_vram_addr(&mut ppu, &mut bus, 0x2400);
    ppu.read_register(&mut bus, 0x2007, true);
    assert_eq!(ppu.read_register(&mut bus, 0x2007, false), 0x55);
    assert_eq!(ppu.vram_addr(), 0x2401);
    assert_eq!(ppu.read_register(&mut bus, 0x2007, true), 0x55);
    assert_eq!(ppu.read_register(&mut bus, 0x2007, true), 0x66);
}

#[test]
fn palette_reads_are_immediate_and_fill_buffer_from_nametable() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    set_vram_addr(&mut ppu, &mut bus, 0x2F05);
    ppu.write_register(&mut bus, 0x2007, 0x77);
    set_vram_addr(&mut ppu, &mut bus, 0x3F05);
    ppu.write_register(&mut bus, 0x2007, 0x21);

    set_vram_addr(&mut ppu, &mut bus, 0x3F05);
    assert_eq!(ppu.read_register(&mut bus, 0x2007, true), 0x21);
    set_vram_addr(&mut ppu, &mut bus, 0x2000);
    assert_eq!(ppu.read_register(&mut bus, 0x2007, true), 0x77);
}

#[test]
fn increment_32_steps_down_a_column() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    ppu.write_register(&mut bus, 0x2000, Control::INCREMENT_32.bits());
    set_vram_addr(&mut ppu, &mut bus, 0x2000);
    ppu.write_register(&mut bus, 0x2007, 1);
    assert_eq!(ppu.vram_addr(), 0x2020);
}

#[test]
fn oam_data_port_increments() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    ppu.write_register(&mut bus, 0x2003, 0x10);
    ppu.write_register(&mut bus, 0x2004, 0xAB);
    ppu.write_register(&mut bus, 0x2004, 0xCD);
    assert_eq!(&ppu.oam[0x10..0x12], &[0xAB, 0xCD]);
    ppu.write_register(&mut bus, 0x2003, 0x11);
    assert_eq!(ppu.read_register(&mut bus, 0x2004, true), 0xCD);
}

#[test]
fn backdrop_fills_screen_when_rendering_disabled() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    bus.vram.palette[0] = 0x0F;
    run_to(&mut ppu, &mut bus, 240, 0);
    assert!(ppu.screen.iter().all(|&c| c == 0x0F));
}

#[test]
fn background_tile_reaches_screen() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    bus.solid_tile(0, 1);
    bus.vram.nametables[0] = 1;
    bus.vram.palette[0] = 0x0F;
    bus.vram.palette[1] = 0x16;
    ppu.mask = Mask::SHOW_BACKGROUND | Mask::BACKGROUND_LEFT;

    // Let the pre-render line prime the pipeline, then draw the first row of the next frame.
    while ppu.frame() == 0 {
        ppu.clock(&mut bus);
    }
    run_to(&mut ppu, &mut bus, 1, 0);

    assert!(ppu.screen[..8].iter().all(|&c| c == 0x16));
    assert!(ppu.screen[8..16].iter().all(|&c| c == 0x0F));
}

/// Place `count` opaque 8x8 sprites side by side on OAM Y `y`, from OAM slot 0.
fn line_of_sprites(ppu: &mut Ppu, bus: &mut TestBus, count: usize, y: u8) {
    bus.solid_tile(0, 2);
    bus.vram.palette[0] = 0x0F;
    bus.vram.palette[0x11] = 0x16;
    ppu.oam.fill(0xFF);
    for i in 0..count {
        ppu.oam[i * 4..i * 4 + 4].copy_from_slice(&[y, 2, 0, (i * 8) as u8]);
    }
    ppu.mask = Mask::SHOW_SPRITES | Mask::SPRITES_LEFT;
}

#[test]
fn ninth_sprite_sets_overflow_and_is_dropped() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    line_of_sprites(&mut ppu, &mut bus, 9, 10);

    run_to(&mut ppu, &mut bus, 12, 0);
    assert!(ppu.status.contains(Status::SPRITE_OVERFLOW));

    let row = &ppu.screen[11 * SCREEN_WIDTH..12 * SCREEN_WIDTH];
    assert!(row[..64].iter().all(|&c| c == 0x16));
    assert!(row[64..72].iter().all(|&c| c == 0x0F));
    // Sprites appear one line below their OAM Y.
    assert_eq!(ppu.screen[10 * SCREEN_WIDTH], 0x0F);
}

#[test]
fn eight_sprites_do_not_overflow() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    line_of_sprites(&mut ppu, &mut bus, 8, 10);
    run_to(&mut ppu, &mut bus, 20, 0);
    assert!(!ppu.status.contains(Status::SPRITE_OVERFLOW));
}

#[test]
fn sprite_zero_hit_needs_both_opaque() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    bus.solid_tile(0, 0);
    ppu.oam.fill(0xFF);
    ppu.oam[..4].copy_from_slice(&[20, 0, 0, 30]);
    ppu.mask = Mask::SHOW_SPRITES | Mask::SPRITES_LEFT;
    run_to(&mut ppu, &mut bus, 30, 0);
    assert!(!ppu.status.contains(Status::SPRITE_ZERO_HIT));

    ppu.mask |= Mask::SHOW_BACKGROUND | Mask::BACKGROUND_LEFT;
    run_to(&mut ppu, &mut bus, 20, 0);
    run_to(&mut ppu, &mut bus, 22, 0);
    assert!(ppu.status.contains(Status::SPRITE_ZERO_HIT));

    run_to(&mut ppu, &mut bus, 261, 2);
    assert!(!ppu.status.contains(Status::SPRITE_ZERO_HIT));
}

#[test]
fn horizontal_flip_reverses_pattern() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    // Only the leftmost pixel of tile 3 is set.
    bus.chr[3 * 16..3 * 16 + 8].fill(0x80);
    bus.vram.palette[0x11] = 0x16;
    ppu.oam.fill(0xFF);
    ppu.oam[..4].copy_from_slice(&[10, 3, 0x40, 16]);
    ppu.mask = Mask::SHOW_SPRITES;
    run_to(&mut ppu, &mut bus, 12, 0);

    let row = &ppu.screen[11 * SCREEN_WIDTH..12 * SCREEN_WIDTH];
    assert_eq!(row[16], 0);
    assert_eq!(row[23], 0x16);
}

#[test]
fn greyscale_masks_color() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    bus.vram.palette[0] = 0x27;
    ppu.mask = Mask::GREYSCALE;
    run_to(&mut ppu, &mut bus, 1, 0);
    assert_eq!(ppu.screen[0], 0x20);
}

#[test]
fn odd_frames_skip_a_dot_while_rendering() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    ppu.mask = Mask::SHOW_BACKGROUND;
    let frame = DOTS_PER_SCANLINE as usize * SCANLINES_PER_FRAME as usize;

    for _ in 0..frame {
        ppu.clock(&mut bus);
    }
    assert_eq!((ppu.frame(), ppu.scanline(), ppu.dot()), (1, 0, 0));
    for _ in 0..frame - 1 {
        ppu.clock(&mut bus);
    }
    assert_eq!((ppu.frame(), ppu.scanline(), ppu.dot()), (2, 0, 0));
}

#[test]
fn scanline_hook_fires_per_rendered_line() {
    let mut ppu = Ppu::new();
    let mut bus = TestBus::new();
    run_to(&mut ppu, &mut bus, 100, 0);
    assert_eq!(bus.scanlines, 0);

    ppu.mask = Mask::SHOW_BACKGROUND;
    while ppu.frame() == 0 {
        ppu.clock(&mut bus);
    }
    run_to(&mut ppu, &mut bus, 0, 0);
    let before = bus.scanlines;
    while ppu.frame() == 1 {
        ppu.clock(&mut bus);
    }
    assert_eq!(bus.scanlines - before, 241);
}

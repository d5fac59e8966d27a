//! Console-level timing, interrupts and bus behavior.

mod common;

use std::cell::Cell;
use std::rc::Rc;

use common::{console, park, run_to_dot, run_to_pc};
use famicore::{
    Buttons, Nes,
    apu::Channel,
    cpu::Status,
    nes::SAMPLE_DIVISOR,
    ppu::registers::Mask,
};

const TICKS_PER_FRAME: usize = 341 * 262;

/// NMI handler: INC $00; RTI.
const COUNT_NMI: [u8; 3] = [0xE6, 0x00, 0x40];

#[test]
fn frame_is_341_dots_by_262_lines() {
    let mut nes = console(&park(vec![]), &COUNT_NMI);
    for _ in 0..TICKS_PER_FRAME {
        nes.clock();
    }
    assert_eq!((nes.ppu.scanline(), nes.ppu.dot()), (0, 0));
    assert_eq!(nes.frame_count(), 1);
    assert_eq!(nes.master_clock(), TICKS_PER_FRAME as u64);
    assert_eq!(nes.cpu_cycles(), (TICKS_PER_FRAME as u64).div_ceil(3));
}

#[test]
fn stepping_helpers_stop_on_boundaries() {
    let mut nes = console(&park(vec![]), &COUNT_NMI);
    nes.clock_scanline();
    assert_eq!((nes.ppu.scanline(), nes.ppu.dot()), (1, 0));
    nes.clock_frame();
    assert_eq!((nes.ppu.scanline(), nes.ppu.dot()), (0, 0));

    nes.clock_instruction();
    assert!(nes.cpu.is_idle());
    assert_eq!(nes.master_clock() % 3, 0);
}

#[test]
fn vblank_raises_nmi_when_enabled() {
    // LDA #$80; STA $2000
    let program = park(vec![0xA9, 0x80, 0x8D, 0x00, 0x20]);
    let mut nes = console(&program, &COUNT_NMI);

    run_to_dot(&mut nes, 241, 1);
    assert_eq!(nes.peek(0x2002) & 0x80, 0);
    assert_eq!(nes.peek(0x0000), 0);
    nes.clock();
    assert_eq!(nes.peek(0x2002) & 0x80, 0x80);
    assert_eq!(nes.cpu.pc, common::NMI_HANDLER);
    assert!(nes.cpu.status.contains(Status::INTERRUPT_DISABLE));

    nes.clock_frame();
    assert_eq!(nes.peek(0x0000), 1);
    nes.clock_frame();
    assert_eq!(nes.peek(0x0000), 2);
}

#[test]
fn vblank_without_enable_sets_flag_only() {
    let mut nes = console(&park(vec![]), &COUNT_NMI);
    run_to_dot(&mut nes, 241, 2);
    assert_eq!(nes.peek(0x2002) & 0x80, 0x80);
    nes.clock_frame();
    assert_eq!(nes.peek(0x0000), 0);
}

#[test]
fn status_peek_has_no_side_effects() {
    let mut nes = console(&park(vec![]), &COUNT_NMI);
    run_to_dot(&mut nes, 241, 2);
    assert_eq!(nes.peek(0x2002) & 0x80, 0x80);
    assert_eq!(nes.peek(0x200A) & 0x80, 0x80, "mirrors of $2002 peek the same register");
    assert!(nes.ppu.status.bits() & 0x80 != 0);
}

#[test]
fn program_reading_status_clears_vblank() {
    // Wait for vblank with BIT $2002 / BPL, then store the status read after it.
    let program = park(vec![
        0x2C, 0x02, 0x20, // BIT $2002
        0x10, 0xFB, // BPL -5
        0xAD, 0x02, 0x20, // LDA $2002
        0x85, 0x01, // STA $01
    ]);
    let mut nes = console(&program, &COUNT_NMI);
    run_to_pc(&mut nes, 0x800A);
    assert_eq!(nes.peek(0x0001) & 0x80, 0);
    assert_eq!(nes.ppu.scanline(), 241);
}

#[test]
fn reset_matches_fresh_console() {
    // LDA #$80; STA $2000; LDX #$12; STX $0300
    let program = park(vec![0xA9, 0x80, 0x8D, 0x00, 0x20, 0xA2, 0x12, 0x8E, 0x00, 0x03]);
    let mut nes = console(&program, &COUNT_NMI);
    for _ in 0..3 {
        nes.clock_frame();
    }
    nes.clock_scanline();
    assert_eq!(nes.peek(0x0300), 0x12);
    nes.apu.set_muted(Channel::Noise, true);
    nes.reset();

    let fresh = console(&program, &COUNT_NMI);
    assert_eq!(nes.cpu.pc, fresh.cpu.pc);
    assert_eq!(
        (nes.cpu.a, nes.cpu.x, nes.cpu.y, nes.cpu.sp, nes.cpu.status),
        (fresh.cpu.a, fresh.cpu.x, fresh.cpu.y, fresh.cpu.sp, fresh.cpu.status)
    );
    assert_eq!(nes.cpu.cycles_remaining(), fresh.cpu.cycles_remaining());
    assert_eq!((nes.ppu.scanline(), nes.ppu.dot()), (0, 0));
    assert_eq!(nes.frame_count(), 0);
    assert_eq!(nes.master_clock(), 0);
    assert_eq!(nes.cpu_cycles(), 0);
    assert_eq!(nes.ppu.ctrl, fresh.ppu.ctrl);
    assert_eq!(nes.ppu.status, fresh.ppu.status);
    assert_eq!(nes.ppu.oam, fresh.ppu.oam);
    assert_eq!(nes.vram.nametables, fresh.vram.nametables);
    assert!((0..0x800).all(|addr| nes.ram.read(addr) == fresh.ram.read(addr)));
    assert!(nes.apu.is_muted(Channel::Noise));
}

#[test]
fn oam_dma_copies_page_and_stalls_cpu() {
    let program = park(vec![
        0xA9, 0x42, 0x8D, 0x00, 0x02, // LDA #$42; STA $0200
        0xA9, 0x99, 0x8D, 0xFF, 0x02, // LDA #$99; STA $02FF
        0xA9, 0x02, // LDA #$02
        0x8D, 0x14, 0x40, // STA $4014
    ]);
    let mut nes = console(&program, &COUNT_NMI);
    run_to_pc(&mut nes, 0x800C);

    let before = nes.cpu_cycles();
    nes.clock_instruction();
    let stall = if before % 2 == 0 { 513 } else { 514 };
    assert_eq!(nes.cpu_cycles() - before, 4 + stall);
    assert_eq!(nes.cpu.pc, 0x800F);
    assert!(!nes.dma.is_active());

    assert_eq!(nes.ppu.oam[0], 0x42);
    assert_eq!(nes.ppu.oam[0xFF], 0x99);
    assert_eq!(nes.ppu.oam_addr, 0);
}

#[test]
fn ninth_sprite_on_a_line_sets_overflow() {
    let mut nes = console(&park(vec![]), &COUNT_NMI);
    nes.ppu.oam.fill(0xFF);
    for sprite in nes.ppu.oam.chunks_mut(4).take(9) {
        sprite.copy_from_slice(&[40, 0, 0, 0]);
    }
    nes.ppu.mask = Mask::SHOW_SPRITES;

    run_to_dot(&mut nes, 39, 0);
    assert_eq!(nes.peek(0x2002) & 0x20, 0);
    run_to_dot(&mut nes, 41, 0);
    assert_eq!(nes.peek(0x2002) & 0x20, 0x20);

    run_to_dot(&mut nes, 261, 2);
    assert_eq!(nes.peek(0x2002) & 0x20, 0);
}

#[test]
fn controller_reads_through_program() {
    let program = park(vec![
        0xA9, 0x01, 0x8D, 0x16, 0x40, // LDA #1; STA $4016
        0xA9, 0x00, 0x8D, 0x16, 0x40, // LDA #0; STA $4016
        0xAD, 0x16, 0x40, 0x85, 0x00, // LDA $4016; STA $00
        0xAD, 0x16, 0x40, 0x85, 0x01, // LDA $4016; STA $01
        0xAD, 0x16, 0x40, 0x85, 0x02, // LDA $4016; STA $02
        0xAD, 0x16, 0x40, 0x85, 0x03, // LDA $4016; STA $03
    ]);
    let mut nes = console(&program, &COUNT_NMI);
    nes.set_buttons(0, Buttons::A | Buttons::START);
    run_to_pc(&mut nes, 0x801E);

    let bits: Vec<u8> = (0..4).map(|addr| nes.peek(addr)).collect();
    assert_eq!(bits, [0x41, 0x40, 0x40, 0x41]);
}

#[test]
fn samples_arrive_every_divisor_ticks() {
    let mut nes = console(&park(vec![]), &COUNT_NMI);
    let count = Rc::new(Cell::new(0usize));
    let seen = Rc::clone(&count);
    nes.set_sample_callback(move |sample| {
        assert_eq!(sample, 0.0);
        seen.set(seen.get() + 1);
    });

    nes.clock_frame();
    let expected = (TICKS_PER_FRAME as u64).div_ceil(SAMPLE_DIVISOR) as usize;
    assert_eq!(count.get(), expected);
    assert_eq!(nes.sample(), 0.0);
    assert!(Channel::ALL.iter().all(|&c| nes.channel_sample(c) == 0));
}

#[test]
fn apu_frame_irq_reaches_cpu() {
    // CLI, then spin; the IRQ handler at $9100 is a bare RTI.
    let program = park(vec![0x58]);
    let mut nes = console(&program, &COUNT_NMI);
    run_to_pc(&mut nes, 0x8001);
    run_to_pc(&mut nes, common::IRQ_HANDLER);
    assert!(nes.apu.irq());
}

#[test]
fn console_without_cartridge_floats() {
    let mut nes = Nes::new();
    for _ in 0..TICKS_PER_FRAME {
        nes.clock();
    }
    assert_eq!(nes.frame_count(), 1);
    assert!(nes.cartridge().is_none());
    assert!(nes.unload_cart().is_none());
}

#[test]
fn cartridge_swaps_cleanly() {
    let mut nes = console(&park(vec![]), &COUNT_NMI);
    assert_eq!(nes.peek(0xFFFC), 0x00);
    assert_eq!(nes.peek(0xFFFD), 0x80);
    assert_eq!(nes.ppu_peek(0x0000), 0xC5);

    let cart = nes.unload_cart().unwrap();
    assert!(nes.cartridge().is_none());
    nes.load_cart(cart);
    assert_eq!(nes.cpu.pc, 0x8000);
    assert_eq!(nes.ppu_peek(0x1FFF), 0xC5);
}

#[test]
fn disassembles_through_the_bus() {
    let mut nes = console(&park(vec![0xA9, 0x80]), &COUNT_NMI);
    let (text, next) = nes.disassemble(0x8000);
    assert_eq!(text.trim(), "LDA #$80");
    assert_eq!(next, 0x8002);
    let (text, next) = nes.disassemble(0x8002);
    assert_eq!(text.trim(), "JMP $8002");
    assert_eq!(next, 0x8005);
}

//! iNES loading through the public API.

mod common;

use common::{CHR_LEN, PRG_LEN, nrom, park};
use famicore::{Cartridge, Nes, cartridge::Mirroring};

#[test]
fn loads_nrom_256() {
    let mut rom = nrom(&park(vec![]), &[0x40]);
    rom[6] = 0x01;
    let cart = Cartridge::from_bytes(rom).unwrap();
    assert_eq!(cart.prg_rom().len(), PRG_LEN);
    assert_eq!(cart.chr().len(), CHR_LEN);
    assert_eq!(cart.header().mapper, 0);
    assert_eq!(cart.mirroring(), Mirroring::Vertical);
    assert_eq!(cart.mapper_name(), "NROM");

    let mut nes = Nes::new();
    nes.load_cart(cart);
    assert_eq!(nes.cpu.pc, 0x8000);
    assert_eq!(nes.peek(0x8000), 0x4C);
    assert_eq!(nes.cartridge().map(|cart| cart.header().prg_chunks), Some(2));
}

#[test]
fn rejects_bad_signature() {
    let mut rom = nrom(&park(vec![]), &[0x40]);
    rom[0] = b'X';
    let err = Cartridge::from_bytes(rom).unwrap_err();
    assert!(err.to_string().contains("bad signature"), "{err}");
}

#[test]
fn rejects_unsupported_mapper() {
    let mut rom = nrom(&park(vec![]), &[0x40]);
    rom[6] = 0x30;
    rom[7] = 0x60;
    let err = Cartridge::from_bytes(rom).unwrap_err();
    assert!(err.to_string().contains("unsupported mapper 99"), "{err}");
}

#[test]
fn rejects_truncated_image() {
    let mut rom = nrom(&park(vec![]), &[0x40]);
    rom.truncate(16 + PRG_LEN + CHR_LEN / 2);
    let err = Cartridge::from_bytes(rom).unwrap_err();
    assert!(err.to_string().contains("CHR ROM too short"), "{err}");
}

#[test]
fn prg_ram_is_mapped_and_survives_reset() {
    // LDA #$5A; STA $6000
    let mut nes = common::console(&park(vec![0xA9, 0x5A, 0x8D, 0x00, 0x60]), &[0x40]);
    common::run_to_pc(&mut nes, 0x8005);
    assert_eq!(nes.peek(0x6000), 0x5A);
    nes.reset();
    assert_eq!(nes.peek(0x6000), 0x5A);
    assert_eq!(nes.cartridge().map(|cart| cart.prg_ram()[0]), Some(0x5A));
}

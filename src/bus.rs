//! Address-mapped buses shared by the CPU and PPU.
//!
//! A [`Bus`] only records *which* devices are attached and in what order. The devices themselves
//! are owned by the console and reached through [`Dispatch`], so the bus never borrows them.
//! Every access is narrowed by the bus mask and offered to each connected device in registration
//! order until one claims it. Unclaimed reads return the floating-bus latch (last value read
//! from the bus). See [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map),
//! [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map) and
//! [Open bus behavior](https://www.nesdev.org/wiki/Open_bus_behavior).

use std::fmt::Debug;

/// CPU address space is the full 16 bits.
pub const CPU_ADDR_MASK: u16 = 0xFFFF;

/// PPU address space is 14 bits ($0000–$3FFF).
pub const PPU_ADDR_MASK: u16 = 0x3FFF;

/// Latch value before the first successful read.
const POWER_ON_LATCH: u8 = 0xAA;

/// Memory view the CPU (and DMA unit) executes against.
pub trait CpuBus {
    /// Read one byte. With `allow_side_effects == false` the read must not change device state
    /// (status flags, shift registers, buffers); used by the disassembler and debuggers.
    fn read(&mut self, addr: u16, allow_side_effects: bool) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Level of the shared IRQ line (cartridge, APU frame counter, DMC). Sampled between
    /// instructions.
    fn irq(&self) -> bool {
        false
    }
}

/// Memory view the PPU renders from: pattern tables, nametables, palette.
pub trait PpuBus {
    fn read(&mut self, addr: u16, allow_side_effects: bool) -> u8;
    fn write(&mut self, addr: u16, data: u8);
    /// Called once per rendered scanline (dot 260); MMC3 clocks its IRQ counter here.
    fn scanline(&mut self) {}
}

/// Implemented by the owner of the devices a [`Bus`] dispatches to.
pub trait Dispatch<D> {
    /// Offer a read to `device`. `None` means the device does not decode `addr`.
    fn read(&mut self, device: D, addr: u16, allow_side_effects: bool) -> Option<u8>;
    /// Offer a write to `device`. `false` means the device does not decode `addr`.
    fn write(&mut self, device: D, addr: u16, data: u8) -> bool;
}

/// Ordered read and write handler lists keyed by device tag.
#[derive(Debug, Clone)]
pub struct Bus<D> {
    name: &'static str,
    readers: Vec<D>,
    writers: Vec<D>,
    mask: u16,
    latch: u8,
}

impl<D: Copy + PartialEq + Debug> Bus<D> {
    /// Create an empty bus. `name` only appears in diagnostics.
    pub fn new(name: &'static str, mask: u16) -> Self {
        Self {
            name,
            readers: Vec::new(),
            writers: Vec::new(),
            mask,
            latch: POWER_ON_LATCH,
        }
    }

    pub fn connect_read(&mut self, device: D) {
        self.readers.push(device);
    }

    pub fn connect_write(&mut self, device: D) {
        self.writers.push(device);
    }

    /// Connect `device` as both reader and writer.
    pub fn connect(&mut self, device: D) {
        self.connect_read(device);
        self.connect_write(device);
    }

    /// Remove `device` from the read list.
    ///
    /// # Panics
    ///
    /// Panics if `device` was never connected for reads.
    pub fn disconnect_read(&mut self, device: D) {
        match self.readers.iter().position(|d| *d == device) {
            Some(i) => {
                self.readers.remove(i);
            }
            None => panic!("{} bus: disconnect_read of unconnected {device:?}", self.name),
        }
    }

    /// Remove `device` from the write list.
    ///
    /// # Panics
    ///
    /// Panics if `device` was never connected for writes.
    pub fn disconnect_write(&mut self, device: D) {
        match self.writers.iter().position(|d| *d == device) {
            Some(i) => {
                self.writers.remove(i);
            }
            None => panic!("{} bus: disconnect_write of unconnected {device:?}", self.name),
        }
    }

    pub fn disconnect(&mut self, device: D) {
        self.disconnect_read(device);
        self.disconnect_write(device);
    }

    pub fn is_connected(&self, device: D) -> bool {
        self.readers.contains(&device) || self.writers.contains(&device)
    }

    /// Last value a side-effecting read returned.
    pub fn latch(&self) -> u8 {
        self.latch
    }

    /// Return the latch to its power-on value; connections are kept.
    pub fn reset(&mut self) {
        self.latch = POWER_ON_LATCH;
    }

    /// Dispatch a read. The latch only follows side-effecting reads so that inspection never
    /// changes what a later open-bus read returns.
    pub fn read<T: Dispatch<D>>(&mut self, devices: &mut T, addr: u16, allow_side_effects: bool) -> u8 {
        let addr = addr & self.mask;
        for &device in &self.readers {
            if let Some(value) = devices.read(device, addr, allow_side_effects) {
                if allow_side_effects {
                    self.latch = value;
                }
                return value;
            }
        }
        log::warn!("{} bus: no read handler for ${addr:04X}", self.name);
        self.latch
    }

    /// Dispatch a write; the first claiming device wins. Writes leave the latch alone.
    pub fn write<T: Dispatch<D>>(&mut self, devices: &mut T, addr: u16, data: u8) {
        let addr = addr & self.mask;
        for &device in &self.writers {
            if devices.write(device, addr, data) {
                return;
            }
        }
        log::warn!("{} bus: no write handler for ${addr:04X} = ${data:02X}", self.name);
    }
}

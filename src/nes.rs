//! The console: owns every chip, wires the two buses and steps them in lockstep.
//!
//! One [`Nes::clock`] is one master tick = one PPU dot. Every third tick the CPU (or the OAM DMA
//! unit while it holds the bus) and the APU advance one CPU cycle first. NMIs raised by the PPU
//! are handed to the CPU in the same tick. See
//! [Cycle reference chart](https://www.nesdev.org/wiki/Cycle_reference_chart).

use crate::{
    apu::{Apu, Channel},
    bus::{Bus, CPU_ADDR_MASK, CpuBus, Dispatch, PPU_ADDR_MASK, PpuBus},
    cartridge::{Cartridge, Mirroring},
    controller::{Buttons, Controller},
    cpu::{Cpu, disasm},
    dma::{DmaCycle, OAM_DATA_PORT, OAM_DMA_PORT, OamDma},
    ppu::{Ppu, Vram},
    ram::Ram,
};

/// NTSC CPU clock.
pub const CPU_CLOCK_HZ: u32 = 1_789_773;
/// Master ticks (PPU dots) per CPU cycle.
pub const DOTS_PER_CPU_CYCLE: u64 = 3;
/// Master ticks between audio samples.
pub const SAMPLE_DIVISOR: u64 = 122;
/// Resulting audio sample rate (~44.0 kHz).
pub const SAMPLE_RATE: u32 = (CPU_CLOCK_HZ as u64 * DOTS_PER_CPU_CYCLE / SAMPLE_DIVISOR) as u32;

/// Devices on the CPU bus, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuDevice {
    Ram,
    Ppu,
    Apu,
    Controller,
    OamDma,
    Cartridge,
}

/// Devices on the PPU bus, in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PpuDevice {
    Cartridge,
    Vram,
}

pub struct Nes {
    pub cpu: Cpu,
    pub ppu: Ppu,
    pub apu: Apu,
    pub ram: Ram,
    pub vram: Vram,
    pub dma: OamDma,
    pub controller: Controller,
    cart: Option<Cartridge>,
    cpu_bus: Bus<CpuDevice>,
    ppu_bus: Bus<PpuDevice>,
    /// Master ticks since reset.
    master_clock: u64,
    /// CPU cycles since reset, including those taken by DMA.
    cpu_cycles: u64,
    sample_callback: Option<Box<dyn FnMut(f32)>>,
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nes {
    /// Build a console with no cartridge and run its reset sequence.
    pub fn new() -> Self {
        let mut cpu_bus = Bus::new("cpu", CPU_ADDR_MASK);
        cpu_bus.connect(CpuDevice::Ram);
        cpu_bus.connect(CpuDevice::Ppu);
        cpu_bus.connect(CpuDevice::Apu);
        cpu_bus.connect(CpuDevice::Controller);
        cpu_bus.connect_write(CpuDevice::OamDma);

        let mut ppu_bus = Bus::new("ppu", PPU_ADDR_MASK);
        ppu_bus.connect(PpuDevice::Vram);

        let mut nes = Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            ram: Ram::new(),
            vram: Vram::new(),
            dma: OamDma::new(),
            controller: Controller::new(),
            cart: None,
            cpu_bus,
            ppu_bus,
            master_clock: 0,
            cpu_cycles: 0,
            sample_callback: None,
        };
        nes.reset();
        nes
    }

    /// Power-cycle every component and jump through the reset vector. The cartridge stays
    /// inserted (its mapper registers are reset, PRG RAM is kept) and APU mute toggles persist.
    pub fn reset(&mut self) {
        log::debug!("console reset");
        self.ram.reset();
        self.vram.reset();
        self.ppu.reset();
        self.apu.reset();
        self.dma.reset();
        self.controller.reset();
        if let Some(cart) = self.cart.as_mut() {
            cart.reset();
        }
        self.cpu_bus.reset();
        self.ppu_bus.reset();
        self.master_clock = 0;
        self.cpu_cycles = 0;

        let (cpu, mut bus) = self.cpu_view();
        cpu.reset(&mut bus);
    }

    /// Insert a cartridge (replacing any current one) and reset.
    pub fn load_cart(&mut self, cart: Cartridge) {
        self.unload_cart();
        log::debug!("inserting cartridge: {}", cart.mapper_name());
        self.cpu_bus.connect(CpuDevice::Cartridge);
        self.ppu_bus.connect(PpuDevice::Cartridge);
        self.cart = Some(cart);
        self.reset();
    }

    /// Remove the cartridge, if any, and hand it back.
    pub fn unload_cart(&mut self) -> Option<Cartridge> {
        let cart = self.cart.take()?;
        log::debug!("removing cartridge: {}", cart.mapper_name());
        self.cpu_bus.disconnect(CpuDevice::Cartridge);
        self.ppu_bus.disconnect(PpuDevice::Cartridge);
        Some(cart)
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cart.as_ref()
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advance one master tick (one PPU dot).
    pub fn clock(&mut self) {
        if self.master_clock % DOTS_PER_CPU_CYCLE == 0 {
            self.clock_cpu();
        }

        {
            let Self {
                ppu,
                vram,
                cart,
                ppu_bus,
                ..
            } = self;
            let mut view = PpuView {
                bus: ppu_bus,
                devices: PpuDevices {
                    vram,
                    cart: cart.as_mut(),
                },
            };
            ppu.clock(&mut view);
        }

        if self.ppu.take_nmi() {
            let (cpu, mut bus) = self.cpu_view();
            cpu.nmi(&mut bus);
        }

        if self.master_clock % SAMPLE_DIVISOR == 0 {
            let sample = self.apu.sample();
            if let Some(callback) = self.sample_callback.as_mut() {
                callback(sample);
            }
        }

        self.master_clock += 1;
    }

    fn clock_cpu(&mut self) {
        if self.dma.is_active() {
            match self.dma.clock() {
                Some(DmaCycle::Read(addr)) => {
                    let data = self.cpu_view().1.read(addr, true);
                    self.dma.latch(data);
                }
                Some(DmaCycle::Write(data)) => self.cpu_view().1.write(OAM_DATA_PORT, data),
                Some(DmaCycle::Wait) | None => {}
            }
        } else {
            let (cpu, mut bus) = self.cpu_view();
            cpu.clock(&mut bus);
        }

        self.apu.clock();
        if let Some(addr) = self.apu.dmc_fetch_address() {
            let data = self.cpu_view().1.read(addr, true);
            self.apu.dmc_feed(data);
        }
        self.cpu_cycles += 1;
    }

    /// Run until the CPU is about to fetch its next instruction.
    pub fn clock_instruction(&mut self) {
        loop {
            self.clock();
            if self.master_clock % DOTS_PER_CPU_CYCLE == 0
                && self.cpu.is_idle()
                && !self.dma.is_active()
            {
                break;
            }
        }
    }

    /// Run until the PPU wraps to dot 0 of the next scanline.
    pub fn clock_scanline(&mut self) {
        loop {
            self.clock();
            if self.ppu.dot() == 0 {
                break;
            }
        }
    }

    /// Run until the PPU returns to dot 0 of scanline 0.
    pub fn clock_frame(&mut self) {
        loop {
            self.clock();
            if self.ppu.scanline() == 0 && self.ppu.dot() == 0 {
                break;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Observable state
    // -------------------------------------------------------------------------

    /// Palette indices of the current frame (256×240, row-major); map through
    /// [`PALETTE_RGB`](crate::ppu::PALETTE_RGB) for display.
    pub fn screen(&self) -> &[u8] {
        &self.ppu.screen[..]
    }

    pub fn frame_count(&self) -> u64 {
        self.ppu.frame()
    }

    pub fn master_clock(&self) -> u64 {
        self.master_clock
    }

    pub fn cpu_cycles(&self) -> u64 {
        self.cpu_cycles
    }

    /// Mixed audio level of the unmuted channels.
    pub fn sample(&self) -> f32 {
        self.apu.sample()
    }

    pub fn channel_sample(&self, channel: Channel) -> u8 {
        self.apu.channel_sample(channel)
    }

    /// Called with every generated sample, [`SAMPLE_RATE`] times per emulated second.
    pub fn set_sample_callback(&mut self, callback: impl FnMut(f32) + 'static) {
        self.sample_callback = Some(Box::new(callback));
    }

    pub fn controller_mut(&mut self) -> &mut Controller {
        &mut self.controller
    }

    /// Set the held buttons of controller `port` (0 or 1).
    pub fn set_buttons(&mut self, port: usize, buttons: Buttons) {
        self.controller.set_buttons(port, buttons);
    }

    /// Side-effect-free CPU bus read.
    pub fn peek(&mut self, addr: u16) -> u8 {
        self.cpu_view().1.read(addr, false)
    }

    /// Side-effect-free PPU bus read.
    pub fn ppu_peek(&mut self, addr: u16) -> u8 {
        let Self {
            vram, cart, ppu_bus, ..
        } = self;
        let mut view = PpuView {
            bus: ppu_bus,
            devices: PpuDevices {
                vram,
                cart: cart.as_mut(),
            },
        };
        view.read(addr, false)
    }

    /// Disassemble the instruction at `addr`; returns the text and the next instruction's address.
    pub fn disassemble(&mut self, addr: u16) -> (String, u16) {
        disasm::disassemble(&mut self.cpu_view().1, addr)
    }

    /// Split the console into the CPU and a bus view over everything else.
    fn cpu_view(&mut self) -> (&mut Cpu, CpuView<'_>) {
        let odd_cycle = self.cpu_cycles % 2 == 1;
        let Self {
            cpu,
            ppu,
            apu,
            ram,
            vram,
            dma,
            controller,
            cart,
            cpu_bus,
            ppu_bus,
            ..
        } = self;
        let view = CpuView {
            bus: cpu_bus,
            devices: CpuDevices {
                ram,
                ppu,
                apu,
                vram,
                dma,
                controller,
                cart: cart.as_mut(),
                ppu_bus,
                odd_cycle,
            },
        };
        (cpu, view)
    }
}

// -----------------------------------------------------------------------------
// Bus views
// -----------------------------------------------------------------------------

struct PpuDevices<'a> {
    vram: &'a mut Vram,
    cart: Option<&'a mut Cartridge>,
}

impl PpuDevices<'_> {
    /// Without a cartridge the nametables fall back to horizontal mirroring.
    fn mirroring(&self) -> Mirroring {
        self.cart
            .as_ref()
            .map_or(Mirroring::Horizontal, |cart| cart.mirroring())
    }
}

impl Dispatch<PpuDevice> for PpuDevices<'_> {
    fn read(&mut self, device: PpuDevice, addr: u16, _allow_side_effects: bool) -> Option<u8> {
        match device {
            PpuDevice::Cartridge => self.cart.as_ref()?.ppu_read(addr),
            PpuDevice::Vram => self.vram.read(addr, self.mirroring()),
        }
    }

    fn write(&mut self, device: PpuDevice, addr: u16, data: u8) -> bool {
        match device {
            PpuDevice::Cartridge => self
                .cart
                .as_deref_mut()
                .is_some_and(|cart| cart.ppu_write(addr, data)),
            PpuDevice::Vram => {
                let mirroring = self.mirroring();
                self.vram.write(addr, data, mirroring)
            }
        }
    }
}

struct PpuView<'a> {
    bus: &'a mut Bus<PpuDevice>,
    devices: PpuDevices<'a>,
}

impl PpuBus for PpuView<'_> {
    fn read(&mut self, addr: u16, allow_side_effects: bool) -> u8 {
        self.bus.read(&mut self.devices, addr, allow_side_effects)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.bus.write(&mut self.devices, addr, data);
    }

    fn scanline(&mut self) {
        if let Some(cart) = self.devices.cart.as_deref_mut() {
            cart.scanline();
        }
    }
}

struct CpuDevices<'a> {
    ram: &'a mut Ram,
    ppu: &'a mut Ppu,
    apu: &'a mut Apu,
    vram: &'a mut Vram,
    dma: &'a mut OamDma,
    controller: &'a mut Controller,
    cart: Option<&'a mut Cartridge>,
    ppu_bus: &'a mut Bus<PpuDevice>,
    /// Parity of the current CPU cycle, for DMA alignment.
    odd_cycle: bool,
}

impl CpuDevices<'_> {
    /// PPU registers reach picture memory through a view over the PPU bus.
    fn ppu_view(&mut self) -> (&mut Ppu, PpuView<'_>) {
        let view = PpuView {
            bus: &mut *self.ppu_bus,
            devices: PpuDevices {
                vram: &mut *self.vram,
                cart: self.cart.as_deref_mut(),
            },
        };
        (&mut *self.ppu, view)
    }
}

impl Dispatch<CpuDevice> for CpuDevices<'_> {
    fn read(&mut self, device: CpuDevice, addr: u16, allow_side_effects: bool) -> Option<u8> {
        match device {
            CpuDevice::Ram => self.ram.read(addr),
            CpuDevice::Ppu if (0x2000..=0x3FFF).contains(&addr) => {
                let (ppu, mut view) = self.ppu_view();
                Some(ppu.read_register(&mut view, addr, allow_side_effects))
            }
            CpuDevice::Ppu | CpuDevice::OamDma => None,
            CpuDevice::Apu => self.apu.read(addr, allow_side_effects),
            CpuDevice::Controller => self.controller.read(addr, allow_side_effects),
            CpuDevice::Cartridge => self.cart.as_ref()?.cpu_read(addr),
        }
    }

    fn write(&mut self, device: CpuDevice, addr: u16, data: u8) -> bool {
        match device {
            CpuDevice::Ram => self.ram.write(addr, data),
            CpuDevice::Ppu if (0x2000..=0x3FFF).contains(&addr) => {
                let (ppu, mut view) = self.ppu_view();
                ppu.write_register(&mut view, addr, data);
                true
            }
            CpuDevice::Ppu => false,
            CpuDevice::OamDma if addr == OAM_DMA_PORT => {
                self.dma.start(data, self.odd_cycle);
                true
            }
            CpuDevice::OamDma => false,
            CpuDevice::Apu => self.apu.write(addr, data),
            CpuDevice::Controller => self.controller.write(addr, data),
            CpuDevice::Cartridge => self
                .cart
                .as_deref_mut()
                .is_some_and(|cart| cart.cpu_write(addr, data)),
        }
    }
}

struct CpuView<'a> {
    bus: &'a mut Bus<CpuDevice>,
    devices: CpuDevices<'a>,
}

impl CpuBus for CpuView<'_> {
    fn read(&mut self, addr: u16, allow_side_effects: bool) -> u8 {
        self.bus.read(&mut self.devices, addr, allow_side_effects)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.bus.write(&mut self.devices, addr, data);
    }

    fn irq(&self) -> bool {
        self.devices.apu.irq() || self.devices.cart.as_ref().is_some_and(|cart| cart.irq())
    }
}

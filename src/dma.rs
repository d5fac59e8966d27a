//! OAM DMA ($4014).
//!
//! Writing page `$XX` to $4014 copies $XX00–$XXFF into OAM through $2004, halting the CPU for
//! 513 cycles (514 when started on an odd CPU cycle). See
//! [DMA](https://www.nesdev.org/wiki/DMA#OAM_DMA).
//!
//! The unit only sequences the transfer; the console performs each bus access it asks for.

pub const OAM_DMA_PORT: u16 = 0x4014;
/// Destination register every byte is written to.
pub const OAM_DATA_PORT: u16 = 0x2004;

/// What the DMA unit does with the bus this CPU cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaCycle {
    /// Alignment / halt cycle.
    Wait,
    /// Read the next source byte; hand it back with [`OamDma::latch`].
    Read(u16),
    /// Write the latched byte to $2004.
    Write(u8),
}

#[derive(Debug, Default, Clone)]
pub struct OamDma {
    page: u8,
    wait: u8,
    /// 0..512: even steps read, odd steps write.
    step: u16,
    data: u8,
    active: bool,
}

impl OamDma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Begin a transfer from `page`. `odd_cycle` adds the extra alignment cycle.
    pub fn start(&mut self, page: u8, odd_cycle: bool) {
        log::debug!("OAM DMA from ${page:02X}00");
        self.page = page;
        self.wait = if odd_cycle { 2 } else { 1 };
        self.step = 0;
        self.active = true;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Advance one CPU cycle. `None` when no transfer is running.
    pub fn clock(&mut self) -> Option<DmaCycle> {
        if !self.active {
            return None;
        }
        if self.wait > 0 {
            self.wait -= 1;
            return Some(DmaCycle::Wait);
        }
        let step = self.step;
        self.step += 1;
        if self.step == 512 {
            self.active = false;
        }
        Some(if step % 2 == 0 {
            DmaCycle::Read(u16::from(self.page) << 8 | step / 2)
        } else {
            DmaCycle::Write(self.data)
        })
    }

    /// Store the byte read during a [`DmaCycle::Read`].
    pub fn latch(&mut self, data: u8) {
        self.data = data;
    }
}

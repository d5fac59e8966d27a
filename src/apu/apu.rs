//! APU register file, frame sequencer and mixer.
//!
//! Implements the [APU](https://www.nesdev.org/wiki/APU) as in the Ricoh 2A03: five channels (pulse×2,
//! triangle, noise, DMC), [frame counter](https://www.nesdev.org/wiki/APU_Frame_Counter) (4-step or
//! 5-step), and [APU Mixer](https://www.nesdev.org/wiki/APU_Mixer) (non-linear). Registers $4000–$4013,
//! $4015, $4017. See [APU registers](https://www.nesdev.org/wiki/APU_registers).
//!
//! ## Timing
//!
//! [`Apu::clock`] runs once per CPU cycle. Every other call is an APU cycle: the frame sequencer
//! advances and the pulse, noise and DMC timers tick. The triangle timer ticks on every call.

use crate::apu::channels::{Dmc, Noise, Pulse, PulseId, Triangle};

/// Frame sequencer checkpoints, in APU cycles.
const QUARTER_1: u32 = 3728;
const HALF_1: u32 = 7456;
const QUARTER_3: u32 = 11185;
const FOUR_STEP_END: u32 = 14914;
const FIVE_STEP_END: u32 = 18640;

/// The five channels, for per-channel sample access and debug muting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Pulse1,
    Pulse2,
    Triangle,
    Noise,
    Dmc,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Pulse1,
        Channel::Pulse2,
        Channel::Triangle,
        Channel::Noise,
        Channel::Dmc,
    ];
}

/// Non-linear mix of raw channel levels (pulse 0–15, triangle 0–15, noise 0–15, DMC 0–127)
/// into 0.0..=1.0.
pub fn mix(pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> f32 {
    let pulse_sum = pulse1 as f32 + pulse2 as f32;
    let pulse_out = if pulse_sum > 0.0 {
        95.88 / (8128.0 / pulse_sum + 100.0)
    } else {
        0.0
    };

    let tnd_sum = triangle as f32 / 8227.0 + noise as f32 / 12241.0 + dmc as f32 / 22638.0;
    let tnd_out = if tnd_sum > 0.0 {
        159.79 / (1.0 / tnd_sum + 100.0)
    } else {
        0.0
    };

    (pulse_out + tnd_out).clamp(0.0, 1.0)
}

pub struct Apu {
    pulse1: Pulse,
    pulse2: Pulse,
    triangle: Triangle,
    noise: Noise,
    dmc: Dmc,
    /// CPU cycles since reset; even cycles are APU cycles.
    cycle: u64,
    /// APU cycles into the current frame sequence.
    frame_step: u32,
    five_step: bool,
    irq_inhibit: bool,
    frame_irq: bool,
    /// Debug toggles, kept across reset.
    muted: [bool; 5],
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl Apu {
    pub fn new() -> Self {
        Self {
            pulse1: Pulse::new(PulseId::One),
            pulse2: Pulse::new(PulseId::Two),
            triangle: Triangle::default(),
            noise: Noise::default(),
            dmc: Dmc::default(),
            cycle: 0,
            frame_step: 0,
            five_step: false,
            irq_inhibit: false,
            frame_irq: false,
            muted: [false; 5],
        }
    }

    /// Return to power-on state, keeping the channel mute toggles.
    pub fn reset(&mut self) {
        let muted = self.muted;
        *self = Self::new();
        self.muted = muted;
    }

    /// Only $4015 is readable. Reading it (with side effects) acknowledges the frame interrupt.
    pub fn read(&mut self, addr: u16, allow_side_effects: bool) -> Option<u8> {
        if addr != 0x4015 {
            return None;
        }
        let mut status = 0;
        status |= u8::from(self.pulse1.length.active());
        status |= u8::from(self.pulse2.length.active()) << 1;
        status |= u8::from(self.triangle.length.active()) << 2;
        status |= u8::from(self.noise.length.active()) << 3;
        status |= u8::from(self.dmc.active()) << 4;
        status |= u8::from(self.frame_irq) << 6;
        status |= u8::from(self.dmc.irq()) << 7;
        if allow_side_effects {
            self.frame_irq = false;
        }
        Some(status)
    }

    pub fn write(&mut self, addr: u16, data: u8) -> bool {
        match addr {
            0x4000..=0x4003 => self.pulse1.write(addr, data),
            0x4004..=0x4007 => self.pulse2.write(addr, data),
            0x4008..=0x400B => self.triangle.write(addr, data),
            0x400C..=0x400F => self.noise.write(addr, data),
            0x4010..=0x4013 => self.dmc.write(addr, data),
            0x4015 => {
                self.pulse1.length.set_enabled(data & 0x01 != 0);
                self.pulse2.length.set_enabled(data & 0x02 != 0);
                self.triangle.length.set_enabled(data & 0x04 != 0);
                self.noise.length.set_enabled(data & 0x08 != 0);
                self.dmc.set_enabled(data & 0x10 != 0);
            }
            0x4017 => {
                self.five_step = data & 0x80 != 0;
                self.irq_inhibit = data & 0x40 != 0;
                if self.irq_inhibit {
                    self.frame_irq = false;
                }
                self.frame_step = 0;
                // Selecting 5-step mode clocks both units immediately.
                if self.five_step {
                    self.quarter_frame();
                    self.half_frame();
                }
            }
            _ => return false,
        }
        true
    }

    /// Advance one CPU cycle.
    pub fn clock(&mut self) {
        self.triangle.clock_timer();

        if self.cycle % 2 == 0 {
            self.frame_step += 1;
            self.step_frame_sequencer();
            self.pulse1.clock_timer();
            self.pulse2.clock_timer();
            self.noise.clock_timer();
            self.dmc.clock_timer();
        }
        self.cycle += 1;
    }

    fn step_frame_sequencer(&mut self) {
        match self.frame_step {
            QUARTER_1 | QUARTER_3 => self.quarter_frame(),
            HALF_1 => {
                self.quarter_frame();
                self.half_frame();
            }
            FOUR_STEP_END if !self.five_step => {
                self.quarter_frame();
                self.half_frame();
                if !self.irq_inhibit {
                    self.frame_irq = true;
                }
                self.frame_step = 0;
            }
            FIVE_STEP_END if self.five_step => {
                self.quarter_frame();
                self.half_frame();
                self.frame_step = 0;
            }
            _ => {}
        }
    }

    /// Envelopes and the triangle's linear counter.
    fn quarter_frame(&mut self) {
        self.pulse1.clock_envelope();
        self.pulse2.clock_envelope();
        self.noise.clock_envelope();
        self.triangle.clock_linear();
    }

    /// Length counters and sweep units.
    fn half_frame(&mut self) {
        self.pulse1.clock_half_frame();
        self.pulse2.clock_half_frame();
        self.triangle.length.clock();
        self.noise.length.clock();
    }

    /// Frame or DMC interrupt pending.
    pub fn irq(&self) -> bool {
        self.frame_irq || self.dmc.irq()
    }

    /// CPU address the DMC memory reader needs, if any.
    pub fn dmc_fetch_address(&self) -> Option<u16> {
        self.dmc.fetch_address()
    }

    pub fn dmc_feed(&mut self, byte: u8) {
        self.dmc.feed(byte);
    }

    /// Current raw level of `channel`, before muting.
    pub fn channel_sample(&self, channel: Channel) -> u8 {
        match channel {
            Channel::Pulse1 => self.pulse1.sample(),
            Channel::Pulse2 => self.pulse2.sample(),
            Channel::Triangle => self.triangle.sample(),
            Channel::Noise => self.noise.sample(),
            Channel::Dmc => self.dmc.sample(),
        }
    }

    pub fn set_muted(&mut self, channel: Channel, muted: bool) {
        self.muted[channel as usize] = muted;
    }

    pub fn is_muted(&self, channel: Channel) -> bool {
        self.muted[channel as usize]
    }

    /// Mixed output of all unmuted channels.
    pub fn sample(&self) -> f32 {
        let level = |channel: Channel| {
            if self.is_muted(channel) {
                0
            } else {
                self.channel_sample(channel)
            }
        };
        mix(
            level(Channel::Pulse1),
            level(Channel::Pulse2),
            level(Channel::Triangle),
            level(Channel::Noise),
            level(Channel::Dmc),
        )
    }
}

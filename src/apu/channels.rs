//! The five APU channels and the units they share.
//!
//! Timers here count in the unit they are clocked with: pulse, noise and DMC tick once per APU
//! cycle (every other CPU cycle), the triangle once per CPU cycle.
//!
//! - [APU Pulse](https://www.nesdev.org/wiki/APU_Pulse), [APU Sweep](https://www.nesdev.org/wiki/APU_Sweep)
//! - [APU Triangle](https://www.nesdev.org/wiki/APU_Triangle), [APU Noise](https://www.nesdev.org/wiki/APU_Noise)
//! - [APU DMC](https://www.nesdev.org/wiki/APU_DMC)
//! - [APU Length Counter](https://www.nesdev.org/wiki/APU_Length_Counter), [APU Envelope](https://www.nesdev.org/wiki/APU_Envelope)

/// Length counter lookup table: 5-bit index from register → count.
const LENGTH_TABLE: [u8; 32] = [
    10, 254, 20, 2, 40, 4, 80, 6, 160, 8, 60, 10, 14, 12, 26, 14, 12, 16, 24, 18, 48, 20, 96, 22,
    192, 24, 72, 26, 16, 28, 32, 30,
];

/// Pulse duty sequences, walked from step 0 downwards (0→7→6→…→1).
const PULSE_DUTY: [[u8; 8]; 4] = [
    [0, 0, 0, 0, 0, 0, 0, 1], // 12.5%
    [0, 0, 0, 0, 0, 0, 1, 1], // 25%
    [0, 0, 0, 0, 1, 1, 1, 1], // 50%
    [1, 1, 1, 1, 1, 1, 0, 0], // 25% negated
];

/// Triangle 32-step waveform: 15 down to 0, then 0 up to 15.
const TRIANGLE_SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12,
    13, 14, 15,
];

/// Noise periods (NTSC) in APU cycles.
const NOISE_PERIOD_TABLE: [u16; 16] = [
    2, 4, 8, 16, 32, 48, 64, 80, 101, 127, 190, 254, 381, 508, 1017, 2034,
];

/// DMC bit periods (NTSC) in APU cycles.
const DMC_RATE_TABLE: [u16; 16] = [
    214, 190, 170, 160, 143, 127, 113, 107, 95, 80, 71, 64, 53, 42, 36, 27,
];

// -----------------------------------------------------------------------------
// Shared units
// -----------------------------------------------------------------------------

/// Length counter: silences a channel after a programmed duration unless halted.
#[derive(Debug, Default, Clone)]
pub struct LengthCounter {
    enabled: bool,
    halt: bool,
    counter: u8,
}

impl LengthCounter {
    /// Load from a 5-bit table index; ignored while the channel is disabled in $4015.
    pub fn load(&mut self, index: u8) {
        if self.enabled {
            self.counter = LENGTH_TABLE[index as usize & 0x1F];
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.counter = 0;
        }
    }

    pub fn set_halt(&mut self, halt: bool) {
        self.halt = halt;
    }

    /// Half-frame clock.
    pub fn clock(&mut self) {
        if !self.halt && self.counter > 0 {
            self.counter -= 1;
        }
    }

    pub fn active(&self) -> bool {
        self.counter > 0
    }

    pub fn counter(&self) -> u8 {
        self.counter
    }
}

/// Volume envelope: constant volume, or a 15→0 decay (optionally looping) at a divided rate.
#[derive(Debug, Default, Clone)]
pub struct Envelope {
    start: bool,
    looping: bool,
    constant: bool,
    /// Constant volume, or the divider period when decaying.
    volume: u8,
    divider: u8,
    decay: u8,
}

impl Envelope {
    /// Low six bits of $4000/$4004/$400C: loop (shared with length halt), constant, volume.
    pub fn write(&mut self, data: u8) {
        self.looping = data & 0x20 != 0;
        self.constant = data & 0x10 != 0;
        self.volume = data & 0x0F;
    }

    pub fn restart(&mut self) {
        self.start = true;
    }

    /// Quarter-frame clock.
    pub fn clock(&mut self) {
        if self.start {
            self.start = false;
            self.decay = 15;
            self.divider = self.volume;
        } else if self.divider > 0 {
            self.divider -= 1;
        } else {
            self.divider = self.volume;
            if self.decay > 0 {
                self.decay -= 1;
            } else if self.looping {
                self.decay = 15;
            }
        }
    }

    pub fn output(&self) -> u8 {
        if self.constant { self.volume } else { self.decay }
    }
}

// -----------------------------------------------------------------------------
// Pulse ($4000–$4003 pulse 1, $4004–$4007 pulse 2)
// -----------------------------------------------------------------------------

/// Which pulse channel; they differ in how the sweep unit negates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PulseId {
    #[default]
    One,
    Two,
}

#[derive(Debug, Default, Clone)]
pub struct Pulse {
    id: PulseId,
    duty: u8,
    step: u8,
    timer: u16,
    period: u16,
    pub length: LengthCounter,
    envelope: Envelope,
    sweep_enabled: bool,
    sweep_period: u8,
    sweep_negate: bool,
    sweep_shift: u8,
    sweep_divider: u8,
    sweep_reload: bool,
}

impl Pulse {
    pub fn new(id: PulseId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Write one of the channel's four registers (`reg` = address & 3).
    pub fn write(&mut self, reg: u16, data: u8) {
        match reg & 3 {
            0 => {
                self.duty = data >> 6;
                self.length.set_halt(data & 0x20 != 0);
                self.envelope.write(data);
            }
            1 => {
                self.sweep_enabled = data & 0x80 != 0;
                self.sweep_period = (data >> 4) & 7;
                self.sweep_negate = data & 0x08 != 0;
                self.sweep_shift = data & 7;
                self.sweep_reload = true;
            }
            2 => self.period = (self.period & 0x0700) | data as u16,
            _ => {
                self.period = (self.period & 0x00FF) | ((data as u16 & 7) << 8);
                self.length.load(data >> 3);
                self.envelope.restart();
                self.step = 0;
            }
        }
    }

    /// Period the sweep unit would move to. Pulse 1 negates with ones' complement, pulse 2 with
    /// two's complement.
    pub fn target_period(&self) -> u16 {
        let change = self.period >> self.sweep_shift;
        if !self.sweep_negate {
            return self.period + change;
        }
        match self.id {
            PulseId::One => self.period.saturating_sub(change + 1),
            PulseId::Two => self.period.saturating_sub(change),
        }
    }

    /// The sweep unit silences the channel for ultrasonic periods or an out-of-range target,
    /// whether or not sweeping is enabled.
    fn sweep_muted(&self) -> bool {
        self.period < 8 || self.target_period() > 0x7FF
    }

    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.period;
            self.step = self.step.wrapping_sub(1) & 7;
        } else {
            self.timer -= 1;
        }
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    /// Half-frame clock: length counter and sweep.
    pub fn clock_half_frame(&mut self) {
        self.length.clock();
        if self.sweep_divider == 0
            && self.sweep_enabled
            && self.sweep_shift > 0
            && !self.sweep_muted()
        {
            self.period = self.target_period();
        }
        if self.sweep_divider == 0 || self.sweep_reload {
            self.sweep_divider = self.sweep_period;
            self.sweep_reload = false;
        } else {
            self.sweep_divider -= 1;
        }
    }

    pub fn sample(&self) -> u8 {
        if !self.length.active()
            || self.sweep_muted()
            || PULSE_DUTY[self.duty as usize][self.step as usize] == 0
        {
            return 0;
        }
        self.envelope.output()
    }
}

// -----------------------------------------------------------------------------
// Triangle ($4008–$400B)
// -----------------------------------------------------------------------------

#[derive(Debug, Default, Clone)]
pub struct Triangle {
    step: u8,
    timer: u16,
    period: u16,
    pub length: LengthCounter,
    /// Control flag: halts the length counter and keeps the linear counter reloading.
    control: bool,
    linear_load: u8,
    linear_counter: u8,
    linear_reload: bool,
}

impl Triangle {
    pub fn write(&mut self, reg: u16, data: u8) {
        match reg & 3 {
            0 => {
                self.control = data & 0x80 != 0;
                self.length.set_halt(self.control);
                self.linear_load = data & 0x7F;
            }
            1 => {}
            2 => self.period = (self.period & 0x0700) | data as u16,
            _ => {
                self.period = (self.period & 0x00FF) | ((data as u16 & 7) << 8);
                self.length.load(data >> 3);
                self.linear_reload = true;
            }
        }
    }

    /// Clocked every CPU cycle; the sequencer only moves while both counters are non-zero.
    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            self.timer = self.period;
            if self.length.active() && self.linear_counter > 0 {
                self.step = (self.step + 1) & 31;
            }
        } else {
            self.timer -= 1;
        }
    }

    /// Quarter-frame clock.
    pub fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_load;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    /// Ultrasonic periods (< 2) are silenced to avoid popping.
    pub fn sample(&self) -> u8 {
        if !self.length.active() || self.linear_counter == 0 || self.period < 2 {
            return 0;
        }
        TRIANGLE_SEQUENCE[self.step as usize]
    }
}

// -----------------------------------------------------------------------------
// Noise ($400C–$400F)
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Noise {
    /// 15-bit LFSR.
    shift: u16,
    /// Short mode: feedback from bit 6 instead of bit 1.
    short_mode: bool,
    timer: u16,
    period: u16,
    pub length: LengthCounter,
    envelope: Envelope,
}

impl Default for Noise {
    fn default() -> Self {
        Self {
            shift: 1,
            short_mode: false,
            timer: 0,
            period: NOISE_PERIOD_TABLE[0],
            length: LengthCounter::default(),
            envelope: Envelope::default(),
        }
    }
}

impl Noise {
    pub fn write(&mut self, reg: u16, data: u8) {
        match reg & 3 {
            0 => {
                self.length.set_halt(data & 0x20 != 0);
                self.envelope.write(data);
            }
            1 => {}
            2 => {
                self.short_mode = data & 0x80 != 0;
                self.period = NOISE_PERIOD_TABLE[data as usize & 0x0F];
            }
            _ => {
                self.length.load(data >> 3);
                self.envelope.restart();
            }
        }
    }

    pub fn clock_timer(&mut self) {
        if self.timer == 0 {
            // Table periods count APU cycles between shifts.
            self.timer = self.period - 1;
            let tap = if self.short_mode { 6 } else { 1 };
            let feedback = (self.shift & 1) ^ ((self.shift >> tap) & 1);
            self.shift = (self.shift >> 1) | (feedback << 14);
        } else {
            self.timer -= 1;
        }
    }

    pub fn clock_envelope(&mut self) {
        self.envelope.clock();
    }

    pub fn sample(&self) -> u8 {
        if !self.length.active() || self.shift & 1 != 0 {
            return 0;
        }
        self.envelope.output()
    }
}

// -----------------------------------------------------------------------------
// DMC ($4010–$4013)
// -----------------------------------------------------------------------------

/// Delta modulation channel. Sample bytes are fetched by the console through the CPU bus
/// whenever [`Dmc::fetch_address`] asks for one.
#[derive(Debug, Clone)]
pub struct Dmc {
    irq_enabled: bool,
    looping: bool,
    timer: u16,
    period: u16,
    level: u8,
    sample_addr: u16,
    sample_len: u16,
    current_addr: u16,
    bytes_remaining: u16,
    buffer: Option<u8>,
    shift: u8,
    bits_remaining: u8,
    silence: bool,
    irq: bool,
}

impl Default for Dmc {
    fn default() -> Self {
        Self {
            irq_enabled: false,
            looping: false,
            timer: 0,
            period: DMC_RATE_TABLE[0],
            level: 0,
            sample_addr: 0xC000,
            sample_len: 1,
            current_addr: 0xC000,
            bytes_remaining: 0,
            buffer: None,
            shift: 0,
            bits_remaining: 8,
            silence: true,
            irq: false,
        }
    }
}

impl Dmc {
    pub fn write(&mut self, reg: u16, data: u8) {
        match reg & 3 {
            0 => {
                self.irq_enabled = data & 0x80 != 0;
                if !self.irq_enabled {
                    self.irq = false;
                }
                self.looping = data & 0x40 != 0;
                self.period = DMC_RATE_TABLE[data as usize & 0x0F];
            }
            // Direct load.
            1 => self.level = data & 0x7F,
            2 => self.sample_addr = 0xC000 + data as u16 * 64,
            _ => self.sample_len = data as u16 * 16 + 1,
        }
    }

    /// $4015 bit 4. Enabling with nothing left to play restarts the sample; any write clears the
    /// DMC interrupt.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.irq = false;
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart();
        }
    }

    fn restart(&mut self) {
        self.current_addr = self.sample_addr;
        self.bytes_remaining = self.sample_len;
    }

    pub fn active(&self) -> bool {
        self.bytes_remaining > 0
    }

    pub fn irq(&self) -> bool {
        self.irq
    }

    /// Address the memory reader wants next, if the sample buffer is empty.
    pub fn fetch_address(&self) -> Option<u16> {
        (self.buffer.is_none() && self.bytes_remaining > 0).then_some(self.current_addr)
    }

    /// Deliver the byte read from [`fetch_address`](Self::fetch_address).
    pub fn feed(&mut self, byte: u8) {
        self.buffer = Some(byte);
        self.current_addr = match self.current_addr {
            0xFFFF => 0x8000,
            addr => addr + 1,
        };
        self.bytes_remaining = self.bytes_remaining.saturating_sub(1);
        if self.bytes_remaining == 0 {
            if self.looping {
                self.restart();
            } else if self.irq_enabled {
                self.irq = true;
            }
        }
    }

    /// One APU cycle of the output unit.
    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.period - 1;

        if !self.silence {
            if self.shift & 1 != 0 {
                if self.level <= 125 {
                    self.level += 2;
                }
            } else if self.level >= 2 {
                self.level -= 2;
            }
        }
        self.shift >>= 1;

        self.bits_remaining -= 1;
        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            match self.buffer.take() {
                Some(byte) => {
                    self.shift = byte;
                    self.silence = false;
                }
                None => self.silence = true,
            }
        }
    }

    pub fn sample(&self) -> u8 {
        self.level
    }
}

//! 2A03 CPU core (6502 without decimal mode).
//!
//! The CPU is a two-state machine driven one cycle at a time by [`Cpu::clock`]: when the cycle
//! countdown is zero it fetches, decodes and fully executes the next instruction (all bus effects
//! happen here), then loads the countdown from the opcode table; otherwise it just counts down.
//! Pending IRQs are taken at the fetch boundary; NMIs are delivered by the console through
//! [`Cpu::nmi`] as soon as the PPU raises them.

use crate::{
    bus::CpuBus,
    cpu::{
        disasm,
        flags::Status,
        instructions::{INSTRUCTIONS, Mode, Op},
    },
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;
const STACK_BASE: u16 = 0x0100;
/// Cycles consumed by reset, IRQ and NMI sequences.
const INTERRUPT_CYCLES: u8 = 7;

/// Where an instruction's operand lives once its addressing mode is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    None,
    Accumulator,
    /// Effective address; immediate operands point at the byte after the opcode.
    Address(u16),
}

#[derive(Debug, Clone)]
pub struct Cpu {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: Status,
    /// Cycles left before the next fetch.
    cycles: u8,
    /// Cycles executed since power-on.
    total_cycles: u64,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::INTERRUPT_DISABLE | Status::UNUSED,
            cycles: 0,
            total_cycles: 0,
        }
    }

    /// Reload registers and jump through the reset vector.
    pub fn reset<B: CpuBus>(&mut self, bus: &mut B) {
        *self = Self::new();
        self.pc = self.read_word(bus, RESET_VECTOR);
        self.cycles = INTERRUPT_CYCLES;
    }

    /// True when the next [`clock`](Self::clock) fetches a new instruction.
    pub fn is_idle(&self) -> bool {
        self.cycles == 0
    }

    /// Cycles left in the current instruction.
    pub fn cycles_remaining(&self) -> u8 {
        self.cycles
    }

    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Advance one CPU cycle.
    pub fn clock<B: CpuBus>(&mut self, bus: &mut B) {
        if self.cycles == 0 {
            if bus.irq() && !self.status.contains(Status::INTERRUPT_DISABLE) {
                self.irq(bus);
            } else {
                self.step(bus);
            }
        }
        self.cycles = self.cycles.saturating_sub(1);
        self.total_cycles += 1;
    }

    /// Fetch and execute one instruction immediately. Returns the cycles it takes, which are
    /// also loaded into the countdown.
    pub fn step<B: CpuBus>(&mut self, bus: &mut B) -> u8 {
        let pc = self.pc;
        let opcode = self.fetch(bus);
        let instruction = INSTRUCTIONS[opcode as usize];

        if log::log_enabled!(target: "cpu", log::Level::Trace) {
            self.trace(bus, pc);
        }

        let (operand, page_crossed) = self.resolve(bus, instruction.mode);
        let extra = self.execute(bus, instruction.op, operand);
        let penalty = u8::from(page_crossed && instruction.op.page_penalty());

        self.cycles = instruction.cycles + penalty + extra;
        self.cycles
    }

    /// Maskable interrupt: ignored while the I flag is set.
    pub fn irq<B: CpuBus>(&mut self, bus: &mut B) {
        if self.status.contains(Status::INTERRUPT_DISABLE) {
            return;
        }
        self.interrupt(bus, IRQ_VECTOR);
        self.cycles = INTERRUPT_CYCLES;
    }

    /// Non-maskable interrupt. Its cycles are added on top of whatever is left of the current
    /// instruction, whose effects have already happened.
    pub fn nmi<B: CpuBus>(&mut self, bus: &mut B) {
        self.interrupt(bus, NMI_VECTOR);
        self.cycles = self.cycles.saturating_add(INTERRUPT_CYCLES);
    }

    fn interrupt<B: CpuBus>(&mut self, bus: &mut B, vector: u16) {
        self.push_word(bus, self.pc);
        let status = (self.status - Status::BREAK) | Status::UNUSED;
        self.push(bus, status.bits());
        self.status.insert(Status::INTERRUPT_DISABLE);
        self.pc = self.read_word(bus, vector);
    }

    fn trace<B: CpuBus>(&self, bus: &mut B, pc: u16) {
        let (text, next) = disasm::disassemble(bus, pc);
        let bytes: Vec<String> = (pc..next)
            .map(|addr| format!("{:02X}", bus.read(addr, false)))
            .collect();
        log::trace!(
            target: "cpu",
            "{:04X}  {:<8}  {:<30}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            pc,
            bytes.join(" "),
            text,
            self.a,
            self.x,
            self.y,
            self.status.bits(),
            self.sp,
            self.total_cycles
        );
    }

    // -------------------------------------------------------------------------
    // Bus helpers
    // -------------------------------------------------------------------------

    fn fetch<B: CpuBus>(&mut self, bus: &mut B) -> u8 {
        let byte = bus.read(self.pc, true);
        self.pc = self.pc.wrapping_add(1);
        byte
    }

    fn fetch_word<B: CpuBus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus) as u16;
        let hi = self.fetch(bus) as u16;
        (hi << 8) | lo
    }

    fn read_word<B: CpuBus>(&mut self, bus: &mut B, addr: u16) -> u16 {
        let lo = bus.read(addr, true) as u16;
        let hi = bus.read(addr.wrapping_add(1), true) as u16;
        (hi << 8) | lo
    }

    /// Read a pointer from zero page; the high byte wraps within page zero.
    fn read_zp_word<B: CpuBus>(&mut self, bus: &mut B, ptr: u8) -> u16 {
        let lo = bus.read(ptr as u16, true) as u16;
        let hi = bus.read(ptr.wrapping_add(1) as u16, true) as u16;
        (hi << 8) | lo
    }

    fn push<B: CpuBus>(&mut self, bus: &mut B, value: u8) {
        bus.write(STACK_BASE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pop<B: CpuBus>(&mut self, bus: &mut B) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(STACK_BASE | self.sp as u16, true)
    }

    fn push_word<B: CpuBus>(&mut self, bus: &mut B, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pop_word<B: CpuBus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pop(bus) as u16;
        let hi = self.pop(bus) as u16;
        (hi << 8) | lo
    }

    fn load<B: CpuBus>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::Accumulator => self.a,
            Operand::Address(addr) => bus.read(addr, true),
            Operand::None => 0,
        }
    }

    fn store<B: CpuBus>(&mut self, bus: &mut B, operand: Operand, value: u8) {
        match operand {
            Operand::Accumulator => self.a = value,
            Operand::Address(addr) => bus.write(addr, value),
            Operand::None => {}
        }
    }

    // -------------------------------------------------------------------------
    // Addressing modes
    // -------------------------------------------------------------------------

    /// Resolve the operand location, consuming operand bytes. The flag reports an indexed page
    /// crossing.
    fn resolve<B: CpuBus>(&mut self, bus: &mut B, mode: Mode) -> (Operand, bool) {
        match mode {
            Mode::Implied => (Operand::None, false),
            Mode::Accumulator => (Operand::Accumulator, false),
            Mode::Immediate | Mode::Relative => {
                let addr = self.pc;
                self.pc = self.pc.wrapping_add(1);
                (Operand::Address(addr), false)
            }
            Mode::ZeroPage => (Operand::Address(self.fetch(bus) as u16), false),
            Mode::ZeroPageX => {
                let base = self.fetch(bus);
                (Operand::Address(base.wrapping_add(self.x) as u16), false)
            }
            Mode::ZeroPageY => {
                let base = self.fetch(bus);
                (Operand::Address(base.wrapping_add(self.y) as u16), false)
            }
            Mode::Absolute => (Operand::Address(self.fetch_word(bus)), false),
            Mode::AbsoluteX => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.x)
            }
            Mode::AbsoluteY => {
                let base = self.fetch_word(bus);
                Self::indexed(base, self.y)
            }
            Mode::Indirect => {
                let ptr = self.fetch_word(bus);
                // The high byte is fetched without carrying into the pointer's page.
                let lo = bus.read(ptr, true) as u16;
                let hi = bus.read((ptr & 0xFF00) | (ptr.wrapping_add(1) & 0x00FF), true) as u16;
                (Operand::Address((hi << 8) | lo), false)
            }
            Mode::IndirectX => {
                let ptr = self.fetch(bus).wrapping_add(self.x);
                (Operand::Address(self.read_zp_word(bus, ptr)), false)
            }
            Mode::IndirectY => {
                let ptr = self.fetch(bus);
                let base = self.read_zp_word(bus, ptr);
                Self::indexed(base, self.y)
            }
        }
    }

    fn indexed(base: u16, index: u8) -> (Operand, bool) {
        let addr = base.wrapping_add(index as u16);
        (Operand::Address(addr), (base & 0xFF00) != (addr & 0xFF00))
    }

    // -------------------------------------------------------------------------
    // Operations
    // -------------------------------------------------------------------------

    fn set_zn(&mut self, value: u8) {
        self.status.set(Status::ZERO, value == 0);
        self.status.set(Status::NEGATIVE, value & 0x80 != 0);
    }

    /// A + value + C with two's-complement overflow detection.
    fn add(&mut self, value: u8) {
        let carry = self.status.contains(Status::CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;
        self.status.set(Status::CARRY, sum > 0xFF);
        self.status.set(
            Status::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0,
        );
        self.a = result;
        self.set_zn(result);
    }

    /// SBC is ADC of the ones' complement.
    fn sub(&mut self, value: u8) {
        self.add(value ^ 0xFF);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(Status::CARRY, register >= value);
        self.set_zn(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.status.set(Status::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.set_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.status.set(Status::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.set_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.status.contains(Status::CARRY) as u8;
        self.status.set(Status::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.set_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.status.contains(Status::CARRY) as u8) << 7;
        self.status.set(Status::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.set_zn(result);
        result
    }

    /// Returns the extra cycles a taken branch costs (1, plus 1 for a page crossing).
    fn branch<B: CpuBus>(&mut self, bus: &mut B, operand: Operand, condition: bool) -> u8 {
        let offset = self.load(bus, operand) as i8;
        if !condition {
            return 0;
        }
        let old_pc = self.pc;
        self.pc = self.pc.wrapping_add(offset as u16);
        if (old_pc & 0xFF00) != (self.pc & 0xFF00) { 2 } else { 1 }
    }

    /// High byte of the target address plus one, used by the unstable SH* stores.
    fn high_plus_one(operand: Operand) -> u8 {
        match operand {
            Operand::Address(addr) => ((addr >> 8) as u8).wrapping_add(1),
            _ => 0,
        }
    }

    /// Execute `op`; returns extra cycles beyond the table value (branches only).
    fn execute<B: CpuBus>(&mut self, bus: &mut B, op: Op, operand: Operand) -> u8 {
        match op {
            // Loads, stores, transfers
            Op::Lda => {
                self.a = self.load(bus, operand);
                self.set_zn(self.a);
            }
            Op::Ldx => {
                self.x = self.load(bus, operand);
                self.set_zn(self.x);
            }
            Op::Ldy => {
                self.y = self.load(bus, operand);
                self.set_zn(self.y);
            }
            Op::Sta => self.store(bus, operand, self.a),
            Op::Stx => self.store(bus, operand, self.x),
            Op::Sty => self.store(bus, operand, self.y),
            Op::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
            }
            Op::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
            }
            Op::Tsx => {
                self.x = self.sp;
                self.set_zn(self.x);
            }
            Op::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
            }
            Op::Txs => self.sp = self.x,
            Op::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
            }

            // Arithmetic and logic
            Op::Adc => {
                let value = self.load(bus, operand);
                self.add(value);
            }
            Op::Sbc => {
                let value = self.load(bus, operand);
                self.sub(value);
            }
            Op::And => {
                self.a &= self.load(bus, operand);
                self.set_zn(self.a);
            }
            Op::Ora => {
                self.a |= self.load(bus, operand);
                self.set_zn(self.a);
            }
            Op::Eor => {
                self.a ^= self.load(bus, operand);
                self.set_zn(self.a);
            }
            Op::Bit => {
                let value = self.load(bus, operand);
                self.status.set(Status::ZERO, self.a & value == 0);
                self.status.set(Status::OVERFLOW, value & 0x40 != 0);
                self.status.set(Status::NEGATIVE, value & 0x80 != 0);
            }
            Op::Cmp => {
                let value = self.load(bus, operand);
                self.compare(self.a, value);
            }
            Op::Cpx => {
                let value = self.load(bus, operand);
                self.compare(self.x, value);
            }
            Op::Cpy => {
                let value = self.load(bus, operand);
                self.compare(self.y, value);
            }

            // Read-modify-write
            Op::Asl => {
                let value = self.load(bus, operand);
                let result = self.asl(value);
                self.store(bus, operand, result);
            }
            Op::Lsr => {
                let value = self.load(bus, operand);
                let result = self.lsr(value);
                self.store(bus, operand, result);
            }
            Op::Rol => {
                let value = self.load(bus, operand);
                let result = self.rol(value);
                self.store(bus, operand, result);
            }
            Op::Ror => {
                let value = self.load(bus, operand);
                let result = self.ror(value);
                self.store(bus, operand, result);
            }
            Op::Inc => {
                let result = self.load(bus, operand).wrapping_add(1);
                self.set_zn(result);
                self.store(bus, operand, result);
            }
            Op::Dec => {
                let result = self.load(bus, operand).wrapping_sub(1);
                self.set_zn(result);
                self.store(bus, operand, result);
            }
            Op::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
            }
            Op::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
            }
            Op::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
            }
            Op::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
            }

            // Branches
            Op::Bcc => return self.branch(bus, operand, !self.status.contains(Status::CARRY)),
            Op::Bcs => return self.branch(bus, operand, self.status.contains(Status::CARRY)),
            Op::Bne => return self.branch(bus, operand, !self.status.contains(Status::ZERO)),
            Op::Beq => return self.branch(bus, operand, self.status.contains(Status::ZERO)),
            Op::Bpl => return self.branch(bus, operand, !self.status.contains(Status::NEGATIVE)),
            Op::Bmi => return self.branch(bus, operand, self.status.contains(Status::NEGATIVE)),
            Op::Bvc => return self.branch(bus, operand, !self.status.contains(Status::OVERFLOW)),
            Op::Bvs => return self.branch(bus, operand, self.status.contains(Status::OVERFLOW)),

            // Jumps, calls, interrupts
            Op::Jmp => {
                if let Operand::Address(addr) = operand {
                    self.pc = addr;
                }
            }
            Op::Jsr => {
                if let Operand::Address(addr) = operand {
                    self.push_word(bus, self.pc.wrapping_sub(1));
                    self.pc = addr;
                }
            }
            Op::Rts => self.pc = self.pop_word(bus).wrapping_add(1),
            Op::Rti => {
                let status = self.pop(bus);
                self.status = (Status::from_bits_retain(status) - Status::BREAK) | Status::UNUSED;
                self.pc = self.pop_word(bus);
            }
            Op::Brk => {
                // Skip the padding byte.
                self.pc = self.pc.wrapping_add(1);
                self.push_word(bus, self.pc);
                self.push(bus, (self.status | Status::BREAK | Status::UNUSED).bits());
                self.status.insert(Status::INTERRUPT_DISABLE);
                self.pc = self.read_word(bus, IRQ_VECTOR);
            }

            // Stack
            Op::Pha => self.push(bus, self.a),
            Op::Php => self.push(bus, (self.status | Status::BREAK | Status::UNUSED).bits()),
            Op::Pla => {
                self.a = self.pop(bus);
                self.set_zn(self.a);
            }
            Op::Plp => {
                let status = self.pop(bus);
                self.status = (Status::from_bits_retain(status) - Status::BREAK) | Status::UNUSED;
            }

            // Flags
            Op::Clc => self.status.remove(Status::CARRY),
            Op::Cld => self.status.remove(Status::DECIMAL),
            Op::Cli => self.status.remove(Status::INTERRUPT_DISABLE),
            Op::Clv => self.status.remove(Status::OVERFLOW),
            Op::Sec => self.status.insert(Status::CARRY),
            Op::Sed => self.status.insert(Status::DECIMAL),
            Op::Sei => self.status.insert(Status::INTERRUPT_DISABLE),

            Op::Nop => {
                // Multi-byte NOPs still perform their read.
                self.load(bus, operand);
            }

            // Undocumented: RMW combined with an ALU op
            Op::Slo => {
                let value = self.load(bus, operand);
                let result = self.asl(value);
                self.store(bus, operand, result);
                self.a |= result;
                self.set_zn(self.a);
            }
            Op::Rla => {
                let value = self.load(bus, operand);
                let result = self.rol(value);
                self.store(bus, operand, result);
                self.a &= result;
                self.set_zn(self.a);
            }
            Op::Sre => {
                let value = self.load(bus, operand);
                let result = self.lsr(value);
                self.store(bus, operand, result);
                self.a ^= result;
                self.set_zn(self.a);
            }
            Op::Rra => {
                let value = self.load(bus, operand);
                let result = self.ror(value);
                self.store(bus, operand, result);
                self.add(result);
            }
            Op::Dcp => {
                let result = self.load(bus, operand).wrapping_sub(1);
                self.store(bus, operand, result);
                self.compare(self.a, result);
            }
            Op::Isc => {
                let result = self.load(bus, operand).wrapping_add(1);
                self.store(bus, operand, result);
                self.sub(result);
            }

            // Undocumented: combined loads and stores
            Op::Lax => {
                let value = self.load(bus, operand);
                self.a = value;
                self.x = value;
                self.set_zn(value);
            }
            Op::Sax => self.store(bus, operand, self.a & self.x),
            Op::Las => {
                let value = self.load(bus, operand) & self.sp;
                self.a = value;
                self.x = value;
                self.sp = value;
                self.set_zn(value);
            }
            Op::Ahx => {
                let value = self.a & self.x & Self::high_plus_one(operand);
                self.store(bus, operand, value);
            }
            Op::Shx => {
                let value = self.x & Self::high_plus_one(operand);
                self.store(bus, operand, value);
            }
            Op::Shy => {
                let value = self.y & Self::high_plus_one(operand);
                self.store(bus, operand, value);
            }
            Op::Tas => {
                self.sp = self.a & self.x;
                let value = self.sp & Self::high_plus_one(operand);
                self.store(bus, operand, value);
            }

            // Undocumented: immediate ALU combinations
            Op::Anc => {
                self.a &= self.load(bus, operand);
                self.set_zn(self.a);
                self.status.set(Status::CARRY, self.a & 0x80 != 0);
            }
            Op::Alr => {
                let value = self.a & self.load(bus, operand);
                self.a = self.lsr(value);
            }
            Op::Arr => {
                let value = self.a & self.load(bus, operand);
                let carry_in = (self.status.contains(Status::CARRY) as u8) << 7;
                self.a = (value >> 1) | carry_in;
                self.set_zn(self.a);
                self.status.set(Status::CARRY, self.a & 0x40 != 0);
                self.status.set(
                    Status::OVERFLOW,
                    ((self.a >> 6) ^ (self.a >> 5)) & 1 != 0,
                );
            }
            Op::Axs => {
                let value = self.load(bus, operand);
                let masked = self.a & self.x;
                self.status.set(Status::CARRY, masked >= value);
                self.x = masked.wrapping_sub(value);
                self.set_zn(self.x);
            }
            Op::Xaa => {
                // Unstable on hardware; $EE is the commonly observed magic constant.
                let value = self.load(bus, operand);
                self.a = (self.a | 0xEE) & self.x & value;
                self.set_zn(self.a);
            }

            Op::Jam => {
                // Re-fetch the same opcode forever instead of halting the core.
                self.pc = self.pc.wrapping_sub(1);
            }
        }
        0
    }
}

//! 6502 status register (P). See [Status flags](https://www.nesdev.org/wiki/Status_flags).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Status: u8 {
        const CARRY = 1 << 0;
        const ZERO = 1 << 1;
        const INTERRUPT_DISABLE = 1 << 2;
        /// Settable but ignored by the 2A03's ALU.
        const DECIMAL = 1 << 3;
        /// Only exists on the stack copy pushed by BRK/PHP.
        const BREAK = 1 << 4;
        const UNUSED = 1 << 5;
        const OVERFLOW = 1 << 6;
        const NEGATIVE = 1 << 7;
    }
}

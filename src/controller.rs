//! NES controller input handling.
//!
//! Implements the standard [controller](https://www.nesdev.org/wiki/Standard_controller) shift
//! register protocol for both ports: a write to $4016 latches every pad's current buttons (and
//! keeps reloading while the strobe bit stays high); each read of $4016 (port 1) or $4017 (port 2)
//! returns the next bit, A first. After eight reads the register returns 1s.

use bitflags::bitflags;

bitflags! {
    /// Button state in report order: bit 0 = A ... bit 7 = Right.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const A = 1 << 0;
        const B = 1 << 1;
        const SELECT = 1 << 2;
        const START = 1 << 3;
        const UP = 1 << 4;
        const DOWN = 1 << 5;
        const LEFT = 1 << 6;
        const RIGHT = 1 << 7;
    }
}

/// Upper bits of a controller read come from open bus; most boards leave $40 there.
const OPEN_BUS_BITS: u8 = 0x40;

/// Both controller ports.
pub struct Controller {
    /// Live button state per port, set by the frontend.
    pub buttons: [Buttons; 2],
    shift: [u8; 2],
    strobe: bool,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// Create controllers with no buttons pressed.
    pub fn new() -> Self {
        Self {
            buttons: [Buttons::empty(); 2],
            shift: [0xFF; 2],
            strobe: false,
        }
    }

    /// Clear the shift registers and strobe; held buttons belong to the frontend and are kept.
    pub fn reset(&mut self) {
        self.shift = [0xFF; 2];
        self.strobe = false;
    }

    pub fn set_buttons(&mut self, port: usize, buttons: Buttons) {
        self.buttons[port & 1] = buttons;
    }

    fn latch(&mut self) {
        self.shift = [self.buttons[0].bits(), self.buttons[1].bits()];
    }

    /// Read $4016/$4017. Without side effects the register is only observed, not shifted.
    pub fn read(&mut self, addr: u16, allow_side_effects: bool) -> Option<u8> {
        let port = match addr {
            0x4016 => 0,
            0x4017 => 1,
            _ => return None,
        };
        if self.strobe {
            self.latch();
        }
        let value = (self.shift[port] & 1) | OPEN_BUS_BITS;
        if allow_side_effects && !self.strobe {
            self.shift[port] = (self.shift[port] >> 1) | 0x80;
        }
        Some(value)
    }

    /// Write $4016: bit 0 is the strobe; latching happens on every write and while it is held.
    pub fn write(&mut self, addr: u16, data: u8) -> bool {
        if addr != 0x4016 {
            return false;
        }
        self.strobe = data & 1 != 0;
        self.latch();
        true
    }
}

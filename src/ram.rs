//! 2 KiB internal work RAM, mirrored four times across $0000–$1FFF.

pub const RAM_SIZE: usize = 0x800;

pub struct Ram {
    pub data: [u8; RAM_SIZE],
}

impl Default for Ram {
    fn default() -> Self {
        Self::new()
    }
}

impl Ram {
    pub fn new() -> Self {
        Self {
            data: [0; RAM_SIZE],
        }
    }

    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    pub fn read(&self, addr: u16) -> Option<u8> {
        match addr {
            0x0000..=0x1FFF => Some(self.data[addr as usize & (RAM_SIZE - 1)]),
            _ => None,
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) -> bool {
        match addr {
            0x0000..=0x1FFF => {
                self.data[addr as usize & (RAM_SIZE - 1)] = data;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_every_2k() {
        let mut ram = Ram::new();
        assert!(ram.write(0x0801, 0x7E));
        assert_eq!(ram.read(0x0001), Some(0x7E));
        assert_eq!(ram.read(0x1801), Some(0x7E));
        assert_eq!(ram.read(0x2000), None);
    }
}

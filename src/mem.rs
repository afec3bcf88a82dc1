use crate::error::{Error, Result};

pub const MEMORY_SIZE: usize = 256;

pub struct Mem {
    pub mem: [u8; MEMORY_SIZE],
}

impl Default for Mem {
    fn default() -> Self {
        Self {
            mem: [0; MEMORY_SIZE],
        }
    }
}

impl Mem {
    pub fn read(&self, addr: u8) -> u8 {
        self.mem[addr as usize]
    }

    pub fn write(&mut self, addr: u8, val: u8) {
        self.mem[addr as usize] = val;
    }

    /// Copies `image` to the start of memory. Cells past the end of the image
    /// keep whatever they held before.
    pub fn load_image(&mut self, image: &[u8]) -> Result<()> {
        if image.len() > MEMORY_SIZE {
            return Err(Error::ImageTooLarge { len: image.len() });
        }
        self.mem[..image.len()].copy_from_slice(image);
        Ok(())
    }
}

//! DRAM model.
//!
//! A flat little-endian byte array at [`DRAM_BASE`] with typed accessors for
//! 8/16/32/64-bit widths. Bytes are indexed by `address - DRAM_BASE`; any
//! access falling outside the array after base subtraction raises the access
//! fault matching the operation. No alignment checks happen at this layer;
//! alignment is policed by the instruction semantics.

use crate::common::constants::DRAM_BASE;
use crate::common::Trap;

/// Main memory backing store.
pub struct Dram {
    data: Vec<u8>,
}

impl Dram {
    /// Creates DRAM of the given size with the kernel image copied to the
    /// bottom (address [`DRAM_BASE`]). Images larger than DRAM are truncated;
    /// the remainder is zero-filled.
    pub fn new(size: usize, kernel: &[u8]) -> Self {
        let mut data = vec![0; size];
        let n = kernel.len().min(size);
        data[..n].copy_from_slice(&kernel[..n]);
        Self { data }
    }

    /// Returns the DRAM size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Returns the byte index for a physical address, or `None` when the
    /// address is below base or past the end of memory.
    fn index(&self, addr: u64, bytes: usize) -> Option<usize> {
        let offset = addr.checked_sub(DRAM_BASE)? as usize;
        if offset.checked_add(bytes)? <= self.data.len() {
            Some(offset)
        } else {
            None
        }
    }

    /// Loads a little-endian value of the given width in bits.
    pub fn load(&self, addr: u64, size: u32) -> Result<u64, Trap> {
        match size {
            8 => self.load_bytes(addr, 1),
            16 => self.load_bytes(addr, 2),
            32 => self.load_bytes(addr, 4),
            64 => self.load_bytes(addr, 8),
            _ => Err(Trap::LoadAccessFault(addr)),
        }
    }

    /// Stores a little-endian value of the given width in bits.
    pub fn store(&mut self, addr: u64, size: u32, value: u64) -> Result<(), Trap> {
        match size {
            8 => self.store_bytes(addr, 1, value),
            16 => self.store_bytes(addr, 2, value),
            32 => self.store_bytes(addr, 4, value),
            64 => self.store_bytes(addr, 8, value),
            _ => Err(Trap::StoreAmoAccessFault(addr)),
        }
    }

    fn load_bytes(&self, addr: u64, bytes: usize) -> Result<u64, Trap> {
        let idx = self
            .index(addr, bytes)
            .ok_or(Trap::LoadAccessFault(addr))?;
        let mut value = 0u64;
        for i in 0..bytes {
            value |= u64::from(self.data[idx + i]) << (i * 8);
        }
        Ok(value)
    }

    fn store_bytes(&mut self, addr: u64, bytes: usize, value: u64) -> Result<(), Trap> {
        let idx = self
            .index(addr, bytes)
            .ok_or(Trap::StoreAmoAccessFault(addr))?;
        for i in 0..bytes {
            self.data[idx + i] = (value >> (i * 8)) as u8;
        }
        Ok(())
    }
}

impl std::fmt::Debug for Dram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dram").field("size", &self.data.len()).finish()
    }
}

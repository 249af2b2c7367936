//! Virtual memory access helpers.
//!
//! Loads and stores issued by instruction semantics re-enter the MMU here, so
//! every data access is translated with the access type that picks the right
//! fault flavor.

use super::Cpu;
use crate::common::{AccessType, Trap};

impl Cpu {
    /// Loads a value of the given width in bits from a virtual address.
    pub fn load(&mut self, vaddr: u32, size: u32) -> Result<u64, Trap> {
        let paddr = self.translate(vaddr, AccessType::Read)?;
        self.bus.load(paddr, size)
    }

    /// Stores a value of the given width in bits to a virtual address.
    pub fn store(&mut self, vaddr: u32, size: u32, value: u64) -> Result<(), Trap> {
        let paddr = self.translate(vaddr, AccessType::Write)?;
        self.bus.store(paddr, size, value)
    }
}

//! Sv39-shaped page-table walker.
//!
//! Translates virtual to physical addresses by walking the three-level table
//! rooted at the paging cache. The walk keeps the Sv39 geometry (9-bit VPN
//! slices, 8-byte PTEs, 44-bit PPN window) even though the hart is 32-bit, so
//! the arithmetic below is deliberately 64-bit wide. Permission, U/SUM/MXR,
//! and A/D handling are outside this machine model; a leaf with R or X set
//! maps the page for every access type.

use super::Cpu;
use crate::common::constants::{PAGE_SHIFT, PAGE_SIZE};
use crate::common::{AccessType, Trap};

/// Size of a page-table entry in bytes.
const PTE_SIZE: u64 = 8;

/// A raw 8-byte Sv39 page-table entry.
#[derive(Clone, Copy)]
struct PageTableEntry(u64);

impl PageTableEntry {
    /// Valid bit.
    fn is_valid(self) -> bool {
        self.0 & 1 != 0
    }

    /// Read permission bit.
    fn can_read(self) -> bool {
        self.0 & (1 << 1) != 0
    }

    /// Write permission bit.
    fn can_write(self) -> bool {
        self.0 & (1 << 2) != 0
    }

    /// Execute permission bit.
    fn can_exec(self) -> bool {
        self.0 & (1 << 3) != 0
    }

    /// Full 44-bit physical page number window.
    fn ppn(self) -> u64 {
        (self.0 >> 10) & 0xFFF_FFFF_FFFF
    }

    /// One 9-or-26-bit PPN slice, for superpage composition.
    fn ppn_slice(self, level: usize) -> u64 {
        match level {
            0 => (self.0 >> 10) & 0x1FF,
            1 => (self.0 >> 19) & 0x1FF,
            _ => (self.0 >> 28) & 0x03FF_FFFF,
        }
    }

    /// A valid entry with R=0, W=0, X=0 points at the next table level.
    fn is_pointer(self) -> bool {
        !self.can_read() && !self.can_write() && !self.can_exec()
    }

    /// W without R is a reserved encoding.
    fn is_malformed(self) -> bool {
        !self.can_read() && self.can_write()
    }
}

impl Cpu {
    /// Translates a virtual address, or raises the page/access fault matching
    /// the access type.
    ///
    /// With paging disabled the address space is identity-mapped.
    pub fn translate(&mut self, vaddr: u32, access: AccessType) -> Result<u64, Trap> {
        if !self.enable_paging {
            return Ok(u64::from(vaddr));
        }

        let vpn = [
            u64::from((vaddr >> 12) & 0x1FF),
            u64::from((vaddr >> 21) & 0x1FF),
            u64::from((vaddr >> 30) & 0x1FF),
        ];

        let mut table = self.page_table_root;
        let mut level = 2usize;

        let pte = loop {
            let pte_addr = table + vpn[level] * PTE_SIZE;
            let raw = self
                .bus
                .load(pte_addr, 64)
                .map_err(|_| access_fault(vaddr, access))?;
            let pte = PageTableEntry(raw);

            if !pte.is_valid() || pte.is_malformed() {
                return Err(page_fault(vaddr, access));
            }
            if !pte.is_pointer() {
                break pte;
            }
            if level == 0 {
                return Err(page_fault(vaddr, access));
            }
            level -= 1;
            table = pte.ppn() * PAGE_SIZE;
        };

        let offset = u64::from(vaddr) & (PAGE_SIZE - 1);
        let paddr = match level {
            // 4 KiB leaf: the full PPN window supplies the frame.
            0 => (pte.ppn() << PAGE_SHIFT) | offset,
            // 2 MiB leaf: vpn[0] passes through.
            1 => {
                (pte.ppn_slice(2) << 30) | (pte.ppn_slice(1) << 21) | (vpn[0] << 12) | offset
            }
            // 1 GiB leaf: vpn[1] and vpn[0] pass through.
            _ => (pte.ppn_slice(2) << 30) | (vpn[1] << 21) | (vpn[0] << 12) | offset,
        };
        Ok(paddr)
    }
}

/// Builds the page-fault variant for the access type.
fn page_fault(vaddr: u32, access: AccessType) -> Trap {
    let addr = u64::from(vaddr);
    match access {
        AccessType::Fetch => Trap::InstructionPageFault(addr),
        AccessType::Read => Trap::LoadPageFault(addr),
        AccessType::Write => Trap::StoreAmoPageFault(addr),
    }
}

/// Builds the access-fault variant for the access type (PTE fetch failed).
fn access_fault(vaddr: u32, access: AccessType) -> Trap {
    let addr = u64::from(vaddr);
    match access {
        AccessType::Fetch => Trap::InstructionAccessFault(addr),
        AccessType::Read => Trap::LoadAccessFault(addr),
        AccessType::Write => Trap::StoreAmoAccessFault(addr),
    }
}

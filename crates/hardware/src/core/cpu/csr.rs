//! CSR access hooks.
//!
//! All CSR traffic from instruction semantics goes through these two methods
//! so architectural side effects stay in one place. The storage-level `sie`
//! mediation lives in [`crate::core::arch::csr::CsrFile`]; the hook layer
//! adds the `satp` paging refresh.

use super::Cpu;
use crate::core::arch::csr::{SATP, SATP_MODE_SV39};

impl Cpu {
    /// Reads a CSR.
    pub fn load_csr(&self, addr: u32) -> u32 {
        self.csrs.read(addr)
    }

    /// Writes a CSR and applies side effects.
    ///
    /// A write to `satp` recomputes the paging cache: translation is enabled
    /// exactly when the mode field selects Sv39, and the root pointer is
    /// rederived from the PPN field on every write.
    pub fn store_csr(&mut self, addr: u32, value: u32) {
        self.csrs.write(addr, value);
        if addr == SATP {
            self.update_paging();
        }
    }

    fn update_paging(&mut self) {
        self.enable_paging = self.csrs.satp_mode() == SATP_MODE_SV39;
        self.page_table_root = self.csrs.satp_root();
    }
}

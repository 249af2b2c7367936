//! Platform-Level Interrupt Controller (PLIC).
//!
//! The PLIC routes external interrupts to the hart's supervisor context. This
//! model keeps the four registers an xv6-class kernel programs:
//!
//! # Memory Map
//!
//! * `0x00_1000`: interrupt pending bits
//! * `0x00_2080`: supervisor enable bits
//! * `0x20_1000`: supervisor priority threshold
//! * `0x20_1004`: supervisor claim/complete
//!
//! All registers are 32-bit only; other widths fault. Unrecognized offsets
//! read 0 and ignore writes. The claim register is also written by the
//! interrupt-pending evaluation when a device asserts its line, so the guest
//! observes the claiming protocol without a full priority arbiter.

use crate::common::constants::{
    PLIC_BASE, PLIC_PENDING_OFFSET, PLIC_SCLAIM_OFFSET, PLIC_SENABLE_OFFSET,
    PLIC_SPRIORITY_OFFSET,
};
use crate::common::Trap;

/// Absolute physical address of the pending register.
const PENDING: u64 = PLIC_BASE + PLIC_PENDING_OFFSET;

/// Absolute physical address of the supervisor enable register.
const SENABLE: u64 = PLIC_BASE + PLIC_SENABLE_OFFSET;

/// Absolute physical address of the supervisor priority threshold.
const SPRIORITY: u64 = PLIC_BASE + PLIC_SPRIORITY_OFFSET;

/// Absolute physical address of the supervisor claim/complete register.
const SCLAIM: u64 = PLIC_BASE + PLIC_SCLAIM_OFFSET;

/// PLIC device state.
#[derive(Debug, Default)]
pub struct Plic {
    /// Interrupt pending bits.
    pending: u32,
    /// Supervisor enable bits.
    senable: u32,
    /// Supervisor priority threshold.
    spriority: u32,
    /// Supervisor claim/complete register.
    sclaim: u32,
}

impl Plic {
    /// Creates a new PLIC with all registers cleared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads from a PLIC register. Only 32-bit accesses are legal.
    pub fn load(&self, addr: u64, size: u32) -> Result<u64, Trap> {
        match size {
            32 => Ok(u64::from(match addr {
                PENDING => self.pending,
                SENABLE => self.senable,
                SPRIORITY => self.spriority,
                SCLAIM => self.sclaim,
                _ => 0,
            })),
            _ => Err(Trap::LoadAccessFault(addr)),
        }
    }

    /// Stores to a PLIC register. Only 32-bit accesses are legal.
    pub fn store(&mut self, addr: u64, size: u32, value: u64) -> Result<(), Trap> {
        match size {
            32 => {
                let value = value as u32;
                match addr {
                    PENDING => self.pending = value,
                    SENABLE => self.senable = value,
                    SPRIORITY => self.spriority = value,
                    SCLAIM => self.sclaim = value,
                    _ => {}
                }
                Ok(())
            }
            _ => Err(Trap::StoreAmoAccessFault(addr)),
        }
    }
}

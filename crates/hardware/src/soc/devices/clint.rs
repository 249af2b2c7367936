//! Core Local Interruptor (CLINT).
//!
//! Holds the memory-mapped machine timer registers.
//!
//! # Memory Map
//!
//! * `0x4000`: MTIMECMP (Machine Time Compare)
//! * `0xBFF8`: MTIME (Machine Time)
//!
//! Both registers are 64-bit only; any other access width faults. Reads from
//! unrecognized offsets return 0 and writes to them are ignored.

use crate::common::constants::{CLINT_BASE, CLINT_MTIMECMP_OFFSET, CLINT_MTIME_OFFSET};
use crate::common::Trap;

/// Absolute physical address of `mtimecmp`.
const MTIMECMP: u64 = CLINT_BASE + CLINT_MTIMECMP_OFFSET;

/// Absolute physical address of `mtime`.
const MTIME: u64 = CLINT_BASE + CLINT_MTIME_OFFSET;

/// CLINT device state.
#[derive(Debug)]
pub struct Clint {
    /// Current machine time counter.
    mtime: u64,
    /// Machine time compare register.
    mtimecmp: u64,
    /// Steps per timer tick.
    divider: u64,
    /// Internal counter for the divider.
    counter: u64,
}

impl Clint {
    /// Creates a new CLINT.
    ///
    /// `mtimecmp` starts at `u64::MAX` so the timer cannot fire before the
    /// guest programs it. A divider of 0 is treated as 1.
    pub fn new(divider: u64) -> Self {
        Self {
            mtime: 0,
            mtimecmp: u64::MAX,
            divider: if divider == 0 { 1 } else { divider },
            counter: 0,
        }
    }

    /// Loads from a CLINT register. Only 64-bit accesses are legal.
    pub fn load(&self, addr: u64, size: u32) -> Result<u64, Trap> {
        match size {
            64 => Ok(match addr {
                MTIMECMP => self.mtimecmp,
                MTIME => self.mtime,
                _ => 0,
            }),
            _ => Err(Trap::LoadAccessFault(addr)),
        }
    }

    /// Stores to a CLINT register. Only 64-bit accesses are legal.
    pub fn store(&mut self, addr: u64, size: u32, value: u64) -> Result<(), Trap> {
        match size {
            64 => {
                match addr {
                    MTIMECMP => self.mtimecmp = value,
                    MTIME => self.mtime = value,
                    _ => {}
                }
                Ok(())
            }
            _ => Err(Trap::StoreAmoAccessFault(addr)),
        }
    }

    /// Advances the timer by one step.
    ///
    /// `mtime` increments once every `divider` calls and is monotonic.
    /// Returns true while the timer condition `mtime >= mtimecmp` holds.
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter >= self.divider {
            self.mtime = self.mtime.wrapping_add(1);
            self.counter = 0;
        }
        self.mtime >= self.mtimecmp
    }
}

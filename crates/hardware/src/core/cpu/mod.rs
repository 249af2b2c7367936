//! CPU core definition and step loop.
//!
//! The [`Cpu`] owns all hart state and the system bus; nothing holds a
//! reference back to it. One call to [`Cpu::step`] runs one instruction to
//! completion: translate the PC, fetch through the bus, execute, catch any
//! trap into the trap unit, then poll for an interrupt to take. There are no
//! suspension points and no hidden unwinding; every trap travels as a
//! `Result` up to this loop.

/// CSR access hooks (paging refresh on `satp` writes).
pub mod csr;

/// Instruction decode and execution.
pub mod execution;

/// Interrupt-pending evaluation.
pub mod interrupt;

/// Virtual memory translation helpers.
pub mod memory;

/// Sv39-shaped page-table walker.
pub mod mmu;

/// Trap entry and privileged returns.
pub mod trap;

use crate::common::constants::DRAM_BASE;
use crate::common::{AccessType, Trap};
use crate::core::arch::csr::{IRQ_MTIP, MIP};
use crate::core::arch::{CsrFile, PrivilegeMode};
use crate::soc::Bus;

/// One RISC-V hart and everything it can touch.
pub struct Cpu {
    /// General-purpose registers. `x0` is hardwired to zero; `x2` starts at
    /// the top of DRAM.
    pub regs: [u32; 32],
    /// Program counter.
    pub pc: u32,
    /// Current privilege mode.
    pub privilege: PrivilegeMode,
    /// Control and status registers.
    pub csrs: CsrFile,
    /// System bus and devices.
    pub bus: Bus,
    /// Paging cache: true when `satp` selects translation.
    pub enable_paging: bool,
    /// Paging cache: physical address of the root page table.
    pub page_table_root: u64,
    /// Load reservation for LR/SC.
    pub load_reservation: Option<u32>,
}

impl Cpu {
    /// Creates a hart in machine mode with the PC at the bottom of DRAM and
    /// the stack pointer at the top.
    pub fn new(bus: Bus) -> Self {
        let mut regs = [0; 32];
        regs[2] = (DRAM_BASE as u32).wrapping_add(bus.dram.size() as u32);
        Self {
            regs,
            pc: DRAM_BASE as u32,
            privilege: PrivilegeMode::Machine,
            csrs: CsrFile::new(),
            bus,
            enable_paging: false,
            page_table_root: 0,
            load_reservation: None,
        }
    }

    /// Reads a general-purpose register.
    #[inline]
    pub fn read_reg(&self, idx: usize) -> u32 {
        self.regs[idx]
    }

    /// Writes a general-purpose register. Writes to `x0` are dropped.
    #[inline]
    pub fn write_reg(&mut self, idx: usize, val: u32) {
        if idx != 0 {
            self.regs[idx] = val;
        }
    }

    /// Runs one instruction and its trap/interrupt follow-up.
    ///
    /// Returns `Err` exactly when a fatal trap was taken; the caller should
    /// stop stepping. Non-fatal traps (page faults, ecalls, interrupts) are
    /// absorbed into the architectural state and never leak past one step.
    pub fn step(&mut self) -> Result<(), Trap> {
        match self.fetch() {
            Ok(inst) => {
                self.pc = self.pc.wrapping_add(4);
                if let Err(trap) = self.execute(inst) {
                    self.handle_trap(trap)?;
                }
            }
            Err(trap) => self.handle_trap(trap)?,
        }

        if self.bus.clint.tick() {
            let mip = self.csrs.read(MIP);
            self.csrs.write(MIP, mip | IRQ_MTIP);
        }

        if let Some(interrupt) = self.pending_interrupt() {
            self.take_trap(&interrupt);
        }
        Ok(())
    }

    /// Translates the PC and loads the next instruction word.
    ///
    /// Bus failures on the translated address surface as instruction access
    /// faults.
    fn fetch(&mut self) -> Result<u32, Trap> {
        let paddr = self.translate(self.pc, AccessType::Fetch)?;
        match self.bus.load(paddr, 32) {
            Ok(inst) => Ok(inst as u32),
            Err(_) => Err(Trap::InstructionAccessFault(u64::from(self.pc))),
        }
    }

    /// Feeds a trap to the trap unit and reports whether stepping can go on.
    fn handle_trap(&mut self, trap: Trap) -> Result<(), Trap> {
        self.take_trap(&trap);
        if trap.is_fatal() {
            Err(trap)
        } else {
            Ok(())
        }
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("pc", &self.pc)
            .field("privilege", &self.privilege)
            .field("enable_paging", &self.enable_paging)
            .finish_non_exhaustive()
    }
}

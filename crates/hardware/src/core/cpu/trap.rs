//! Trap entry and privileged returns.
//!
//! `take_trap` performs the mode transition for a caught trap: classify the
//! cause, consult the delegation registers, and run either the supervisor or
//! the machine entry sequence. `mret`/`sret` undo it. The exception program
//! counter always blames the instruction that ran: the step loop advances the
//! PC before executing, so `epc = pc - 4`.

use tracing::debug;

use super::Cpu;
use crate::core::arch::csr::{
    CAUSE_INTERRUPT_BIT, MCAUSE, MEDELEG, MEPC, MIDELEG, MSTATUS, MTVAL, MTVEC, SCAUSE, SEPC,
    SSTATUS, STATUS_MIE, STATUS_MPIE, STATUS_MPP_MASK, STATUS_MPP_SHIFT, STATUS_SIE, STATUS_SPIE,
    STATUS_SPP, STVAL, STVEC,
};
use crate::common::Trap;
use crate::core::arch::PrivilegeMode;

impl Cpu {
    /// Performs the mode transition for a trap.
    ///
    /// Exceptions delegated through `medeleg` (and interrupts through
    /// `mideleg`) are handled in supervisor mode when the hart was in
    /// supervisor or user mode; everything else lands in machine mode. The
    /// vectored `xtvec` mode offsets the handler for interrupts only.
    pub fn take_trap(&mut self, trap: &Trap) {
        self.load_reservation = None;

        let epc = self.pc.wrapping_sub(4);
        let code = trap.code();
        let is_interrupt = trap.is_interrupt();
        let cause = if is_interrupt {
            CAUSE_INTERRUPT_BIT | code
        } else {
            code
        };
        let prev = self.privilege;

        let deleg = if is_interrupt {
            self.csrs.read(MIDELEG)
        } else {
            self.csrs.read(MEDELEG)
        };
        let delegated = prev <= PrivilegeMode::Supervisor && (deleg >> code) & 1 != 0;

        debug!(%trap, epc, mode = %prev, delegated, "trap taken");

        if delegated {
            self.privilege = PrivilegeMode::Supervisor;

            let stvec = self.csrs.read(STVEC);
            self.pc = (stvec & !1).wrapping_add(vector_offset(stvec, is_interrupt, code));

            self.csrs.write(SEPC, epc & !1);
            self.csrs.write(SCAUSE, cause);
            self.csrs.write(STVAL, 0);

            let mut sstatus = self.csrs.read(SSTATUS);
            sstatus = if sstatus & STATUS_SIE != 0 {
                sstatus | STATUS_SPIE
            } else {
                sstatus & !STATUS_SPIE
            };
            sstatus &= !STATUS_SIE;
            sstatus = if prev == PrivilegeMode::User {
                sstatus & !STATUS_SPP
            } else {
                sstatus | STATUS_SPP
            };
            self.csrs.write(SSTATUS, sstatus);
        } else {
            self.privilege = PrivilegeMode::Machine;

            let mtvec = self.csrs.read(MTVEC);
            self.pc = (mtvec & !1).wrapping_add(vector_offset(mtvec, is_interrupt, code));

            self.csrs.write(MEPC, epc & !1);
            self.csrs.write(MCAUSE, cause);
            self.csrs.write(MTVAL, 0);

            let mut mstatus = self.csrs.read(MSTATUS);
            mstatus = if mstatus & STATUS_MIE != 0 {
                mstatus | STATUS_MPIE
            } else {
                mstatus & !STATUS_MPIE
            };
            mstatus &= !STATUS_MIE;
            mstatus &= !(STATUS_MPP_MASK << STATUS_MPP_SHIFT);
            self.csrs.write(MSTATUS, mstatus);
        }
    }

    /// Returns from a machine-mode trap handler.
    pub(crate) fn mret(&mut self) {
        self.pc = self.load_csr(MEPC) & !1;

        let mstatus = self.load_csr(MSTATUS);
        let mpp = (mstatus >> STATUS_MPP_SHIFT) & STATUS_MPP_MASK;
        self.privilege = PrivilegeMode::from_bits(mpp);

        let mut next = if mstatus & STATUS_MPIE != 0 {
            mstatus | STATUS_MIE
        } else {
            mstatus & !STATUS_MIE
        };
        next |= STATUS_MPIE;
        next &= !(STATUS_MPP_MASK << STATUS_MPP_SHIFT);
        self.store_csr(MSTATUS, next);
    }

    /// Returns from a supervisor-mode trap handler.
    pub(crate) fn sret(&mut self) {
        self.pc = self.load_csr(SEPC) & !1;

        let sstatus = self.load_csr(SSTATUS);
        self.privilege = if sstatus & STATUS_SPP != 0 {
            PrivilegeMode::Supervisor
        } else {
            PrivilegeMode::User
        };

        let mut next = if sstatus & STATUS_SPIE != 0 {
            sstatus | STATUS_SIE
        } else {
            sstatus & !STATUS_SIE
        };
        next |= STATUS_SPIE;
        next &= !STATUS_SPP;
        self.store_csr(SSTATUS, next);
    }
}

/// Handler offset for vectored trap vectors; vectoring applies to interrupts
/// only.
fn vector_offset(xtvec: u32, is_interrupt: bool, code: u32) -> u32 {
    if is_interrupt && xtvec & 1 != 0 {
        4 * code
    } else {
        0
    }
}

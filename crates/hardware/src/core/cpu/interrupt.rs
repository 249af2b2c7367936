//! Interrupt-pending evaluation.
//!
//! Runs once per step, after execution. Device lines are polled first: a UART
//! byte or a virtio notification becomes a PLIC claim plus `mip.SEIP`, and a
//! virtio notification additionally drives the DMA engine before the
//! interrupt is raised. The winner is then chosen from `mie & mip` in fixed
//! priority order, at most one interrupt per step, clearing its pending bit.

use tracing::{debug, warn};

use super::Cpu;
use crate::common::constants::{PLIC_SCLAIM, UART_IRQ, VIRTIO_IRQ};
use crate::common::Trap;
use crate::core::arch::csr::{
    IRQ_MEIP, IRQ_MSIP, IRQ_MTIP, IRQ_SEIP, IRQ_SSIP, IRQ_STIP, MIE, MIP, MSTATUS, SSTATUS,
    STATUS_MIE, STATUS_SIE,
};
use crate::core::arch::PrivilegeMode;

/// Pending bits resolved most-urgent first.
const PRIORITY: [(u32, Trap); 6] = [
    (IRQ_MEIP, Trap::MachineExternalInterrupt),
    (IRQ_MSIP, Trap::MachineSoftwareInterrupt),
    (IRQ_MTIP, Trap::MachineTimerInterrupt),
    (IRQ_SEIP, Trap::SupervisorExternalInterrupt),
    (IRQ_SSIP, Trap::SupervisorSoftwareInterrupt),
    (IRQ_STIP, Trap::SupervisorTimerInterrupt),
];

impl Cpu {
    /// Returns the interrupt to take this step, if any.
    pub fn pending_interrupt(&mut self) -> Option<Trap> {
        // Global gate for the current mode. User mode is never gated.
        match self.privilege {
            PrivilegeMode::Machine if self.csrs.read(MSTATUS) & STATUS_MIE == 0 => return None,
            PrivilegeMode::Supervisor if self.csrs.read(SSTATUS) & STATUS_SIE == 0 => {
                return None;
            }
            _ => {}
        }

        let irq = if self.bus.uart.is_interrupting() {
            UART_IRQ
        } else if self.bus.virtio.is_interrupting() {
            // The queue was notified: run the request before raising the
            // completion interrupt.
            if let Err(trap) = self.bus.disk_access() {
                warn!(%trap, "virtio: DMA abandoned");
            }
            VIRTIO_IRQ
        } else {
            0
        };

        if irq != 0 {
            if let Err(trap) = self.bus.store(PLIC_SCLAIM, 32, u64::from(irq)) {
                debug!(%trap, "plic claim seed failed");
            }
            let mip = self.csrs.read(MIP);
            self.csrs.write(MIP, mip | IRQ_SEIP);
        }

        let pending = self.csrs.read(MIE) & self.csrs.read(MIP);
        for (bit, interrupt) in PRIORITY {
            if pending & bit != 0 {
                let mip = self.csrs.read(MIP);
                self.csrs.write(MIP, mip & !bit);
                return Some(interrupt);
            }
        }
        None
    }
}

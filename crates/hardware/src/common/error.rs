//! Trap definitions.
//!
//! This module defines the architectural trap type used for control flow
//! throughout the core. Instruction semantics, the bus, and the MMU return
//! `Result<_, Trap>`; the step loop catches the error, drives the trap unit,
//! and halts when the trap is fatal. Nothing unwinds.

use thiserror::Error;

/// RISC-V trap: a synchronous exception or an asynchronous interrupt.
///
/// Each variant maps to one cause code of the privileged specification.
/// Address-carrying variants hold the faulting address for diagnostics; the
/// trap unit itself writes `stval`/`mtval` as zero.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Trap {
    /// A control-transfer target was not aligned to the instruction size.
    #[error("InstructionAddressMisaligned({0:#x})")]
    InstructionAddressMisaligned(u64),

    /// An instruction fetch touched memory no device claims.
    #[error("InstructionAccessFault({0:#x})")]
    InstructionAccessFault(u64),

    /// The instruction encoding is invalid or unimplemented; carries the
    /// offending encoding.
    #[error("IllegalInstruction({0:#010x})")]
    IllegalInstruction(u32),

    /// An `EBREAK` instruction was executed; carries the program counter.
    #[error("Breakpoint({0:#x})")]
    Breakpoint(u32),

    /// A load (LR.W) address violated the required alignment.
    #[error("LoadAddressMisaligned({0:#x})")]
    LoadAddressMisaligned(u64),

    /// A load touched memory no device claims, or used an illegal MMIO width.
    #[error("LoadAccessFault({0:#x})")]
    LoadAccessFault(u64),

    /// A store or AMO address violated the required alignment.
    #[error("StoreAmoAddressMisaligned({0:#x})")]
    StoreAmoAddressMisaligned(u64),

    /// A store or AMO touched memory no device claims, or used an illegal
    /// MMIO width.
    #[error("StoreAmoAccessFault({0:#x})")]
    StoreAmoAccessFault(u64),

    /// An `ECALL` was executed in user mode.
    #[error("EnvironmentCallFromUMode")]
    EnvironmentCallFromUMode,

    /// An `ECALL` was executed in supervisor mode.
    #[error("EnvironmentCallFromSMode")]
    EnvironmentCallFromSMode,

    /// An `ECALL` was executed in machine mode.
    #[error("EnvironmentCallFromMMode")]
    EnvironmentCallFromMMode,

    /// The page-table walk failed for an instruction fetch.
    #[error("InstructionPageFault({0:#x})")]
    InstructionPageFault(u64),

    /// The page-table walk failed for a load.
    #[error("LoadPageFault({0:#x})")]
    LoadPageFault(u64),

    /// The page-table walk failed for a store or AMO.
    #[error("StoreAmoPageFault({0:#x})")]
    StoreAmoPageFault(u64),

    /// Supervisor software interrupt.
    #[error("SupervisorSoftwareInterrupt")]
    SupervisorSoftwareInterrupt,

    /// Machine software interrupt.
    #[error("MachineSoftwareInterrupt")]
    MachineSoftwareInterrupt,

    /// Supervisor timer interrupt.
    #[error("SupervisorTimerInterrupt")]
    SupervisorTimerInterrupt,

    /// Machine timer interrupt.
    #[error("MachineTimerInterrupt")]
    MachineTimerInterrupt,

    /// Supervisor external interrupt.
    #[error("SupervisorExternalInterrupt")]
    SupervisorExternalInterrupt,

    /// Machine external interrupt.
    #[error("MachineExternalInterrupt")]
    MachineExternalInterrupt,
}

impl Trap {
    /// Returns the cause code written to `mcause`/`scause`, without the
    /// interrupt bit.
    pub fn code(&self) -> u32 {
        match self {
            Trap::InstructionAddressMisaligned(_) => 0,
            Trap::InstructionAccessFault(_) => 1,
            Trap::IllegalInstruction(_) => 2,
            Trap::Breakpoint(_) => 3,
            Trap::LoadAddressMisaligned(_) => 4,
            Trap::LoadAccessFault(_) => 5,
            Trap::StoreAmoAddressMisaligned(_) => 6,
            Trap::StoreAmoAccessFault(_) => 7,
            Trap::EnvironmentCallFromUMode => 8,
            Trap::EnvironmentCallFromSMode => 9,
            Trap::EnvironmentCallFromMMode => 11,
            Trap::InstructionPageFault(_) => 12,
            Trap::LoadPageFault(_) => 13,
            Trap::StoreAmoPageFault(_) => 15,
            Trap::SupervisorSoftwareInterrupt => 1,
            Trap::MachineSoftwareInterrupt => 3,
            Trap::SupervisorTimerInterrupt => 5,
            Trap::MachineTimerInterrupt => 7,
            Trap::SupervisorExternalInterrupt => 9,
            Trap::MachineExternalInterrupt => 11,
        }
    }

    /// Returns true for the interrupt variants (cause MSB set in `xcause`).
    pub fn is_interrupt(&self) -> bool {
        matches!(
            self,
            Trap::SupervisorSoftwareInterrupt
                | Trap::MachineSoftwareInterrupt
                | Trap::SupervisorTimerInterrupt
                | Trap::MachineTimerInterrupt
                | Trap::SupervisorExternalInterrupt
                | Trap::MachineExternalInterrupt
        )
    }

    /// Returns true if the trap halts the emulator.
    ///
    /// Access faults and instruction/store misalignment are unrecoverable in
    /// this machine model; page faults are left to the supervisor.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Trap::InstructionAddressMisaligned(_)
                | Trap::InstructionAccessFault(_)
                | Trap::LoadAccessFault(_)
                | Trap::StoreAmoAddressMisaligned(_)
                | Trap::StoreAmoAccessFault(_)
        )
    }
}

//! RISC-V RV32 `virt`-machine emulator library.
//!
//! A single-hart RV32IMA + Zicsr + Zifencei interpreter modeled on the QEMU
//! `virt` board, capable of booting an xv6-class kernel image. The crate
//! provides:
//! 1. **Core:** Fetch/decode/execute loop, privilege modes, CSR file with
//!    delegation semantics, Sv39-shaped MMU, trap unit, interrupt polling.
//! 2. **SoC:** Address-routed bus over DRAM and the CLINT, PLIC, UART, and
//!    virtio-blk MMIO devices, including the legacy virtio DMA engine.
//! 3. **Simulation:** [`Emulator`] wrapping it all behind the host contract —
//!    two image buffers in, `step()` plus UART hooks out.
//!
//! The host front-end (file loading, terminal) lives in the companion CLI
//! crate.

/// Common types and constants (address map, access types, traps).
pub mod common;
/// Emulator configuration.
pub mod config;
/// CPU core (architectural state, execution, MMU, traps, interrupts).
pub mod core;
/// Instruction encodings.
pub mod isa;
/// Emulation driver.
pub mod sim;
/// System-on-chip (bus, DRAM, MMIO devices).
pub mod soc;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Architectural trap type returned by `step()` on halt.
pub use crate::common::Trap;
/// The hart; owns the bus and all architectural state.
pub use crate::core::Cpu;
/// Top-level emulator; construct with `Emulator::new`.
pub use crate::sim::Emulator;
/// System bus; routes physical accesses to DRAM and devices.
pub use crate::soc::Bus;

//! System-on-chip: bus, memory, and MMIO devices.
//!
//! The [`Bus`] owns DRAM and the four devices and routes every physical
//! access; the CPU owns the bus. Control flows strictly CPU → bus → device;
//! interrupts flow back only because the CPU polls the device lines each
//! step.

/// Address-range router and virtio DMA engine.
pub mod bus;

/// MMIO device models.
pub mod devices;

/// Main memory.
pub mod dram;

pub use bus::Bus;
pub use dram::Dram;

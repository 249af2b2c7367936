//! Memory-mapped I/O devices.
//!
//! The four devices of the emulated `virt` machine: the CLINT timer block,
//! the PLIC interrupt controller, the 16550A UART, and the legacy virtio
//! block device. Each exposes `load`/`store` taking a physical address and an
//! access width in bits, rejecting the widths its hardware does not decode.

/// Core Local Interruptor (machine timer).
pub mod clint;

/// Platform-Level Interrupt Controller.
pub mod plic;

/// 16550A-compatible serial port.
pub mod uart;

/// Virtio block device (legacy MMIO).
pub mod virtio;

pub use clint::Clint;
pub use plic::Plic;
pub use uart::Uart;
pub use virtio::VirtioBlk;

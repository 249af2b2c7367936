//! Global system constants.
//!
//! This module defines the fixed physical address map of the emulated `virt`
//! machine together with paging and device constants. The address ranges are
//! invariants of the platform: they never change at run time and exactly one
//! device claims any given in-range address.

/// Base physical address of DRAM.
pub const DRAM_BASE: u64 = 0x8000_0000;

/// Default DRAM size (128 MiB), giving the range `0x8000_0000..0x8800_0000`.
pub const DRAM_SIZE: usize = 128 * 1024 * 1024;

/// Base physical address of the CLINT MMIO region.
pub const CLINT_BASE: u64 = 0x0200_0000;

/// Size of the CLINT MMIO region.
pub const CLINT_SIZE: u64 = 0x10000;

/// Offset of the `mtimecmp` register within the CLINT region.
pub const CLINT_MTIMECMP_OFFSET: u64 = 0x4000;

/// Offset of the `mtime` register within the CLINT region.
pub const CLINT_MTIME_OFFSET: u64 = 0xBFF8;

/// Base physical address of the PLIC MMIO region.
pub const PLIC_BASE: u64 = 0x0C00_0000;

/// Size of the PLIC MMIO region (`0x0C00_0000..0x1000_0000`).
pub const PLIC_SIZE: u64 = 0x400_0000;

/// Offset of the interrupt pending register within the PLIC region.
pub const PLIC_PENDING_OFFSET: u64 = 0x1000;

/// Offset of the supervisor enable register within the PLIC region.
pub const PLIC_SENABLE_OFFSET: u64 = 0x2080;

/// Offset of the supervisor priority-threshold register within the PLIC region.
pub const PLIC_SPRIORITY_OFFSET: u64 = 0x20_1000;

/// Offset of the supervisor claim/complete register within the PLIC region.
pub const PLIC_SCLAIM_OFFSET: u64 = 0x20_1004;

/// Absolute physical address of the supervisor claim/complete register.
pub const PLIC_SCLAIM: u64 = PLIC_BASE + PLIC_SCLAIM_OFFSET;

/// Base physical address of the UART MMIO region.
pub const UART_BASE: u64 = 0x1000_0000;

/// Size of the UART MMIO region.
pub const UART_SIZE: u64 = 0x100;

/// Base physical address of the virtio-blk MMIO region.
pub const VIRTIO_BASE: u64 = 0x1000_1000;

/// Size of the virtio-blk MMIO region.
pub const VIRTIO_SIZE: u64 = 0x1000;

/// PLIC interrupt source number of the UART.
pub const UART_IRQ: u32 = 10;

/// PLIC interrupt source number of the virtio-blk device.
pub const VIRTIO_IRQ: u32 = 1;

/// Page size in bytes (4 KiB).
pub const PAGE_SIZE: u64 = 4096;

/// Number of bits to shift to convert between bytes and pages.
pub const PAGE_SHIFT: u64 = 12;

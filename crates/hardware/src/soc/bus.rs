//! System bus.
//!
//! Routes physical accesses to DRAM and the MMIO devices. The five targets
//! are statically known, so dispatch is a fixed sequence of range checks with
//! no device table and no dynamic dispatch: exactly one target claims any
//! in-range address, DRAM is the final fallback for addresses at or above
//! [`DRAM_BASE`], and everything else faults.
//!
//! The bus also hosts the virtio DMA engine, since a disk request touches the
//! virtio register state and DRAM in one motion.

use tracing::debug;

use crate::common::constants::{
    CLINT_BASE, CLINT_SIZE, DRAM_BASE, PLIC_BASE, PLIC_SIZE, UART_BASE, UART_SIZE, VIRTIO_BASE,
    VIRTIO_SIZE,
};
use crate::common::Trap;
use crate::config::Config;
use crate::soc::devices::virtio::{DESC_NUM, SECTOR_SIZE, VRING_DESC_SIZE};
use crate::soc::devices::{Clint, Plic, Uart, VirtioBlk};
use crate::soc::dram::Dram;

/// The system bus and everything attached to it.
#[derive(Debug)]
pub struct Bus {
    /// Main memory.
    pub dram: Dram,
    /// Machine timer block.
    pub clint: Clint,
    /// External interrupt controller.
    pub plic: Plic,
    /// Serial port.
    pub uart: Uart,
    /// Block device.
    pub virtio: VirtioBlk,
}

impl Bus {
    /// Builds the bus with DRAM initialized from the kernel image and the
    /// virtio device backed by the disk image.
    pub fn new(kernel: &[u8], disk_image: Vec<u8>, config: &Config) -> Self {
        Self {
            dram: Dram::new(config.memory.dram_size, kernel),
            clint: Clint::new(config.clint.divider),
            plic: Plic::new(),
            uart: Uart::new(),
            virtio: VirtioBlk::new(disk_image),
        }
    }

    /// Loads a value of the given width in bits from a physical address.
    pub fn load(&mut self, addr: u64, size: u32) -> Result<u64, Trap> {
        if (CLINT_BASE..CLINT_BASE + CLINT_SIZE).contains(&addr) {
            self.clint.load(addr, size)
        } else if (PLIC_BASE..PLIC_BASE + PLIC_SIZE).contains(&addr) {
            self.plic.load(addr, size)
        } else if (UART_BASE..UART_BASE + UART_SIZE).contains(&addr) {
            self.uart.load(addr, size)
        } else if (VIRTIO_BASE..VIRTIO_BASE + VIRTIO_SIZE).contains(&addr) {
            self.virtio.load(addr, size)
        } else if addr >= DRAM_BASE {
            self.dram.load(addr, size)
        } else {
            Err(Trap::LoadAccessFault(addr))
        }
    }

    /// Stores a value of the given width in bits to a physical address.
    pub fn store(&mut self, addr: u64, size: u32, value: u64) -> Result<(), Trap> {
        if (CLINT_BASE..CLINT_BASE + CLINT_SIZE).contains(&addr) {
            self.clint.store(addr, size, value)
        } else if (PLIC_BASE..PLIC_BASE + PLIC_SIZE).contains(&addr) {
            self.plic.store(addr, size, value)
        } else if (UART_BASE..UART_BASE + UART_SIZE).contains(&addr) {
            self.uart.store(addr, size, value)
        } else if (VIRTIO_BASE..VIRTIO_BASE + VIRTIO_SIZE).contains(&addr) {
            self.virtio.store(addr, size, value)
        } else if addr >= DRAM_BASE {
            self.dram.store(addr, size, value)
        } else {
            Err(Trap::StoreAmoAccessFault(addr))
        }
    }

    /// Executes one queued virtio-blk request (the DMA engine).
    ///
    /// Called exactly once per detected queue notification. The virtqueue
    /// layout is the legacy single-page arrangement: the descriptor table at
    /// `queue_pfn * guest_page_size`, the available ring 0x40 bytes in, the
    /// used ring one page in. Legacy block requests chain a header descriptor
    /// (type/reserved/sector) to a data descriptor whose `flags` bit 1 gives
    /// the direction; the copy runs byte-by-byte in ascending order, fully
    /// completing before control returns to the CPU.
    pub fn disk_access(&mut self) -> Result<(), Trap> {
        let desc = self.virtio.desc_addr();
        let avail = desc + 0x40;
        let used = desc + 4096;

        // avail[1] tells the device how far to look in the ring of
        // descriptor indices that starts at avail[2].
        let offset = self.load(avail.wrapping_add(1), 16)?;
        let index = self.load(avail.wrapping_add(offset % DESC_NUM).wrapping_add(2), 16)?;

        // Head descriptor: buffer holds a virtio_blk_outhdr, next links the
        // data descriptor. addr at +0, next at +14.
        let head = desc + VRING_DESC_SIZE * index;
        let header_addr = self.load(head, 64)?;
        let next = self.load(head.wrapping_add(14), 16)?;

        // Data descriptor: addr at +0, len at +8, flags at +12.
        let data = desc + VRING_DESC_SIZE * next;
        let data_addr = self.load(data, 64)?;
        let len = self.load(data.wrapping_add(8), 32)?;
        let flags = self.load(data.wrapping_add(12), 16)?;

        // The sector sits 8 bytes into the request header.
        let sector = self.load(header_addr.wrapping_add(8), 64)?;

        debug!(sector, len, write = flags & 2 == 0, "virtio: disk access");

        if flags & 2 == 0 {
            // Device-write direction: guest memory to disk.
            for i in 0..len {
                let byte = self.load(data_addr + i, 8)?;
                self.virtio.write_disk(sector * SECTOR_SIZE + i, byte as u8);
            }
        } else {
            // Device-read direction: disk to guest memory.
            for i in 0..len {
                let byte = self.virtio.read_disk(sector * SECTOR_SIZE + i);
                self.store(data_addr + i, 8, u64::from(byte))?;
            }
        }

        // Completion: append the new id to the used ring.
        let id = u64::from(self.virtio.next_id());
        self.store(used.wrapping_add(2), 16, id % DESC_NUM)
    }
}

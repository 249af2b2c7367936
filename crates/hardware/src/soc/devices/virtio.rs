//! Virtio block device (legacy MMIO transport).
//!
//! Implements the pre-1.0 virtio-mmio register layout QEMU exposes on the
//! `virt` machine, backed by an in-memory disk image. A write to the
//! queue-notify register records a pending request; the CPU observes it
//! through [`VirtioBlk::is_interrupting`] on its next interrupt poll and
//! drives the DMA engine ([`crate::soc::Bus::disk_access`]) before taking the
//! interrupt.
//!
//! # Memory Map (offsets from `VIRTIO_BASE`, all 32-bit)
//!
//! * `0x00`: magic (`0x7472_6976`, "virt")
//! * `0x04`: version (1 = legacy)
//! * `0x08`: device id (2 = block)
//! * `0x0c`: vendor id (`0x554d_4551`, "QEMU")
//! * `0x10`: device features
//! * `0x20`: driver features
//! * `0x28`: guest page size (write-only)
//! * `0x30`: queue select (write-only)
//! * `0x34`: queue max size (read-only)
//! * `0x38`: queue size (write-only)
//! * `0x40`: queue PFN
//! * `0x50`: queue notify (write-only)
//! * `0x70`: device status

use tracing::warn;

use crate::common::constants::VIRTIO_BASE;
use crate::common::Trap;

/// Magic value register ("virt" in ASCII).
const MAGIC: u64 = VIRTIO_BASE;
/// Version register; 1 is the legacy interface.
const VERSION: u64 = VIRTIO_BASE + 0x04;
/// Device type; 2 is a block device.
const DEVICE_ID: u64 = VIRTIO_BASE + 0x08;
/// Vendor register ("QEMU" in ASCII).
const VENDOR_ID: u64 = VIRTIO_BASE + 0x0c;
/// Device feature bits.
const DEVICE_FEATURES: u64 = VIRTIO_BASE + 0x10;
/// Driver feature bits.
const DRIVER_FEATURES: u64 = VIRTIO_BASE + 0x20;
/// Guest page size used to locate the queue from its PFN.
const GUEST_PAGE_SIZE: u64 = VIRTIO_BASE + 0x28;
/// Queue selector.
const QUEUE_SEL: u64 = VIRTIO_BASE + 0x30;
/// Maximum virtqueue size.
const QUEUE_NUM_MAX: u64 = VIRTIO_BASE + 0x34;
/// Virtqueue size chosen by the driver.
const QUEUE_NUM: u64 = VIRTIO_BASE + 0x38;
/// Physical page number of the virtqueue.
const QUEUE_PFN: u64 = VIRTIO_BASE + 0x40;
/// Queue notify; a write signals a pending request.
const QUEUE_NOTIFY: u64 = VIRTIO_BASE + 0x50;
/// Device status.
const STATUS: u64 = VIRTIO_BASE + 0x70;

/// Number of virtqueue descriptors. Must be a power of two.
pub const DESC_NUM: u64 = 8;

/// Size of one virtqueue descriptor in bytes.
pub const VRING_DESC_SIZE: u64 = 16;

/// Disk sector size in bytes.
pub const SECTOR_SIZE: u64 = 512;

/// Queue-notify value meaning "no request pending". Any in-range queue index
/// written by the driver differs from it.
const NOTIFY_IDLE: u32 = u32::MAX;

/// Virtio block device state.
pub struct VirtioBlk {
    /// Used-ring identifier, incremented (wrapping) per completed request.
    id: u32,
    /// Feature bits acknowledged by the driver.
    driver_features: u32,
    /// Guest page size programmed by the driver.
    page_size: u32,
    /// Selected virtqueue index.
    queue_sel: u32,
    /// Virtqueue size programmed by the driver.
    queue_num: u32,
    /// Physical page number of the virtqueue.
    queue_pfn: u32,
    /// Last queue-notify write, or [`NOTIFY_IDLE`].
    queue_notify: u32,
    /// Device status flags.
    status: u32,
    /// Disk image backing store, mutated by DMA.
    disk: Vec<u8>,
}

impl VirtioBlk {
    /// Creates a new device backed by the given disk image.
    pub fn new(disk_image: Vec<u8>) -> Self {
        Self {
            id: 0,
            driver_features: 0,
            page_size: 0,
            queue_sel: 0,
            queue_num: 0,
            queue_pfn: 0,
            queue_notify: NOTIFY_IDLE,
            status: 0,
            disk: disk_image,
        }
    }

    /// Loads from a virtio register. Only 32-bit accesses are legal.
    pub fn load(&self, addr: u64, size: u32) -> Result<u64, Trap> {
        match size {
            32 => Ok(u64::from(match addr {
                MAGIC => 0x7472_6976,
                VERSION => 1,
                DEVICE_ID => 2,
                VENDOR_ID => 0x554d_4551,
                DEVICE_FEATURES => 0,
                DRIVER_FEATURES => self.driver_features,
                QUEUE_NUM_MAX => DESC_NUM as u32,
                QUEUE_PFN => self.queue_pfn,
                STATUS => self.status,
                _ => 0,
            })),
            _ => Err(Trap::LoadAccessFault(addr)),
        }
    }

    /// Stores to a virtio register. Only 32-bit accesses are legal.
    pub fn store(&mut self, addr: u64, size: u32, value: u64) -> Result<(), Trap> {
        match size {
            32 => {
                let value = value as u32;
                match addr {
                    DRIVER_FEATURES => self.driver_features = value,
                    GUEST_PAGE_SIZE => self.page_size = value,
                    QUEUE_SEL => self.queue_sel = value,
                    QUEUE_NUM => self.queue_num = value,
                    QUEUE_PFN => self.queue_pfn = value,
                    QUEUE_NOTIFY => self.queue_notify = value,
                    STATUS => self.status = value,
                    _ => {}
                }
                Ok(())
            }
            _ => Err(Trap::StoreAmoAccessFault(addr)),
        }
    }

    /// Returns true once per queue notification and rearms the sentinel.
    pub fn is_interrupting(&mut self) -> bool {
        if self.queue_notify != NOTIFY_IDLE {
            self.queue_notify = NOTIFY_IDLE;
            return true;
        }
        false
    }

    /// Physical address of the virtqueue (descriptor table base).
    pub fn desc_addr(&self) -> u64 {
        u64::from(self.queue_pfn) * u64::from(self.page_size)
    }

    /// Reads one byte from the disk image. Out-of-range reads return 0.
    pub fn read_disk(&self, addr: u64) -> u8 {
        self.disk.get(addr as usize).copied().unwrap_or_else(|| {
            warn!(addr, "virtio: disk read out of range");
            0
        })
    }

    /// Writes one byte to the disk image. Out-of-range writes are dropped.
    pub fn write_disk(&mut self, addr: u64, value: u8) {
        match self.disk.get_mut(addr as usize) {
            Some(byte) => *byte = value,
            None => warn!(addr, "virtio: disk write out of range"),
        }
    }

    /// Returns the next used-ring identifier (wrapping increment).
    pub fn next_id(&mut self) -> u32 {
        self.id = self.id.wrapping_add(1);
        self.id
    }

    /// Returns a view of the disk image (test and host inspection hook).
    pub fn disk(&self) -> &[u8] {
        &self.disk
    }
}

impl std::fmt::Debug for VirtioBlk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VirtioBlk")
            .field("status", &self.status)
            .field("queue_pfn", &self.queue_pfn)
            .field("disk_len", &self.disk.len())
            .finish_non_exhaustive()
    }
}

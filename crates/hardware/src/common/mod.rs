//! Common types and constants shared across the emulator.
//!
//! This module provides the building blocks every other component depends on:
//! 1. **Constants:** The fixed physical address map and paging parameters.
//! 2. **Memory access:** Classification of accesses (Fetch/Read/Write).
//! 3. **Traps:** The architectural trap type used for control flow.

/// Physical address map and paging constants.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Trap definitions.
pub mod error;

pub use constants::{DRAM_BASE, DRAM_SIZE, PAGE_SHIFT, PAGE_SIZE};
pub use data::AccessType;
pub use error::Trap;

//! Emulation driver.

/// Top-level emulator type and host hooks.
pub mod emulator;

pub use emulator::Emulator;

//! Configuration for the emulator.
//!
//! This module defines the small set of knobs the core honors. Configuration
//! is supplied as JSON by the host front-end, or use `Config::default()`.

use serde::Deserialize;

/// Default configuration constants.
mod defaults {
    /// Total size of DRAM (128 MiB). The guest-visible range is
    /// `DRAM_BASE .. DRAM_BASE + DRAM_SIZE`.
    pub const DRAM_SIZE: usize = 128 * 1024 * 1024;

    /// CLINT divider: `mtime` advances once every N calls to `step()`.
    pub const CLINT_DIVIDER: u64 = 1;
}

/// Root configuration type.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Memory sizing.
    pub memory: MemoryConfig,
    /// CLINT timer behavior.
    pub clint: ClintConfig,
}

/// DRAM configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// DRAM size in bytes.
    pub dram_size: usize,
}

/// CLINT configuration.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClintConfig {
    /// Steps per `mtime` tick. A value of 0 is treated as 1.
    pub divider: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            memory: MemoryConfig::default(),
            clint: ClintConfig::default(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            dram_size: defaults::DRAM_SIZE,
        }
    }
}

impl Default for ClintConfig {
    fn default() -> Self {
        Self {
            divider: defaults::CLINT_DIVIDER,
        }
    }
}

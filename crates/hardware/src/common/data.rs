//! Memory access types.
//!
//! Classifies memory accesses so the MMU and bus can raise the fault variant
//! that matches the operation being performed.

/// Type of memory access operation.
///
/// Used to pick between the instruction/load/store flavors of page faults and
/// access faults during address translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access.
    Fetch,

    /// Data read access (load instructions, PTE reads on behalf of a load).
    Read,

    /// Data write access (store and AMO instructions).
    Write,
}

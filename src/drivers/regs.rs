//! Register windows: bounds-checked views over 32-bit hardware cells.
//!
//! Every register access in the crate goes through [`RegisterWindow`],
//! addressed by the byte offsets the IP documentation uses.  Offsets
//! must be word-aligned and inside the mapped size; anything else is a
//! programming error and panics before touching memory.
//!
//! Implementations:
//! - [`MmioWindow`](crate::adapters::uio::MmioWindow): volatile access
//!   to an `mmap`ed UIO map.
//! - [`MemWindow`]: plain memory, for host tests and simulation.

/// Width of one register cell in bytes.
pub const CELL_BYTES: usize = 4;

/// A mapped block of 32-bit registers controlling one peripheral.
pub trait RegisterWindow {
    /// Mapped size in bytes.
    fn size(&self) -> usize;

    /// Read the register at byte `offset`.
    fn read(&self, offset: usize) -> u32;

    /// Write the register at byte `offset`.
    fn write(&mut self, offset: usize, value: u32);

    /// Read-modify-write.  Not atomic with respect to the hardware.
    fn modify(&mut self, offset: usize, f: impl FnOnce(u32) -> u32)
    where
        Self: Sized,
    {
        let value = self.read(offset);
        self.write(offset, f(value));
    }

    /// XOR `mask` into the register at `offset`.
    fn toggle(&mut self, offset: usize, mask: u32)
    where
        Self: Sized,
    {
        self.modify(offset, |v| v ^ mask);
    }
}

/// Convert a byte offset into a cell index, asserting it is in range.
#[inline]
pub fn cell_index(offset: usize, size: usize) -> usize {
    assert!(
        offset % CELL_BYTES == 0,
        "register offset {offset:#x} is not word-aligned"
    );
    assert!(
        offset + CELL_BYTES <= size,
        "register offset {offset:#x} outside {size:#x}-byte window"
    );
    offset / CELL_BYTES
}

/// Register window backed by ordinary memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemWindow {
    cells: Vec<u32>,
}

impl MemWindow {
    /// A zero-filled window of `size` bytes (rounded down to whole cells).
    pub fn new(size: usize) -> Self {
        Self {
            cells: vec![0; size / CELL_BYTES],
        }
    }

    /// Raw view of every cell, indexed by `offset / 4`.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }
}

impl RegisterWindow for MemWindow {
    fn size(&self) -> usize {
        self.cells.len() * CELL_BYTES
    }

    fn read(&self, offset: usize) -> u32 {
        self.cells[cell_index(offset, self.size())]
    }

    fn write(&mut self, offset: usize, value: u32) {
        let idx = cell_index(offset, self.size());
        self.cells[idx] = value;
    }
}

//! RAM-backed emulated EEPROM
//!
//! In-memory [`EepromStorage`] for host builds and tests. Supports:
//! - Lock enforcement (writes fail unless unlocked)
//! - Power-loss simulation after a given number of writes
//! - Corruption injection for testing fallback paths

use heapless::LinearMap;

use crate::eeprom::{EepromError, EepromStorage, VirtAddr};

/// In-memory emulated EEPROM holding up to `N` cells
#[derive(Debug, Clone)]
pub struct RamEeprom<const N: usize> {
    cells: LinearMap<VirtAddr, u16, N>,
    locked: bool,
    /// Writes still accepted before simulated power loss
    writes_left: Option<usize>,
    write_count: usize,
}

impl<const N: usize> Default for RamEeprom<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamEeprom<N> {
    /// Create an empty (never written) store, locked
    pub const fn new() -> Self {
        Self {
            cells: LinearMap::new(),
            locked: true,
            writes_left: None,
            write_count: 0,
        }
    }

    /// Check if the store currently rejects writes
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Simulate power loss after `writes` more successful writes
    ///
    /// Every later write fails with [`EepromError::Flash`] and leaves the
    /// cell untouched, as if the controller reset mid-save.
    pub fn fail_after(&mut self, writes: usize) {
        self.writes_left = Some(writes);
    }

    /// Undo [`fail_after`](Self::fail_after)
    pub fn restore_power(&mut self) {
        self.writes_left = None;
    }

    /// Number of successful writes since creation
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// Overwrite a cell directly, bypassing the lock (corruption injection)
    pub fn inject(&mut self, addr: VirtAddr, value: u16) -> Result<(), EepromError> {
        self.cells
            .insert(addr, value)
            .map(|_| ())
            .map_err(|_| EepromError::Full)
    }

    /// Peek at a cell without going through the trait
    pub fn cell(&self, addr: VirtAddr) -> Option<u16> {
        self.cells.get(&addr).copied()
    }

    /// Number of cells written at least once
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Check if no cell was ever written
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl<const N: usize> EepromStorage for RamEeprom<N> {
    fn unlock(&mut self) {
        self.locked = false;
    }

    fn lock(&mut self) {
        self.locked = true;
    }

    fn read(&mut self, addr: VirtAddr) -> Result<u16, EepromError> {
        self.cells.get(&addr).copied().ok_or(EepromError::NotFound)
    }

    fn write(&mut self, addr: VirtAddr, value: u16) -> Result<(), EepromError> {
        if self.locked {
            return Err(EepromError::Locked);
        }

        match self.writes_left {
            Some(0) => return Err(EepromError::Flash),
            Some(ref mut left) => *left -= 1,
            None => {}
        }

        self.cells
            .insert(addr, value)
            .map_err(|_| EepromError::Full)?;
        self.write_count += 1;
        Ok(())
    }
}

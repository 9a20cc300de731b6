//! Flash-backed parameter store
//!
//! The registry talks to a synchronous [`EepromStorage`]; flash on the
//! RP2040 is async. [`FlashEeprom`] keeps every cell in RAM and queues
//! writes in the order they were made. The console task flushes the
//! queue after each line, so a save reaches flash with the sentinel key
//! still written last.
//!
//! Cells live in the last 64KB of flash as sequential-storage map items
//! keyed by [`VirtAddr`].

use defmt::*;
use embassy_rp::flash::{Async, Flash};
use embassy_rp::peripherals::FLASH;
use heapless::{LinearMap, Vec};
use sequential_storage::cache::NoCache;
use sequential_storage::map;

use trimpot_core::MAX_PARAMS;
use trimpot_hal::{EepromError, EepromStorage, VirtAddr};

/// Flash storage configuration
pub const FLASH_SIZE: usize = 2 * 1024 * 1024; // 2MB flash
pub const CONFIG_PARTITION_SIZE: usize = 64 * 1024; // 64KB for parameters
pub const CONFIG_PARTITION_START: usize = FLASH_SIZE - CONFIG_PARTITION_SIZE;

/// Flash range for the parameter partition
pub const CONFIG_RANGE: core::ops::Range<u32> =
    (CONFIG_PARTITION_START as u32)..(FLASH_SIZE as u32);

/// Sentinel plus one cell per parameter
const MAX_CELLS: usize = MAX_PARAMS + 1;

/// A full save queues every cell plus two sentinel writes
const MAX_PENDING: usize = MAX_PARAMS + 2;

/// Scratch buffer for sequential-storage item encoding
const ITEM_BUF_SIZE: usize = 32;

pub type ConfigFlash = Flash<'static, FLASH, Async, FLASH_SIZE>;

/// RAM shadow of the persisted cells with an ordered write queue
pub struct FlashEeprom {
    cells: LinearMap<VirtAddr, u16, MAX_CELLS>,
    pending: Vec<(VirtAddr, u16), MAX_PENDING>,
    locked: bool,
}

impl FlashEeprom {
    /// Read `addrs` from flash into a fresh shadow
    ///
    /// Missing or unreadable cells are left out, which the registry
    /// treats as never written.
    pub async fn load<I>(flash: &mut ConfigFlash, addrs: I) -> Self
    where
        I: IntoIterator<Item = VirtAddr>,
    {
        let mut store = Self {
            cells: LinearMap::new(),
            pending: Vec::new(),
            locked: true,
        };

        for addr in addrs {
            let mut data_buffer = [0u8; ITEM_BUF_SIZE];
            let result = map::fetch_item::<VirtAddr, &[u8], _>(
                flash,
                CONFIG_RANGE,
                &mut NoCache::new(),
                &mut data_buffer,
                &addr,
            )
            .await;

            match result {
                Ok(Some(&[lo, hi])) => {
                    let value = u16::from_le_bytes([lo, hi]);
                    trace!("Cell {} = {}", addr.as_u16(), value);
                    if store.cells.insert(addr, value).is_err() {
                        warn!("Too many cells, ignoring {}", addr.as_u16());
                    }
                }
                Ok(Some(_)) => warn!("Cell {} has unexpected size", addr.as_u16()),
                Ok(None) => trace!("Cell {} not found", addr.as_u16()),
                Err(_) => warn!("Failed to read cell {}", addr.as_u16()),
            }
        }

        info!("Loaded {} cells from flash", store.cells.len());
        store
    }

    /// Check if writes are waiting for [`flush`](Self::flush)
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Write queued cells to flash in order
    ///
    /// Stops at the first failure and keeps it and every later write
    /// queued, so a retry never reorders them. Returns the number of
    /// cells written.
    pub async fn flush(&mut self, flash: &mut ConfigFlash) -> Result<usize, EepromError> {
        let mut written = 0;
        let mut result = Ok(());

        for &(addr, value) in self.pending.iter() {
            let mut data_buffer = [0u8; ITEM_BUF_SIZE];
            let bytes = value.to_le_bytes();
            let stored = map::store_item(
                flash,
                CONFIG_RANGE,
                &mut NoCache::new(),
                &mut data_buffer,
                &addr,
                &&bytes[..],
            )
            .await;

            if stored.is_err() {
                result = Err(EepromError::Flash);
                break;
            }
            written += 1;
        }

        let remaining = self.pending.len() - written;
        self.pending.rotate_left(written);
        self.pending.truncate(remaining);

        result.map(|()| written)
    }
}

impl EepromStorage for FlashEeprom {
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
        self.pending
            .push((addr, value))
            .map_err(|_| EepromError::Full)?;
        self.cells
            .insert(addr, value)
            .map_err(|_| EepromError::Full)?;
        Ok(())
    }
}

//! Emulated EEPROM abstractions
//!
//! Provides the trait for a persistent store of 16-bit cells addressed by
//! a virtual address, the way sector-emulated EEPROM on small MCUs works.
//! Writes must be bracketed by [`EepromStorage::unlock`] and
//! [`EepromStorage::lock`]; [`Unlocked`] does the bracketing for a scope.

use core::ops::{Deref, DerefMut};

/// Virtual address of one 16-bit cell
///
/// Address 0 is conventionally reserved for the "store initialized"
/// marker by the parameter registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VirtAddr(pub u16);

impl VirtAddr {
    /// Create an address from its raw value
    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    /// Get the raw address value
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl From<u16> for VirtAddr {
    fn from(raw: u16) -> Self {
        Self(raw)
    }
}

/// Errors from emulated EEPROM operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EepromError {
    /// Flash operation failed
    Flash,
    /// Cell was never written
    NotFound,
    /// Data corrupted or invalid
    Corrupted,
    /// Storage is full
    Full,
    /// Write attempted while the store is locked
    Locked,
}

impl core::fmt::Display for EepromError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let text = match self {
            EepromError::Flash => "flash operation failed",
            EepromError::NotFound => "cell not found",
            EepromError::Corrupted => "cell corrupted",
            EepromError::Full => "storage full",
            EepromError::Locked => "storage locked",
        };
        f.write_str(text)
    }
}

/// Emulated EEPROM trait
///
/// Implementations are synchronous: a console line is processed to
/// completion without suspending, so the registry never awaits storage.
/// Firmware backed by async flash keeps a RAM shadow and flushes it
/// afterwards, preserving write order.
pub trait EepromStorage {
    /// Allow writes until the next [`lock`](Self::lock)
    fn unlock(&mut self) {}

    /// Forbid writes
    fn lock(&mut self) {}

    /// Read the cell at `addr`
    ///
    /// Returns [`EepromError::NotFound`] if the cell was never written.
    fn read(&mut self, addr: VirtAddr) -> Result<u16, EepromError>;

    /// Write `value` into the cell at `addr`
    fn write(&mut self, addr: VirtAddr, value: u16) -> Result<(), EepromError>;
}

impl<T: EepromStorage + ?Sized> EepromStorage for &mut T {
    fn unlock(&mut self) {
        (**self).unlock()
    }

    fn lock(&mut self) {
        (**self).lock()
    }

    fn read(&mut self, addr: VirtAddr) -> Result<u16, EepromError> {
        (**self).read(addr)
    }

    fn write(&mut self, addr: VirtAddr, value: u16) -> Result<(), EepromError> {
        (**self).write(addr, value)
    }
}

/// Unlocked scope over a store
///
/// Unlocks on creation and locks again when dropped, so every early
/// return inside a save still relocks the flash.
pub struct Unlocked<'s, S: EepromStorage + ?Sized> {
    store: &'s mut S,
}

impl<'s, S: EepromStorage + ?Sized> Unlocked<'s, S> {
    /// Unlock `store` for the lifetime of the returned guard
    pub fn new(store: &'s mut S) -> Self {
        store.unlock();
        Self { store }
    }
}

impl<S: EepromStorage + ?Sized> Deref for Unlocked<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.store
    }
}

impl<S: EepromStorage + ?Sized> DerefMut for Unlocked<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.store
    }
}

impl<S: EepromStorage + ?Sized> Drop for Unlocked<'_, S> {
    fn drop(&mut self) {
        self.store.lock();
    }
}

// Implement the sequential-storage Key trait when the feature is enabled
#[cfg(feature = "sequential-storage")]
impl sequential_storage::map::Key for VirtAddr {
    fn serialize_into(
        &self,
        buffer: &mut [u8],
    ) -> Result<usize, sequential_storage::map::SerializationError> {
        if buffer.len() < 2 {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        buffer[..2].copy_from_slice(&self.0.to_le_bytes());
        Ok(2)
    }

    fn deserialize_from(
        buffer: &[u8],
    ) -> Result<(Self, usize), sequential_storage::map::SerializationError> {
        if buffer.len() < 2 {
            return Err(sequential_storage::map::SerializationError::BufferTooSmall);
        }
        Ok((VirtAddr(u16::from_le_bytes([buffer[0], buffer[1]])), 2))
    }
}

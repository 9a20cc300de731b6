//! Watch list
//!
//! Ordered, duplicate-free set of parameter indices reported
//! periodically without being asked. Toggling an index appends it, or
//! removes it and shifts later entries left, so report order is always
//! the order the operator added them in.

use core::fmt;

use heapless::Vec;
use trimpot_protocol::{write_watch_line, WatchEntry};

use crate::registry::{Registry, MAX_PARAMS};

/// Maximum number of watched indices
pub const MAX_WATCHED: usize = MAX_PARAMS;

/// Result of [`WatchList::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Toggle {
    Added,
    Removed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WatchError {
    /// Already [`MAX_WATCHED`] entries
    Full,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    indices: Vec<usize, MAX_WATCHED>,
}

impl WatchList {
    pub const fn new() -> Self {
        Self {
            indices: Vec::new(),
        }
    }

    /// Add `index` if absent, remove it if present
    pub fn toggle(&mut self, index: usize) -> Result<Toggle, WatchError> {
        match self.indices.iter().position(|&i| i == index) {
            Some(pos) => {
                self.indices.remove(pos);
                Ok(Toggle::Removed)
            }
            None => {
                self.indices.push(index).map_err(|_| WatchError::Full)?;
                Ok(Toggle::Added)
            }
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// Write one `NAME:value` line for everything watched
    ///
    /// Writes nothing and returns `Ok(false)` when the list is empty.
    pub fn report<W: fmt::Write + ?Sized>(
        &self,
        registry: &Registry<'_>,
        out: &mut W,
    ) -> Result<bool, fmt::Error> {
        let entries = self.iter().filter_map(|index| {
            let param = registry.param(index).ok()?;
            Some(WatchEntry {
                name: param.name,
                value: param.to_external(param.read()),
            })
        });
        write_watch_line(out, entries)
    }
}

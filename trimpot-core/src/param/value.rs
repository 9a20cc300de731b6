//! Typed access to controller-owned storage
//!
//! A parameter never owns its value. It holds a [`ValueRef`] into memory
//! owned by the controller (control-model inputs, measured speed, ADC
//! buffers). The variant carries the width and signedness, so reads
//! sign-extend correctly and writes truncate to the cell width.

use portable_atomic::{
    AtomicI16, AtomicI32, AtomicI8, AtomicU16, AtomicU32, AtomicU8, Ordering,
};

/// Physical width/signedness of a backing cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataType {
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
}

/// Non-owning reference to one backing cell
#[derive(Debug, Clone, Copy)]
pub enum ValueRef<'a> {
    U8(&'a AtomicU8),
    U16(&'a AtomicU16),
    U32(&'a AtomicU32),
    I8(&'a AtomicI8),
    I16(&'a AtomicI16),
    I32(&'a AtomicI32),
}

impl ValueRef<'_> {
    /// Width/signedness of the referenced cell
    pub fn datatype(&self) -> DataType {
        match self {
            ValueRef::U8(_) => DataType::U8,
            ValueRef::U16(_) => DataType::U16,
            ValueRef::U32(_) => DataType::U32,
            ValueRef::I8(_) => DataType::I8,
            ValueRef::I16(_) => DataType::I16,
            ValueRef::I32(_) => DataType::I32,
        }
    }

    /// Load the cell, widened to `i32`
    ///
    /// `U32` cells above `i32::MAX` wrap into negative values.
    pub fn load(&self) -> i32 {
        match self {
            ValueRef::U8(cell) => cell.load(Ordering::Relaxed) as i32,
            ValueRef::U16(cell) => cell.load(Ordering::Relaxed) as i32,
            ValueRef::U32(cell) => cell.load(Ordering::Relaxed) as i32,
            ValueRef::I8(cell) => cell.load(Ordering::Relaxed) as i32,
            ValueRef::I16(cell) => cell.load(Ordering::Relaxed) as i32,
            ValueRef::I32(cell) => cell.load(Ordering::Relaxed),
        }
    }

    /// Store `value`, truncated to the cell width
    pub fn store(&self, value: i32) {
        match self {
            ValueRef::U8(cell) => cell.store(value as u8, Ordering::Relaxed),
            ValueRef::U16(cell) => cell.store(value as u16, Ordering::Relaxed),
            ValueRef::U32(cell) => cell.store(value as u32, Ordering::Relaxed),
            ValueRef::I8(cell) => cell.store(value as i8, Ordering::Relaxed),
            ValueRef::I16(cell) => cell.store(value as i16, Ordering::Relaxed),
            ValueRef::I32(cell) => cell.store(value, Ordering::Relaxed),
        }
    }
}

macro_rules! value_ref_from {
    ($($atomic:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<&'a $atomic> for ValueRef<'a> {
                fn from(cell: &'a $atomic) -> Self {
                    ValueRef::$variant(cell)
                }
            }
        )*
    };
}

value_ref_from! {
    AtomicU8 => U8,
    AtomicU16 => U16,
    AtomicU32 => U32,
    AtomicI8 => I8,
    AtomicI16 => I16,
    AtomicI32 => I32,
}

/// Primary and optional mirrored storage of one logical value
///
/// With both references set the value lives on two independent
/// sub-controllers: reads average them, writes go to both.
#[derive(Debug, Clone, Copy, Default)]
pub struct Backing<'a> {
    pub primary: Option<ValueRef<'a>>,
    pub secondary: Option<ValueRef<'a>>,
}

impl<'a> Backing<'a> {
    /// No backing memory (derived or informational entries)
    pub const fn none() -> Self {
        Self {
            primary: None,
            secondary: None,
        }
    }

    /// Check if at least one reference is present
    pub fn is_backed(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }

    fn cells(&self) -> impl Iterator<Item = &ValueRef<'a>> {
        self.primary.iter().chain(self.secondary.iter())
    }

    /// Average of the present cells, `None` when unbacked
    ///
    /// Integer division truncates toward zero. Parameters that need the
    /// sum of both sides double their `div` factor instead.
    pub fn read(&self) -> Option<i32> {
        let mut sum: i64 = 0;
        let mut count: i64 = 0;
        for cell in self.cells() {
            sum += cell.load() as i64;
            count += 1;
        }
        (count > 0).then(|| (sum / count) as i32)
    }

    /// Store `value` into every present cell
    ///
    /// Returns `false` without touching memory if the primary cell
    /// already holds `value`, or if nothing is backed.
    pub fn write(&self, value: i32) -> bool {
        if !self.is_backed() {
            return false;
        }
        if let Some(primary) = &self.primary {
            if primary.load() == value {
                return false;
            }
        }
        for cell in self.cells() {
            cell.store(value);
        }
        true
    }
}

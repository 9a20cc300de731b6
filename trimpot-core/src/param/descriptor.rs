//! Parameter descriptors
//!
//! One [`ParamDescriptor`] per named value. Descriptors are declared once
//! at startup with the builder methods and never change afterwards; the
//! value itself lives in controller memory behind [`Backing`].

use core::fmt;

use trimpot_hal::VirtAddr;

use super::convert::Scaling;
use super::value::{Backing, DataType, ValueRef};

/// Whether the operator may change a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamKind {
    /// Operator-configurable and bounded
    Parameter,
    /// Read-only telemetry; bounds are ignored
    Variable,
}

/// Side effect run after a value actually changed
///
/// Typically recomputes something derived from the written value.
/// Any `Fn()` closure is a hook.
pub trait WriteHook {
    fn after_write(&self);
}

impl<F: Fn()> WriteHook for F {
    fn after_write(&self) {
        self()
    }
}

/// Description of one registered value
#[derive(Clone, Copy)]
pub struct ParamDescriptor<'a> {
    pub name: &'static str,
    pub kind: ParamKind,
    pub backing: Backing<'a>,
    /// Persistent cell; `None` means never persisted
    pub slot: Option<VirtAddr>,
    /// Fallback internal value
    pub init: i32,
    /// Inclusive lower bound, external representation
    pub min: i32,
    /// Inclusive upper bound, external representation
    pub max: i32,
    pub scaling: Scaling,
    pub on_write: Option<&'a dyn WriteHook>,
    pub help: &'static str,
}

impl<'a> ParamDescriptor<'a> {
    const fn new(kind: ParamKind, name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            kind,
            backing: Backing::none(),
            slot: None,
            init: 0,
            min: 0,
            max: 0,
            scaling: Scaling::NONE,
            on_write: None,
            help,
        }
    }

    /// Declare an operator-configurable parameter
    pub const fn parameter(name: &'static str, help: &'static str) -> Self {
        Self::new(ParamKind::Parameter, name, help)
    }

    /// Declare a read-only variable
    pub const fn variable(name: &'static str, help: &'static str) -> Self {
        Self::new(ParamKind::Variable, name, help)
    }

    /// Set the primary backing cell
    pub fn backed_by(mut self, cell: impl Into<ValueRef<'a>>) -> Self {
        self.backing.primary = Some(cell.into());
        self
    }

    /// Set the mirrored cell on the second sub-controller
    pub fn mirrored_by(mut self, cell: impl Into<ValueRef<'a>>) -> Self {
        self.backing.secondary = Some(cell.into());
        self
    }

    /// Persist the value in `slot`
    pub fn persisted_at(mut self, slot: u16) -> Self {
        self.slot = Some(VirtAddr(slot));
        self
    }

    pub fn with_init(mut self, init: i32) -> Self {
        self.init = init;
        self
    }

    pub fn with_range(mut self, min: i32, max: i32) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_div(mut self, div: i32) -> Self {
        self.scaling.div = div;
        self
    }

    pub fn with_mul(mut self, mul: i32) -> Self {
        self.scaling.mul = mul;
        self
    }

    pub fn with_fix(mut self, fix: u8) -> Self {
        self.scaling.fix = fix;
        self
    }

    pub fn on_write(mut self, hook: &'a dyn WriteHook) -> Self {
        self.on_write = Some(hook);
        self
    }

    /// Check if this is a read-only variable
    pub fn is_variable(&self) -> bool {
        self.kind == ParamKind::Variable
    }

    /// Width of the primary cell, `None` for unbacked entries
    pub fn datatype(&self) -> Option<DataType> {
        self.backing.primary.as_ref().map(ValueRef::datatype)
    }

    /// Current internal value
    ///
    /// Averages dual-channel cells. Unbacked entries report `init`.
    pub fn read(&self) -> i32 {
        self.backing.read().unwrap_or(self.init)
    }

    /// Store an internal value, without bounds checking
    ///
    /// Runs the write hook and returns `true` only if the stored value
    /// changed.
    pub fn write(&self, internal: i32) -> bool {
        if !self.backing.write(internal) {
            return false;
        }
        if let Some(hook) = self.on_write {
            hook.after_write();
        }
        true
    }

    pub fn to_internal(&self, external: i32) -> i32 {
        self.scaling.to_internal(external)
    }

    pub fn to_external(&self, internal: i32) -> i32 {
        self.scaling.to_external(internal)
    }

    /// Check an external value against the bounds
    ///
    /// Variables accept anything.
    pub fn in_range(&self, external: i32) -> bool {
        self.is_variable() || (self.min..=self.max).contains(&external)
    }
}

impl fmt::Debug for ParamDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("backing", &self.backing)
            .field("slot", &self.slot)
            .field("init", &self.init)
            .field("min", &self.min)
            .field("max", &self.max)
            .field("scaling", &self.scaling)
            .field("on_write", &self.on_write.is_some())
            .finish()
    }
}

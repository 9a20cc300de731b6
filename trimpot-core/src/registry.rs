//! Parameter and command registry
//!
//! The registry borrows the two declaration tables built at startup and
//! exposes lookup by name prefix plus the external-facing get/set
//! operations. Persistence lives in [`crate::persist`].

use core::fmt;

use trimpot_hal::{EepromError, VirtAddr};

use crate::console::CommandDescriptor;
use crate::param::{ParamDescriptor, ParamKind};
use crate::persist::SENTINEL_ADDR;

/// Maximum number of parameter descriptors
pub const MAX_PARAMS: usize = 64;

/// Rejected declaration tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistryError {
    /// More than [`MAX_PARAMS`] descriptors
    TooManyParameters,
    /// A parameter claims the sentinel slot
    ReservedSlot { index: usize },
    /// Two parameters share one persistent slot
    DuplicateSlot { first: usize, second: usize },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::TooManyParameters => {
                write!(f, "more than {} parameters", MAX_PARAMS)
            }
            RegistryError::ReservedSlot { index } => {
                write!(f, "parameter {} uses the reserved slot", index)
            }
            RegistryError::DuplicateSlot { first, second } => {
                write!(f, "parameters {} and {} share a slot", first, second)
            }
        }
    }
}

/// Errors from parameter access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParamError {
    /// No descriptor at this index
    UnknownIndex,
    /// External value outside `[min, max]`
    OutOfRange { value: i32, min: i32, max: i32 },
    /// Persistent store failure
    Storage(EepromError),
}

impl From<EepromError> for ParamError {
    fn from(err: EepromError) -> Self {
        ParamError::Storage(err)
    }
}

impl fmt::Display for ParamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamError::UnknownIndex => f.write_str("unknown parameter index"),
            ParamError::OutOfRange { value, min, max } => {
                write!(f, "Value {} out of range [min:{} max:{}]", value, min, max)
            }
            ParamError::Storage(err) => write!(f, "storage: {}", err),
        }
    }
}

/// Literal prefix rule shared by both tables
///
/// The declared name must be a byte prefix of `span` and strictly
/// shorter than it, so a bare name with no terminator never matches.
fn name_matches(name: &str, span: &[u8]) -> bool {
    let name = name.as_bytes();
    name.len() < span.len() && span.starts_with(name)
}

/// Immutable view over the declaration tables
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a> {
    params: &'a [ParamDescriptor<'a>],
    commands: &'a [CommandDescriptor],
}

impl<'a> Registry<'a> {
    /// Validate and wrap the declaration tables
    pub fn new(
        params: &'a [ParamDescriptor<'a>],
        commands: &'a [CommandDescriptor],
    ) -> Result<Self, RegistryError> {
        if params.len() > MAX_PARAMS {
            return Err(RegistryError::TooManyParameters);
        }

        for (index, param) in params.iter().enumerate() {
            let Some(slot) = param.slot else { continue };
            if slot == SENTINEL_ADDR {
                return Err(RegistryError::ReservedSlot { index });
            }
            if let Some(first) = params[..index].iter().position(|p| p.slot == Some(slot)) {
                return Err(RegistryError::DuplicateSlot {
                    first,
                    second: index,
                });
            }
        }

        Ok(Self { params, commands })
    }

    pub fn params(&self) -> &'a [ParamDescriptor<'a>] {
        self.params
    }

    pub fn commands(&self) -> &'a [CommandDescriptor] {
        self.commands
    }

    /// Number of parameter descriptors
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Descriptor at `index`
    pub fn param(&self, index: usize) -> Result<&'a ParamDescriptor<'a>, ParamError> {
        self.params.get(index).ok_or(ParamError::UnknownIndex)
    }

    /// Index of the first parameter whose name prefixes `span`
    ///
    /// Declaration order breaks ties: a name that is a prefix of a later
    /// name shadows it.
    pub fn find_param(&self, span: &[u8]) -> Option<usize> {
        self.params.iter().position(|p| name_matches(p.name, span))
    }

    /// Index of the first command whose name prefixes `span`
    pub fn find_command(&self, span: &[u8]) -> Option<usize> {
        self.commands.iter().position(|c| name_matches(c.name, span))
    }

    /// Index of the parameter persisted at `slot`
    pub fn find_slot(&self, slot: VirtAddr) -> Option<usize> {
        self.params.iter().position(|p| p.slot == Some(slot))
    }

    pub fn get_internal(&self, index: usize) -> Result<i32, ParamError> {
        Ok(self.param(index)?.read())
    }

    /// Current value in operator units
    pub fn get_external(&self, index: usize) -> Result<i32, ParamError> {
        let param = self.param(index)?;
        Ok(param.to_external(param.read()))
    }

    /// Store an internal value without bounds checking
    ///
    /// Returns whether the stored value changed.
    pub fn set_internal(&self, index: usize, internal: i32) -> Result<bool, ParamError> {
        Ok(self.param(index)?.write(internal))
    }

    /// Store a value given in operator units
    ///
    /// Parameters are checked against `[min, max]` first; a rejected
    /// value leaves memory untouched. Variables are not checked.
    pub fn set_external(&self, index: usize, external: i32) -> Result<bool, ParamError> {
        let param = self.param(index)?;
        if !param.in_range(external) {
            return Err(ParamError::OutOfRange {
                value: external,
                min: param.min,
                max: param.max,
            });
        }
        Ok(param.write(param.to_internal(external)))
    }

    /// Step the external value by one, wrapping from `max` to `min`
    ///
    /// Returns the new external value.
    pub fn increment(&self, index: usize) -> Result<i32, ParamError> {
        let param = self.param(index)?;
        let current = param.to_external(param.read());
        let next = if current < param.max {
            current + 1
        } else {
            param.min
        };
        self.set_external(index, next)?;
        Ok(next)
    }

    /// Parameters declared with a persistent slot, in declaration order
    pub fn persisted(&self) -> impl Iterator<Item = (usize, VirtAddr)> + 'a {
        self.params
            .iter()
            .enumerate()
            .filter_map(|(index, p)| p.slot.map(|slot| (index, slot)))
    }

    /// Indices of the given kind, in declaration order
    pub fn indices_of(&self, kind: ParamKind) -> impl Iterator<Item = usize> + 'a {
        self.params
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.kind == kind)
            .map(|(index, _)| index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portable_atomic::{AtomicI16, AtomicU8, Ordering};

    #[test]
    fn test_prefix_lookup() {
        let params = [
            ParamDescriptor::parameter("CTRL_MOD", ""),
            ParamDescriptor::parameter("CTRL_TYP", ""),
        ];
        let registry = Registry::new(&params, &[]).unwrap();

        assert_eq!(registry.find_param(b"CTRL_TYP\r"), Some(1));
        assert_eq!(registry.find_param(b"CTRL_MOD 3\r"), Some(0));
        // Exact length never matches
        assert_eq!(registry.find_param(b"CTRL_MOD"), None);
        assert_eq!(registry.find_param(b""), None);
        assert_eq!(registry.find_param(b"CTRL\r"), None);
    }

    #[test]
    fn test_earlier_prefix_shadows_later_name() {
        let params = [
            ParamDescriptor::variable("SPD", ""),
            ParamDescriptor::variable("SPD_AVG", ""),
        ];
        let registry = Registry::new(&params, &[]).unwrap();

        assert_eq!(registry.find_param(b"SPD_AVG\r"), Some(0));
    }

    #[test]
    fn test_rejects_reserved_and_duplicate_slots() {
        let params = [ParamDescriptor::parameter("A", "").persisted_at(0)];
        assert_eq!(
            Registry::new(&params, &[]).unwrap_err(),
            RegistryError::ReservedSlot { index: 0 }
        );

        let params = [
            ParamDescriptor::parameter("A", "").persisted_at(3),
            ParamDescriptor::parameter("B", ""),
            ParamDescriptor::parameter("C", "").persisted_at(3),
        ];
        assert_eq!(
            Registry::new(&params, &[]).unwrap_err(),
            RegistryError::DuplicateSlot {
                first: 0,
                second: 2
            }
        );
    }

    #[test]
    fn test_rejects_oversized_table() {
        let params = [ParamDescriptor::variable("X", ""); MAX_PARAMS + 1];
        assert_eq!(
            Registry::new(&params, &[]).unwrap_err(),
            RegistryError::TooManyParameters
        );
    }

    #[test]
    fn test_set_external_out_of_range_leaves_value() {
        let left = AtomicI16::new(240);
        let right = AtomicI16::new(240);
        let params = [ParamDescriptor::parameter("I_MOT_MAX", "")
            .backed_by(&left)
            .mirrored_by(&right)
            .with_range(1, 40)
            .with_div(50)
            .with_fix(4)];
        let registry = Registry::new(&params, &[]).unwrap();

        assert_eq!(
            registry.set_external(0, 999),
            Err(ParamError::OutOfRange {
                value: 999,
                min: 1,
                max: 40
            })
        );
        assert_eq!(left.load(Ordering::Relaxed), 240);
        assert_eq!(right.load(Ordering::Relaxed), 240);

        assert_eq!(registry.set_external(0, 20), Ok(true));
        assert_eq!(left.load(Ordering::Relaxed), 16_000);
        assert_eq!(right.load(Ordering::Relaxed), 16_000);
        assert_eq!(registry.get_external(0), Ok(20));
    }

    #[test]
    fn test_variable_set_skips_bounds() {
        let cell = AtomicI16::new(0);
        let params = [ParamDescriptor::variable("SPD_AVG", "").backed_by(&cell)];
        let registry = Registry::new(&params, &[]).unwrap();

        assert_eq!(registry.set_external(0, -700), Ok(true));
        assert_eq!(registry.get_internal(0), Ok(-700));
    }

    #[test]
    fn test_increment_wraps_to_min() {
        let cell = AtomicU8::new(2);
        let params = [ParamDescriptor::parameter("CTRL_MOD", "")
            .backed_by(&cell)
            .with_range(1, 3)];
        let registry = Registry::new(&params, &[]).unwrap();

        assert_eq!(registry.increment(0), Ok(3));
        assert_eq!(registry.increment(0), Ok(1));
        assert_eq!(registry.increment(0), Ok(2));
        assert_eq!(cell.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_unknown_index() {
        let registry = Registry::new(&[], &[]).unwrap();
        assert_eq!(registry.get_external(0), Err(ParamError::UnknownIndex));
        assert!(registry.is_empty());
    }
}

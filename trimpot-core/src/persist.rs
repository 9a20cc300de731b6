//! Persistent store synchronization
//!
//! Each persisted parameter owns one 16-bit cell. A sentinel cell at
//! [`SENTINEL_ADDR`] holds [`SENTINEL_KEY`] once a complete save went
//! through; persisted cells are only trusted while it does.
//!
//! A save writes in this order:
//!
//! 1. sentinel <- [`SENTINEL_ERASED`]
//! 2. every persisted cell
//! 3. sentinel <- [`SENTINEL_KEY`]
//!
//! Power lost anywhere before step 3 leaves the sentinel invalid, and the
//! next boot falls back to the declared init values.

use trimpot_hal::{EepromError, EepromStorage, Unlocked, VirtAddr};

use crate::param::ParamKind;
use crate::registry::{ParamError, Registry};

/// Cell holding the "store initialized" marker
pub const SENTINEL_ADDR: VirtAddr = VirtAddr(0);

/// Marker value of a completely saved store
pub const SENTINEL_KEY: u16 = 0x1003;

/// Marker value while a save is in progress
pub const SENTINEL_ERASED: u16 = 0;

/// Check whether the store holds a complete save
pub fn is_initialized<S: EepromStorage + ?Sized>(store: &mut S) -> bool {
    matches!(store.read(SENTINEL_ADDR), Ok(SENTINEL_KEY))
}

impl Registry<'_> {
    /// Internal value a parameter should start from
    ///
    /// The persisted cell when the store is initialized, otherwise the
    /// declared init. Unreadable cells also fall back to init. Does not
    /// touch the live value.
    pub fn init_internal<S: EepromStorage + ?Sized>(
        &self,
        index: usize,
        store: &mut S,
    ) -> Result<i32, ParamError> {
        let param = self.param(index)?;
        let Some(slot) = param.slot else {
            return Ok(param.init);
        };
        if !is_initialized(store) {
            return Ok(param.init);
        }
        // Cells are 16 bits wide; sign-extend signed values back
        Ok(store
            .read(slot)
            .map_or(param.init, |cell| cell as i16 as i32))
    }

    /// [`init_internal`](Self::init_internal) in operator units
    pub fn init_external<S: EepromStorage + ?Sized>(
        &self,
        index: usize,
        store: &mut S,
    ) -> Result<i32, ParamError> {
        let param = self.param(index)?;
        Ok(param.to_external(self.init_internal(index, store)?))
    }

    /// Load the init value of one parameter into live memory
    ///
    /// Returns whether the live value changed.
    pub fn apply_init<S: EepromStorage + ?Sized>(
        &self,
        index: usize,
        store: &mut S,
    ) -> Result<bool, ParamError> {
        let value = self.init_internal(index, store)?;
        self.set_internal(index, value)
    }

    /// Load every parameter at boot
    ///
    /// Variables are left alone. Returns the number of values changed.
    pub fn load_all<S: EepromStorage + ?Sized>(&self, store: &mut S) -> usize {
        self.indices_of(ParamKind::Parameter)
            .filter(|&index| matches!(self.apply_init(index, &mut *store), Ok(true)))
            .count()
    }

    /// Persist every parameter that declares a slot
    ///
    /// Runs inside one unlocked section and writes the sentinel key last.
    /// Returns the number of parameter cells written.
    pub fn save_all<S: EepromStorage + ?Sized>(&self, store: &mut S) -> Result<usize, EepromError> {
        let mut store = Unlocked::new(store);

        store.write(SENTINEL_ADDR, SENTINEL_ERASED)?;
        let mut saved = 0;
        for (index, slot) in self.persisted() {
            let value = self.params()[index].read();
            store.write(slot, value as u16)?;
            saved += 1;
        }
        store.write(SENTINEL_ADDR, SENTINEL_KEY)?;

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::ParamDescriptor;
    use portable_atomic::{AtomicI16, AtomicU8, Ordering};
    use trimpot_hal::RamEeprom;

    struct Cells {
        mode: AtomicU8,
        current: AtomicI16,
        speed: AtomicI16,
        offset: AtomicI16,
    }

    impl Cells {
        fn new() -> Self {
            Self {
                mode: AtomicU8::new(0),
                current: AtomicI16::new(0),
                speed: AtomicI16::new(0),
                offset: AtomicI16::new(0),
            }
        }
    }

    fn table(cells: &Cells) -> [ParamDescriptor<'_>; 4] {
        [
            ParamDescriptor::parameter("CTRL_MOD", "")
                .backed_by(&cells.mode)
                .with_init(1)
                .with_range(1, 3),
            ParamDescriptor::parameter("I_MOT_MAX", "")
                .backed_by(&cells.current)
                .persisted_at(1)
                .with_init(12_000)
                .with_range(1, 40)
                .with_div(50)
                .with_fix(4),
            ParamDescriptor::parameter("N_MOT_MAX", "")
                .backed_by(&cells.speed)
                .persisted_at(2)
                .with_init(16_000)
                .with_range(10, 2000)
                .with_fix(4),
            ParamDescriptor::parameter("OFFSET", "")
                .backed_by(&cells.offset)
                .persisted_at(3)
                .with_init(0)
                .with_range(-100, 100),
        ]
    }

    #[test]
    fn test_fresh_store_uses_init() {
        let cells = Cells::new();
        let params = table(&cells);
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<8>::new();

        assert!(!is_initialized(&mut store));
        for (index, param) in params.iter().enumerate() {
            assert_eq!(registry.init_internal(index, &mut store), Ok(param.init));
        }
        assert_eq!(registry.init_external(1, &mut store), Ok(15));
    }

    #[test]
    fn test_save_then_cold_init() {
        let cells = Cells::new();
        let params = table(&cells);
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<8>::new();

        registry.load_all(&mut store);
        registry.set_external(0, 3).unwrap();
        registry.set_external(1, 20).unwrap();
        registry.set_external(2, 500).unwrap();
        registry.set_external(3, -42).unwrap();

        assert_eq!(registry.save_all(&mut store), Ok(3));
        assert!(store.is_locked());
        assert_eq!(store.cell(SENTINEL_ADDR), Some(SENTINEL_KEY));

        // Cold boot: fresh memory, same store
        let cold = Cells::new();
        let params = table(&cold);
        let registry = Registry::new(&params, &[]).unwrap();
        registry.load_all(&mut store);

        // Not persisted: back to init
        assert_eq!(registry.get_external(0), Ok(1));
        assert_eq!(registry.get_external(1), Ok(20));
        assert_eq!(registry.get_external(2), Ok(500));
        // Negative values survive the 16-bit cell
        assert_eq!(registry.get_external(3), Ok(-42));
    }

    #[test]
    fn test_power_loss_before_sentinel_falls_back_to_init() {
        let cells = Cells::new();
        let params = table(&cells);
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<8>::new();

        registry.load_all(&mut store);
        registry.set_external(1, 30).unwrap();
        registry.set_external(2, 1500).unwrap();

        // Erase marker plus all three cells, then the key write is lost
        store.fail_after(4);
        assert_eq!(registry.save_all(&mut store), Err(EepromError::Flash));
        assert!(store.is_locked());
        store.restore_power();

        assert_eq!(store.cell(VirtAddr(1)), Some(24_000));
        for (index, param) in params.iter().enumerate() {
            assert_eq!(registry.init_internal(index, &mut store), Ok(param.init));
        }
    }

    #[test]
    fn test_interrupted_resave_invalidates_previous_save() {
        let cells = Cells::new();
        let params = table(&cells);
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<8>::new();

        registry.load_all(&mut store);
        registry.set_external(1, 30).unwrap();
        registry.save_all(&mut store).unwrap();
        assert_eq!(registry.init_external(1, &mut store), Ok(30));

        registry.set_external(1, 5).unwrap();
        store.fail_after(2);
        assert!(registry.save_all(&mut store).is_err());
        store.restore_power();

        assert_eq!(registry.init_internal(1, &mut store), Ok(12_000));
    }

    #[test]
    fn test_stale_sentinel_is_not_trusted() {
        let cells = Cells::new();
        let params = table(&cells);
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<8>::new();

        store.inject(SENTINEL_ADDR, 0xBEEF).unwrap();
        store.inject(VirtAddr(2), 320).unwrap();
        assert_eq!(registry.init_internal(2, &mut store), Ok(16_000));

        store.inject(SENTINEL_ADDR, SENTINEL_KEY).unwrap();
        assert_eq!(registry.init_internal(2, &mut store), Ok(320));
        // Missing cell under a valid sentinel still falls back
        assert_eq!(registry.init_internal(3, &mut store), Ok(0));
    }

    #[test]
    fn test_apply_init_leaves_variables_alone() {
        let cell = AtomicI16::new(77);
        let params = [ParamDescriptor::variable("SPD_AVG", "").backed_by(&cell)];
        let registry = Registry::new(&params, &[]).unwrap();
        let mut store = RamEeprom::<2>::new();

        assert_eq!(registry.load_all(&mut store), 0);
        assert_eq!(cell.load(Ordering::Relaxed), 77);

        // Explicit init still applies
        assert_eq!(registry.apply_init(0, &mut store), Ok(true));
        assert_eq!(cell.load(Ordering::Relaxed), 0);
    }
}

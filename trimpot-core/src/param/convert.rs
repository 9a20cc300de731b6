//! External/internal unit conversion
//!
//! The operator sees the *external* value (RPM, amperes, value x10); the
//! controller stores the *internal* one (ADC counts, fixed-point). The
//! factors are applied in a fixed order:
//!
//! ```text
//! external -> internal:  v *= div,  v <<= fix,  v /= mul
//! internal -> external:  v *= mul,  v /= div,   v >>= fix
//! ```
//!
//! A zero factor is skipped. All arithmetic is `i32` and wraps instead of
//! panicking on overflow.

/// Conversion factors of one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scaling {
    /// Multiplier on the way in, divisor on the way out
    pub div: i32,
    /// Divisor on the way in, multiplier on the way out
    pub mul: i32,
    /// Binary point position of the internal fixed-point value
    pub fix: u8,
}

impl Scaling {
    /// Identity conversion
    pub const NONE: Self = Self {
        div: 0,
        mul: 0,
        fix: 0,
    };

    /// Translate an operator-facing value to the stored representation
    pub const fn to_internal(&self, external: i32) -> i32 {
        let mut value = external;
        if self.div != 0 {
            value = value.wrapping_mul(self.div);
        }
        if self.fix != 0 {
            value = value.wrapping_shl(self.fix as u32);
        }
        if self.mul != 0 {
            value = value.wrapping_div(self.mul);
        }
        value
    }

    /// Translate a stored value to the operator-facing representation
    pub const fn to_external(&self, internal: i32) -> i32 {
        let mut value = internal;
        if self.mul != 0 {
            value = value.wrapping_mul(self.mul);
        }
        if self.div != 0 {
            value = value.wrapping_div(self.div);
        }
        if self.fix != 0 {
            value = value.wrapping_shr(self.fix as u32);
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_identity() {
        assert_eq!(Scaling::NONE.to_internal(-17), -17);
        assert_eq!(Scaling::NONE.to_external(-17), -17);
    }

    #[test]
    fn test_current_conversion() {
        // 15 A at 50 counts/A in 12.4 fixed point
        let scaling = Scaling {
            div: 50,
            mul: 0,
            fix: 4,
        };
        assert_eq!(scaling.to_internal(15), 12_000);
        assert_eq!(scaling.to_external(12_000), 15);
    }

    #[test]
    fn test_small_number_conversion() {
        // Speed coefficient 16384 in 2.14 fixed point shown as x10
        let scaling = Scaling {
            div: 0,
            mul: 10,
            fix: 14,
        };
        assert_eq!(scaling.to_external(16_384), 10);
    }

    #[test]
    fn test_negative_shift_is_arithmetic() {
        let scaling = Scaling {
            div: 0,
            mul: 0,
            fix: 4,
        };
        assert_eq!(scaling.to_internal(-3), -48);
        assert_eq!(scaling.to_external(-48), -3);
        // Rounds toward negative infinity like the hardware shift
        assert_eq!(scaling.to_external(-47), -3);
    }

    proptest! {
        #[test]
        fn test_fixed_point_roundtrip(value in -2000i32..=2000, fix in 0u8..=14) {
            let scaling = Scaling { div: 0, mul: 0, fix };
            prop_assert_eq!(scaling.to_external(scaling.to_internal(value)), value);
        }

        #[test]
        fn test_div_and_fix_roundtrip(value in -40i32..=40, div in 1i32..=100, fix in 0u8..=4) {
            let scaling = Scaling { div, mul: 0, fix };
            prop_assert_eq!(scaling.to_external(scaling.to_internal(value)), value);
        }
    }
}

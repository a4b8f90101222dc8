//! Flag computations shared by the integer and floating-point executors.

use crate::bitwise::Bits;
use crate::cpu::psr::Nzcv;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ArithmeticOpResult<T> {
    pub result: T,
    pub carry: bool,
    pub overflow: bool,
    pub sign: bool,
    pub zero: bool,
}

impl<T> ArithmeticOpResult<T> {
    #[must_use]
    pub const fn nzcv(&self) -> Nzcv {
        Nzcv::from_flags(self.sign, self.zero, self.carry, self.overflow)
    }
}

macro_rules! add_with_carry_impl {
    ($name:ident, $t:ty, $wide:ty) => {
        /// `op1 + op2 + carry_in` with the resulting flags. Subtraction is
        /// `op1 + !op2 + 1`.
        #[must_use]
        pub fn $name(op1: $t, op2: $t, carry_in: bool) -> ArithmeticOpResult<$t> {
            // we do the sum in the wider type so that the extra bit is the carry
            let wide = <$wide>::from(op1) + <$wide>::from(op2) + <$wide>::from(carry_in);
            let result = wide as $t;

            let msb = <$t>::BITS - 1;
            let sign_op1 = op1.get_bit(msb);
            let sign_op2 = op2.get_bit(msb);
            let sign_r = result.get_bit(msb);

            // overflow only occurs when operands have the same sign and result has the opposite one
            let same_sign = sign_op1 == sign_op2;

            ArithmeticOpResult {
                result,
                carry: (wide >> <$t>::BITS) != 0,
                overflow: same_sign && (sign_op1 != sign_r),
                sign: sign_r,
                zero: result == 0,
            }
        }
    };
}

add_with_carry_impl!(add_with_carry32, u32, u64);
add_with_carry_impl!(add_with_carry64, u64, u128);

/// `add_with_carry32`/`add_with_carry64` selected by `sf`. The 32-bit result
/// is zero-extended.
#[must_use]
pub fn add_with_carry(sf: bool, op1: u64, op2: u64, carry_in: bool) -> ArithmeticOpResult<u64> {
    if sf {
        add_with_carry64(op1, op2, carry_in)
    } else {
        let r = add_with_carry32(op1 as u32, op2 as u32, carry_in);
        ArithmeticOpResult {
            result: u64::from(r.result),
            carry: r.carry,
            overflow: r.overflow,
            sign: r.sign,
            zero: r.zero,
        }
    }
}

#[must_use]
pub fn add_flags32(a: u32, b: u32) -> Nzcv {
    add_with_carry32(a, b, false).nzcv()
}

#[must_use]
pub fn sub_flags32(a: u32, b: u32) -> Nzcv {
    add_with_carry32(a, !b, true).nzcv()
}

#[must_use]
pub fn add_flags64(a: u64, b: u64) -> Nzcv {
    add_with_carry64(a, b, false).nzcv()
}

#[must_use]
pub fn sub_flags64(a: u64, b: u64) -> Nzcv {
    add_with_carry64(a, !b, true).nzcv()
}

/// Flags of a logical operation (`ANDS`, `BICS`, `TST`): C and V are cleared.
#[must_use]
pub fn logical_flags(sf: bool, result: u64) -> Nzcv {
    let msb = if sf { 63 } else { 31 };
    let result = if sf { result } else { result & 0xFFFF_FFFF };
    Nzcv::from_flags(result.get_bit(msb), result == 0, false, false)
}

/// `FCMP` outcome: unordered sets C and V, equal sets Z and C, less sets N,
/// greater sets C.
fn compare_flags<F: PartialOrd>(a: F, b: F) -> Nzcv {
    use std::cmp::Ordering;
    match a.partial_cmp(&b) {
        None => Nzcv::from_nibble(0b0011),
        Some(Ordering::Equal) => Nzcv::from_nibble(0b0110),
        Some(Ordering::Less) => Nzcv::from_nibble(0b1000),
        Some(Ordering::Greater) => Nzcv::from_nibble(0b0010),
    }
}

#[must_use]
pub fn float_compare_flags(a: f32, b: f32) -> Nzcv {
    compare_flags(a, b)
}

#[must_use]
pub fn double_compare_flags(a: f64, b: f64) -> Nzcv {
    compare_flags(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn add_flags_match_wide_arithmetic_32() {
        for _ in 0..5000 {
            let a = rand::random::<i32>();
            let b = rand::random::<i32>();
            let flags = add_flags32(a as u32, b as u32);

            let signed = i64::from(a) + i64::from(b);
            let unsigned = u64::from(a as u32) + u64::from(b as u32);
            assert_eq!(
                flags.overflow_flag(),
                signed < i64::from(i32::MIN) || signed > i64::from(i32::MAX)
            );
            assert_eq!(flags.carry_flag(), unsigned > u64::from(u32::MAX));
            assert_eq!(flags.zero_flag(), a.wrapping_add(b) == 0);
            assert_eq!(flags.sign_flag(), a.wrapping_add(b) < 0);
        }
    }

    #[test]
    fn add_flags_match_wide_arithmetic_64() {
        for _ in 0..5000 {
            let a = rand::random::<i64>();
            let b = rand::random::<i64>();
            let flags = add_flags64(a as u64, b as u64);

            let signed = i128::from(a) + i128::from(b);
            let unsigned = u128::from(a as u64) + u128::from(b as u64);
            assert_eq!(
                flags.overflow_flag(),
                signed < i128::from(i64::MIN) || signed > i128::from(i64::MAX)
            );
            assert_eq!(flags.carry_flag(), unsigned > u128::from(u64::MAX));
        }
    }

    #[test]
    fn sub_flags_carry_means_no_borrow() {
        for _ in 0..5000 {
            let a = rand::random::<u32>();
            let b = rand::random::<u32>();
            let flags = sub_flags32(a, b);
            assert_eq!(flags.carry_flag(), a >= b);
            assert_eq!(flags.zero_flag(), a == b);

            let signed = i64::from(a as i32) - i64::from(b as i32);
            assert_eq!(
                flags.overflow_flag(),
                signed < i64::from(i32::MIN) || signed > i64::from(i32::MAX)
            );

            let a = rand::random::<u64>();
            let b = rand::random::<u64>();
            assert_eq!(sub_flags64(a, b).carry_flag(), a >= b);
        }
    }

    #[test]
    fn adds_max_positive_plus_one() {
        let r = add_with_carry32(0x7FFF_FFFF, 1, false);
        assert_eq!(r.result, 0x8000_0000);
        assert!(r.overflow);
        assert!(r.sign);
        assert!(!r.zero);
        assert!(!r.carry);
    }

    #[test]
    fn carry_in_is_added() {
        let r = add_with_carry(false, 0xFFFF_FFFF, 0, true);
        assert_eq!(r.result, 0);
        assert!(r.carry);
        assert!(r.zero);

        let r = add_with_carry(true, u64::MAX, 0, true);
        assert_eq!(r.result, 0);
        assert!(r.carry);
    }

    #[test]
    fn float_compare() {
        assert_eq!(float_compare_flags(1.0, 2.0).nibble(), 0b1000);
        assert_eq!(float_compare_flags(2.0, 2.0).nibble(), 0b0110);
        assert_eq!(float_compare_flags(3.0, 2.0).nibble(), 0b0010);
        assert_eq!(float_compare_flags(f32::NAN, 2.0).nibble(), 0b0011);
        assert_eq!(double_compare_flags(0.0, -0.0).nibble(), 0b0110);
        assert_eq!(double_compare_flags(1.0, f64::NAN).nibble(), 0b0011);
        assert_eq!(double_compare_flags(f64::NEG_INFINITY, -1.0).nibble(), 0b1000);
    }

    #[test]
    fn logical() {
        assert_eq!(logical_flags(false, 0xFFFF_FFFF_0000_0000).nibble(), 0b0100);
        assert_eq!(logical_flags(false, 0x8000_0000).nibble(), 0b1000);
        assert_eq!(logical_flags(true, 0x8000_0000).nibble(), 0b0000);
    }
}

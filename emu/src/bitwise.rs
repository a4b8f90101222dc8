use std::ops::RangeInclusive;

/// Contains some helper methods to manipulate bits,
/// the index (`bit_idx`) is supposed to be from lsb to msb (right to left)
pub trait Bits: Copy + Sized {
    const BITS: u32;

    fn get_bit(self, bit_idx: u32) -> bool;

    fn set_bit(&mut self, bit_idx: u32, value: bool);

    /// Returns the bits in `bits_range` (inclusive, lsb first) moved to bit 0.
    fn get_bits(self, bits_range: RangeInclusive<u32>) -> Self;

    /// Returns a sign-extended copy of the value.
    /// `number_of_bits` is the width of the two's complement number stored
    /// in the low bits of the value.
    fn sign_extended(self, number_of_bits: u32) -> Self;

    fn is_bit_on(self, bit_idx: u32) -> bool {
        self.get_bit(bit_idx)
    }

    fn is_bit_off(self, bit_idx: u32) -> bool {
        !self.get_bit(bit_idx)
    }

    fn set_bit_on(&mut self, bit_idx: u32) {
        self.set_bit(bit_idx, true);
    }

    fn set_bit_off(&mut self, bit_idx: u32) {
        self.set_bit(bit_idx, false);
    }

    /// Checks if a certain sequence of bit is set to 1.
    fn are_bits_on(self, bits_range: RangeInclusive<u32>) -> bool {
        bits_range.into_iter().all(|bit_idx| self.get_bit(bit_idx))
    }
}

macro_rules! impl_bits {
    ($($t:ty => $signed:ty),* $(,)?) => {
        $(
            impl Bits for $t {
                const BITS: u32 = <$t>::BITS;

                fn get_bit(self, bit_idx: u32) -> bool {
                    debug_assert!(bit_idx < Self::BITS);
                    (self >> bit_idx) & 1 == 1
                }

                fn set_bit(&mut self, bit_idx: u32, value: bool) {
                    debug_assert!(bit_idx < Self::BITS);
                    let mask = 1 << bit_idx;
                    if value {
                        *self |= mask;
                    } else {
                        *self &= !mask;
                    }
                }

                fn get_bits(self, bits_range: RangeInclusive<u32>) -> Self {
                    let start = *bits_range.start();
                    let length = bits_range.end() - start + 1;
                    debug_assert!(start + length <= Self::BITS);

                    // Gets a value with `length` number of ones.
                    let mask = if length >= Self::BITS {
                        <$t>::MAX
                    } else {
                        (1 << length) - 1
                    };

                    (self >> start) & mask
                }

                fn sign_extended(self, number_of_bits: u32) -> Self {
                    debug_assert!(number_of_bits > 0 && number_of_bits <= Self::BITS);
                    // Move the sign bit of the narrow value to the msb, then
                    // let the arithmetic shift replicate it on the way back.
                    let shift = Self::BITS - number_of_bits;
                    ((self << shift) as $signed >> shift) as $t
                }
            }
        )*
    };
}

impl_bits!(u8 => i8, u16 => i16, u32 => i32, u64 => i64, u128 => i128);

/// Unsigned field `[hi, lo]` of `word`, moved to bit 0.
/// The two bounds may be given in either order.
#[must_use]
pub fn field(word: u64, hi: u32, lo: u32) -> u64 {
    let (hi, lo) = if hi >= lo { (hi, lo) } else { (lo, hi) };
    word.get_bits(lo..=hi)
}

/// Signed field `[hi, lo]` of `word`, sign-extended from its top bit.
#[must_use]
pub fn signed_field(word: u64, hi: u32, lo: u32) -> i64 {
    let (hi, lo) = if hi >= lo { (hi, lo) } else { (lo, hi) };
    field(word, hi, lo).sign_extended(hi - lo + 1) as i64
}

/// Mask with ones in bits `[hi, lo]`.
#[must_use]
pub fn mask(hi: u32, lo: u32) -> u64 {
    let (hi, lo) = if hi >= lo { (hi, lo) } else { (lo, hi) };
    ones(hi - lo + 1) << lo
}

/// Picks field `[hi, lo]` out of `word` and places it starting at bit `to`.
///
/// Used to reassemble immediates that are scattered over the instruction,
/// e.g. `ADR` keeps `immlo` in `[30:29]` and `immhi` in `[23:5]`.
#[must_use]
pub fn pick(word: u64, hi: u32, lo: u32, to: u32) -> u64 {
    field(word, hi, lo) << to
}

/// Value with the low `count` bits set.
#[must_use]
pub const fn ones(count: u32) -> u64 {
    if count >= 64 {
        u64::MAX
    } else {
        (1 << count) - 1
    }
}

/// Sign-extends the low `bits` bits of `value`.
#[must_use]
pub fn sign_extend(value: u64, bits: u32) -> i64 {
    value.sign_extended(bits) as i64
}

/// Rotates the low `width` bits of `value` right by `amount`.
#[must_use]
pub const fn ror(value: u64, amount: u32, width: u32) -> u64 {
    let value = value & ones(width);
    let amount = amount % width;
    if amount == 0 {
        value
    } else {
        ((value >> amount) | (value << (width - amount))) & ones(width)
    }
}

/// Replicates an element of `esize` bits until it fills 64 bits.
#[must_use]
pub const fn replicate(element: u64, esize: u32) -> u64 {
    let element = element & ones(esize);
    let mut result = 0;
    let mut pos = 0;
    while pos < 64 {
        result |= element << pos;
        pos += esize;
    }
    result
}

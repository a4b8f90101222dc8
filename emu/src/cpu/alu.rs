//! # Operand shaping
//!
//! Shifts, extensions and the bitmask immediates used by the integer
//! data-processing instructions.
//!
//! ## Logical immediates
//!
//! `AND`/`ORR`/`EOR`/`ANDS` (immediate) encode their 64-bit operand in 13
//! bits, `N:immr:imms`. The value is a run of `imms + 1` ones inside an
//! element of 2, 4, 8, 16, 32 or 64 bits, rotated right by `immr` and then
//! replicated to fill the register:
//!
//! ```text
//!   N  imms      element size   run length
//!   0  11110x    2              imms<0> + 1
//!   0  1110xx    4              imms<1:0> + 1
//!   0  110xxx    8              imms<2:0> + 1
//!   0  10xxxx    16             imms<3:0> + 1
//!   0  0xxxxx    32             imms<4:0> + 1
//!   1  xxxxxx    64             imms + 1
//! ```
//!
//! A run that fills the whole element (all ones) is not encodable. Since
//! every valid pattern has at least one set bit, a table entry of zero marks
//! an invalid encoding.

use std::sync::LazyLock;

use crate::bitwise::{ones, replicate, ror};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftKind {
    Lsl,
    Lsr,
    Asr,
    Ror,
}

impl From<u32> for ShiftKind {
    fn from(shift: u32) -> Self {
        match shift & 0b11 {
            0b00 => Self::Lsl,
            0b01 => Self::Lsr,
            0b10 => Self::Asr,
            _ => Self::Ror,
        }
    }
}

impl ShiftKind {
    /// Shifts a 32-bit operand by `amount` (taken modulo 32).
    #[must_use]
    pub const fn apply32(self, value: u32, amount: u32) -> u32 {
        let amount = amount % 32;
        match self {
            Self::Lsl => value << amount,
            Self::Lsr => value >> amount,
            Self::Asr => ((value as i32) >> amount) as u32,
            Self::Ror => value.rotate_right(amount),
        }
    }

    /// Shifts a 64-bit operand by `amount` (taken modulo 64).
    #[must_use]
    pub const fn apply64(self, value: u64, amount: u32) -> u64 {
        let amount = amount % 64;
        match self {
            Self::Lsl => value << amount,
            Self::Lsr => value >> amount,
            Self::Asr => ((value as i64) >> amount) as u64,
            Self::Ror => value.rotate_right(amount),
        }
    }

    /// `apply32` or `apply64` selected by `sf`; 32-bit results are
    /// zero-extended.
    #[must_use]
    pub const fn apply(self, sf: bool, value: u64, amount: u32) -> u64 {
        if sf {
            self.apply64(value, amount)
        } else {
            self.apply32(value as u32, amount) as u64
        }
    }
}

impl std::fmt::Display for ShiftKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lsl => f.write_str("LSL"),
            Self::Lsr => f.write_str("LSR"),
            Self::Asr => f.write_str("ASR"),
            Self::Ror => f.write_str("ROR"),
        }
    }
}

/// Register extension of the extended-register and register-offset forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extension {
    Uxtb,
    Uxth,
    Uxtw,
    Uxtx,
    Sxtb,
    Sxth,
    Sxtw,
    Sxtx,
}

impl From<u32> for Extension {
    fn from(option: u32) -> Self {
        match option & 0b111 {
            0b000 => Self::Uxtb,
            0b001 => Self::Uxth,
            0b010 => Self::Uxtw,
            0b011 => Self::Uxtx,
            0b100 => Self::Sxtb,
            0b101 => Self::Sxth,
            0b110 => Self::Sxtw,
            _ => Self::Sxtx,
        }
    }
}

impl Extension {
    /// Extends `value` to 64 bits and shifts it left by `shift`.
    #[must_use]
    pub const fn apply(self, value: u64, shift: u32) -> u64 {
        let extended = match self {
            Self::Uxtb => value as u8 as u64,
            Self::Uxth => value as u16 as u64,
            Self::Uxtw => value as u32 as u64,
            Self::Uxtx | Self::Sxtx => value,
            Self::Sxtb => value as i8 as u64,
            Self::Sxth => value as i16 as u64,
            Self::Sxtw => value as i32 as u64,
        };
        extended << (shift % 64)
    }
}

/// `DecodeBitMasks` from the architecture: returns `(wmask, tmask)` for a
/// bitfield or logical immediate, or `None` for a reserved encoding.
#[must_use]
pub fn decode_bit_masks(
    n: bool,
    imms: u32,
    immr: u32,
    immediate: bool,
    datasize: u32,
) -> Option<(u64, u64)> {
    let combined = (u32::from(n) << 6) | (!imms & 0x3F);
    if combined == 0 {
        return None;
    }
    let len = 31 - combined.leading_zeros();
    if len < 1 {
        return None;
    }

    let esize = 1 << len;
    if esize > datasize {
        return None;
    }

    let levels = esize - 1;
    if immediate && (imms & levels) == levels {
        return None;
    }

    let s = imms & levels;
    let r = immr & levels;
    let d = s.wrapping_sub(r) & levels;

    let welem = ones(s + 1);
    let telem = ones(d + 1);

    let wmask = replicate(ror(welem, r, esize), esize) & ones(datasize);
    let tmask = replicate(telem, esize) & ones(datasize);

    Some((wmask, tmask))
}

/// Every 64-bit logical immediate, indexed by `N:immr:imms`.
static LOGICAL_IMMEDIATES: LazyLock<Box<[u64]>> = LazyLock::new(|| {
    (0..8192_u32)
        .map(|index| {
            let n = index >> 12 != 0;
            let immr = (index >> 6) & 0x3F;
            let imms = index & 0x3F;
            decode_bit_masks(n, imms, immr, true, 64).map_or(0, |(wmask, _)| wmask)
        })
        .collect()
});

/// Looks up the logical immediate for the 13-bit `N:immr:imms` field.
/// Zero means the encoding is reserved.
#[must_use]
pub fn logical_immediate(encoded: u32) -> u64 {
    LOGICAL_IMMEDIATES[(encoded & 0x1FFF) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn encoded(n: u32, immr: u32, imms: u32) -> u32 {
        (n << 12) | (immr << 6) | imms
    }

    #[test]
    fn known_logical_immediates() {
        // AND X0, X0, #0xFF
        assert_eq!(logical_immediate(encoded(1, 0, 7)), 0xFF);
        // ORR X0, XZR, #0x5555555555555555
        assert_eq!(logical_immediate(encoded(0, 0, 0b11_1100)), 0x5555_5555_5555_5555);
        // ORR W0, WZR, #0x80000000
        assert_eq!(
            logical_immediate(encoded(0, 1, 0)) & 0xFFFF_FFFF,
            0x8000_0000
        );
        // AND X0, X0, #0xFFFF0000FFFF0000
        assert_eq!(
            logical_immediate(encoded(0, 16, 0b00_1111)),
            0xFFFF_0000_FFFF_0000
        );
        // TST X0, #0x8000000000000000
        assert_eq!(logical_immediate(encoded(1, 1, 0)), 0x8000_0000_0000_0000);
        // AND X0, X0, #0xFFFFFFFFFFFFFFFE
        assert_eq!(logical_immediate(encoded(1, 63, 62)), 0xFFFF_FFFF_FFFF_FFFE);
        // 0x0F0F0F0F...: 8-bit element, run of four
        assert_eq!(
            logical_immediate(encoded(0, 0, 0b11_0011)),
            0x0F0F_0F0F_0F0F_0F0F
        );
    }

    #[test]
    fn all_ones_runs_are_reserved() {
        assert_eq!(logical_immediate(encoded(1, 0, 63)), 0);
        assert_eq!(logical_immediate(encoded(0, 0, 31)), 0);
        assert_eq!(logical_immediate(encoded(0, 3, 0b11_1101)), 0);
        // N=0 with imms=11111x has no element size at all
        assert_eq!(logical_immediate(encoded(0, 0, 0b11_1110)), 0);
        assert_eq!(logical_immediate(encoded(0, 0, 0b11_1111)), 0);
    }

    #[test]
    fn every_entry_is_a_replicated_rotated_run() {
        for index in 0..8192_u32 {
            let n = index >> 12;
            let imms = index & 0x3F;
            let value = logical_immediate(index);

            let esize = if n == 1 {
                64
            } else {
                match (0..=5).rev().find(|bit| imms & (1 << bit) == 0) {
                    Some(bit) => 1 << bit,
                    None => 0,
                }
            };
            let run = if esize == 0 { 0 } else { (imms & (esize - 1)) + 1 };

            if esize < 2 || run == esize {
                assert_eq!(value, 0, "entry {index:#06X} should be reserved");
                continue;
            }
            assert_ne!(value, 0, "entry {index:#06X} should be valid");

            let element = value & ones(esize);
            assert_eq!(replicate(element, esize), value);
            assert_eq!(element.count_ones(), run);

            // Some rotation of the element is the plain run of ones.
            assert!((0..esize).any(|r| ror(element, r, esize) == ones(run)));
        }
    }

    #[test]
    fn bitfield_masks() {
        // UBFM X0, X1, #4, #11 (UBFX X0, X1, #4, #8)
        let (wmask, tmask) = decode_bit_masks(true, 11, 4, false, 64).unwrap();
        assert_eq!(wmask, 0xF000_0000_0000_00FF);
        assert_eq!(tmask, 0xFF);

        // N mismatched with a 32-bit datasize
        assert_eq!(decode_bit_masks(true, 11, 4, false, 32), None);

        // LSL W0, W1, #8 == UBFM W0, W1, #24, #23
        let (wmask, tmask) = decode_bit_masks(false, 23, 24, false, 32).unwrap();
        assert_eq!(wmask, 0xFFFF_FF00);
        assert_eq!(tmask, 0xFFFF_FFFF);
    }

    #[test]
    fn shifts() {
        assert_eq!(ShiftKind::Lsl.apply32(0x8000_0001, 1), 2);
        assert_eq!(ShiftKind::Asr.apply32(0x8000_0000, 31), 0xFFFF_FFFF);
        assert_eq!(ShiftKind::Ror.apply64(1, 1), 0x8000_0000_0000_0000);
        assert_eq!(ShiftKind::Lsr.apply64(u64::MAX, 63), 1);
        assert_eq!(ShiftKind::Lsl.apply(false, 0xFFFF_FFFF, 4), 0xFFFF_FFF0);
        assert_eq!(ShiftKind::Asr.apply(true, 0x8000_0000, 4), 0x0800_0000);
        assert_eq!(ShiftKind::from(0b10), ShiftKind::Asr);
    }

    #[test]
    fn extensions() {
        assert_eq!(Extension::Sxtb.apply(0x80, 0), 0xFFFF_FFFF_FFFF_FF80);
        assert_eq!(Extension::Uxtb.apply(0x1FF, 2), 0x3FC);
        assert_eq!(Extension::Sxtw.apply(0xFFFF_FFFF, 4), 0xFFFF_FFFF_FFFF_FFF0);
        assert_eq!(Extension::Uxtw.apply(0xFFFF_FFFF_FFFF_FFFF, 0), 0xFFFF_FFFF);
        assert_eq!(Extension::from(0b111), Extension::Sxtx);
    }
}

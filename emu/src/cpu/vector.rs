//! # SIMD & FP register file
//!
//! 32 registers of 128 bits. Each one is plain little-endian storage that
//! can be viewed at several widths:
//!
//! ```text
//!  127                          64 63                           0
//! ┌──────────────────────────────┬──────────────────────────────┐
//! │                            Qn                               │
//! ├──────────────────────────────┼──────────────────────────────┤
//! │           Vn.D[1]            │      Dn = Vn.D[0]            │
//! ├──────────────┬───────────────┼──────────────┬───────────────┤
//! │   Vn.S[3]    │   Vn.S[2]     │   Vn.S[1]    │  Sn = Vn.S[0] │
//! └──────────────┴───────────────┴──────────────┴───────────────┘
//!                  ... and so on down to 16 byte lanes
//! ```
//!
//! Writing one lane never touches its neighbours. Scalar FP and SIMD
//! instructions write their result into lane 0 and clear the rest.

use serde::{Deserialize, Serialize};

use crate::bitwise::ones;
use crate::memory::Scalar;

/// One 128-bit register value.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vector(pub [u8; 16]);

impl Vector {
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(value.to_le_bytes())
    }

    #[must_use]
    pub const fn to_u128(self) -> u128 {
        u128::from_le_bytes(self.0)
    }

    /// Typed lane `index`.
    #[must_use]
    pub fn lane<T: Scalar>(&self, index: usize) -> T {
        T::from_le_slice(&self.0[index * T::SIZE..])
    }

    pub fn set_lane<T: Scalar>(&mut self, index: usize, value: T) {
        value.write_le_slice(&mut self.0[index * T::SIZE..]);
    }

    /// Lane `index` of an `esize`-bit view (8, 16, 32 or 64), zero-extended.
    #[must_use]
    pub fn element(&self, index: usize, esize: u32) -> u64 {
        match esize {
            8 => u64::from(self.lane::<u8>(index)),
            16 => u64::from(self.lane::<u16>(index)),
            32 => u64::from(self.lane::<u32>(index)),
            _ => self.lane::<u64>(index),
        }
    }

    /// Lane `index` of an `esize`-bit view, sign-extended.
    #[must_use]
    pub fn signed_element(&self, index: usize, esize: u32) -> i64 {
        match esize {
            8 => i64::from(self.lane::<i8>(index)),
            16 => i64::from(self.lane::<i16>(index)),
            32 => i64::from(self.lane::<i32>(index)),
            _ => self.lane::<i64>(index),
        }
    }

    /// Writes the low `esize` bits of `value` into lane `index`.
    pub fn set_element(&mut self, index: usize, esize: u32, value: u64) {
        match esize {
            8 => self.set_lane(index, value as u8),
            16 => self.set_lane(index, value as u16),
            32 => self.set_lane(index, value as u32),
            _ => self.set_lane(index, value),
        }
    }

    /// Zeroes every byte from `from` upwards.
    pub fn clear_from(&mut self, from: usize) {
        self.0[from..].fill(0);
    }

    /// Keeps only the low 64 bits unless `full` is set.
    #[must_use]
    pub fn sized(mut self, full: bool) -> Self {
        if !full {
            self.clear_from(8);
        }
        self
    }
}

/// Mask of an `esize`-bit element.
#[must_use]
pub const fn element_mask(esize: u32) -> u64 {
    ones(esize)
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorRegisters([Vector; 32]);

impl VectorRegisters {
    #[must_use]
    pub const fn get(&self, reg: u32) -> Vector {
        self.0[reg as usize]
    }

    pub const fn set(&mut self, reg: u32, value: Vector) {
        self.0[reg as usize] = value;
    }

    #[must_use]
    pub fn lane<T: Scalar>(&self, reg: u32, index: usize) -> T {
        self.0[reg as usize].lane(index)
    }

    pub fn set_lane<T: Scalar>(&mut self, reg: u32, index: usize, value: T) {
        self.0[reg as usize].set_lane(index, value);
    }

    /// Writes `value` into lane 0 and zeroes the rest of the register.
    pub fn set_scalar<T: Scalar>(&mut self, reg: u32, value: T) {
        let mut v = Vector::default();
        v.set_lane(0, value);
        self.0[reg as usize] = v;
    }

    #[must_use]
    pub const fn q(&self, reg: u32) -> u128 {
        self.0[reg as usize].to_u128()
    }

    pub const fn set_q(&mut self, reg: u32, value: u128) {
        self.0[reg as usize] = Vector::from_u128(value);
    }
}

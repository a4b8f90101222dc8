//! # Status registers (NZCV and FPSR)
//!
//! AArch64 splits the old PSR into separate system registers. The condition
//! flags live in `NZCV`, laid out exactly where `MRS Xt, NZCV` returns them:
//!
//! ```text
//! 31 30 29 28 27                              0
//! ┌──┬──┬──┬──┬─────────────────────────────────┐
//! │N │Z │C │V │            RES0                 │
//! └──┴──┴──┴──┴─────────────────────────────────┘
//! ```
//!
//! The floating-point status register accumulates exception flags. They are
//! sticky: instructions only ever set them, software clears them with `MSR`.
//!
//! ```text
//! 31    27 26        8 7   5 4   3   2   1   0
//! ┌──────┬──┬─────────┬───┬──┬───┬───┬───┬───┬───┐
//! │ RES0 │QC│  RES0   │IDC│  │IXC│UFC│OFC│DZC│IOC│
//! └──────┴──┴─────────┴───┴──┴───┴───┴───┴───┴───┘
//! ```
//!
//! See [`condition`](super::condition) for how the flags are tested.

use serde::{Deserialize, Serialize};

use crate::bitwise::Bits;

/// The `NZCV` condition flags register.
///
/// ```
/// use emu::cpu::psr::Nzcv;
///
/// let mut nzcv = Nzcv::default();
/// nzcv.set_zero_flag(true);
/// assert!(nzcv.zero_flag());
/// assert_eq!(nzcv.nibble(), 0b0100);
/// ```
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nzcv(u32);

impl Nzcv {
    const MASK: u32 = 0xF000_0000;

    /// Builds the register from the raw system register value; RES0 bits
    /// are dropped.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::MASK)
    }

    /// Builds the register from an immediate `nzcv` field (`CCMP`, `FCCMP`).
    #[must_use]
    pub const fn from_nibble(nibble: u32) -> Self {
        Self((nibble & 0xF) << 28)
    }

    #[must_use]
    pub const fn from_flags(sign: bool, zero: bool, carry: bool, overflow: bool) -> Self {
        Self(
            (sign as u32) << 31 | (zero as u32) << 30 | (carry as u32) << 29 | (overflow as u32) << 28,
        )
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn nibble(self) -> u32 {
        self.0 >> 28
    }

    /// N => Bit 31, (0=Not Signed, 1=Signed)
    #[must_use]
    pub fn sign_flag(self) -> bool {
        self.0.get_bit(31)
    }

    /// Z => Bit 30, (0=Not Zero, 1=Zero)
    #[must_use]
    pub fn zero_flag(self) -> bool {
        self.0.get_bit(30)
    }

    /// C => Bit 29, (0=Borrow/No Carry, 1=Carry/No Borrow)
    #[must_use]
    pub fn carry_flag(self) -> bool {
        self.0.get_bit(29)
    }

    /// V => Bit 28, (0=No Overflow, 1=Overflow)
    #[must_use]
    pub fn overflow_flag(self) -> bool {
        self.0.get_bit(28)
    }

    pub fn set_sign_flag(&mut self, value: bool) {
        self.0.set_bit(31, value);
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.0.set_bit(30, value);
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.0.set_bit(29, value);
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.0.set_bit(28, value);
    }
}

impl std::fmt::Display for Nzcv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let flag = |on: bool, c: char| if on { c } else { '-' };
        write!(
            f,
            "{}{}{}{}",
            flag(self.sign_flag(), 'N'),
            flag(self.zero_flag(), 'Z'),
            flag(self.carry_flag(), 'C'),
            flag(self.overflow_flag(), 'V'),
        )
    }
}

/// The floating-point status register.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fpsr(u32);

impl Fpsr {
    const MASK: u32 = 0x0800_009F;

    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits & Self::MASK)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// IOC => Bit 0, invalid operation.
    #[must_use]
    pub fn invalid_operation(self) -> bool {
        self.0.get_bit(0)
    }

    /// DZC => Bit 1, division by zero.
    #[must_use]
    pub fn divide_by_zero(self) -> bool {
        self.0.get_bit(1)
    }

    /// OFC => Bit 2
    #[must_use]
    pub fn overflow(self) -> bool {
        self.0.get_bit(2)
    }

    /// UFC => Bit 3
    #[must_use]
    pub fn underflow(self) -> bool {
        self.0.get_bit(3)
    }

    /// IXC => Bit 4
    #[must_use]
    pub fn inexact(self) -> bool {
        self.0.get_bit(4)
    }

    /// IDC => Bit 7, input denormal.
    #[must_use]
    pub fn input_denormal(self) -> bool {
        self.0.get_bit(7)
    }

    /// QC => Bit 27, cumulative saturation of integer SIMD operations.
    #[must_use]
    pub fn saturation(self) -> bool {
        self.0.get_bit(27)
    }

    pub fn set_invalid_operation(&mut self, value: bool) {
        self.0.set_bit(0, value);
    }

    pub fn set_divide_by_zero(&mut self, value: bool) {
        self.0.set_bit(1, value);
    }

    pub fn set_overflow(&mut self, value: bool) {
        self.0.set_bit(2, value);
    }

    pub fn set_underflow(&mut self, value: bool) {
        self.0.set_bit(3, value);
    }

    pub fn set_inexact(&mut self, value: bool) {
        self.0.set_bit(4, value);
    }

    pub fn set_input_denormal(&mut self, value: bool) {
        self.0.set_bit(7, value);
    }

    pub fn set_saturation(&mut self, value: bool) {
        self.0.set_bit(27, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn check_sign_flag() {
        let mut nzcv = Nzcv::default();
        nzcv.set_sign_flag(true);
        assert!(nzcv.sign_flag());
        assert_eq!(nzcv.bits(), 0x8000_0000);
    }

    #[test]
    fn check_zero_flag() {
        let mut nzcv = Nzcv::default();
        nzcv.set_zero_flag(true);
        assert!(nzcv.zero_flag());
    }

    #[test]
    fn check_carry_flag() {
        let mut nzcv = Nzcv::default();
        nzcv.set_carry_flag(true);
        assert!(nzcv.carry_flag());
    }

    #[test]
    fn check_overflow_flag() {
        let nzcv = Nzcv::from_bits(0b0001_0000_0000_0000_0000_0000_0000_0000);
        assert!(nzcv.overflow_flag());
        assert!(!nzcv.carry_flag());
    }

    #[test]
    fn reserved_bits_are_dropped() {
        assert_eq!(Nzcv::from_bits(u32::MAX).bits(), 0xF000_0000);
        assert_eq!(Fpsr::from_bits(u32::MAX).bits(), 0x0800_009F);
    }

    #[test]
    fn nibble_round_trip() {
        for nibble in 0..16 {
            let nzcv = Nzcv::from_nibble(nibble);
            assert_eq!(nzcv.nibble(), nibble);
            assert_eq!(
                nzcv,
                Nzcv::from_flags(
                    nibble & 8 != 0,
                    nibble & 4 != 0,
                    nibble & 2 != 0,
                    nibble & 1 != 0
                )
            );
        }
    }

    #[test]
    fn display() {
        assert_eq!(Nzcv::from_nibble(0b1010).to_string(), "N-C-");
        assert_eq!(Nzcv::default().to_string(), "----");
    }

    #[test]
    fn check_fpsr_flags() {
        let mut fpsr = Fpsr::default();
        fpsr.set_invalid_operation(true);
        fpsr.set_divide_by_zero(true);
        fpsr.set_saturation(true);
        assert!(fpsr.invalid_operation());
        assert!(fpsr.divide_by_zero());
        assert!(fpsr.saturation());
        assert!(!fpsr.inexact());
        assert_eq!(fpsr.bits(), 0x0800_0003);

        fpsr.set_saturation(false);
        assert_eq!(fpsr.bits(), 0b11);
    }
}

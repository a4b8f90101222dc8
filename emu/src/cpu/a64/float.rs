//! # Scalar floating point
//!
//! Single and double precision share one generic implementation through the
//! [`Fp`] trait. NaN handling follows the default `FPCR` configuration:
//! signalling NaNs are quieted and raise `IOC`, the first NaN operand is
//! propagated, and an invalid operation on ordinary operands produces the
//! positive default NaN.
//!
//! Arithmetic always rounds to nearest; `FPCR.RMode` is stored but not
//! consulted.

use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::bitwise::{Bits, ones};
use crate::cpu::a64::{rd, rm, rn};
use crate::cpu::condition::Condition;
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::interpreter::Interpreter;
use crate::cpu::psr::Nzcv;
use crate::cpu::registers::R31;
use crate::cpu::status::{ExecResult, Status};
use crate::memory::Scalar;

pub(crate) trait Fp:
    Scalar
    + PartialOrd
    + Neg<Output = Self>
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
{
    const EXPONENT_BITS: u32;
    const FRACTION_BITS: u32;
    const ZERO: Self;

    fn from_raw(bits: u64) -> Self;
    fn raw(self) -> u64;
    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
    fn is_sign_negative(self) -> bool;
    fn abs(self) -> Self;
    fn sqrt(self) -> Self;
    fn mul_add(self, a: Self, b: Self) -> Self;
    fn round_ties_even(self) -> Self;
    fn round_ties_away(self) -> Self;
    fn ceil(self) -> Self;
    fn floor(self) -> Self;
    fn trunc(self) -> Self;
    fn to_f64(self) -> f64;
    fn from_f64(value: f64) -> Self;
    fn from_i64(value: i64) -> Self;
    fn from_u64(value: u64) -> Self;

    fn is_zero(self) -> bool {
        self == Self::ZERO
    }

    fn is_signalling(self) -> bool {
        self.is_nan() && !self.raw().get_bit(Self::FRACTION_BITS - 1)
    }

    fn quiet(self) -> Self {
        Self::from_raw(self.raw() | (1 << (Self::FRACTION_BITS - 1)))
    }

    fn default_nan() -> Self {
        let exponent = ones(Self::EXPONENT_BITS) << Self::FRACTION_BITS;
        Self::from_raw(exponent | (1 << (Self::FRACTION_BITS - 1)))
    }

    /// Expands the 8-bit `FMOV` immediate: sign, a 3-bit exponent and a
    /// 4-bit fraction.
    fn expand_immediate(imm8: u32) -> Self {
        let e = Self::EXPONENT_BITS;
        let f = Self::FRACTION_BITS;
        let sign = u64::from(imm8.get_bit(7));
        let b6 = imm8.get_bit(6);
        let exponent = (u64::from(!b6) << (e - 1))
            | if b6 { ones(e - 3) << 2 } else { 0 }
            | u64::from(imm8.get_bits(4..=5));
        let fraction = u64::from(imm8.get_bits(0..=3)) << (f - 4);
        Self::from_raw((sign << (e + f)) | (exponent << f) | fraction)
    }
}

macro_rules! impl_fp {
    ($($t:ty => $raw:ty, $exponent:expr, $fraction:expr);* $(;)?) => {
        $(
            impl Fp for $t {
                const EXPONENT_BITS: u32 = $exponent;
                const FRACTION_BITS: u32 = $fraction;
                const ZERO: Self = 0.0;

                fn from_raw(bits: u64) -> Self {
                    <$t>::from_bits(bits as $raw)
                }

                fn raw(self) -> u64 {
                    u64::from(self.to_bits())
                }

                fn is_nan(self) -> bool {
                    <$t>::is_nan(self)
                }

                fn is_infinite(self) -> bool {
                    <$t>::is_infinite(self)
                }

                fn is_sign_negative(self) -> bool {
                    <$t>::is_sign_negative(self)
                }

                fn abs(self) -> Self {
                    <$t>::abs(self)
                }

                fn sqrt(self) -> Self {
                    <$t>::sqrt(self)
                }

                fn mul_add(self, a: Self, b: Self) -> Self {
                    <$t>::mul_add(self, a, b)
                }

                fn round_ties_even(self) -> Self {
                    <$t>::round_ties_even(self)
                }

                fn round_ties_away(self) -> Self {
                    <$t>::round(self)
                }

                fn ceil(self) -> Self {
                    <$t>::ceil(self)
                }

                fn floor(self) -> Self {
                    <$t>::floor(self)
                }

                fn trunc(self) -> Self {
                    <$t>::trunc(self)
                }

                fn to_f64(self) -> f64 {
                    f64::from(self)
                }

                fn from_f64(value: f64) -> Self {
                    value as $t
                }

                fn from_i64(value: i64) -> Self {
                    value as $t
                }

                fn from_u64(value: u64) -> Self {
                    value as $t
                }
            }
        )*
    };
}

impl_fp!(
    f32 => u32, 8, 23;
    f64 => u64, 11, 52;
);

/// Named rounding of `FRINT*` and `FCVT*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rounding {
    TiesEven,
    PlusInfinity,
    MinusInfinity,
    Zero,
    TiesAway,
}

impl From<u32> for Rounding {
    /// The 2-bit `rmode` field.
    fn from(rmode: u32) -> Self {
        match rmode & 0b11 {
            0b00 => Self::TiesEven,
            0b01 => Self::PlusInfinity,
            0b10 => Self::MinusInfinity,
            _ => Self::Zero,
        }
    }
}

impl Rounding {
    pub(crate) fn apply<T: Fp>(self, value: T) -> T {
        match self {
            Self::TiesEven => value.round_ties_even(),
            Self::PlusInfinity => value.ceil(),
            Self::MinusInfinity => value.floor(),
            Self::Zero => value.trunc(),
            Self::TiesAway => value.round_ties_away(),
        }
    }
}

/// Two-operand arithmetic shared by the scalar and vector forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FpBinary {
    Add,
    Sub,
    Mul,
    Div,
    Max,
    Min,
    MaxNum,
    MinNum,
    NegatedMul,
    AbsoluteDifference,
}

fn maximum<T: Fp>(a: T, b: T) -> T {
    if a > b {
        a
    } else if b > a || a.is_sign_negative() {
        b
    } else {
        a
    }
}

fn minimum<T: Fp>(a: T, b: T) -> T {
    if a < b {
        a
    } else if b < a || !a.is_sign_negative() {
        b
    } else {
        a
    }
}

impl Interpreter {
    /// Quiets and picks the NaN operand that wins, raising `IOC` for a
    /// signalling one.
    fn propagate_nan<T: Fp>(&mut self, operands: &[T]) -> Option<T> {
        if let Some(&nan) = operands.iter().find(|x| x.is_signalling()) {
            self.state.fpsr.set_invalid_operation(true);
            return Some(nan.quiet());
        }
        operands.iter().copied().find(|x| x.is_nan())
    }

    /// Replaces a NaN produced from ordinary operands with the default NaN.
    fn invalid_result<T: Fp>(&mut self, result: T) -> T {
        if result.is_nan() {
            self.state.fpsr.set_invalid_operation(true);
            T::default_nan()
        } else {
            result
        }
    }

    pub(crate) fn fp_binary<T: Fp>(&mut self, op: FpBinary, a: T, b: T) -> T {
        let quiet_nan_count = usize::from(a.is_nan() && !a.is_signalling())
            + usize::from(b.is_nan() && !b.is_signalling());
        if matches!(op, FpBinary::MaxNum | FpBinary::MinNum) && quiet_nan_count == 1 {
            // A single quiet NaN loses to the number.
            if a.is_nan() {
                return b;
            }
            if b.is_nan() {
                return a;
            }
        }
        if let Some(nan) = self.propagate_nan(&[a, b]) {
            return nan;
        }

        let result = match op {
            FpBinary::Add => a + b,
            FpBinary::Sub => a - b,
            FpBinary::Mul => a * b,
            FpBinary::NegatedMul => -(a * b),
            FpBinary::Div => {
                if b.is_zero() && !a.is_zero() && !a.is_infinite() {
                    self.state.fpsr.set_divide_by_zero(true);
                }
                a / b
            }
            FpBinary::Max | FpBinary::MaxNum => maximum(a, b),
            FpBinary::Min | FpBinary::MinNum => minimum(a, b),
            FpBinary::AbsoluteDifference => (a - b).abs(),
        };
        self.invalid_result(result)
    }

    /// `addend + a * b` with one rounding.
    pub(crate) fn fp_mul_add<T: Fp>(&mut self, addend: T, a: T, b: T) -> T {
        if let Some(nan) = self.propagate_nan(&[addend, a, b]) {
            return nan;
        }
        let result = a.mul_add(b, addend);
        self.invalid_result(result)
    }

    pub(crate) fn fp_sqrt<T: Fp>(&mut self, value: T) -> T {
        if let Some(nan) = self.propagate_nan(&[value]) {
            return nan;
        }
        let result = value.sqrt();
        self.invalid_result(result)
    }

    pub(crate) fn fp_round<T: Fp>(&mut self, rounding: Rounding, value: T) -> T {
        self.propagate_nan(&[value])
            .unwrap_or_else(|| rounding.apply(value))
    }

    /// `FCMP`/`FCMPE` outcome. `signalling` compares raise `IOC` on any NaN.
    pub(crate) fn fp_compare<T: Fp>(&mut self, a: T, b: T, signalling: bool) -> Nzcv {
        let any_nan = a.is_nan() || b.is_nan();
        if (signalling && any_nan) || a.is_signalling() || b.is_signalling() {
            self.state.fpsr.set_invalid_operation(true);
        }
        match a.partial_cmp(&b) {
            None => Nzcv::from_nibble(0b0011),
            Some(std::cmp::Ordering::Equal) => Nzcv::from_nibble(0b0110),
            Some(std::cmp::Ordering::Less) => Nzcv::from_nibble(0b1000),
            Some(std::cmp::Ordering::Greater) => Nzcv::from_nibble(0b0010),
        }
    }

    /// Converts to a `bits`-wide integer scaled by `2^fbits`, saturating.
    /// NaN converts to 0. Both raise `IOC`.
    pub(crate) fn fp_to_integer<T: Fp>(
        &mut self,
        value: T,
        rounding: Rounding,
        signed: bool,
        bits: u32,
        fbits: u32,
    ) -> u64 {
        if value.is_nan() {
            self.state.fpsr.set_invalid_operation(true);
            return 0;
        }

        let scaled = value.to_f64() * 2_f64.powi(fbits as i32);
        let rounded = rounding.apply(scaled);
        let magnitude_bits = if signed { bits - 1 } else { bits };
        let limit = 2_f64.powi(magnitude_bits as i32);
        let lower = if signed { -limit } else { 0.0 };

        if rounded >= limit {
            self.state.fpsr.set_invalid_operation(true);
            return if signed { ones(bits - 1) } else { ones(bits) };
        }
        if rounded < lower {
            self.state.fpsr.set_invalid_operation(true);
            return if signed { (-(limit as i128)) as u64 } else { 0 };
        }

        if signed {
            rounded as i64 as u64
        } else {
            rounded as u64
        }
    }

    /// Converts a `bits`-wide integer, read as fixed point with `fbits`
    /// fraction bits.
    pub(crate) fn integer_to_fp<T: Fp>(value: u64, signed: bool, bits: u32, fbits: u32) -> T {
        let whole = if signed {
            T::from_i64(value.sign_extended(bits) as i64)
        } else {
            T::from_u64(value & ones(bits))
        };
        if fbits == 0 {
            whole
        } else {
            whole / T::from_f64(2_f64.powi(fbits as i32))
        }
    }

    fn fp_reg<T: Fp>(&self, n: u32) -> T {
        self.state.vectors.lane(n, 0)
    }

    fn set_fp_reg<T: Fp>(&mut self, n: u32, value: T) {
        self.state.vectors.set_scalar(n, value);
    }

    /// `[28:24] = 11110`: everything but the fused multiply-adds.
    pub(crate) fn float_data_processing(&mut self, word: u32) -> ExecResult {
        if word.get_bit(29) {
            return Err(unallocated(word, "floating point"));
        }
        if !word.get_bit(21) {
            return self.float_fixed_conversion(word);
        }

        match word.get_bits(10..=11) {
            0b00 if word.get_bits(10..=15) == 0 => self.float_integer_conversion(word),
            _ if word.get_bit(31) => Err(unallocated(word, "floating point")),
            0b00 if word.get_bits(10..=14) == 0b1_0000 => {
                self.with_precision(word, Self::float_dp1::<f32>, Self::float_dp1::<f64>)
            }
            0b00 if word.get_bits(10..=13) == 0b1000 => {
                self.with_precision(word, Self::float_compare::<f32>, Self::float_compare::<f64>)
            }
            0b00 if word.get_bits(10..=12) == 0b100 => self.with_precision(
                word,
                Self::float_move_immediate::<f32>,
                Self::float_move_immediate::<f64>,
            ),
            0b00 => Err(unallocated(word, "floating point")),
            0b01 => self.with_precision(
                word,
                Self::float_conditional_compare::<f32>,
                Self::float_conditional_compare::<f64>,
            ),
            0b10 => self.with_precision(word, Self::float_dp2::<f32>, Self::float_dp2::<f64>),
            _ => self.with_precision(
                word,
                Self::float_conditional_select::<f32>,
                Self::float_conditional_select::<f64>,
            ),
        }
    }

    /// Picks the executor for the `ftype` field `[23:22]`.
    fn with_precision(
        &mut self,
        word: u32,
        single: fn(&mut Self, u32) -> ExecResult,
        double: fn(&mut Self, u32) -> ExecResult,
    ) -> ExecResult {
        match word.get_bits(22..=23) {
            0b00 => single(self, word),
            0b01 => double(self, word),
            0b11 => Err(not_yet_implemented(word, "half precision")),
            _ => Err(unallocated(word, "floating point type")),
        }
    }

    fn float_dp1<T: Fp>(&mut self, word: u32) -> ExecResult {
        let (rd, rn) = (rd(word), rn(word));
        let value: T = self.fp_reg(rn);

        let result = match word.get_bits(15..=20) {
            0b00_0000 => value,
            0b00_0001 => value.abs(),
            0b00_0010 => -value,
            0b00_0011 => self.fp_sqrt(value),
            0b00_0100 | 0b00_0101 => return self.float_convert_precision(word),
            0b00_0111 => return Err(not_yet_implemented(word, "FCVT to half")),
            0b00_1000 => self.fp_round(Rounding::TiesEven, value),
            0b00_1001 => self.fp_round(Rounding::PlusInfinity, value),
            0b00_1010 => self.fp_round(Rounding::MinusInfinity, value),
            0b00_1011 => self.fp_round(Rounding::Zero, value),
            0b00_1100 => self.fp_round(Rounding::TiesAway, value),
            0b00_1110 | 0b00_1111 => {
                return Err(not_yet_implemented(word, "FRINTX/FRINTI"));
            }
            0b01_0000..=0b01_0011 => return Err(not_yet_implemented(word, "FRINT32/FRINT64")),
            _ => return Err(unallocated(word, "floating point (1 source)")),
        };
        self.set_fp_reg(rd, result);

        Ok(Status::Ready)
    }

    /// `FCVT` between single and double.
    fn float_convert_precision(&mut self, word: u32) -> ExecResult {
        let rd = rd(word);
        match (word.get_bits(22..=23), word.get_bit(15)) {
            (0b00, true) => {
                let value = self.fp_reg::<f32>(rn(word));
                let result = self.fp_widen(value);
                self.set_fp_reg(rd, result);
            }
            (0b01, false) => {
                let value = self.fp_reg::<f64>(rn(word));
                let result = self.fp_narrow(value);
                self.set_fp_reg(rd, result);
            }
            _ => return Err(unallocated(word, "FCVT to the same precision")),
        }

        Ok(Status::Ready)
    }

    /// Single to double. NaNs keep their sign and payload.
    pub(crate) fn fp_widen(&mut self, value: f32) -> f64 {
        if !value.is_nan() {
            return f64::from(value);
        }
        if value.is_signalling() {
            self.state.fpsr.set_invalid_operation(true);
        }
        let sign = value.raw() >> 31;
        let payload = value.quiet().raw() & ones(f32::FRACTION_BITS);
        f64::from_raw((sign << 63) | f64::default_nan().raw() | (payload << 29))
    }

    /// Double to single, rounding to nearest. NaNs keep their sign and the
    /// top of their payload.
    pub(crate) fn fp_narrow(&mut self, value: f64) -> f32 {
        if !value.is_nan() {
            return value as f32;
        }
        if value.is_signalling() {
            self.state.fpsr.set_invalid_operation(true);
        }
        let sign = value.raw() >> 63;
        let payload = value.quiet().raw() & ones(f64::FRACTION_BITS);
        f32::from_raw((sign << 31) | f32::default_nan().raw() | (payload >> 29))
    }

    fn float_dp2<T: Fp>(&mut self, word: u32) -> ExecResult {
        let op = match word.get_bits(12..=15) {
            0b0000 => FpBinary::Mul,
            0b0001 => FpBinary::Div,
            0b0010 => FpBinary::Add,
            0b0011 => FpBinary::Sub,
            0b0100 => FpBinary::Max,
            0b0101 => FpBinary::Min,
            0b0110 => FpBinary::MaxNum,
            0b0111 => FpBinary::MinNum,
            0b1000 => FpBinary::NegatedMul,
            _ => return Err(unallocated(word, "floating point (2 source)")),
        };

        let a: T = self.fp_reg(rn(word));
        let b: T = self.fp_reg(rm(word));
        let result = self.fp_binary(op, a, b);
        self.set_fp_reg(rd(word), result);

        Ok(Status::Ready)
    }

    /// `FCMP`, `FCMPE`, optionally against `#0.0`.
    fn float_compare<T: Fp>(&mut self, word: u32) -> ExecResult {
        if word.get_bits(14..=15) != 0 || word.get_bits(0..=2) != 0 {
            return Err(unallocated(word, "floating point compare"));
        }

        let a: T = self.fp_reg(rn(word));
        let b = if word.get_bit(3) {
            T::ZERO
        } else {
            self.fp_reg(rm(word))
        };
        self.state.nzcv = self.fp_compare(a, b, word.get_bit(4));

        Ok(Status::Ready)
    }

    fn float_move_immediate<T: Fp>(&mut self, word: u32) -> ExecResult {
        if word.get_bits(5..=9) != 0 {
            return Err(unallocated(word, "FMOV (scalar, immediate)"));
        }
        self.set_fp_reg(rd(word), T::expand_immediate(word.get_bits(13..=20)));

        Ok(Status::Ready)
    }

    /// `FCCMP`, `FCCMPE`.
    fn float_conditional_compare<T: Fp>(&mut self, word: u32) -> ExecResult {
        let condition = Condition::from(word.get_bits(12..=15));
        self.state.nzcv = if condition.holds(self.state.nzcv) {
            let a: T = self.fp_reg(rn(word));
            let b: T = self.fp_reg(rm(word));
            self.fp_compare(a, b, word.get_bit(4))
        } else {
            Nzcv::from_nibble(word.get_bits(0..=3))
        };

        Ok(Status::Ready)
    }

    fn float_conditional_select<T: Fp>(&mut self, word: u32) -> ExecResult {
        let condition = Condition::from(word.get_bits(12..=15));
        let source = if condition.holds(self.state.nzcv) {
            rn(word)
        } else {
            rm(word)
        };
        let value: T = self.fp_reg(source);
        self.set_fp_reg(rd(word), value);

        Ok(Status::Ready)
    }

    /// Conversions between floating point and general registers, including
    /// `FMOV` (general).
    fn float_integer_conversion(&mut self, word: u32) -> ExecResult {
        let sf = word.get_bit(31);
        let ftype = word.get_bits(22..=23);
        let rmode = word.get_bits(19..=20);
        let opcode = word.get_bits(16..=18);
        let (rd, rn) = (rd(word), rn(word));

        match (opcode, rmode, ftype, sf) {
            (0b110 | 0b111, 0b00, 0b00, false) | (0b110 | 0b111, 0b00, 0b01, true) => {
                let mask = ones(if sf { 64 } else { 32 });
                if opcode == 0b110 {
                    let value = self.state.vectors.lane::<u64>(rn, 0) & mask;
                    self.state.set_reg(sf, rd, value, R31::Zr);
                } else {
                    let value = self.state.reg(sf, rn, R31::Zr);
                    if sf {
                        self.state.vectors.set_scalar(rd, value);
                    } else {
                        self.state.vectors.set_scalar(rd, value as u32);
                    }
                }
                Ok(Status::Ready)
            }
            (0b110, 0b01, 0b10, true) => {
                let value = self.state.vectors.lane::<u64>(rn, 1);
                self.state.set_x(rd, value);
                Ok(Status::Ready)
            }
            (0b111, 0b01, 0b10, true) => {
                let value = self.state.x(rn);
                self.state.vectors.set_lane(rd, 1, value);
                Ok(Status::Ready)
            }
            (_, _, 0b11, _) => Err(not_yet_implemented(word, "half precision conversion")),
            (0b110, 0b11, 0b01, false) => Err(not_yet_implemented(word, "FJCVTZS")),
            (_, _, 0b10, _) => Err(unallocated(word, "floating point conversion")),
            (0b000 | 0b001, _, _, _) | (0b100 | 0b101, 0b00, _, _) => {
                let rounding = if opcode & 0b100 == 0 {
                    Rounding::from(rmode)
                } else {
                    Rounding::TiesAway
                };
                let signed = opcode & 1 == 0;
                let bits = if sf { 64 } else { 32 };
                let value = if ftype == 0 {
                    let value: f32 = self.fp_reg(rn);
                    self.fp_to_integer(value, rounding, signed, bits, 0)
                } else {
                    let value: f64 = self.fp_reg(rn);
                    self.fp_to_integer(value, rounding, signed, bits, 0)
                };
                self.state.set_reg(sf, rd, value, R31::Zr);
                Ok(Status::Ready)
            }
            (0b010 | 0b011, 0b00, _, _) => {
                let signed = opcode == 0b010;
                let bits = if sf { 64 } else { 32 };
                let value = self.state.x(rn);
                if ftype == 0 {
                    let result: f32 = Self::integer_to_fp(value, signed, bits, 0);
                    self.set_fp_reg(rd, result);
                } else {
                    let result: f64 = Self::integer_to_fp(value, signed, bits, 0);
                    self.set_fp_reg(rd, result);
                }
                Ok(Status::Ready)
            }
            _ => Err(unallocated(word, "floating point conversion")),
        }
    }

    /// `SCVTF`, `UCVTF`, `FCVTZS`, `FCVTZU` with a fixed-point operand.
    fn float_fixed_conversion(&mut self, word: u32) -> ExecResult {
        let sf = word.get_bit(31);
        let ftype = word.get_bits(22..=23);
        let scale = word.get_bits(10..=15);
        let bits = if sf { 64 } else { 32 };
        if !sf && scale < 32 {
            return Err(unallocated(word, "fixed-point conversion"));
        }
        let fbits = 64 - scale;
        let (rd, rn) = (rd(word), rn(word));

        match ftype {
            0b11 => return Err(not_yet_implemented(word, "half precision conversion")),
            0b10 => return Err(unallocated(word, "fixed-point conversion")),
            _ => {}
        }
        let double = ftype == 0b01;

        match word.get_bits(16..=20) {
            0b0_0010 | 0b0_0011 => {
                let signed = !word.get_bit(16);
                let value = self.state.x(rn);
                if double {
                    let result: f64 = Self::integer_to_fp(value, signed, bits, fbits);
                    self.set_fp_reg(rd, result);
                } else {
                    let result: f32 = Self::integer_to_fp(value, signed, bits, fbits);
                    self.set_fp_reg(rd, result);
                }
            }
            0b1_1000 | 0b1_1001 => {
                let signed = !word.get_bit(16);
                let value = if double {
                    let value: f64 = self.fp_reg(rn);
                    self.fp_to_integer(value, Rounding::Zero, signed, bits, fbits)
                } else {
                    let value: f32 = self.fp_reg(rn);
                    self.fp_to_integer(value, Rounding::Zero, signed, bits, fbits)
                };
                self.state.set_reg(sf, rd, value, R31::Zr);
            }
            _ => return Err(unallocated(word, "fixed-point conversion")),
        }

        Ok(Status::Ready)
    }

    /// `FMADD`, `FMSUB`, `FNMADD`, `FNMSUB`.
    pub(crate) fn float_data_processing_3(&mut self, word: u32) -> ExecResult {
        if word.get_bit(31) || word.get_bit(29) {
            return Err(unallocated(word, "floating point (3 source)"));
        }
        self.with_precision(word, Self::fused_multiply_add::<f32>, Self::fused_multiply_add::<f64>)
    }

    fn fused_multiply_add<T: Fp>(&mut self, word: u32) -> ExecResult {
        let n: T = self.fp_reg(rn(word));
        let m: T = self.fp_reg(rm(word));
        let a: T = self.fp_reg(word.get_bits(10..=14));

        let negate_product = word.get_bit(15) != word.get_bit(21);
        let negate_addend = word.get_bit(21);
        let n = if negate_product { -n } else { n };
        let a = if negate_addend { -a } else { a };

        let result = self.fp_mul_add(a, n, m);
        self.set_fp_reg(rd(word), result);

        Ok(Status::Ready)
    }
}

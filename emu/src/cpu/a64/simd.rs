//! # Advanced SIMD
//!
//! Vector forms, plus the lane operations the scalar forms in
//! [`simd_scalar`](super::simd_scalar) run over a single element.
//!
//! Every instruction builds its result in a fresh [`Vector`] and writes it
//! back through [`Vector::sized`], so a 64-bit (`Q` clear) result always
//! zeroes the upper half of the destination. The only exceptions are the
//! element inserts and the upper-half (`2`) narrowing forms, which keep the
//! part of the destination they do not write.

use crate::bitwise::{Bits, ones, replicate};
use crate::cpu::a64::float::{Fp, FpBinary, Rounding};
use crate::cpu::a64::{rd, rm, rn};
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::interpreter::Interpreter;
use crate::cpu::registers::R31;
use crate::cpu::status::{ErrorKind, ExecResult, Status};
use crate::cpu::vector::{Vector, element_mask};

/// Element size and count of an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Arrangement {
    pub esize: u32,
    pub elements: usize,
    pub full: bool,
}

impl Arrangement {
    /// Lanes of `esize` bits filling 64 or (`full`) 128 bits.
    pub(crate) fn vector(word: u32, esize: u32, full: bool) -> Result<Self, ErrorKind> {
        if esize == 64 && !full {
            return Err(unallocated(word, "vector arrangement"));
        }
        Ok(Self {
            esize,
            elements: (if full { 128 } else { 64 }) / esize as usize,
            full,
        })
    }

    pub(crate) const fn scalar(esize: u32) -> Self {
        Self {
            esize,
            elements: 1,
            full: false,
        }
    }

    /// The scalar shape, or the vector shape selected by `Q`.
    pub(crate) fn of(word: u32, esize: u32, scalar: bool) -> Result<Self, ErrorKind> {
        if scalar {
            Ok(Self::scalar(esize))
        } else {
            Self::vector(word, esize, word.get_bit(30))
        }
    }
}

/// An element as a wide integer, sign- or zero-extended.
pub(crate) fn widen(value: u64, signed: bool, esize: u32) -> i128 {
    if signed {
        i128::from(value.sign_extended(esize) as i64)
    } else {
        i128::from(value & element_mask(esize))
    }
}

/// Element `index` of the concatenation `m:n`, as the pairwise forms see it.
fn pair_element(n: &Vector, m: &Vector, index: usize, arrangement: Arrangement) -> u64 {
    if index < arrangement.elements {
        n.element(index, arrangement.esize)
    } else {
        m.element(index - arrangement.elements, arrangement.esize)
    }
}

fn pair_lane<T: Fp>(n: &Vector, m: &Vector, index: usize, elements: usize) -> T {
    if index < elements {
        n.lane(index)
    } else {
        m.lane(index - elements)
    }
}

/// `SSHL`/`USHL`: shifts left by the signed low byte of `shift`, right when
/// it is negative.
fn shift_by_register(value: u64, shift: u64, signed: bool, esize: u32) -> u64 {
    let amount = i32::from(shift as u8 as i8);
    let x = widen(value, signed, esize);
    let shifted = if amount >= esize as i32 {
        0
    } else if amount >= 0 {
        x << amount
    } else {
        x >> (-amount).min(127)
    };
    shifted as u64 & element_mask(esize)
}

/// Shifts right by `shift` (1 to `esize`), optionally rounding.
pub(crate) fn shift_right(value: u64, signed: bool, esize: u32, shift: u32, rounding: bool) -> u64 {
    let mut x = widen(value, signed, esize);
    if rounding {
        x += 1 << (shift - 1);
    }
    (x >> shift) as u64 & element_mask(esize)
}

fn polynomial_multiply(a: u64, b: u64, esize: u32) -> u64 {
    let a = a & element_mask(esize);
    (0..esize)
        .filter(|&bit| b.get_bit(bit))
        .fold(0, |product, bit| product ^ (a << bit))
        & element_mask(esize)
}

fn count_leading_zeros(value: u64, esize: u32) -> u64 {
    u64::from((value & element_mask(esize)).leading_zeros() - (64 - esize))
}

/// Reverses the order of `esize` elements within each `container` bits.
fn reverse_elements(source: &Vector, arrangement: Arrangement, container: u32) -> Vector {
    let per_container = (container / arrangement.esize) as usize;
    let mut result = Vector::default();
    for e in 0..arrangement.elements {
        let base = e / per_container * per_container;
        let from = base + per_container - 1 - e % per_container;
        result.set_element(e, arrangement.esize, source.element(from, arrangement.esize));
    }
    result
}

/// Integer lane operations of the three-same and by-element groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IntBinary {
    HalvingAdd,
    SaturatingAdd,
    RoundingHalvingAdd,
    HalvingSub,
    SaturatingSub,
    Greater,
    GreaterEqual,
    ShiftLeft,
    Max,
    Min,
    AbsoluteDifference,
    AbsoluteDifferenceAccumulate,
    Add,
    Sub,
    Test,
    Equal,
    MultiplyAdd,
    MultiplySub,
    Multiply,
    PolynomialMultiply,
}

impl IntBinary {
    /// The three-same `opcode` `[15:11]` with `U`.
    fn from_three_same(opcode: u32, u: bool) -> Option<Self> {
        let op = match (opcode, u) {
            (0b0_0000, _) => Self::HalvingAdd,
            (0b0_0001, _) => Self::SaturatingAdd,
            (0b0_0010, _) => Self::RoundingHalvingAdd,
            (0b0_0100, _) => Self::HalvingSub,
            (0b0_0101, _) => Self::SaturatingSub,
            (0b0_0110, _) => Self::Greater,
            (0b0_0111, _) => Self::GreaterEqual,
            (0b0_1000, _) => Self::ShiftLeft,
            (0b0_1100 | 0b1_0100, _) => Self::Max,
            (0b0_1101 | 0b1_0101, _) => Self::Min,
            (0b0_1110, _) => Self::AbsoluteDifference,
            (0b0_1111, _) => Self::AbsoluteDifferenceAccumulate,
            (0b1_0000, false) | (0b1_0111, false) => Self::Add,
            (0b1_0000, true) => Self::Sub,
            (0b1_0001, false) => Self::Test,
            (0b1_0001, true) => Self::Equal,
            (0b1_0010, false) => Self::MultiplyAdd,
            (0b1_0010, true) => Self::MultiplySub,
            (0b1_0011, false) => Self::Multiply,
            (0b1_0011, true) => Self::PolynomialMultiply,
            _ => return None,
        };
        Some(op)
    }

    /// Operations that do not exist for 64-bit elements.
    const fn narrow_only(self) -> bool {
        !matches!(
            self,
            Self::SaturatingAdd
                | Self::SaturatingSub
                | Self::Greater
                | Self::GreaterEqual
                | Self::ShiftLeft
                | Self::Add
                | Self::Sub
                | Self::Test
                | Self::Equal
        )
    }

    /// The forms that also exist as scalar instructions.
    const fn has_scalar_form(self) -> bool {
        !self.narrow_only()
    }
}

/// Floating-point comparisons producing lane masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FpCompare {
    Equal,
    GreaterEqual,
    Greater,
    AbsGreaterEqual,
    AbsGreater,
    LessEqual,
    Less,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FloatLanes {
    Binary(FpBinary),
    Pairwise(FpBinary),
    MultiplyAdd,
    MultiplySub,
    Compare(FpCompare),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FloatUnary {
    Abs,
    Neg,
    Sqrt,
    Round(Rounding),
    ToInteger(Rounding, bool),
    FromInteger(bool),
    CompareZero(FpCompare),
}

impl Interpreter {
    /// Clamps to the `esize` range, setting `QC` when it had to.
    pub(crate) fn saturate(&mut self, value: i128, signed: bool, esize: u32) -> u64 {
        let (min, max) = if signed {
            (-(1_i128 << (esize - 1)), (1_i128 << (esize - 1)) - 1)
        } else {
            (0, (1_i128 << esize) - 1)
        };
        let clamped = value.clamp(min, max);
        if clamped != value {
            self.state.fpsr.set_saturation(true);
        }
        clamped as u64 & element_mask(esize)
    }

    pub(crate) fn int_binary(
        &mut self,
        op: IntBinary,
        signed: bool,
        esize: u32,
        a: u64,
        b: u64,
        accumulator: u64,
    ) -> u64 {
        let x = widen(a, signed, esize);
        let y = widen(b, signed, esize);
        let acc = i128::from(accumulator & element_mask(esize));
        let truth = |condition: bool| if condition { element_mask(esize) } else { 0 };

        let value = match op {
            IntBinary::HalvingAdd => (x + y) >> 1,
            IntBinary::RoundingHalvingAdd => (x + y + 1) >> 1,
            IntBinary::HalvingSub => (x - y) >> 1,
            IntBinary::SaturatingAdd => return self.saturate(x + y, signed, esize),
            IntBinary::SaturatingSub => return self.saturate(x - y, signed, esize),
            IntBinary::Greater => return truth(x > y),
            IntBinary::GreaterEqual => return truth(x >= y),
            IntBinary::Test => return truth((a & b & element_mask(esize)) != 0),
            IntBinary::Equal => return truth(x == y),
            IntBinary::ShiftLeft => return shift_by_register(a, b, signed, esize),
            IntBinary::PolynomialMultiply => return polynomial_multiply(a, b, esize),
            IntBinary::Max => x.max(y),
            IntBinary::Min => x.min(y),
            IntBinary::AbsoluteDifference => (x - y).abs(),
            IntBinary::AbsoluteDifferenceAccumulate => acc + (x - y).abs(),
            IntBinary::Add => x + y,
            IntBinary::Sub => x - y,
            IntBinary::Multiply => x * y,
            IntBinary::MultiplyAdd => acc + x * y,
            IntBinary::MultiplySub => acc - x * y,
        };
        value as u64 & element_mask(esize)
    }

    /// Lane mask outcome of a floating-point comparison. Only `Equal` is a
    /// quiet comparison.
    pub(crate) fn fp_compare_lanes<T: Fp>(&mut self, compare: FpCompare, a: T, b: T) -> bool {
        let (a, b) = match compare {
            FpCompare::AbsGreaterEqual | FpCompare::AbsGreater => (a.abs(), b.abs()),
            _ => (a, b),
        };
        let any_nan = a.is_nan() || b.is_nan();
        if a.is_signalling() || b.is_signalling() || (compare != FpCompare::Equal && any_nan) {
            self.state.fpsr.set_invalid_operation(true);
        }
        match compare {
            FpCompare::Equal => a == b,
            FpCompare::GreaterEqual | FpCompare::AbsGreaterEqual => a >= b,
            FpCompare::Greater | FpCompare::AbsGreater => a > b,
            FpCompare::LessEqual => a <= b,
            FpCompare::Less => a < b,
        }
    }

    fn write_vector(&mut self, rd: u32, value: Vector, arrangement: Arrangement) {
        self.state.vectors.set(rd, value.sized(arrangement.full));
    }

    /// Writes 64 bits into the lower half (clearing the upper) or into the
    /// upper half (keeping the lower) of `rd`.
    fn write_half(&mut self, rd: u32, half: Vector, upper: bool) {
        if upper {
            let low = half.lane::<u64>(0);
            self.state.vectors.set_lane(rd, 1, low);
        } else {
            self.state.vectors.set(rd, half.sized(false));
        }
    }

    fn map_lanes(&mut self, word: u32, arrangement: Arrangement, f: impl Fn(u64) -> u64) {
        let source = self.state.vectors.get(rn(word));
        let mut result = Vector::default();
        for e in 0..arrangement.elements {
            result.set_element(e, arrangement.esize, f(source.element(e, arrangement.esize)));
        }
        self.write_vector(rd(word), result, arrangement);
    }

    fn int_lanes(&mut self, word: u32, op: IntBinary, signed: bool, arrangement: Arrangement) {
        let esize = arrangement.esize;
        let n = self.state.vectors.get(rn(word));
        let m = self.state.vectors.get(rm(word));
        let d = self.state.vectors.get(rd(word));

        let mut result = Vector::default();
        for e in 0..arrangement.elements {
            let value = self.int_binary(
                op,
                signed,
                esize,
                n.element(e, esize),
                m.element(e, esize),
                d.element(e, esize),
            );
            result.set_element(e, esize, value);
        }
        self.write_vector(rd(word), result, arrangement);
    }

    fn int_pairwise(&mut self, word: u32, op: IntBinary, signed: bool, arrangement: Arrangement) {
        let esize = arrangement.esize;
        let n = self.state.vectors.get(rn(word));
        let m = self.state.vectors.get(rm(word));

        let mut result = Vector::default();
        for e in 0..arrangement.elements {
            let a = pair_element(&n, &m, 2 * e, arrangement);
            let b = pair_element(&n, &m, 2 * e + 1, arrangement);
            let value = self.int_binary(op, signed, esize, a, b, 0);
            result.set_element(e, esize, value);
        }
        self.write_vector(rd(word), result, arrangement);
    }

    /// `Rm`-indexed float lanes for the three-same and by-element forms.
    fn float_lanes<T: Fp>(
        &mut self,
        word: u32,
        op: FloatLanes,
        arrangement: Arrangement,
        element: Option<usize>,
        rm: u32,
    ) {
        let esize = arrangement.esize;
        let elements = arrangement.elements;
        let n = self.state.vectors.get(rn(word));
        let m = self.state.vectors.get(rm);
        let d = self.state.vectors.get(rd(word));

        let mut result = Vector::default();
        for e in 0..elements {
            let (a, b): (T, T) = match op {
                FloatLanes::Pairwise(_) => (
                    pair_lane(&n, &m, 2 * e, elements),
                    pair_lane(&n, &m, 2 * e + 1, elements),
                ),
                _ => (n.lane(e), m.lane(element.unwrap_or(e))),
            };
            match op {
                FloatLanes::Binary(op) | FloatLanes::Pairwise(op) => {
                    result.set_lane(e, self.fp_binary(op, a, b));
                }
                FloatLanes::MultiplyAdd => result.set_lane(e, self.fp_mul_add(d.lane(e), a, b)),
                FloatLanes::MultiplySub => result.set_lane(e, self.fp_mul_add(d.lane(e), -a, b)),
                FloatLanes::Compare(compare) => {
                    let mask = if self.fp_compare_lanes(compare, a, b) {
                        ones(esize)
                    } else {
                        0
                    };
                    result.set_element(e, esize, mask);
                }
            }
        }
        self.write_vector(rd(word), result, arrangement);
    }

    /// Groups `[28] = 0, [24] = 0`.
    pub(crate) fn simd_vector(&mut self, word: u32) -> ExecResult {
        if word.get_bit(31) {
            return Err(unallocated(word, "SIMD"));
        }

        if word.get_bit(21) {
            if word.get_bit(10) {
                return self.three_same(word, false);
            }
            return match (word.get_bit(11), word.get_bits(17..=20)) {
                (false, _) => self.three_different(word),
                (true, 0b0000) => self.two_register_misc(word, false),
                (true, 0b1000) => self.across_lanes(word),
                _ => Err(not_yet_implemented(word, "SIMD (crypto, half precision)")),
            };
        }

        let plain = word.get_bits(22..=23) == 0 && !word.get_bit(15);
        match (word.get_bit(29), word.get_bit(10), word.get_bit(11)) {
            (_, true, _) if plain => self.copy(word),
            (_, true, _) => Err(not_yet_implemented(word, "SIMD three same (extra, half)")),
            (false, false, true) if !word.get_bit(15) => self.permute(word),
            (false, false, false) if plain => self.table_lookup(word),
            (true, false, _) if plain => self.extract_vector(word),
            _ => Err(unallocated(word, "SIMD")),
        }
    }

    /// Groups `[28] = 0, [24] = 1`.
    pub(crate) fn simd_vector_immediate(&mut self, word: u32) -> ExecResult {
        if word.get_bit(31) {
            return Err(unallocated(word, "SIMD"));
        }
        match (word.get_bit(10), word.get_bits(19..=22)) {
            (true, 0) => self.modified_immediate(word),
            (true, _) => self.shift_by_immediate(word, false),
            (false, _) => self.multiply_by_element(word, false),
        }
    }

    /// Three registers of the same arrangement.
    pub(crate) fn three_same(&mut self, word: u32, scalar: bool) -> ExecResult {
        let u = word.get_bit(29);
        let size = word.get_bits(22..=23);
        let opcode = word.get_bits(11..=15);

        if opcode >= 0b1_1000 {
            let esize = 32 << word.get_bits(22..=22);
            let arrangement = Arrangement::of(word, esize, scalar)?;
            return if esize == 32 {
                self.float_three_same::<f32>(word, arrangement, scalar)
            } else {
                self.float_three_same::<f64>(word, arrangement, scalar)
            };
        }

        if opcode == 0b0_0011 {
            return if scalar {
                Err(unallocated(word, "SIMD scalar logical"))
            } else {
                self.vector_logical(word)
            };
        }

        let Some(op) = IntBinary::from_three_same(opcode, u) else {
            return match opcode {
                0b0_1001..=0b0_1011 | 0b1_0110 => {
                    Err(not_yet_implemented(word, "SIMD saturating shift/multiply"))
                }
                _ => Err(unallocated(word, "SIMD three same")),
            };
        };

        let esize = 8 << size;
        let saturating = matches!(op, IntBinary::SaturatingAdd | IntBinary::SaturatingSub);
        if scalar && (!op.has_scalar_form() || opcode == 0b1_0111 || (esize != 64 && !saturating)) {
            return Err(unallocated(word, "SIMD scalar three same"));
        }
        if (esize == 64 && op.narrow_only())
            || (op == IntBinary::PolynomialMultiply && esize != 8)
            || (opcode == 0b1_0111 && u)
        {
            return Err(unallocated(word, "SIMD three same"));
        }

        let arrangement = Arrangement::of(word, esize, scalar)?;
        if opcode >= 0b1_0100 && opcode != 0b1_0110 && opcode <= 0b1_0111 {
            self.int_pairwise(word, op, !u, arrangement);
        } else {
            self.int_lanes(word, op, !u, arrangement);
        }

        Ok(Status::Ready)
    }

    fn float_three_same<T: Fp>(
        &mut self,
        word: u32,
        arrangement: Arrangement,
        scalar: bool,
    ) -> ExecResult {
        let u = word.get_bit(29);
        let a = word.get_bit(23);

        let op = match (word.get_bits(11..=15), u, a) {
            (0b1_1000, false, false) => FloatLanes::Binary(FpBinary::MaxNum),
            (0b1_1000, false, true) => FloatLanes::Binary(FpBinary::MinNum),
            (0b1_1000, true, false) => FloatLanes::Pairwise(FpBinary::MaxNum),
            (0b1_1000, true, true) => FloatLanes::Pairwise(FpBinary::MinNum),
            (0b1_1001, false, false) => FloatLanes::MultiplyAdd,
            (0b1_1001, false, true) => FloatLanes::MultiplySub,
            (0b1_1010, false, false) => FloatLanes::Binary(FpBinary::Add),
            (0b1_1010, false, true) => FloatLanes::Binary(FpBinary::Sub),
            (0b1_1010, true, false) => FloatLanes::Pairwise(FpBinary::Add),
            (0b1_1010, true, true) => FloatLanes::Binary(FpBinary::AbsoluteDifference),
            (0b1_1011, true, false) => FloatLanes::Binary(FpBinary::Mul),
            (0b1_1100, false, false) => FloatLanes::Compare(FpCompare::Equal),
            (0b1_1100, true, false) => FloatLanes::Compare(FpCompare::GreaterEqual),
            (0b1_1100, true, true) => FloatLanes::Compare(FpCompare::Greater),
            (0b1_1101, true, false) => FloatLanes::Compare(FpCompare::AbsGreaterEqual),
            (0b1_1101, true, true) => FloatLanes::Compare(FpCompare::AbsGreater),
            (0b1_1110, false, false) => FloatLanes::Binary(FpBinary::Max),
            (0b1_1110, false, true) => FloatLanes::Binary(FpBinary::Min),
            (0b1_1110, true, false) => FloatLanes::Pairwise(FpBinary::Max),
            (0b1_1110, true, true) => FloatLanes::Pairwise(FpBinary::Min),
            (0b1_1111, true, false) => FloatLanes::Binary(FpBinary::Div),
            (0b1_1011, false, false) | (0b1_1111, false, _) => {
                return Err(not_yet_implemented(word, "FMULX/FRECPS/FRSQRTS"));
            }
            _ => return Err(unallocated(word, "SIMD three same (float)")),
        };

        let scalar_form = matches!(
            op,
            FloatLanes::Compare(_) | FloatLanes::Binary(FpBinary::AbsoluteDifference)
        );
        if scalar && !scalar_form {
            return Err(unallocated(word, "SIMD scalar three same (float)"));
        }

        self.float_lanes::<T>(word, op, arrangement, None, rm(word));
        Ok(Status::Ready)
    }

    /// `AND`, `BIC`, `ORR`, `ORN`, `EOR`, `BSL`, `BIT`, `BIF`.
    fn vector_logical(&mut self, word: u32) -> ExecResult {
        let n = self.state.vectors.q(rn(word));
        let m = self.state.vectors.q(rm(word));
        let d = self.state.vectors.q(rd(word));

        let value = match (word.get_bit(29), word.get_bits(22..=23)) {
            (false, 0b00) => n & m,
            (false, 0b01) => n & !m,
            (false, 0b10) => n | m,
            (false, _) => n | !m,
            (true, 0b00) => n ^ m,
            (true, 0b01) => (d & n) | (!d & m),
            (true, 0b10) => (d & !m) | (n & m),
            (true, _) => (d & m) | (n & !m),
        };
        let full = word.get_bit(30);
        self.state
            .vectors
            .set(rd(word), Vector::from_u128(value).sized(full));

        Ok(Status::Ready)
    }

    /// Long, wide and narrowing-high forms. `Q` selects the upper half of
    /// the narrow operands (the `2` variants).
    fn three_different(&mut self, word: u32) -> ExecResult {
        let size = word.get_bits(22..=23);
        if size == 0b11 {
            return Err(unallocated(word, "SIMD three different"));
        }
        let u = word.get_bit(29);
        let signed = !u;
        let upper = word.get_bit(30);
        let esize = 8 << size;
        let wide = esize * 2;
        let elements = (64 / esize) as usize;
        let part = if upper { elements } else { 0 };

        let n = self.state.vectors.get(rn(word));
        let m = self.state.vectors.get(rm(word));
        let d = self.state.vectors.get(rd(word));

        let opcode = word.get_bits(12..=15);
        match (opcode, u) {
            (0b0100 | 0b0110, false) => {
                let mut result = Vector::default();
                for e in 0..elements {
                    let (a, b) = (n.element(e, wide), m.element(e, wide));
                    let sum = if opcode == 0b0100 {
                        a.wrapping_add(b)
                    } else {
                        a.wrapping_sub(b)
                    };
                    result.set_element(e, esize, sum >> esize);
                }
                self.write_half(rd(word), result, upper);
                return Ok(Status::Ready);
            }
            (0b0100 | 0b0110, true) => {
                return Err(not_yet_implemented(word, "RADDHN/RSUBHN"));
            }
            (0b1001 | 0b1011 | 0b1101 | 0b1110, _) => {
                return Err(not_yet_implemented(word, "SQDML*/PMULL"));
            }
            (0b1111, _) => return Err(unallocated(word, "SIMD three different")),
            _ => {}
        }

        let mut result = Vector::default();
        for e in 0..elements {
            let x = if opcode == 0b0001 || opcode == 0b0011 {
                widen(n.element(e, wide), signed, wide)
            } else {
                widen(n.element(part + e, esize), signed, esize)
            };
            let y = widen(m.element(part + e, esize), signed, esize);
            let acc = i128::from(d.element(e, wide));

            let value = match opcode {
                0b0000 | 0b0001 => x + y,
                0b0010 | 0b0011 => x - y,
                0b0101 => acc + (x - y).abs(),
                0b0111 => (x - y).abs(),
                0b1000 => acc + x * y,
                0b1010 => acc - x * y,
                _ => x * y,
            };
            result.set_element(e, wide, value as u64);
        }
        self.state.vectors.set(rd(word), result);

        Ok(Status::Ready)
    }

    pub(crate) fn two_register_misc(&mut self, word: u32, scalar: bool) -> ExecResult {
        let opcode = word.get_bits(12..=16);
        match opcode {
            0b0_0000..=0b0_1011 | 0b1_0010..=0b1_0100 => self.integer_misc(word, scalar),
            0b1_0110 | 0b1_0111 if scalar => {
                Err(not_yet_implemented(word, "SIMD scalar FCVTXN"))
            }
            0b1_0110 | 0b1_0111 => self.convert_long_narrow(word),
            _ => {
                let esize = 32 << word.get_bits(22..=22);
                let arrangement = Arrangement::of(word, esize, scalar)?;
                if esize == 32 {
                    self.float_misc::<f32>(word, arrangement, scalar)
                } else {
                    self.float_misc::<f64>(word, arrangement, scalar)
                }
            }
        }
    }

    fn integer_misc(&mut self, word: u32, scalar: bool) -> ExecResult {
        let u = word.get_bit(29);
        let size = word.get_bits(22..=23);
        let esize = 8 << size;
        let opcode = word.get_bits(12..=16);

        let compare_or_abs = matches!(opcode, 0b0_1000..=0b0_1011);
        if scalar {
            if matches!(opcode, 0b0_0011 | 0b0_0111 | 0b1_0010 | 0b1_0100) {
                return Err(not_yet_implemented(word, "SIMD scalar saturating"));
            }
            if !compare_or_abs || size != 0b11 || (opcode == 0b0_1010 && u) {
                return Err(unallocated(word, "SIMD scalar two-register misc"));
            }
        }

        let full = word.get_bit(30);
        match (opcode, u) {
            (0b0_0000, _) | (0b0_0001, false) => {
                let container = match (opcode, u) {
                    (0b0_0000, false) => 64,
                    (0b0_0000, true) => 32,
                    _ => 16,
                };
                if esize >= container {
                    return Err(unallocated(word, "REV"));
                }
                let arrangement = Arrangement::vector(word, esize, full)?;
                let source = self.state.vectors.get(rn(word));
                let result = reverse_elements(&source, arrangement, container);
                self.write_vector(rd(word), result, arrangement);
            }
            (0b0_0010 | 0b0_0110, _) => {
                if size == 0b11 {
                    return Err(unallocated(word, "ADDLP/ADALP"));
                }
                let accumulate = opcode == 0b0_0110;
                let wide = esize * 2;
                let arrangement = Arrangement::vector(word, wide, full)?;
                let source = self.state.vectors.get(rn(word));
                let d = self.state.vectors.get(rd(word));
                let mut result = Vector::default();
                for e in 0..arrangement.elements {
                    let a = widen(source.element(2 * e, esize), !u, esize);
                    let b = widen(source.element(2 * e + 1, esize), !u, esize);
                    let acc = if accumulate {
                        i128::from(d.element(e, wide))
                    } else {
                        0
                    };
                    result.set_element(e, wide, (acc + a + b) as u64);
                }
                self.write_vector(rd(word), result, arrangement);
            }
            (0b0_0011 | 0b0_0111, _) => {
                return Err(not_yet_implemented(word, "SUQADD/USQADD/SQABS/SQNEG"));
            }
            (0b0_0100, _) if size != 0b11 => {
                let arrangement = Arrangement::vector(word, esize, full)?;
                self.map_lanes(word, arrangement, |x| {
                    if u {
                        count_leading_zeros(x, esize)
                    } else {
                        let sign_copies = if x.get_bit(esize - 1) { !x } else { x };
                        count_leading_zeros((sign_copies << 1) | 1, esize)
                    }
                });
            }
            (0b0_0101, false) if size == 0 => {
                let arrangement = Arrangement::vector(word, 8, full)?;
                self.map_lanes(word, arrangement, |x| u64::from((x as u8).count_ones()));
            }
            (0b0_0101, true) if size == 0 => {
                let arrangement = Arrangement::vector(word, 8, full)?;
                self.map_lanes(word, arrangement, |x| !x);
            }
            (0b0_0101, true) if size == 1 => {
                let arrangement = Arrangement::vector(word, 8, full)?;
                self.map_lanes(word, arrangement, |x| u64::from((x as u8).reverse_bits()));
            }
            (0b0_1000..=0b0_1010, _) if !(opcode == 0b0_1010 && u) => {
                let arrangement = Arrangement::of(word, esize, scalar)?;
                self.map_lanes(word, arrangement, |x| {
                    let x = widen(x, true, esize);
                    let holds = match (opcode, u) {
                        (0b0_1000, false) => x > 0,
                        (0b0_1000, true) => x >= 0,
                        (0b0_1001, false) => x == 0,
                        (0b0_1001, true) => x <= 0,
                        _ => x < 0,
                    };
                    if holds { ones(esize) } else { 0 }
                });
            }
            (0b0_1011, _) => {
                let arrangement = Arrangement::of(word, esize, scalar)?;
                self.map_lanes(word, arrangement, |x| {
                    let x = widen(x, true, esize);
                    (if u { -x } else { x.abs() }) as u64
                });
            }
            (0b1_0010, false) if size != 0b11 => {
                let source = self.state.vectors.get(rn(word));
                let elements = (64 / esize) as usize;
                let mut result = Vector::default();
                for e in 0..elements {
                    result.set_element(e, esize, source.element(e, esize * 2));
                }
                self.write_half(rd(word), result, full);
            }
            (0b1_0010, true) | (0b1_0011, true) | (0b1_0100, _) => {
                return Err(not_yet_implemented(word, "SQXTUN/SHLL/SQXTN"));
            }
            _ => return Err(unallocated(word, "SIMD two-register misc")),
        }

        Ok(Status::Ready)
    }

    /// `FCVTL` (single to double) and `FCVTN` (double to single).
    fn convert_long_narrow(&mut self, word: u32) -> ExecResult {
        if word.get_bit(29) {
            return Err(not_yet_implemented(word, "FCVTXN"));
        }
        if !word.get_bit(22) {
            return Err(not_yet_implemented(word, "half precision FCVTL/FCVTN"));
        }
        let upper = word.get_bit(30);
        let source = self.state.vectors.get(rn(word));
        let mut result = Vector::default();

        if word.get_bit(12) {
            let part = if upper { 2 } else { 0 };
            for e in 0..2 {
                let value = self.fp_widen(source.lane(part + e));
                result.set_lane(e, value);
            }
            self.state.vectors.set(rd(word), result);
        } else {
            for e in 0..2 {
                let value = self.fp_narrow(source.lane(e));
                result.set_lane(e, value);
            }
            self.write_half(rd(word), result, upper);
        }

        Ok(Status::Ready)
    }

    fn float_misc<T: Fp>(&mut self, word: u32, arrangement: Arrangement, scalar: bool) -> ExecResult {
        let u = word.get_bit(29);
        let a = word.get_bit(23);

        let op = match (word.get_bits(12..=16), u, a) {
            (0b0_1100, false, true) => FloatUnary::CompareZero(FpCompare::Greater),
            (0b0_1100, true, true) => FloatUnary::CompareZero(FpCompare::GreaterEqual),
            (0b0_1101, false, true) => FloatUnary::CompareZero(FpCompare::Equal),
            (0b0_1101, true, true) => FloatUnary::CompareZero(FpCompare::LessEqual),
            (0b0_1110, false, true) => FloatUnary::CompareZero(FpCompare::Less),
            (0b0_1111, false, true) => FloatUnary::Abs,
            (0b0_1111, true, true) => FloatUnary::Neg,
            (0b1_1111, true, true) => FloatUnary::Sqrt,
            (0b1_1000, false, false) => FloatUnary::Round(Rounding::TiesEven),
            (0b1_1000, false, true) => FloatUnary::Round(Rounding::PlusInfinity),
            (0b1_1001, false, false) => FloatUnary::Round(Rounding::MinusInfinity),
            (0b1_1001, false, true) => FloatUnary::Round(Rounding::Zero),
            (0b1_1000, true, false) => FloatUnary::Round(Rounding::TiesAway),
            (0b1_1010, _, false) => FloatUnary::ToInteger(Rounding::TiesEven, !u),
            (0b1_1010, _, true) => FloatUnary::ToInteger(Rounding::PlusInfinity, !u),
            (0b1_1011, _, false) => FloatUnary::ToInteger(Rounding::MinusInfinity, !u),
            (0b1_1011, _, true) => FloatUnary::ToInteger(Rounding::Zero, !u),
            (0b1_1100, _, false) => FloatUnary::ToInteger(Rounding::TiesAway, !u),
            (0b1_1101, _, false) => FloatUnary::FromInteger(!u),
            (0b1_1001, true, _) => return Err(not_yet_implemented(word, "FRINTX/FRINTI")),
            (0b1_1100 | 0b1_1101, _, true) | (0b1_1110, _, _) | (0b1_1111, false, true) => {
                return Err(not_yet_implemented(word, "SIMD estimates/FRINT32"));
            }
            _ => return Err(unallocated(word, "SIMD two-register misc (float)")),
        };

        let scalar_form = matches!(
            op,
            FloatUnary::CompareZero(_) | FloatUnary::ToInteger(..) | FloatUnary::FromInteger(_)
        );
        if scalar && !scalar_form {
            return Err(unallocated(word, "SIMD scalar two-register misc (float)"));
        }

        let esize = arrangement.esize;
        let source = self.state.vectors.get(rn(word));
        let mut result = Vector::default();
        for e in 0..arrangement.elements {
            let x: T = source.lane(e);
            match op {
                FloatUnary::Abs => result.set_lane(e, x.abs()),
                FloatUnary::Neg => result.set_lane(e, -x),
                FloatUnary::Sqrt => result.set_lane(e, self.fp_sqrt(x)),
                FloatUnary::Round(rounding) => result.set_lane(e, self.fp_round(rounding, x)),
                FloatUnary::ToInteger(rounding, signed) => {
                    let value = self.fp_to_integer(x, rounding, signed, esize, 0);
                    result.set_element(e, esize, value);
                }
                FloatUnary::FromInteger(signed) => {
                    let value: T = Self::integer_to_fp(source.element(e, esize), signed, esize, 0);
                    result.set_lane(e, value);
                }
                FloatUnary::CompareZero(compare) => {
                    let mask = if self.fp_compare_lanes(compare, x, T::ZERO) {
                        ones(esize)
                    } else {
                        0
                    };
                    result.set_element(e, esize, mask);
                }
            }
        }
        self.write_vector(rd(word), result, arrangement);

        Ok(Status::Ready)
    }

    /// Reductions into a scalar.
    fn across_lanes(&mut self, word: u32) -> ExecResult {
        let u = word.get_bit(29);
        let full = word.get_bit(30);
        let size = word.get_bits(22..=23);
        let opcode = word.get_bits(12..=16);

        if opcode == 0b0_1100 || opcode == 0b0_1111 {
            if !u {
                return Err(not_yet_implemented(word, "half precision reduction"));
            }
            if word.get_bit(22) || !full {
                return Err(unallocated(word, "SIMD across lanes (float)"));
            }
            let op = match (opcode, word.get_bit(23)) {
                (0b0_1100, false) => FpBinary::MaxNum,
                (0b0_1100, true) => FpBinary::MinNum,
                (_, false) => FpBinary::Max,
                (_, true) => FpBinary::Min,
            };
            let source = self.state.vectors.get(rn(word));
            let lanes: [f32; 4] = std::array::from_fn(|e| source.lane(e));
            let low = self.fp_binary(op, lanes[0], lanes[1]);
            let high = self.fp_binary(op, lanes[2], lanes[3]);
            let result = self.fp_binary(op, low, high);
            self.state.vectors.set_scalar(rd(word), result);
            return Ok(Status::Ready);
        }

        if size == 0b11 || (size == 0b10 && !full) {
            return Err(unallocated(word, "SIMD across lanes"));
        }
        let esize = 8 << size;
        let arrangement = Arrangement::vector(word, esize, full)?;
        let source = self.state.vectors.get(rn(word));
        let signed = !u;
        let values = (0..arrangement.elements).map(|e| widen(source.element(e, esize), signed, esize));

        let (value, result_size) = match (opcode, u) {
            (0b0_0011, _) => (values.sum::<i128>(), esize * 2),
            (0b0_1010, _) => (values.max().unwrap_or_default(), esize),
            (0b1_1010, _) => (values.min().unwrap_or_default(), esize),
            (0b1_1011, false) => (values.sum::<i128>(), esize),
            _ => return Err(unallocated(word, "SIMD across lanes")),
        };

        let mut result = Vector::default();
        result.set_element(0, result_size, value as u64);
        self.state.vectors.set(rd(word), result);

        Ok(Status::Ready)
    }

    /// `DUP`, `INS`, `SMOV`, `UMOV`.
    fn copy(&mut self, word: u32) -> ExecResult {
        let imm5 = word.get_bits(16..=20);
        let imm4 = word.get_bits(11..=14);
        if imm5 & 0b1111 == 0 {
            return Err(unallocated(word, "SIMD copy"));
        }
        let size = imm5.trailing_zeros();
        let esize = 8 << size;
        let index = (imm5 >> (size + 1)) as usize;
        let full = word.get_bit(30);
        let (rd, rn) = (rd(word), rn(word));

        match (word.get_bit(29), imm4) {
            (false, 0b0000) => {
                let arrangement = Arrangement::vector(word, esize, full)?;
                let value = self.state.vectors.get(rn).element(index, esize);
                self.dup(rd, value, arrangement);
            }
            (false, 0b0001) => {
                let arrangement = Arrangement::vector(word, esize, full)?;
                let value = self.state.x(rn);
                self.dup(rd, value, arrangement);
            }
            (false, 0b0011) if full => {
                let value = self.state.x(rn);
                let mut vector = self.state.vectors.get(rd);
                vector.set_element(index, esize, value);
                self.state.vectors.set(rd, vector);
            }
            (false, 0b0101) if esize < 32 || (esize == 32 && full) => {
                let value = self.state.vectors.get(rn).signed_element(index, esize);
                self.state.set_reg(full, rd, value as u64, R31::Zr);
            }
            (false, 0b0111) if (esize == 64) == full => {
                let value = self.state.vectors.get(rn).element(index, esize);
                self.state.set_reg(full, rd, value, R31::Zr);
            }
            (true, _) if full => {
                let from = (imm4 >> size) as usize;
                let value = self.state.vectors.get(rn).element(from, esize);
                let mut vector = self.state.vectors.get(rd);
                vector.set_element(index, esize, value);
                self.state.vectors.set(rd, vector);
            }
            _ => return Err(unallocated(word, "SIMD copy")),
        }

        Ok(Status::Ready)
    }

    fn dup(&mut self, rd: u32, value: u64, arrangement: Arrangement) {
        let mut result = Vector::default();
        for e in 0..arrangement.elements {
            result.set_element(e, arrangement.esize, value);
        }
        self.write_vector(rd, result, arrangement);
    }

    /// `UZP1/2`, `TRN1/2`, `ZIP1/2`.
    fn permute(&mut self, word: u32) -> ExecResult {
        let esize = 8 << word.get_bits(22..=23);
        let arrangement = Arrangement::vector(word, esize, word.get_bit(30))?;
        let elements = arrangement.elements;
        let pairs = elements / 2;
        let part = usize::from(word.get_bit(14));
        let n = self.state.vectors.get(rn(word));
        let m = self.state.vectors.get(rm(word));

        let mut result = Vector::default();
        match word.get_bits(12..=13) {
            0b01 => {
                for e in 0..elements {
                    let value = pair_element(&n, &m, 2 * e + part, arrangement);
                    result.set_element(e, esize, value);
                }
            }
            0b10 => {
                for p in 0..pairs {
                    result.set_element(2 * p, esize, n.element(2 * p + part, esize));
                    result.set_element(2 * p + 1, esize, m.element(2 * p + part, esize));
                }
            }
            0b11 => {
                let base = part * pairs;
                for p in 0..pairs {
                    result.set_element(2 * p, esize, n.element(base + p, esize));
                    result.set_element(2 * p + 1, esize, m.element(base + p, esize));
                }
            }
            _ => return Err(unallocated(word, "SIMD permute")),
        }
        self.write_vector(rd(word), result, arrangement);

        Ok(Status::Ready)
    }

    /// `TBL`, `TBX` over one to four consecutive table registers.
    fn table_lookup(&mut self, word: u32) -> ExecResult {
        let registers = word.get_bits(13..=14) + 1;
        let extend = word.get_bit(12);
        let full = word.get_bit(30);

        let mut table = Vec::with_capacity(16 * registers as usize);
        let mut t = rn(word);
        for _ in 0..registers {
            table.extend_from_slice(&self.state.vectors.get(t).0);
            t = (t + 1) % 32;
        }

        let indices = self.state.vectors.get(rm(word));
        let mut result = self.state.vectors.get(rd(word));
        for (byte, &index) in result.0.iter_mut().zip(indices.0.iter()) {
            match table.get(usize::from(index)) {
                Some(&value) => *byte = value,
                None if extend => {}
                None => *byte = 0,
            }
        }
        self.state.vectors.set(rd(word), result.sized(full));

        Ok(Status::Ready)
    }

    /// `EXT`: bytes of `Vm:Vn` starting at byte `imm4`.
    fn extract_vector(&mut self, word: u32) -> ExecResult {
        let full = word.get_bit(30);
        let position = word.get_bits(11..=14) as usize;
        if !full && position >= 8 {
            return Err(unallocated(word, "EXT"));
        }
        let bytes = if full { 16 } else { 8 };
        let n = self.state.vectors.get(rn(word));
        let m = self.state.vectors.get(rm(word));

        let mut result = Vector::default();
        for (i, byte) in result.0.iter_mut().take(bytes).enumerate() {
            let from = position + i;
            *byte = if from < bytes {
                n.0[from]
            } else {
                m.0[from - bytes]
            };
        }
        self.state.vectors.set(rd(word), result);

        Ok(Status::Ready)
    }

    /// `MOVI`, `MVNI`, `ORR`, `BIC` and `FMOV` (vector, immediate).
    fn modified_immediate(&mut self, word: u32) -> ExecResult {
        let op = word.get_bit(29);
        let full = word.get_bit(30);
        let cmode = word.get_bits(12..=15);
        let imm8 = u64::from((word.get_bits(16..=18) << 5) | word.get_bits(5..=9));

        if word.get_bit(11) {
            return Err(not_yet_implemented(word, "FMOV (vector, half precision)"));
        }

        let immediate = match (cmode, op) {
            (0b0000..=0b0111, _) => replicate(imm8 << (8 * (cmode >> 1)), 32),
            (0b1000..=0b1011, _) => replicate(imm8 << (8 * ((cmode >> 1) & 1)), 16),
            (0b1100, _) => replicate((imm8 << 8) | 0xFF, 32),
            (0b1101, _) => replicate((imm8 << 16) | 0xFFFF, 32),
            (0b1110, false) => replicate(imm8, 8),
            (0b1110, true) => (0..8)
                .filter(|&bit| imm8.get_bit(bit))
                .fold(0, |mask, bit| mask | (0xFF << (8 * bit))),
            (_, false) => replicate(f32::expand_immediate(imm8 as u32).raw(), 32),
            (_, true) if full => f64::expand_immediate(imm8 as u32).raw(),
            (_, true) => return Err(unallocated(word, "FMOV (vector, immediate)")),
        };
        let immediate = (u128::from(immediate) << 64) | u128::from(immediate);

        let combines = cmode < 0b1100 && cmode & 1 == 1;
        let value = if combines && op {
            self.state.vectors.q(rd(word)) & !immediate
        } else if combines {
            self.state.vectors.q(rd(word)) | immediate
        } else if op && cmode < 0b1110 {
            !immediate
        } else {
            immediate
        };
        self.state
            .vectors
            .set(rd(word), Vector::from_u128(value).sized(full));

        Ok(Status::Ready)
    }

    /// Shifts by an immediate, shared by the vector and scalar groups.
    pub(crate) fn shift_by_immediate(&mut self, word: u32, scalar: bool) -> ExecResult {
        let immh = word.get_bits(19..=22);
        if immh == 0 {
            return Err(unallocated(word, "SIMD shift by immediate"));
        }
        let u = word.get_bit(29);
        let signed = !u;
        let opcode = word.get_bits(11..=15);
        let esize = 8 << (31 - immh.leading_zeros());
        let encoded = word.get_bits(16..=22);
        let right = 2 * esize - encoded;
        let left = encoded - esize;
        if matches!(opcode, 0b1_0000..=0b1_0100) {
            if scalar && (opcode == 0b1_0100 || (opcode <= 0b1_0001 && !u)) {
                return Err(unallocated(word, "SIMD scalar shift long/narrow"));
            }
            if scalar {
                return Err(not_yet_implemented(word, "SIMD scalar saturating narrow"));
            }
            if esize == 64 {
                return Err(unallocated(word, "SIMD shift long/narrow"));
            }
        }

        match (opcode, u) {
            (0b0_0000 | 0b0_0010 | 0b0_0100 | 0b0_0110, _) => {
                let rounding = opcode & 0b100 != 0;
                let accumulate = opcode & 0b10 != 0;
                let arrangement = Self::shift_arrangement(word, esize, scalar)?;
                let d = self.state.vectors.get(rd(word));
                let source = self.state.vectors.get(rn(word));
                let mut result = Vector::default();
                for e in 0..arrangement.elements {
                    let shifted = shift_right(source.element(e, esize), signed, esize, right, rounding);
                    let acc = if accumulate { d.element(e, esize) } else { 0 };
                    result.set_element(e, esize, acc.wrapping_add(shifted));
                }
                self.write_vector(rd(word), result, arrangement);
            }
            (0b0_1000, true) | (0b0_1010, _) => {
                let arrangement = Self::shift_arrangement(word, esize, scalar)?;
                let insert = u;
                let mask = if opcode == 0b0_1000 {
                    element_mask(esize).checked_shr(right).unwrap_or(0)
                } else {
                    (element_mask(esize) << left) & element_mask(esize)
                };
                let d = self.state.vectors.get(rd(word));
                let source = self.state.vectors.get(rn(word));
                let mut result = Vector::default();
                for e in 0..arrangement.elements {
                    let x = source.element(e, esize);
                    let shifted = if opcode == 0b0_1000 {
                        x.checked_shr(right).unwrap_or(0)
                    } else {
                        x << left
                    };
                    let value = if insert {
                        (d.element(e, esize) & !mask) | (shifted & mask)
                    } else {
                        shifted
                    };
                    result.set_element(e, esize, value);
                }
                self.write_vector(rd(word), result, arrangement);
            }
            (0b1_0000 | 0b1_0001, false) => {
                let rounding = opcode == 0b1_0001;
                let source = self.state.vectors.get(rn(word));
                let elements = (64 / esize) as usize;
                let mut result = Vector::default();
                for e in 0..elements {
                    let wide = source.element(e, esize * 2);
                    let shifted = shift_right(wide, false, esize * 2, right, rounding);
                    result.set_element(e, esize, shifted);
                }
                self.write_half(rd(word), result, word.get_bit(30));
            }
            (0b1_0100, _) => {
                let source = self.state.vectors.get(rn(word));
                let elements = (64 / esize) as usize;
                let part = if word.get_bit(30) { elements } else { 0 };
                let mut result = Vector::default();
                for e in 0..elements {
                    let x = widen(source.element(part + e, esize), signed, esize);
                    result.set_element(e, esize * 2, (x << left) as u64);
                }
                self.state.vectors.set(rd(word), result);
            }
            (0b1_1100 | 0b1_1111, _) => {
                if esize == 16 {
                    return Err(not_yet_implemented(word, "half precision fixed point"));
                }
                if esize == 8 {
                    return Err(unallocated(word, "SIMD fixed-point conversion"));
                }
                let arrangement = Arrangement::of(word, esize, scalar)?;
                let to_float = opcode == 0b1_1100;
                if esize == 32 {
                    self.fixed_point_lanes::<f32>(word, arrangement, to_float, signed, right);
                } else {
                    self.fixed_point_lanes::<f64>(word, arrangement, to_float, signed, right);
                }
            }
            (0b0_1100 | 0b0_1110 | 0b1_0000..=0b1_0011, _) => {
                return Err(not_yet_implemented(word, "SIMD saturating shift"));
            }
            _ => return Err(unallocated(word, "SIMD shift by immediate")),
        }

        Ok(Status::Ready)
    }

    /// Integer shifts only exist for 64-bit scalars.
    fn shift_arrangement(word: u32, esize: u32, scalar: bool) -> Result<Arrangement, ErrorKind> {
        if scalar && esize != 64 {
            return Err(unallocated(word, "SIMD scalar shift"));
        }
        Arrangement::of(word, esize, scalar)
    }

    fn fixed_point_lanes<T: Fp>(
        &mut self,
        word: u32,
        arrangement: Arrangement,
        to_float: bool,
        signed: bool,
        fbits: u32,
    ) {
        let esize = arrangement.esize;
        let source = self.state.vectors.get(rn(word));
        let mut result = Vector::default();
        for e in 0..arrangement.elements {
            if to_float {
                let value: T = Self::integer_to_fp(source.element(e, esize), signed, esize, fbits);
                result.set_lane(e, value);
            } else {
                let value = self.fp_to_integer(source.lane::<T>(e), Rounding::Zero, signed, esize, fbits);
                result.set_element(e, esize, value);
            }
        }
        self.write_vector(rd(word), result, arrangement);
    }

    /// Multiplies by one element of `Vm`, shared by the vector and scalar
    /// groups.
    pub(crate) fn multiply_by_element(&mut self, word: u32, scalar: bool) -> ExecResult {
        let u = word.get_bit(29);
        let size = word.get_bits(22..=23);
        let (l, m, h) = (
            u32::from(word.get_bit(21)),
            u32::from(word.get_bit(20)),
            u32::from(word.get_bit(11)),
        );
        let rm4 = word.get_bits(16..=19);

        match (word.get_bits(12..=15), u) {
            (0b0001 | 0b0101 | 0b1001, false) => {
                match size {
                    0b00 => return Err(not_yet_implemented(word, "half precision by element")),
                    0b01 => return Err(unallocated(word, "SIMD by element (float)")),
                    _ => {}
                }
                let double = size == 0b11;
                if double && l == 1 {
                    return Err(unallocated(word, "SIMD by element (float)"));
                }
                let index = if double { h } else { (h << 1) | l };
                let rm = (m << 4) | rm4;
                let op = match word.get_bits(12..=15) {
                    0b0001 => FloatLanes::MultiplyAdd,
                    0b0101 => FloatLanes::MultiplySub,
                    _ => FloatLanes::Binary(FpBinary::Mul),
                };
                let esize = if double { 64 } else { 32 };
                let arrangement = Arrangement::of(word, esize, scalar)?;
                if double {
                    self.float_lanes::<f64>(word, op, arrangement, Some(index as usize), rm);
                } else {
                    self.float_lanes::<f32>(word, op, arrangement, Some(index as usize), rm);
                }
            }
            (0b1000, false) | (0b0000 | 0b0100, true) if !scalar => {
                let (index, rm) = match size {
                    0b01 => ((h << 2) | (l << 1) | m, rm4),
                    0b10 => ((h << 1) | l, (m << 4) | rm4),
                    _ => return Err(unallocated(word, "SIMD by element")),
                };
                let op = match word.get_bits(12..=15) {
                    0b1000 => IntBinary::Multiply,
                    0b0000 => IntBinary::MultiplyAdd,
                    _ => IntBinary::MultiplySub,
                };
                let esize = 8 << size;
                let arrangement = Arrangement::vector(word, esize, word.get_bit(30))?;
                let element = self.state.vectors.get(rm).element(index as usize, esize);
                let n = self.state.vectors.get(rn(word));
                let d = self.state.vectors.get(rd(word));
                let mut result = Vector::default();
                for e in 0..arrangement.elements {
                    let value = self.int_binary(
                        op,
                        false,
                        esize,
                        n.element(e, esize),
                        element,
                        d.element(e, esize),
                    );
                    result.set_element(e, esize, value);
                }
                self.write_vector(rd(word), result, arrangement);
            }
            (0b1001, true) => return Err(not_yet_implemented(word, "FMULX (by element)")),
            _ => return Err(not_yet_implemented(word, "SIMD by element")),
        }

        Ok(Status::Ready)
    }
}

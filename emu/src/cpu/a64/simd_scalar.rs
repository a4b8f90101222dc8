//! Advanced SIMD scalar forms. Most of them are the vector lane operations
//! run over element 0 only; the ones that are not (pairwise reductions of a
//! two-element vector and `DUP` into a scalar) live here.

use crate::bitwise::Bits;
use crate::cpu::a64::float::{Fp, FpBinary};
use crate::cpu::a64::{rd, rn};
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::interpreter::Interpreter;
use crate::cpu::status::{ExecResult, Status};
use crate::cpu::vector::Vector;

impl Interpreter {
    /// Groups `[28] = 1, [30] = 1, [24] = 0`.
    pub(crate) fn simd_scalar(&mut self, word: u32) -> ExecResult {
        if word.get_bit(31) {
            return Err(unallocated(word, "SIMD scalar"));
        }

        if word.get_bit(21) {
            return match (word.get_bit(10), word.get_bit(11), word.get_bits(17..=20)) {
                (true, _, _) => self.three_same(word, true),
                (false, false, _) => Err(not_yet_implemented(word, "SIMD scalar three different")),
                (false, true, 0b0000) => self.two_register_misc(word, true),
                (false, true, 0b1000) => self.scalar_pairwise(word),
                _ => Err(not_yet_implemented(word, "SIMD scalar (crypto, half precision)")),
            };
        }

        let copy = word.get_bit(10)
            && word.get_bits(22..=23) == 0
            && !word.get_bit(29)
            && word.get_bits(11..=15) == 0;
        if copy {
            return self.scalar_duplicate(word);
        }

        Err(not_yet_implemented(word, "SIMD scalar"))
    }

    /// Groups `[28] = 1, [30] = 1, [24] = 1`.
    pub(crate) fn simd_scalar_immediate(&mut self, word: u32) -> ExecResult {
        if word.get_bit(31) {
            return Err(unallocated(word, "SIMD scalar"));
        }
        if word.get_bit(10) {
            self.shift_by_immediate(word, true)
        } else {
            self.multiply_by_element(word, true)
        }
    }

    /// `ADDP`, `FADDP`, `FMAXP`, `FMINP`, `FMAXNMP` and `FMINNMP` over the two
    /// lanes of a 128-bit (integer) or 64/128-bit (float) source.
    fn scalar_pairwise(&mut self, word: u32) -> ExecResult {
        let u = word.get_bit(29);
        let opcode = word.get_bits(12..=16);

        if opcode == 0b1_1011 {
            if u || word.get_bits(22..=23) != 0b11 {
                return Err(unallocated(word, "ADDP (scalar)"));
            }
            let source = self.state.vectors.get(rn(word));
            let sum = source.element(0, 64).wrapping_add(source.element(1, 64));
            self.state.vectors.set_scalar(rd(word), sum);
            return Ok(Status::Ready);
        }

        let op = match (opcode, word.get_bit(23)) {
            (0b0_1100, false) => FpBinary::MaxNum,
            (0b0_1100, true) => FpBinary::MinNum,
            (0b0_1101, false) => FpBinary::Add,
            (0b0_1111, false) => FpBinary::Max,
            (0b0_1111, true) => FpBinary::Min,
            _ => return Err(unallocated(word, "SIMD scalar pairwise")),
        };
        if !u {
            return Err(not_yet_implemented(word, "half precision pairwise"));
        }

        let source = self.state.vectors.get(rn(word));
        if word.get_bit(22) {
            self.pairwise_reduce::<f64>(rd(word), op, &source);
        } else {
            self.pairwise_reduce::<f32>(rd(word), op, &source);
        }

        Ok(Status::Ready)
    }

    fn pairwise_reduce<T: Fp>(&mut self, rd: u32, op: FpBinary, source: &Vector) {
        let result: T = self.fp_binary(op, source.lane(0), source.lane(1));
        self.state.vectors.set_scalar(rd, result);
    }

    /// `DUP` (element) into a scalar register, also spelt `MOV`.
    fn scalar_duplicate(&mut self, word: u32) -> ExecResult {
        let imm5 = word.get_bits(16..=20);
        if imm5 & 0b1111 == 0 {
            return Err(unallocated(word, "DUP (element, scalar)"));
        }
        let size = imm5.trailing_zeros();
        let esize = 8 << size;
        let index = (imm5 >> (size + 1)) as usize;

        let value = self.state.vectors.get(rn(word)).element(index, esize);
        let mut result = Vector::default();
        result.set_element(0, esize, value);
        self.state.vectors.set(rd(word), result);

        Ok(Status::Ready)
    }
}

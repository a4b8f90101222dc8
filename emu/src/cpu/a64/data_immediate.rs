//! Data processing with an immediate operand.

use crate::bitwise::{Bits, ones, ror, sign_extend};
use crate::cpu::a64::{datasize, rd, rn, rm, sf};
use crate::cpu::alu::{decode_bit_masks, logical_immediate};
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::flags::{add_with_carry, logical_flags};
use crate::cpu::interpreter::Interpreter;
use crate::cpu::registers::R31;
use crate::cpu::status::{ExecResult, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogicalOp {
    And,
    Orr,
    Eor,
    Ands,
}

impl From<u32> for LogicalOp {
    fn from(opc: u32) -> Self {
        match opc & 0b11 {
            0b00 => Self::And,
            0b01 => Self::Orr,
            0b10 => Self::Eor,
            _ => Self::Ands,
        }
    }
}

impl LogicalOp {
    const fn apply(self, a: u64, b: u64) -> u64 {
        match self {
            Self::And | Self::Ands => a & b,
            Self::Orr => a | b,
            Self::Eor => a ^ b,
        }
    }
}

impl Interpreter {
    /// `ADR` and `ADRP`.
    pub(crate) fn pc_relative(&mut self, word: u32) -> ExecResult {
        let immlo = word.get_bits(29..=30);
        let immhi = word.get_bits(5..=23);
        let imm = sign_extend(u64::from((immhi << 2) | immlo), 21);
        let pc = self.state.pc;

        let value = if word.get_bit(31) {
            (pc & !0xFFF).wrapping_add((imm << 12) as u64)
        } else {
            pc.wrapping_add(imm as u64)
        };
        self.state.set_x(rd(word), value);

        Ok(Status::Ready)
    }

    /// `ADD`, `ADDS`, `SUB`, `SUBS` with a 12-bit immediate.
    pub(crate) fn add_sub_immediate(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let subtract = word.get_bit(30);
        let set_flags = word.get_bit(29);
        let shift = if word.get_bit(22) { 12 } else { 0 };
        let imm = u64::from(word.get_bits(10..=21)) << shift;

        let operand1 = self.state.reg(sf, rn(word), R31::Sp);
        let result = if subtract {
            add_with_carry(sf, operand1, !imm, true)
        } else {
            add_with_carry(sf, operand1, imm, false)
        };

        if set_flags {
            self.state.nzcv = result.nzcv();
            self.state.set_reg(sf, rd(word), result.result, R31::Zr);
        } else {
            self.state.set_reg(sf, rd(word), result.result, R31::Sp);
        }

        Ok(Status::Ready)
    }

    /// `ADDG`/`SUBG` and the immediate min/max forms.
    pub(crate) fn add_sub_immediate_tags(&mut self, word: u32) -> ExecResult {
        Err(not_yet_implemented(word, "add/subtract (immediate, with tags)"))
    }

    /// `AND`, `ORR`, `EOR`, `ANDS` with a bitmask immediate.
    pub(crate) fn logical_immediate(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        if !sf && word.get_bit(22) {
            return Err(unallocated(word, "logical immediate"));
        }

        let imm = logical_immediate(word.get_bits(10..=22));
        if imm == 0 {
            return Err(unallocated(word, "logical immediate"));
        }

        let op = LogicalOp::from(word.get_bits(29..=30));
        let operand1 = self.state.reg(sf, rn(word), R31::Zr);
        let result = op.apply(operand1, imm);

        if op == LogicalOp::Ands {
            self.state.nzcv = logical_flags(sf, result);
            self.state.set_reg(sf, rd(word), result, R31::Zr);
        } else {
            self.state.set_reg(sf, rd(word), result, R31::Sp);
        }

        Ok(Status::Ready)
    }

    /// `MOVN`, `MOVZ`, `MOVK`.
    pub(crate) fn move_wide(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let opc = word.get_bits(29..=30);
        let hw = word.get_bits(21..=22);
        if opc == 0b01 || (!sf && hw >= 2) {
            return Err(unallocated(word, "move wide"));
        }

        let pos = hw * 16;
        let imm = u64::from(word.get_bits(5..=20)) << pos;
        let rd = rd(word);

        let result = match opc {
            0b00 => !imm,
            0b10 => imm,
            _ => (self.state.x(rd) & !(0xFFFF << pos)) | imm,
        };
        self.state.set_reg(sf, rd, result, R31::Zr);

        Ok(Status::Ready)
    }

    /// `SBFM`, `BFM`, `UBFM` and their aliases.
    pub(crate) fn bitfield(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let opc = word.get_bits(29..=30);
        let n = word.get_bit(22);
        let immr = word.get_bits(16..=21);
        let imms = word.get_bits(10..=15);

        if opc == 0b11 || sf != n || (!sf && (immr.get_bit(5) || imms.get_bit(5))) {
            return Err(unallocated(word, "bitfield"));
        }

        let size = datasize(sf);
        let Some((wmask, tmask)) = decode_bit_masks(n, imms, immr, false, size) else {
            return Err(unallocated(word, "bitfield"));
        };

        let rd = rd(word);
        let src = self.state.reg(sf, rn(word), R31::Zr);
        let dst = self.state.reg(sf, rd, R31::Zr);

        let bot = ror(src, immr, size) & wmask;
        let result = match opc {
            // SBFM
            0b00 => {
                let top = if src.get_bit(imms) { ones(size) } else { 0 };
                (top & !tmask) | (bot & tmask)
            }
            // BFM
            0b01 => {
                let bot = (dst & !wmask) | bot;
                (dst & !tmask) | (bot & tmask)
            }
            // UBFM
            _ => bot & tmask,
        };
        self.state.set_reg(sf, rd, result, R31::Zr);

        Ok(Status::Ready)
    }

    /// `EXTR` (and `ROR` immediate).
    pub(crate) fn extract(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let op21 = word.get_bits(29..=30);
        let n = word.get_bit(22);
        let o0 = word.get_bit(21);
        let lsb = word.get_bits(10..=15);

        if op21 != 0 || o0 || n != sf || (!sf && lsb.get_bit(5)) {
            return Err(unallocated(word, "extract"));
        }

        let size = datasize(sf);
        let high = u128::from(self.state.reg(sf, rn(word), R31::Zr));
        let low = u128::from(self.state.reg(sf, rm(word), R31::Zr));
        let concat = (high << size) | low;
        let result = (concat >> lsb) as u64 & ones(size);
        self.state.set_reg(sf, rd(word), result, R31::Zr);

        Ok(Status::Ready)
    }
}

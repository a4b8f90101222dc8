//! Branches and exception generation.
//!
//! Branches never touch `pc` directly: they overwrite the staged
//! `next_pc`, which the interpreter commits when the instruction succeeds.

use crate::bitwise::{Bits, sign_extend};
use crate::cpu::a64::{rn, sf};
use crate::cpu::condition::Condition;
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::interpreter::{CalloutKind, Interpreter};
use crate::cpu::registers::{R31, REG_LR};
use crate::cpu::status::{ExecResult, Status};

impl Interpreter {
    fn branch_relative(&mut self, offset: i64) {
        self.state.next_pc = self.state.pc.wrapping_add((offset << 2) as u64);
    }

    /// `B` and `BL`.
    pub(crate) fn branch_immediate(&mut self, word: u32) -> ExecResult {
        if word.get_bit(31) {
            let link = self.state.pc.wrapping_add(4);
            self.state.set_x(REG_LR, link);
        }
        self.branch_relative(sign_extend(u64::from(word.get_bits(0..=25)), 26));

        Ok(Status::Ready)
    }

    /// `CBZ`, `CBNZ` (`[25]` clear) and `TBZ`, `TBNZ` (`[25]` set).
    pub(crate) fn compare_and_test_branch(&mut self, word: u32) -> ExecResult {
        let rt = word.get_bits(0..=4);
        let nonzero = word.get_bit(24);

        let (taken, offset) = if word.get_bit(25) {
            let bit = (u32::from(word.get_bit(31)) << 5) | word.get_bits(19..=23);
            let set = self.state.x(rt).get_bit(bit);
            (set == nonzero, sign_extend(u64::from(word.get_bits(5..=18)), 14))
        } else {
            let value = self.state.reg(sf(word), rt, R31::Zr);
            ((value != 0) == nonzero, sign_extend(u64::from(word.get_bits(5..=23)), 19))
        };

        if taken {
            self.branch_relative(offset);
        }

        Ok(Status::Ready)
    }

    /// `B.cond`.
    pub(crate) fn conditional_branch(&mut self, word: u32) -> ExecResult {
        if word.get_bit(25) || word.get_bit(24) {
            return Err(unallocated(word, "conditional branch"));
        }
        if word.get_bit(4) {
            return Err(not_yet_implemented(word, "BC.cond"));
        }

        let condition = Condition::from(word.get_bits(0..=3));
        if condition.holds(self.state.nzcv) {
            self.branch_relative(sign_extend(u64::from(word.get_bits(5..=23)), 19));
        }

        Ok(Status::Ready)
    }

    /// Group `[31:29] = 110`: exception generation, system instructions and
    /// branches to a register.
    pub(crate) fn exception_system_register_branch(&mut self, word: u32) -> ExecResult {
        match word.get_bits(24..=25) {
            0b00 => self.exception_generation(word),
            0b01 => self.system(word),
            _ => self.branch_register(word),
        }
    }

    fn exception_generation(&mut self, word: u32) -> ExecResult {
        if word.get_bits(2..=4) != 0 {
            return Err(unallocated(word, "exception generation"));
        }

        let imm16 = word.get_bits(5..=20) as u16;
        match (word.get_bits(21..=23), word.get_bits(0..=1)) {
            (0b000, 0b01) => self.request_callout(CalloutKind::Supervisor(imm16)),
            (0b000, 0b10 | 0b11) => Err(not_yet_implemented(word, "HVC/SMC")),
            (0b001, 0b00) => {
                tracing::debug!("BRK #{imm16:#X} at {:#018X}", self.state.pc);
                Ok(Status::Break)
            }
            (0b010, 0b00) => Ok(Status::Halt),
            (0b101, 0b01..=0b11) => Err(not_yet_implemented(word, "DCPS")),
            _ => Err(unallocated(word, "exception generation")),
        }
    }

    /// `BR`, `BLR`, `RET`.
    fn branch_register(&mut self, word: u32) -> ExecResult {
        if word.get_bits(16..=20) != 0b1_1111 {
            return Err(unallocated(word, "branch (register)"));
        }

        let opc = word.get_bits(21..=24);
        let op3 = word.get_bits(10..=15);
        let op4 = word.get_bits(0..=4);

        match opc {
            0b0000..=0b0010 if op3 == 0 && op4 == 0 => {
                let target = self.state.x(rn(word));
                if opc == 0b0001 {
                    let link = self.state.pc.wrapping_add(4);
                    self.state.set_x(REG_LR, link);
                }
                self.state.next_pc = target;
                Ok(Status::Ready)
            }
            0b0000..=0b0010 | 0b1000 | 0b1001 => {
                Err(not_yet_implemented(word, "authenticated branch"))
            }
            0b0100 | 0b0101 => Err(not_yet_implemented(word, "ERET/DRPS")),
            _ => Err(unallocated(word, "branch (register)")),
        }
    }
}

//! Data processing with register operands.

use crate::bitwise::Bits;
use crate::cpu::a64::{datasize, ra, rd, rm, rn, sf};
use crate::cpu::alu::{Extension, ShiftKind};
use crate::cpu::condition::Condition;
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::flags::{add_with_carry, logical_flags};
use crate::cpu::interpreter::Interpreter;
use crate::cpu::psr::Nzcv;
use crate::cpu::registers::R31;
use crate::cpu::status::{ExecResult, Status};

/// Counts leading bits equal to the sign bit, not counting the sign bit.
const fn count_leading_sign_bits(sf: bool, value: u64) -> u64 {
    if sf {
        ((value ^ (value << 1)) | 1).leading_zeros() as u64
    } else {
        let value = value as u32;
        ((value ^ (value << 1)) | 1).leading_zeros() as u64
    }
}

/// Swaps the bytes inside every `container`-bit chunk of `value`.
fn reverse_bytes(value: u64, container: u32) -> u64 {
    match container {
        16 => ((value & 0x00FF_00FF_00FF_00FF) << 8) | ((value >> 8) & 0x00FF_00FF_00FF_00FF),
        32 => {
            let low = u64::from((value as u32).swap_bytes());
            let high = u64::from(((value >> 32) as u32).swap_bytes());
            (high << 32) | low
        }
        _ => value.swap_bytes(),
    }
}

impl Interpreter {
    /// `AND`, `BIC`, `ORR`, `ORN`, `EOR`, `EON`, `ANDS`, `BICS`.
    pub(crate) fn logical_shifted_register(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let amount = word.get_bits(10..=15);
        if !sf && amount.get_bit(5) {
            return Err(unallocated(word, "logical (shifted register)"));
        }

        let shift = ShiftKind::from(word.get_bits(22..=23));
        let operand1 = self.state.reg(sf, rn(word), R31::Zr);
        let mut operand2 = shift.apply(sf, self.state.reg(sf, rm(word), R31::Zr), amount);
        if word.get_bit(21) {
            operand2 = !operand2;
        }

        let opc = word.get_bits(29..=30);
        let result = match opc {
            0b00 | 0b11 => operand1 & operand2,
            0b01 => operand1 | operand2,
            _ => operand1 ^ operand2,
        };

        if opc == 0b11 {
            self.state.nzcv = logical_flags(sf, result);
        }
        self.state.set_reg(sf, rd(word), result, R31::Zr);

        Ok(Status::Ready)
    }

    /// `ADD`, `ADDS`, `SUB`, `SUBS` with a shifted register.
    pub(crate) fn add_sub_shifted_register(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let shift = ShiftKind::from(word.get_bits(22..=23));
        let amount = word.get_bits(10..=15);
        if shift == ShiftKind::Ror || (!sf && amount.get_bit(5)) {
            return Err(unallocated(word, "add/subtract (shifted register)"));
        }

        let operand1 = self.state.reg(sf, rn(word), R31::Zr);
        let operand2 = shift.apply(sf, self.state.reg(sf, rm(word), R31::Zr), amount);
        self.add_sub(word, operand1, operand2, R31::Zr);

        Ok(Status::Ready)
    }

    /// `ADD`, `ADDS`, `SUB`, `SUBS` with an extended register.
    pub(crate) fn add_sub_extended_register(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let shift = word.get_bits(10..=12);
        if word.get_bits(22..=23) != 0 || shift > 4 {
            return Err(unallocated(word, "add/subtract (extended register)"));
        }

        let extension = Extension::from(word.get_bits(13..=15));
        let operand1 = self.state.reg(sf, rn(word), R31::Sp);
        let operand2 = extension.apply(self.state.x(rm(word)), shift);
        self.add_sub(word, operand1, operand2, R31::Sp);

        Ok(Status::Ready)
    }

    /// Shared tail of the add/subtract forms: `op` in `[30]`, `S` in `[29]`.
    /// `rd_r31` applies when flags are not set.
    fn add_sub(&mut self, word: u32, operand1: u64, operand2: u64, rd_r31: R31) {
        let sf = sf(word);
        let result = if word.get_bit(30) {
            add_with_carry(sf, operand1, !operand2, true)
        } else {
            add_with_carry(sf, operand1, operand2, false)
        };

        if word.get_bit(29) {
            self.state.nzcv = result.nzcv();
            self.state.set_reg(sf, rd(word), result.result, R31::Zr);
        } else {
            self.state.set_reg(sf, rd(word), result.result, rd_r31);
        }
    }

    /// `ADC`, `ADCS`, `SBC`, `SBCS`.
    pub(crate) fn add_sub_carry(&mut self, word: u32) -> ExecResult {
        if word.get_bits(10..=15) != 0 {
            return Err(not_yet_implemented(word, "RMIF/SETF"));
        }

        let sf = sf(word);
        let operand1 = self.state.reg(sf, rn(word), R31::Zr);
        let mut operand2 = self.state.reg(sf, rm(word), R31::Zr);
        if word.get_bit(30) {
            operand2 = !operand2;
        }

        let result = add_with_carry(sf, operand1, operand2, self.state.nzcv.carry_flag());
        if word.get_bit(29) {
            self.state.nzcv = result.nzcv();
        }
        self.state.set_reg(sf, rd(word), result.result, R31::Zr);

        Ok(Status::Ready)
    }

    /// `CCMN` and `CCMP`, register or 5-bit immediate.
    pub(crate) fn conditional_compare(&mut self, word: u32) -> ExecResult {
        if !word.get_bit(29) || word.get_bit(10) || word.get_bit(4) {
            return Err(unallocated(word, "conditional compare"));
        }

        let sf = sf(word);
        let condition = Condition::from(word.get_bits(12..=15));
        if !condition.holds(self.state.nzcv) {
            self.state.nzcv = Nzcv::from_nibble(word.get_bits(0..=3));
            return Ok(Status::Ready);
        }

        let operand1 = self.state.reg(sf, rn(word), R31::Zr);
        let operand2 = if word.get_bit(11) {
            u64::from(word.get_bits(16..=20))
        } else {
            self.state.reg(sf, rm(word), R31::Zr)
        };

        let result = if word.get_bit(30) {
            add_with_carry(sf, operand1, !operand2, true)
        } else {
            add_with_carry(sf, operand1, operand2, false)
        };
        self.state.nzcv = result.nzcv();

        Ok(Status::Ready)
    }

    /// `CSEL`, `CSINC`, `CSINV`, `CSNEG`.
    pub(crate) fn conditional_select(&mut self, word: u32) -> ExecResult {
        if word.get_bit(29) || word.get_bit(11) {
            return Err(unallocated(word, "conditional select"));
        }

        let sf = sf(word);
        let condition = Condition::from(word.get_bits(12..=15));
        let result = if condition.holds(self.state.nzcv) {
            self.state.reg(sf, rn(word), R31::Zr)
        } else {
            let operand2 = self.state.reg(sf, rm(word), R31::Zr);
            match (word.get_bit(30), word.get_bit(10)) {
                (false, false) => operand2,
                (false, true) => operand2.wrapping_add(1),
                (true, false) => !operand2,
                (true, true) => operand2.wrapping_neg(),
            }
        };
        self.state.set_reg(sf, rd(word), result, R31::Zr);

        Ok(Status::Ready)
    }

    /// Data processing with one (`[30]` set) or two source registers.
    pub(crate) fn data_processing_source(&mut self, word: u32) -> ExecResult {
        if word.get_bit(30) {
            self.data_processing_1_source(word)
        } else {
            self.data_processing_2_source(word)
        }
    }

    fn data_processing_1_source(&mut self, word: u32) -> ExecResult {
        let opcode2 = word.get_bits(16..=20);
        if word.get_bit(29) || opcode2 > 1 {
            return Err(unallocated(word, "data processing (1 source)"));
        }
        if opcode2 == 1 {
            return Err(not_yet_implemented(word, "pointer authentication"));
        }

        let sf = sf(word);
        let size = datasize(sf);
        let value = self.state.reg(sf, rn(word), R31::Zr);

        let result = match (word.get_bits(10..=15), sf) {
            (0b00_0000, true) => value.reverse_bits(),
            (0b00_0000, false) => u64::from((value as u32).reverse_bits()),
            (0b00_0001, _) => reverse_bytes(value, 16),
            (0b00_0010, _) => reverse_bytes(value, 32),
            (0b00_0011, true) => reverse_bytes(value, 64),
            (0b00_0100, _) => u64::from(value.leading_zeros() - (64 - size)),
            (0b00_0101, _) => count_leading_sign_bits(sf, value),
            (0b00_0110..=0b00_1000, _) => {
                return Err(not_yet_implemented(word, "CTZ/CNT/ABS"));
            }
            _ => return Err(unallocated(word, "data processing (1 source)")),
        };
        self.state.set_reg(sf, rd(word), result, R31::Zr);

        Ok(Status::Ready)
    }

    fn data_processing_2_source(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let opcode = word.get_bits(10..=15);
        if word.get_bit(29) {
            return Err(if sf && opcode == 0 {
                not_yet_implemented(word, "SUBPS")
            } else {
                unallocated(word, "data processing (2 source)")
            });
        }

        let operand1 = self.state.reg(sf, rn(word), R31::Zr);
        let operand2 = self.state.reg(sf, rm(word), R31::Zr);
        let amount = operand2 as u32;

        let result = match opcode {
            0b00_0010 => operand1.checked_div(operand2).unwrap_or(0),
            0b00_0011 if sf => {
                let (a, b) = (operand1 as i64, operand2 as i64);
                if b == 0 { 0 } else { a.wrapping_div(b) as u64 }
            }
            0b00_0011 => {
                let (a, b) = (operand1 as i32, operand2 as i32);
                if b == 0 { 0 } else { u64::from(a.wrapping_div(b) as u32) }
            }
            0b00_1000..=0b00_1011 => ShiftKind::from(opcode).apply(sf, operand1, amount),
            0b00_0000 | 0b00_0100 | 0b00_0101 | 0b00_1100 => {
                return Err(not_yet_implemented(word, "memory tagging/PACGA"));
            }
            0b01_0000..=0b01_0111 => return Err(not_yet_implemented(word, "CRC32")),
            0b01_1000..=0b01_1011 => return Err(not_yet_implemented(word, "min/max")),
            _ => return Err(unallocated(word, "data processing (2 source)")),
        };
        self.state.set_reg(sf, rd(word), result, R31::Zr);

        Ok(Status::Ready)
    }

    /// `MADD`, `MSUB` and the 64-bit long and high multiplies.
    pub(crate) fn data_processing_3_source(&mut self, word: u32) -> ExecResult {
        let sf = sf(word);
        let op31 = word.get_bits(21..=23);
        let o0 = word.get_bit(15);
        if word.get_bits(29..=30) != 0 || (!sf && op31 != 0) {
            return Err(unallocated(word, "data processing (3 source)"));
        }

        let n = self.state.reg(sf, rn(word), R31::Zr);
        let m = self.state.reg(sf, rm(word), R31::Zr);
        let a = self.state.reg(sf, ra(word), R31::Zr);

        let accumulate = |product: u64| {
            if o0 {
                a.wrapping_sub(product)
            } else {
                a.wrapping_add(product)
            }
        };

        let result = match (op31, o0) {
            (0b000, _) => accumulate(n.wrapping_mul(m)),
            (0b001, _) => {
                let product = i64::from(n as i32) * i64::from(m as i32);
                accumulate(product as u64)
            }
            (0b101, _) => accumulate(u64::from(n as u32) * u64::from(m as u32)),
            (0b010, false) => ((i128::from(n as i64) * i128::from(m as i64)) >> 64) as u64,
            (0b110, false) => ((u128::from(n) * u128::from(m)) >> 64) as u64,
            _ => return Err(unallocated(word, "data processing (3 source)")),
        };
        self.state.set_reg(sf, rd(word), result, R31::Zr);

        Ok(Status::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::a64::test_support::{cpu, exec};
    use crate::cpu::status::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn logical_shifted() {
        let mut cpu = cpu();
        cpu.state.set_x(1, 0xFF0);
        cpu.state.set_x(2, 0x0F);

        // AND X0, X1, X2, LSL #4
        exec(&mut cpu, 0x8A02_1020).unwrap();
        assert_eq!(cpu.state.x(0), 0xF0);

        // BIC X0, X1, X2
        exec(&mut cpu, 0x8A22_0020).unwrap();
        assert_eq!(cpu.state.x(0), 0xFF0);

        // MVN W0, W2
        exec(&mut cpu, 0x2A22_03E0).unwrap();
        assert_eq!(cpu.state.x(0), 0xFFFF_FFF0);

        // TST X1, X2
        cpu.state.set_x(2, 0x0F);
        exec(&mut cpu, 0xEA02_003F).unwrap();
        assert!(cpu.state.nzcv.zero_flag());
        assert!(!cpu.state.nzcv.carry_flag());

        // EOR X0, X1, X2, ROR #8
        cpu.state.set_x(1, 0);
        cpu.state.set_x(2, 0xFF);
        exec(&mut cpu, 0xCAC2_2020).unwrap();
        assert_eq!(cpu.state.x(0), 0xFF00_0000_0000_0000);

        // AND W0, W1, W0, LSL #32
        assert_eq!(
            exec(&mut cpu, 0x0A00_8020),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn add_sub_shifted() {
        let mut cpu = cpu();
        // SUB X0, X1, X2, ASR #1
        cpu.state.set_x(1, 0);
        cpu.state.set_x(2, (-2_i64) as u64);
        exec(&mut cpu, 0xCB82_0420).unwrap();
        assert_eq!(cpu.state.x(0), 1);

        // ADDS W0, W1, W2
        cpu.state.set_x(1, 0x7FFF_FFFF);
        cpu.state.set_x(2, 1);
        exec(&mut cpu, 0x2B02_0020).unwrap();
        assert_eq!(cpu.state.x(0), 0x8000_0000);
        assert_eq!(cpu.state.nzcv, Nzcv::from_nibble(0b1001));

        assert_eq!(
            exec(&mut cpu, 0x8BC2_0020),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn adds_matches_wide_arithmetic() {
        let mut cpu = cpu();
        for _ in 0..2000 {
            let a = rand::random::<u32>();
            let b = rand::random::<u32>();
            cpu.state.set_x(1, u64::from(a));
            cpu.state.set_x(2, u64::from(b));
            exec(&mut cpu, 0x2B02_0020).unwrap();

            let flags = cpu.state.nzcv;
            let signed = i64::from(a as i32) + i64::from(b as i32);
            assert_eq!(cpu.state.x(0), u64::from(a.wrapping_add(b)));
            assert_eq!(flags.carry_flag(), u64::from(a) + u64::from(b) > 0xFFFF_FFFF);
            assert_eq!(flags.overflow_flag(), i32::try_from(signed).is_err());
        }
    }

    #[test]
    fn add_sub_extended() {
        let mut cpu = cpu();
        // ADD X0, SP, W1, UXTW #2
        cpu.state.set_sp(0x1000);
        cpu.state.set_x(1, 0xFFFF_FFFF_0000_0004);
        exec(&mut cpu, 0x8B21_4BE0).unwrap();
        assert_eq!(cpu.state.x(0), 0x1010);

        // SUB X0, X1, W2, SXTB
        cpu.state.set_x(1, 0);
        cpu.state.set_x(2, 0xFF);
        exec(&mut cpu, 0xCB22_8020).unwrap();
        assert_eq!(cpu.state.x(0), 1);

        assert_eq!(
            exec(&mut cpu, 0x8B21_17E0),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn carry_chain() {
        let mut cpu = cpu();
        cpu.state.nzcv.set_carry_flag(true);
        cpu.state.set_x(1, 1);
        cpu.state.set_x(2, 2);
        // ADC X0, X1, X2
        exec(&mut cpu, 0x9A02_0020).unwrap();
        assert_eq!(cpu.state.x(0), 4);

        // SBCS W0, W1, W2
        cpu.state.set_x(1, 5);
        cpu.state.set_x(2, 5);
        exec(&mut cpu, 0x7A02_0020).unwrap();
        assert_eq!(cpu.state.x(0), 0);
        assert_eq!(cpu.state.nzcv, Nzcv::from_nibble(0b0110));

        cpu.state.nzcv.set_carry_flag(false);
        exec(&mut cpu, 0x7A02_0020).unwrap();
        assert_eq!(cpu.state.x(0), 0xFFFF_FFFF);
        assert_eq!(cpu.state.nzcv, Nzcv::from_nibble(0b1000));
    }

    #[test]
    fn conditional_compare() {
        let mut cpu = cpu();
        cpu.state.set_x(1, 3);
        cpu.state.set_x(2, 3);

        // CCMP X1, X2, #0, NE with NE holding
        cpu.state.nzcv = Nzcv::from_nibble(0);
        exec(&mut cpu, 0xFA42_1020).unwrap();
        assert_eq!(cpu.state.nzcv, Nzcv::from_nibble(0b0110));

        // ... and with NE failing
        exec(&mut cpu, 0xFA42_1020).unwrap();
        assert_eq!(cpu.state.nzcv, Nzcv::from_nibble(0));

        // CCMN X1, #5, #2, EQ with EQ failing
        cpu.state.nzcv = Nzcv::from_nibble(0);
        exec(&mut cpu, 0xBA45_0822).unwrap();
        assert_eq!(cpu.state.nzcv, Nzcv::from_nibble(0b0010));

        assert_eq!(
            exec(&mut cpu, 0xDA42_1020),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn conditional_select() {
        let mut cpu = cpu();
        cpu.state.set_x(1, 10);
        cpu.state.set_x(2, 20);

        // CSEL X0, X1, X2, EQ
        cpu.state.nzcv = Nzcv::from_nibble(0b0100);
        exec(&mut cpu, 0x9A82_0020).unwrap();
        assert_eq!(cpu.state.x(0), 10);
        cpu.state.nzcv = Nzcv::from_nibble(0);
        exec(&mut cpu, 0x9A82_0020).unwrap();
        assert_eq!(cpu.state.x(0), 20);

        // CSET X0, EQ
        cpu.state.nzcv = Nzcv::from_nibble(0b0100);
        exec(&mut cpu, 0x9A9F_17E0).unwrap();
        assert_eq!(cpu.state.x(0), 1);
        cpu.state.nzcv = Nzcv::from_nibble(0);
        exec(&mut cpu, 0x9A9F_17E0).unwrap();
        assert_eq!(cpu.state.x(0), 0);

        // CSNEG W0, W1, W2, LT with LT failing
        exec(&mut cpu, 0x5A82_B420).unwrap();
        assert_eq!(cpu.state.x(0), 0xFFFF_FFEC);

        assert_eq!(
            exec(&mut cpu, 0x9A82_0820),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn one_source() {
        let mut cpu = cpu();
        cpu.state.set_x(1, 1);
        // RBIT W0, W1
        exec(&mut cpu, 0x5AC0_0020).unwrap();
        assert_eq!(cpu.state.x(0), 0x8000_0000);

        cpu.state.set_x(1, 0x0102_0304_0506_0708);
        // REV16 X0, X1
        exec(&mut cpu, 0xDAC0_0420).unwrap();
        assert_eq!(cpu.state.x(0), 0x0201_0403_0605_0807);
        // REV32 X0, X1
        exec(&mut cpu, 0xDAC0_0820).unwrap();
        assert_eq!(cpu.state.x(0), 0x0403_0201_0807_0605);
        // REV X0, X1
        exec(&mut cpu, 0xDAC0_0C20).unwrap();
        assert_eq!(cpu.state.x(0), 0x0807_0605_0403_0201);
        // REV W0, W1
        exec(&mut cpu, 0x5AC0_0820).unwrap();
        assert_eq!(cpu.state.x(0), 0x0807_0605);

        // CLZ X0, X1 and CLZ W0, W1
        cpu.state.set_x(1, 1);
        exec(&mut cpu, 0xDAC0_1020).unwrap();
        assert_eq!(cpu.state.x(0), 63);
        cpu.state.set_x(1, 0);
        exec(&mut cpu, 0x5AC0_1020).unwrap();
        assert_eq!(cpu.state.x(0), 32);

        // CLS X0, X1
        exec(&mut cpu, 0xDAC0_1420).unwrap();
        assert_eq!(cpu.state.x(0), 63);
        cpu.state.set_x(1, 1);
        exec(&mut cpu, 0xDAC0_1420).unwrap();
        assert_eq!(cpu.state.x(0), 62);
        cpu.state.set_x(1, 0xFFFF_FFFF);
        exec(&mut cpu, 0x5AC0_1420).unwrap();
        assert_eq!(cpu.state.x(0), 31);

        assert_eq!(
            exec(&mut cpu, 0x5AC0_0C20),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn two_source() {
        let mut cpu = cpu();
        // UDIV X0, X1, X2
        cpu.state.set_x(1, 100);
        cpu.state.set_x(2, 7);
        exec(&mut cpu, 0x9AC2_0820).unwrap();
        assert_eq!(cpu.state.x(0), 14);
        cpu.state.set_x(2, 0);
        exec(&mut cpu, 0x9AC2_0820).unwrap();
        assert_eq!(cpu.state.x(0), 0);

        // SDIV X0, X1, X2
        cpu.state.set_x(1, i64::MIN as u64);
        cpu.state.set_x(2, u64::MAX);
        exec(&mut cpu, 0x9AC2_0C20).unwrap();
        assert_eq!(cpu.state.x(0), i64::MIN as u64);
        cpu.state.set_x(2, 0);
        exec(&mut cpu, 0x9AC2_0C20).unwrap();
        assert_eq!(cpu.state.x(0), 0);

        // SDIV W0, W1, W2
        cpu.state.set_x(1, 0xFFFF_FFF9);
        cpu.state.set_x(2, 2);
        exec(&mut cpu, 0x1AC2_0C20).unwrap();
        assert_eq!(cpu.state.x(0), 0xFFFF_FFFD);

        // LSLV X0, X1, X2 uses the amount modulo 64
        cpu.state.set_x(1, 1);
        cpu.state.set_x(2, 65);
        exec(&mut cpu, 0x9AC2_2020).unwrap();
        assert_eq!(cpu.state.x(0), 2);

        // ASRV W0, W1, W2
        cpu.state.set_x(1, 0x8000_0000);
        cpu.state.set_x(2, 4);
        exec(&mut cpu, 0x1AC2_2820).unwrap();
        assert_eq!(cpu.state.x(0), 0xF800_0000);

        // RORV X0, X1, X2
        cpu.state.set_x(1, 1);
        cpu.state.set_x(2, 1);
        exec(&mut cpu, 0x9AC2_2C20).unwrap();
        assert_eq!(cpu.state.x(0), 1 << 63);

        // CRC32B W0, W1, W2
        assert_eq!(
            exec(&mut cpu, 0x1AC2_4020),
            Err(ErrorKind::NotYetImplemented)
        );
    }

    #[test]
    fn three_source() {
        let mut cpu = cpu();
        cpu.state.set_x(1, 6);
        cpu.state.set_x(2, 7);
        cpu.state.set_x(3, 100);
        // MADD X0, X1, X2, X3
        exec(&mut cpu, 0x9B02_0C20).unwrap();
        assert_eq!(cpu.state.x(0), 142);
        // MSUB X0, X1, X2, X3
        exec(&mut cpu, 0x9B02_8C20).unwrap();
        assert_eq!(cpu.state.x(0), 58);

        // SMULL X0, W1, W2
        cpu.state.set_x(1, 0xFFFF_FFFE);
        cpu.state.set_x(2, 3);
        exec(&mut cpu, 0x9B22_7C20).unwrap();
        assert_eq!(cpu.state.x(0), (-6_i64) as u64);

        // UMULL X0, W1, W2
        cpu.state.set_x(1, 0xFFFF_FFFF);
        cpu.state.set_x(2, 2);
        exec(&mut cpu, 0x9BA2_7C20).unwrap();
        assert_eq!(cpu.state.x(0), 0x1_FFFF_FFFE);

        // SMULH X0, X1, X2
        cpu.state.set_x(1, u64::MAX);
        exec(&mut cpu, 0x9B42_7C20).unwrap();
        assert_eq!(cpu.state.x(0), u64::MAX);

        // UMULH X0, X1, X2
        exec(&mut cpu, 0x9BC2_7C20).unwrap();
        assert_eq!(cpu.state.x(0), 1);

        assert_eq!(
            exec(&mut cpu, 0x1B22_7C20),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }
}

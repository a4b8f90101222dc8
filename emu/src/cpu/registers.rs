//! # General-purpose registers
//!
//! 31 general-purpose 64-bit registers, `X0`-`X30`, plus slot 31.
//!
//! - **X0-X7**: Arguments and results
//! - **X29 (FP)**: Frame pointer (by convention)
//! - **X30 (LR)**: Link register, written by `BL`/`BLR`
//! - **Slot 31**: Either the stack pointer `SP` or the zero register
//!   `XZR`/`WZR`, depending on the instruction field being decoded
//!
//! Which meaning slot 31 has is not machine state: every access says
//! it explicitly with [`R31`].

use serde::{Deserialize, Serialize};

/// Frame pointer register index.
pub const REG_FP: u32 = 29;

/// Link Register index (return address for subroutines).
pub const REG_LR: u32 = 30;

/// Index of the shared SP/ZR slot.
pub const REG_SP: u32 = 31;

/// How an operand field that holds 31 is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum R31 {
    /// The stack pointer, a real storage slot.
    Sp,

    /// The zero register: reads as 0 and discards writes.
    Zr,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers([u64; 32]);

impl Registers {
    #[must_use]
    pub fn register_at(&self, reg: u32, r31: R31) -> u64 {
        match (reg, r31) {
            (REG_SP, R31::Zr) => 0,
            _ => self.0[reg as usize],
        }
    }

    pub fn set_register_at(&mut self, reg: u32, new_value: u64, r31: R31) {
        assert!(reg <= REG_SP, "Invalid register index: {reg} (0x{reg:X})");
        match (reg, r31) {
            (REG_SP, R31::Zr) => {}
            _ => self.0[reg as usize] = new_value,
        }
    }

    #[must_use]
    pub const fn stack_pointer(&self) -> u64 {
        self.0[REG_SP as usize]
    }

    pub const fn set_stack_pointer(&mut self, new_value: u64) {
        self.0[REG_SP as usize] = new_value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn set_then_get_round_trips() {
        let mut registers = Registers::default();
        for _ in 0..5000 {
            let reg = rand::random_range(0..31);
            let value = rand::random::<u64>();
            registers.set_register_at(reg, value, R31::Zr);
            assert_eq!(registers.register_at(reg, R31::Zr), value);
            assert_eq!(registers.register_at(reg, R31::Sp), value);
        }
    }

    #[test]
    fn zero_register_reads_zero_and_discards_writes() {
        let mut registers = Registers::default();
        registers.set_stack_pointer(0x8000);
        for _ in 0..1000 {
            registers.set_register_at(REG_SP, rand::random::<u64>(), R31::Zr);
            assert_eq!(registers.register_at(REG_SP, R31::Zr), 0);
        }
        assert_eq!(registers.register_at(REG_SP, R31::Sp), 0x8000);
    }

    #[test]
    fn stack_pointer_is_slot_31() {
        let mut registers = Registers::default();
        registers.set_register_at(REG_SP, 0x1234, R31::Sp);
        assert_eq!(registers.stack_pointer(), 0x1234);
        assert_eq!(registers.register_at(REG_SP, R31::Sp), 0x1234);
    }

    #[test]
    #[should_panic(expected = "Invalid register index")]
    fn out_of_range_index_panics() {
        Registers::default().set_register_at(32, 0, R31::Sp);
    }
}

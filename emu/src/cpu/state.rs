//! # Architectural state
//!
//! Everything an instruction can read or write apart from memory. The
//! program counter is staged: executors only ever write `next_pc`, and the
//! interpreter commits it once the instruction has completed.

use serde::{Deserialize, Serialize};

use crate::cpu::psr::{Fpsr, Nzcv};
use crate::cpu::registers::{R31, Registers};
use crate::cpu::vector::VectorRegisters;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MachineState {
    pub registers: Registers,
    pub vectors: VectorRegisters,
    pub pc: u64,
    pub next_pc: u64,
    pub nzcv: Nzcv,
    pub fpsr: Fpsr,
    pub fpcr: u32,
    pub tpidr: u64,
}

impl MachineState {
    /// `Xn` (or `Wn`, zero-extended, when `sf` is clear).
    #[must_use]
    pub fn reg(&self, sf: bool, n: u32, r31: R31) -> u64 {
        let value = self.registers.register_at(n, r31);
        if sf { value } else { value & 0xFFFF_FFFF }
    }

    /// Writes `Xn`, or `Wn` with the upper half cleared when `sf` is clear.
    pub fn set_reg(&mut self, sf: bool, n: u32, value: u64, r31: R31) {
        let value = if sf { value } else { value & 0xFFFF_FFFF };
        self.registers.set_register_at(n, value, r31);
    }

    /// `Xn` where 31 is the zero register.
    #[must_use]
    pub fn x(&self, n: u32) -> u64 {
        self.registers.register_at(n, R31::Zr)
    }

    pub fn set_x(&mut self, n: u32, value: u64) {
        self.registers.set_register_at(n, value, R31::Zr);
    }

    #[must_use]
    pub const fn sp(&self) -> u64 {
        self.registers.stack_pointer()
    }

    pub const fn set_sp(&mut self, value: u64) {
        self.registers.set_stack_pointer(value);
    }

    /// Single-precision view of `Vn`.
    #[must_use]
    pub fn s(&self, n: u32) -> f32 {
        self.vectors.lane(n, 0)
    }

    /// Double-precision view of `Vn`.
    #[must_use]
    pub fn d(&self, n: u32) -> f64 {
        self.vectors.lane(n, 0)
    }

    /// Moves the staged program counter into place.
    pub const fn commit_pc(&mut self) {
        self.pc = self.next_pc;
    }
}

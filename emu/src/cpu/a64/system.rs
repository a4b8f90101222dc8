//! # System instructions
//!
//! Hints, barriers, cache maintenance and the handful of system registers a
//! user-mode program can reach:
//!
//! ```text
//! ┌────────────┬─────────────────────┬────────────┐
//! │ Register   │ op0 op1 CRn CRm op2 │ Access     │
//! ├────────────┼─────────────────────┼────────────┤
//! │ NZCV       │   3   3   4   2   0 │ read/write │
//! │ FPCR       │   3   3   4   4   0 │ read/write │
//! │ FPSR       │   3   3   4   4   1 │ read/write │
//! │ TPIDR_EL0  │   3   3  13   0   2 │ read/write │
//! │ CTR_EL0    │   3   3   0   0   1 │ read only  │
//! │ DCZID_EL0  │   3   3   0   0   7 │ read only  │
//! │ MIDR_EL1   │   3   0   0   0   0 │ read only  │
//! └────────────┴─────────────────────┴────────────┘
//! ```

use crate::bitwise::Bits;
use crate::cpu::a64::rd;
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::interpreter::Interpreter;
use crate::cpu::psr::{Fpsr, Nzcv};
use crate::cpu::status::{ExecResult, Status};

/// 64-byte lines, 16-byte minimum cache lines.
const CTR_EL0: u64 = 0x8444_C004;

/// `DC ZVA` prohibited.
const DCZID_EL0: u64 = 0x10;

/// Cortex-A53.
const MIDR_EL1: u64 = 0x410F_D034;

const fn encoding(op0: u32, op1: u32, crn: u32, crm: u32, op2: u32) -> u32 {
    (op0 << 14) | (op1 << 11) | (crn << 7) | (crm << 3) | op2
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SystemRegister {
    Nzcv,
    Fpcr,
    Fpsr,
    TpidrEl0,
    CtrEl0,
    DczidEl0,
    MidrEl1,
}

impl SystemRegister {
    const fn from_encoding(encoding_bits: u32) -> Option<Self> {
        const NZCV: u32 = encoding(3, 3, 4, 2, 0);
        const FPCR: u32 = encoding(3, 3, 4, 4, 0);
        const FPSR: u32 = encoding(3, 3, 4, 4, 1);
        const TPIDR_EL0: u32 = encoding(3, 3, 13, 0, 2);
        const CTR: u32 = encoding(3, 3, 0, 0, 1);
        const DCZID: u32 = encoding(3, 3, 0, 0, 7);
        const MIDR: u32 = encoding(3, 0, 0, 0, 0);

        match encoding_bits {
            NZCV => Some(Self::Nzcv),
            FPCR => Some(Self::Fpcr),
            FPSR => Some(Self::Fpsr),
            TPIDR_EL0 => Some(Self::TpidrEl0),
            CTR => Some(Self::CtrEl0),
            DCZID => Some(Self::DczidEl0),
            MIDR => Some(Self::MidrEl1),
            _ => None,
        }
    }

    const fn read_only(self) -> bool {
        matches!(self, Self::CtrEl0 | Self::DczidEl0 | Self::MidrEl1)
    }
}

impl std::fmt::Display for SystemRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nzcv => f.write_str("NZCV"),
            Self::Fpcr => f.write_str("FPCR"),
            Self::Fpsr => f.write_str("FPSR"),
            Self::TpidrEl0 => f.write_str("TPIDR_EL0"),
            Self::CtrEl0 => f.write_str("CTR_EL0"),
            Self::DczidEl0 => f.write_str("DCZID_EL0"),
            Self::MidrEl1 => f.write_str("MIDR_EL1"),
        }
    }
}

impl Interpreter {
    /// `[25:24] = 01` of the branch/exception/system group.
    pub(crate) fn system(&mut self, word: u32) -> ExecResult {
        if word.get_bits(22..=23) != 0 {
            return Err(unallocated(word, "system"));
        }

        let read = word.get_bit(21);
        match (word.get_bits(19..=20), read) {
            (0b00, false) => self.hints_barriers_pstate(word),
            (0b01, false) => self.system_instruction(word),
            (0b01, true) => Err(not_yet_implemented(word, "SYSL")),
            (0b10, _) => Err(not_yet_implemented(word, "debug system register")),
            (0b11, _) => self.system_register_move(word, read),
            _ => Err(unallocated(word, "system")),
        }
    }

    fn hints_barriers_pstate(&mut self, word: u32) -> ExecResult {
        let op1 = word.get_bits(16..=18);
        let crn = word.get_bits(12..=15);
        let op2 = word.get_bits(5..=7);
        let rt = rd(word);

        match (crn, op1) {
            // NOP, YIELD, WFE, WFI, SEV, SEVL and the rest of the hint
            // space all retire without effect.
            (0b0010, 0b011) if rt == 0b1_1111 => Ok(Status::Ready),
            (0b0011, 0b011) if rt == 0b1_1111 => match op2 {
                0b010 => {
                    self.exclusive = None;
                    Ok(Status::Ready)
                }
                // DSB, DMB, ISB, SB
                0b100..=0b111 => Ok(Status::Ready),
                _ => Err(unallocated(word, "barrier")),
            },
            (0b0100, _) => Err(not_yet_implemented(word, "MSR (immediate)")),
            (0b0001, 0b011) => Err(not_yet_implemented(word, "WFET/WFIT")),
            _ => Err(unallocated(word, "hint/barrier")),
        }
    }

    /// `SYS`: cache maintenance is accepted, everything else is left out.
    fn system_instruction(&mut self, word: u32) -> ExecResult {
        let op1 = word.get_bits(16..=18);
        let crn = word.get_bits(12..=15);
        let crm = word.get_bits(8..=11);
        let op2 = word.get_bits(5..=7);

        match (op1, crn, crm, op2) {
            (0b011, 7, 4, 1) => Err(not_yet_implemented(word, "DC ZVA")),
            (_, 7, 8 | 9, _) => Err(not_yet_implemented(word, "address translation")),
            (_, 7, _, _) => Ok(Status::Ready),
            _ => Err(not_yet_implemented(word, "SYS")),
        }
    }

    /// `MRS` (`read`) and `MSR` (register).
    fn system_register_move(&mut self, word: u32, read: bool) -> ExecResult {
        let Some(register) = SystemRegister::from_encoding(word.get_bits(5..=20)) else {
            return Err(not_yet_implemented(word, "system register"));
        };
        let rt = rd(word);

        if read {
            let value = match register {
                SystemRegister::Nzcv => u64::from(self.state.nzcv.bits()),
                SystemRegister::Fpcr => u64::from(self.state.fpcr),
                SystemRegister::Fpsr => u64::from(self.state.fpsr.bits()),
                SystemRegister::TpidrEl0 => self.state.tpidr,
                SystemRegister::CtrEl0 => CTR_EL0,
                SystemRegister::DczidEl0 => DCZID_EL0,
                SystemRegister::MidrEl1 => MIDR_EL1,
            };
            self.state.set_x(rt, value);
            return Ok(Status::Ready);
        }

        if register.read_only() {
            return Err(unallocated(word, "MSR to a read-only register"));
        }

        let value = self.state.x(rt);
        match register {
            SystemRegister::Nzcv => self.state.nzcv = Nzcv::from_bits(value as u32),
            SystemRegister::Fpcr => self.state.fpcr = value as u32,
            SystemRegister::Fpsr => self.state.fpsr = Fpsr::from_bits(value as u32),
            _ => self.state.tpidr = value,
        }
        tracing::trace!("MSR {register}, {value:#X}");

        Ok(Status::Ready)
    }
}

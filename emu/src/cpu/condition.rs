//! # Condition codes
//!
//! In AArch64 only a handful of instructions are conditional: `B.cond`,
//! `CSEL` and friends, `CCMP`/`CCMN`, `FCSEL` and `FCCMP`. They all carry a
//! 4-bit condition field that is tested against the `NZCV` flags.
//!
//! ```text
//! ┌───────┬────────┬─────────────────────┬─────────────────────────────────┐
//! │ Code  │ Suffix │     Meaning         │          Flags Tested           │
//! ├───────┼────────┼─────────────────────┼─────────────────────────────────┤
//! │ 0000  │   EQ   │ Equal               │ Z=1                             │
//! │ 0001  │   NE   │ Not equal           │ Z=0                             │
//! │ 0010  │  CS/HS │ Carry set / ≥ (uns) │ C=1                             │
//! │ 0011  │  CC/LO │ Carry clear / < (u) │ C=0                             │
//! │ 0100  │   MI   │ Minus / negative    │ N=1                             │
//! │ 0101  │   PL   │ Plus / non-negative │ N=0                             │
//! │ 0110  │   VS   │ Overflow set        │ V=1                             │
//! │ 0111  │   VC   │ Overflow clear      │ V=0                             │
//! │ 1000  │   HI   │ Higher (unsigned)   │ C=1 AND Z=0                     │
//! │ 1001  │   LS   │ Lower/same (unsig)  │ C=0 OR Z=1                      │
//! │ 1010  │   GE   │ ≥ (signed)          │ N=V                             │
//! │ 1011  │   LT   │ < (signed)          │ N≠V                             │
//! │ 1100  │   GT   │ > (signed)          │ Z=0 AND N=V                     │
//! │ 1101  │   LE   │ ≤ (signed)          │ Z=1 OR N≠V                      │
//! │ 1110  │   AL   │ Always              │ (unconditional)                 │
//! │ 1111  │   NV   │ Always              │ (unconditional, like AL)        │
//! └───────┴────────┴─────────────────────┴─────────────────────────────────┘
//! ```
//!
//! Unlike 32-bit ARM, `NV` is not "never": in A64 it behaves exactly like
//! `AL`.

use serde::{Deserialize, Serialize};

use crate::cpu::psr::Nzcv;

#[derive(Debug, Eq, PartialEq, Copy, Clone, Serialize, Deserialize)]
pub enum Condition {
    /// Equal (Z=1)
    EQ = 0x0,

    /// Not equal (Z=0)
    NE = 0x1,

    /// Carry set / unsigned higher or same (C=1), also known as HS.
    CS = 0x2,

    /// Carry clear / unsigned lower (C=0), also known as LO.
    CC = 0x3,

    /// Minus / negative (N=1)
    MI = 0x4,

    /// Plus / positive or zero (N=0)
    PL = 0x5,

    /// Overflow set (V=1)
    VS = 0x6,

    /// Overflow clear (V=0)
    VC = 0x7,

    /// Unsigned higher (C=1 AND Z=0)
    HI = 0x8,

    /// Unsigned lower or same (C=0 OR Z=1)
    LS = 0x9,

    /// Signed greater or equal (N=V)
    GE = 0xA,

    /// Signed less than (N≠V)
    LT = 0xB,

    /// Signed greater than (Z=0 AND N=V)
    GT = 0xC,

    /// Signed less than or equal (Z=1 OR N≠V)
    LE = 0xD,

    /// Always
    AL = 0xE,

    /// Always, encoded with the low bit set.
    NV = 0xF,
}

impl Condition {
    /// Whether the condition holds for `flags`.
    #[must_use]
    pub fn holds(self, flags: Nzcv) -> bool {
        use Condition::{AL, CC, CS, EQ, GE, GT, HI, LE, LS, LT, MI, NE, NV, PL, VC, VS};
        match self {
            EQ => flags.zero_flag(),
            NE => !flags.zero_flag(),
            CS => flags.carry_flag(),
            CC => !flags.carry_flag(),
            MI => flags.sign_flag(),
            PL => !flags.sign_flag(),
            VS => flags.overflow_flag(),
            VC => !flags.overflow_flag(),
            HI => flags.carry_flag() && !flags.zero_flag(),
            LS => !flags.carry_flag() || flags.zero_flag(),
            GE => flags.sign_flag() == flags.overflow_flag(),
            LT => flags.sign_flag() != flags.overflow_flag(),
            GT => !flags.zero_flag() && (flags.sign_flag() == flags.overflow_flag()),
            LE => flags.zero_flag() || (flags.sign_flag() != flags.overflow_flag()),
            AL | NV => true,
        }
    }
}

impl From<u32> for Condition {
    /// Only the low four bits are looked at.
    fn from(item: u32) -> Self {
        match item & 0xF {
            0x0 => Self::EQ,
            0x1 => Self::NE,
            0x2 => Self::CS,
            0x3 => Self::CC,
            0x4 => Self::MI,
            0x5 => Self::PL,
            0x6 => Self::VS,
            0x7 => Self::VC,
            0x8 => Self::HI,
            0x9 => Self::LS,
            0xA => Self::GE,
            0xB => Self::LT,
            0xC => Self::GT,
            0xD => Self::LE,
            0xE => Self::AL,
            _ => Self::NV,
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let suffix = match self {
            Self::EQ => "EQ",
            Self::NE => "NE",
            Self::CS => "CS",
            Self::CC => "CC",
            Self::MI => "MI",
            Self::PL => "PL",
            Self::VS => "VS",
            Self::VC => "VC",
            Self::HI => "HI",
            Self::LS => "LS",
            Self::GE => "GE",
            Self::LT => "LT",
            Self::GT => "GT",
            Self::LE => "LE",
            Self::AL => "AL",
            Self::NV => "NV",
        };
        f.write_str(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn every_flags_value() -> impl Iterator<Item = Nzcv> {
        (0..16).map(Nzcv::from_nibble)
    }

    #[test]
    fn always_conditions_hold() {
        for flags in every_flags_value() {
            assert!(Condition::AL.holds(flags));
            assert!(Condition::NV.holds(flags));
        }
    }

    #[test]
    fn paired_conditions_are_exclusive() {
        // Codes 2n and 2n+1 test opposite things, except AL/NV.
        for flags in every_flags_value() {
            for code in (0..14).step_by(2) {
                let even = Condition::from(code);
                let odd = Condition::from(code + 1);
                assert_eq!(even.holds(flags), !odd.holds(flags), "{even}/{odd} {flags}");
            }
            assert!(!(Condition::EQ.holds(flags) && Condition::NE.holds(flags)));
        }
    }

    #[test]
    fn signed_comparisons() {
        // flags produced by CMP 1, 2: N=1, C=0
        let less = Nzcv::from_flags(true, false, false, false);
        assert!(Condition::LT.holds(less));
        assert!(Condition::LE.holds(less));
        assert!(!Condition::GT.holds(less));
        assert!(Condition::CC.holds(less));
        assert!(Condition::LS.holds(less));

        // flags produced by CMP 2, 2: Z=1, C=1
        let equal = Nzcv::from_flags(false, true, true, false);
        assert!(Condition::GE.holds(equal));
        assert!(Condition::LE.holds(equal));
        assert!(!Condition::HI.holds(equal));
        assert!(Condition::CS.holds(equal));
    }

    #[test]
    fn decode_and_display() {
        assert_eq!(Condition::from(0b1100), Condition::GT);
        assert_eq!(Condition::from(0xF1), Condition::NE);
        assert_eq!(Condition::LS.to_string(), "LS");
    }
}

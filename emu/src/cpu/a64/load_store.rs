//! # Loads and stores
//!
//! Addressing forms of the single register and pair instructions:
//!
//! ```text
//! ┌──────────────────┬──────────────────────┬─────────────┐
//! │ Form             │ Address used         │ Base after  │
//! ├──────────────────┼──────────────────────┼─────────────┤
//! │ unsigned offset  │ Xn + (imm12 << size) │ unchanged   │
//! │ unscaled offset  │ Xn + imm9            │ unchanged   │
//! │ pre-index        │ Xn + imm9            │ Xn + imm9   │
//! │ post-index       │ Xn                   │ Xn + imm9   │
//! │ register offset  │ Xn + ext(Xm) << s    │ unchanged   │
//! └──────────────────┴──────────────────────┴─────────────┘
//! ```
//!
//! A write-back form whose transfer register is also the base register is
//! rejected as unallocated, for loads and stores alike.
//!
//! Loads that fault still write their (zero) value before the fault is
//! reported; the base register is never updated after a fault.

use crate::bitwise::{Bits, signed_field};
use crate::cpu::a64::{ra, rd, rm, rn};
use crate::cpu::alu::Extension;
use crate::cpu::decode::{not_yet_implemented, unallocated};
use crate::cpu::interpreter::Interpreter;
use crate::cpu::registers::{R31, REG_SP};
use crate::cpu::status::{ErrorKind, ExecResult, Status};

/// What a transfer does with the register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Store,
    LoadUnsigned,

    /// Sign-extends into a `W` register.
    LoadSigned32,

    /// Sign-extends into an `X` register.
    LoadSigned64,
    Prefetch,
    StoreVector,
    LoadVector,
}

impl Transfer {
    const fn is_vector(self) -> bool {
        matches!(self, Self::StoreVector | Self::LoadVector)
    }
}

/// Addressing of the immediate and register forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Indexing {
    Offset,
    PreIndex,
    PostIndex,
}

impl Indexing {
    const fn writes_back(self) -> bool {
        !matches!(self, Self::Offset)
    }
}

impl Interpreter {
    pub(crate) fn load_integer(&mut self, address: u64, size: usize) -> u64 {
        match size {
            1 => u64::from(self.memory.read::<u8>(address)),
            2 => u64::from(self.memory.read::<u16>(address)),
            4 => u64::from(self.memory.read::<u32>(address)),
            _ => self.memory.read::<u64>(address),
        }
    }

    pub(crate) fn store_integer(&mut self, address: u64, size: usize, value: u64) {
        match size {
            1 => self.memory.write(address, value as u8),
            2 => self.memory.write(address, value as u16),
            4 => self.memory.write(address, value as u32),
            _ => self.memory.write(address, value),
        }
    }

    /// Moves `size` bytes between memory and register `rt`, then reports any
    /// memory fault.
    fn transfer(
        &mut self,
        kind: Transfer,
        address: u64,
        size: usize,
        rt: u32,
    ) -> Result<(), ErrorKind> {
        let bits = (size * 8) as u32;
        match kind {
            Transfer::Store => {
                let value = self.state.x(rt);
                self.store_integer(address, size, value);
            }
            Transfer::LoadUnsigned => {
                let value = self.load_integer(address, size);
                self.state.set_x(rt, value);
            }
            Transfer::LoadSigned32 => {
                let value = self.load_integer(address, size).sign_extended(bits);
                self.state.set_reg(false, rt, value, R31::Zr);
            }
            Transfer::LoadSigned64 => {
                let value = self.load_integer(address, size).sign_extended(bits);
                self.state.set_x(rt, value);
            }
            Transfer::Prefetch => {}
            Transfer::StoreVector => match size {
                1 => self.memory.write(address, self.state.vectors.lane::<u8>(rt, 0)),
                2 => self.memory.write(address, self.state.vectors.lane::<u16>(rt, 0)),
                4 => self.memory.write(address, self.state.vectors.lane::<u32>(rt, 0)),
                8 => self.memory.write(address, self.state.vectors.lane::<u64>(rt, 0)),
                _ => self.memory.write(address, self.state.vectors.q(rt)),
            },
            Transfer::LoadVector => match size {
                1 => {
                    let value = self.memory.read::<u8>(address);
                    self.state.vectors.set_scalar(rt, value);
                }
                2 => {
                    let value = self.memory.read::<u16>(address);
                    self.state.vectors.set_scalar(rt, value);
                }
                4 => {
                    let value = self.memory.read::<u32>(address);
                    self.state.vectors.set_scalar(rt, value);
                }
                8 => {
                    let value = self.memory.read::<u64>(address);
                    self.state.vectors.set_scalar(rt, value);
                }
                _ => {
                    let value = self.memory.read::<u128>(address);
                    self.state.vectors.set_q(rt, value);
                }
            },
        }

        self.check_memory()
    }

    fn base_address(&self, rn: u32) -> u64 {
        self.state.reg(true, rn, R31::Sp)
    }

    /// `LDR` (literal), `LDRSW` (literal), `PRFM` (literal).
    pub(crate) fn load_literal(&mut self, word: u32) -> ExecResult {
        let vector = word.get_bit(26);
        if word.get_bit(24) {
            return Err(if vector {
                unallocated(word, "load/store (RCpc, tags)")
            } else {
                not_yet_implemented(word, "load/store (RCpc, tags)")
            });
        }

        let (kind, size) = match (word.get_bits(30..=31), vector) {
            (0b00, false) => (Transfer::LoadUnsigned, 4),
            (0b01, false) => (Transfer::LoadUnsigned, 8),
            (0b10, false) => (Transfer::LoadSigned64, 4),
            (0b11, false) => return Ok(Status::Ready),
            (0b00, true) => (Transfer::LoadVector, 4),
            (0b01, true) => (Transfer::LoadVector, 8),
            (0b10, true) => (Transfer::LoadVector, 16),
            _ => return Err(unallocated(word, "load literal")),
        };

        let offset = signed_field(u64::from(word), 23, 5) << 2;
        let address = self.state.pc.wrapping_add(offset as u64);
        self.transfer(kind, address, size, rd(word))?;

        Ok(Status::Ready)
    }

    /// Exclusive, acquire/release and compare-and-swap forms.
    pub(crate) fn load_store_exclusive(&mut self, word: u32) -> ExecResult {
        if word.get_bit(24) {
            return Err(unallocated(word, "load/store exclusive"));
        }

        let size = 1_usize << word.get_bits(30..=31);
        let load = word.get_bit(22);
        let rs = rm(word);
        let rn = rn(word);
        let rt = rd(word);

        match (word.get_bit(23), word.get_bit(21)) {
            (false, false) => {
                let address = self.base_address(rn);
                if load {
                    self.transfer(Transfer::LoadUnsigned, address, size, rt)?;
                    self.exclusive = Some((address, size));
                    return Ok(Status::Ready);
                }

                if rs == rt || (rs == rn && rn != REG_SP) {
                    return Err(unallocated(word, "store exclusive"));
                }

                let armed = self.exclusive.take() == Some((address, size));
                if armed {
                    self.transfer(Transfer::Store, address, size, rt)?;
                }
                self.state.set_reg(false, rs, u64::from(!armed), R31::Zr);

                Ok(Status::Ready)
            }
            (true, false) => {
                let address = self.base_address(rn);
                let kind = if load {
                    Transfer::LoadUnsigned
                } else {
                    Transfer::Store
                };
                self.transfer(kind, address, size, rt)?;

                Ok(Status::Ready)
            }
            (false, true) => Err(not_yet_implemented(word, "exclusive pair/CASP")),
            (true, true) => Err(not_yet_implemented(word, "compare and swap")),
        }
    }

    /// `STP`, `LDP`, `LDPSW`, `STNP`, `LDNP` for general and vector
    /// registers.
    pub(crate) fn load_store_pair(&mut self, word: u32) -> ExecResult {
        let vector = word.get_bit(26);
        let load = word.get_bit(22);
        let opc = word.get_bits(30..=31);
        let pair_type = word.get_bits(23..=24);

        let (kind, size) = match (opc, vector, load) {
            (0b00, false, false) | (0b10, false, false) => (Transfer::Store, 4 << (opc >> 1)),
            (0b00, false, true) | (0b10, false, true) => (Transfer::LoadUnsigned, 4 << (opc >> 1)),
            (0b01, false, true) if pair_type != 0 => (Transfer::LoadSigned64, 4),
            (0b01, false, false) => return Err(not_yet_implemented(word, "STGP")),
            (0b00..=0b10, true, false) => (Transfer::StoreVector, 4 << opc),
            (0b00..=0b10, true, true) => (Transfer::LoadVector, 4 << opc),
            _ => return Err(unallocated(word, "load/store pair")),
        };

        let indexing = match pair_type {
            0b01 => Indexing::PostIndex,
            0b11 => Indexing::PreIndex,
            _ => Indexing::Offset,
        };

        let rn = rn(word);
        let rt = rd(word);
        let rt2 = ra(word);

        if indexing.writes_back() && !vector && rn != REG_SP && (rt == rn || rt2 == rn) {
            return Err(unallocated(word, "load/store pair write-back"));
        }
        if load && rt == rt2 {
            return Err(unallocated(word, "load pair"));
        }

        let offset = (signed_field(u64::from(word), 21, 15) * size as i64) as u64;
        let base = self.base_address(rn);
        let address = match indexing {
            Indexing::PostIndex => base,
            _ => base.wrapping_add(offset),
        };

        self.transfer(kind, address, size, rt)?;
        self.transfer(kind, address.wrapping_add(size as u64), size, rt2)?;

        if indexing.writes_back() {
            self.state.set_reg(true, rn, base.wrapping_add(offset), R31::Sp);
        }

        Ok(Status::Ready)
    }

    /// Single register loads and stores in all addressing forms.
    pub(crate) fn load_store_register(&mut self, word: u32) -> ExecResult {
        let vector = word.get_bit(26);
        let size_field = word.get_bits(30..=31);
        let opc = word.get_bits(22..=23);

        let (kind, scale) = if vector {
            let scale = (u32::from(opc.get_bit(1)) << 2) | size_field;
            if scale > 4 {
                return Err(unallocated(word, "load/store register (SIMD&FP)"));
            }
            let kind = if opc.get_bit(0) {
                Transfer::LoadVector
            } else {
                Transfer::StoreVector
            };
            (kind, scale)
        } else {
            let kind = match (opc, size_field) {
                (0b00, _) => Transfer::Store,
                (0b01, _) => Transfer::LoadUnsigned,
                (0b10, 0b11) => Transfer::Prefetch,
                (0b10, _) => Transfer::LoadSigned64,
                (0b11, 0b00 | 0b01) => Transfer::LoadSigned32,
                _ => return Err(unallocated(word, "load/store register")),
            };
            (kind, size_field)
        };
        let size = 1_usize << scale;

        let rn = rn(word);
        let rt = rd(word);

        let (indexing, offset) = if word.get_bit(24) {
            let imm12 = u64::from(word.get_bits(10..=21));
            (Indexing::Offset, imm12 << scale)
        } else if !word.get_bit(21) {
            let imm9 = signed_field(u64::from(word), 20, 12) as u64;
            match word.get_bits(10..=11) {
                0b00 => (Indexing::Offset, imm9),
                0b10 if kind.is_vector() || kind == Transfer::Prefetch => {
                    return Err(unallocated(word, "load/store unprivileged"));
                }
                0b10 => (Indexing::Offset, imm9),
                _ if kind == Transfer::Prefetch => {
                    return Err(unallocated(word, "prefetch with write-back"));
                }
                0b01 => (Indexing::PostIndex, imm9),
                _ => (Indexing::PreIndex, imm9),
            }
        } else {
            match word.get_bits(10..=11) {
                0b10 => {
                    let option = word.get_bits(13..=15);
                    if !option.get_bit(1) {
                        return Err(unallocated(word, "load/store register offset"));
                    }
                    let shift = if word.get_bit(12) { scale } else { 0 };
                    let offset = Extension::from(option).apply(self.state.x(rm(word)), shift);
                    (Indexing::Offset, offset)
                }
                0b00 => return Err(not_yet_implemented(word, "atomic memory operation")),
                _ => return Err(not_yet_implemented(word, "pointer authenticated load")),
            }
        };

        if indexing.writes_back() && !kind.is_vector() && rn == rt && rn != REG_SP {
            return Err(unallocated(word, "load/store write-back"));
        }

        let base = self.base_address(rn);
        let address = match indexing {
            Indexing::PostIndex => base,
            _ => base.wrapping_add(offset),
        };
        self.transfer(kind, address, size, rt)?;

        if indexing.writes_back() {
            self.state.set_reg(true, rn, base.wrapping_add(offset), R31::Sp);
        }

        Ok(Status::Ready)
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::a64::test_support::{DATA, cpu, exec};
    use crate::cpu::status::{ErrorKind, Status};
    use pretty_assertions::assert_eq;

    #[test]
    fn unsigned_offset() {
        let mut cpu = cpu();
        cpu.state.set_x(1, 0x0123_4567_89AB_CDEF);
        cpu.state.set_x(2, DATA);

        // STR X1, [X2, #8]; LDR X3, [X2, #8]
        exec(&mut cpu, 0xF900_0441).unwrap();
        exec(&mut cpu, 0xF940_0443).unwrap();
        assert_eq!(cpu.state.x(3), 0x0123_4567_89AB_CDEF);
        assert_eq!(cpu.memory.read::<u64>(DATA + 8), 0x0123_4567_89AB_CDEF);
        assert_eq!(cpu.state.x(2), DATA);
    }

    #[test]
    fn pre_and_post_index() {
        let mut cpu = cpu();
        cpu.state.set_x(1, 0xAB);
        cpu.state.set_x(2, DATA);

        // STRB W1, [X2], #1
        exec(&mut cpu, 0x3800_1441).unwrap();
        assert_eq!(cpu.state.x(2), DATA + 1);
        assert_eq!(cpu.memory.read::<u8>(DATA), 0xAB);

        // LDRB W3, [X2, #-1]!
        exec(&mut cpu, 0x385F_FC43).unwrap();
        assert_eq!(cpu.state.x(2), DATA);
        assert_eq!(cpu.state.x(3), 0xAB);
    }

    #[test]
    fn sign_extending_loads() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        cpu.memory.write(DATA, 0x8080_u16);
        cpu.memory.write(DATA + 4, 0xFFFF_FFFE_u32);

        // LDRSB X3, [X2]
        exec(&mut cpu, 0x3980_0043).unwrap();
        assert_eq!(cpu.state.x(3), 0xFFFF_FFFF_FFFF_FF80);

        // LDRSH W3, [X2]
        exec(&mut cpu, 0x79C0_0043).unwrap();
        assert_eq!(cpu.state.x(3), 0xFFFF_8080);

        // LDRSW X3, [X2, #4]
        exec(&mut cpu, 0xB980_0443).unwrap();
        assert_eq!(cpu.state.x(3), (-2_i64) as u64);

        // LDRSW with opc=11
        assert_eq!(
            exec(&mut cpu, 0xB9C0_0043),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn register_offset() {
        let mut cpu = cpu();
        cpu.memory.write(DATA + 0x18, 0x55_u64);
        cpu.memory.write(DATA + 4, 0x66_u32);
        cpu.state.set_x(2, DATA);
        cpu.state.set_x(4, 3);

        // LDR X3, [X2, X4, LSL #3]
        exec(&mut cpu, 0xF864_7843).unwrap();
        assert_eq!(cpu.state.x(3), 0x55);

        // LDR W3, [X2, W4, SXTW]
        cpu.state.set_x(2, DATA + 8);
        cpu.state.set_x(4, 0xFFFF_FFFC);
        exec(&mut cpu, 0xB864_C843).unwrap();
        assert_eq!(cpu.state.x(3), 0x66);

        // UXTB is not a valid offset extension
        assert_eq!(
            exec(&mut cpu, 0xB864_0843),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn write_back_onto_the_transfer_register_is_rejected() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        // LDR X2, [X2], #8
        assert_eq!(
            exec(&mut cpu, 0xF840_8442),
            Err(ErrorKind::UnallocatedInstruction)
        );
        // STR X2, [X2, #8]!
        assert_eq!(
            exec(&mut cpu, 0xF800_8C42),
            Err(ErrorKind::UnallocatedInstruction)
        );
        assert_eq!(cpu.state.x(2), DATA);
    }

    #[test]
    fn vector_registers() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        cpu.state.vectors.set_q(0, 0x0011_2233_4455_6677_8899_AABB_CCDD_EEFF);

        // STR Q0, [X2, #16]; LDR Q1, [X2, #16]
        exec(&mut cpu, 0x3D80_0440).unwrap();
        exec(&mut cpu, 0x3DC0_0441).unwrap();
        assert_eq!(cpu.state.vectors.q(1), cpu.state.vectors.q(0));

        // LDR D1, [X2] clears the upper half
        cpu.memory.write(DATA, 1.5_f64);
        exec(&mut cpu, 0xFD40_0041).unwrap();
        assert_eq!(cpu.state.d(1), 1.5);
        assert_eq!(cpu.state.vectors.q(1) >> 64, 0);
    }

    #[test]
    fn prefetch_does_nothing() {
        let mut cpu = cpu();
        // PRFM PLDL1KEEP, [X2] with X2 unmapped
        cpu.state.set_x(2, 0xDEAD_0000);
        assert_eq!(exec(&mut cpu, 0xF980_0040), Ok(Status::Ready));
        assert_eq!(cpu.memory.fault(), None);
    }

    #[test]
    fn faulting_load_writes_zero() {
        let mut cpu = cpu();
        cpu.state.set_x(2, 0);
        cpu.state.set_x(3, 0x77);
        // LDR X3, [X2]
        assert_eq!(
            exec(&mut cpu, 0xF940_0043),
            Err(ErrorKind::MemoryException)
        );
        assert_eq!(cpu.state.x(3), 0);
    }

    #[test]
    fn literal() {
        let mut cpu = cpu();
        cpu.state.pc = DATA;
        cpu.memory.write(DATA + 8, 0xFFFF_FFFF_8000_0000_u64);

        // LDR X1, #8
        exec(&mut cpu, 0x5800_0041).unwrap();
        assert_eq!(cpu.state.x(1), 0xFFFF_FFFF_8000_0000);

        // LDRSW X1, #4 from DATA + 4 + 4
        exec(&mut cpu, 0x9800_0021).unwrap();
        assert_eq!(cpu.state.x(1), 0xFFFF_FFFF_8000_0000);

        // LDR D1, #0 from DATA + 8
        cpu.state.pc = DATA + 8;
        exec(&mut cpu, 0x5C00_0001).unwrap();
        assert_eq!(cpu.state.vectors.lane::<u64>(1, 0), 0xFFFF_FFFF_8000_0000);

        // PRFM (literal), LDR with opc=11 V=1
        assert_eq!(exec(&mut cpu, 0xD800_0041), Ok(Status::Ready));
        assert_eq!(
            exec(&mut cpu, 0xDC00_0041),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn pairs() {
        let mut cpu = cpu();
        cpu.state.set_sp(DATA + 0x100);
        cpu.state.set_x(1, 11);
        cpu.state.set_x(2, 22);

        // STP X1, X2, [SP, #-16]!
        exec(&mut cpu, 0xA9BF_0BE1).unwrap();
        assert_eq!(cpu.state.sp(), DATA + 0xF0);
        assert_eq!(cpu.memory.read::<u64>(DATA + 0xF0), 11);
        assert_eq!(cpu.memory.read::<u64>(DATA + 0xF8), 22);

        // LDP X3, X4, [SP], #16
        exec(&mut cpu, 0xA8C1_13E3).unwrap();
        assert_eq!(cpu.state.sp(), DATA + 0x100);
        assert_eq!((cpu.state.x(3), cpu.state.x(4)), (11, 22));

        // LDPSW X3, X4, [X2]
        cpu.state.set_x(2, DATA);
        cpu.memory.write(DATA, -5_i32);
        cpu.memory.write(DATA + 4, 7_i32);
        exec(&mut cpu, 0x6940_1043).unwrap();
        assert_eq!(cpu.state.x(3), (-5_i64) as u64);
        assert_eq!(cpu.state.x(4), 7);

        // LDP X3, X3, [X2]
        assert_eq!(
            exec(&mut cpu, 0xA940_0C43),
            Err(ErrorKind::UnallocatedInstruction)
        );
        // LDP X2, X3, [X2], #16
        assert_eq!(
            exec(&mut cpu, 0xA8C1_0C42),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn vector_pairs() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        cpu.state.vectors.set_q(0, 1);
        cpu.state.vectors.set_q(1, 2);

        // STP Q0, Q1, [X2]
        exec(&mut cpu, 0xAD00_0440).unwrap();
        assert_eq!(cpu.memory.read::<u128>(DATA + 16), 2);

        // LDP S0, S1, [X2, #8]
        cpu.memory.write(DATA + 8, 1.0_f32);
        cpu.memory.write(DATA + 12, 2.0_f32);
        exec(&mut cpu, 0x2D41_0440).unwrap();
        assert_eq!(cpu.state.s(0), 1.0);
        assert_eq!(cpu.state.s(1), 2.0);
    }

    #[test]
    fn exclusive_monitor() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        cpu.state.set_x(4, 99);

        // STXR W3, X4, [X2] without a reservation fails
        exec(&mut cpu, 0xC803_7C44).unwrap();
        assert_eq!(cpu.state.x(3), 1);
        assert_eq!(cpu.memory.read::<u64>(DATA), 0);

        // LDXR X1, [X2]; STXR W3, X4, [X2]
        exec(&mut cpu, 0xC85F_7C41).unwrap();
        exec(&mut cpu, 0xC803_7C44).unwrap();
        assert_eq!(cpu.state.x(3), 0);
        assert_eq!(cpu.memory.read::<u64>(DATA), 99);

        // The reservation is gone
        exec(&mut cpu, 0xC803_7C44).unwrap();
        assert_eq!(cpu.state.x(3), 1);

        // STXR W2, X4, [X2]
        assert_eq!(
            exec(&mut cpu, 0xC802_7C44),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }

    #[test]
    fn acquire_release() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        cpu.state.set_x(1, 0x1234_5678_9ABC);

        // STLR W1, [X2]; LDAR W5, [X2]
        exec(&mut cpu, 0x889F_FC41).unwrap();
        exec(&mut cpu, 0x88DF_FC45).unwrap();
        assert_eq!(cpu.state.x(5), 0x5678_9ABC);

        // CAS X1, X2, [X3]
        assert_eq!(
            exec(&mut cpu, 0xC8A1_7C62),
            Err(ErrorKind::NotYetImplemented)
        );
    }
}

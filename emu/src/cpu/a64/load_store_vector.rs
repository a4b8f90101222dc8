//! `LD1`..`LD4`, `ST1`..`ST4` and the replicating `LD1R`..`LD4R`.
//!
//! Structures are interleaved in memory: element `e` of structure member
//! `s` lives at `(e * selem + s) * ebytes`. A 64-bit (`Q` clear) load zeroes
//! the upper half of every register it writes.

use crate::bitwise::{Bits, replicate};
use crate::cpu::a64::{rd, rm, rn};
use crate::cpu::decode::unallocated;
use crate::cpu::interpreter::Interpreter;
use crate::cpu::registers::R31;
use crate::cpu::status::{ErrorKind, ExecResult, Status};

const fn next_register(reg: u32) -> u32 {
    (reg + 1) % 32
}

impl Interpreter {
    pub(crate) fn simd_load_store_structure(&mut self, word: u32) -> ExecResult {
        if word.get_bit(31) {
            return Err(unallocated(word, "SIMD load/store structure"));
        }
        if !word.get_bit(23) && rm(word) != 0 {
            return Err(unallocated(word, "SIMD load/store structure offset"));
        }

        let transferred = if word.get_bit(24) {
            self.single_structure(word)?
        } else {
            self.multiple_structures(word)?
        };

        if word.get_bit(23) {
            let rn = rn(word);
            let offset = match rm(word) {
                0b1_1111 => transferred as u64,
                rm => self.state.x(rm),
            };
            let base = self.state.reg(true, rn, R31::Sp);
            self.state.set_reg(true, rn, base.wrapping_add(offset), R31::Sp);
        }

        Ok(Status::Ready)
    }

    /// Returns the number of bytes moved.
    fn multiple_structures(&mut self, word: u32) -> Result<usize, ErrorKind> {
        if word.get_bit(21) {
            return Err(unallocated(word, "SIMD load/store multiple"));
        }

        let (rpt, selem) = match word.get_bits(12..=15) {
            0b0000 => (1, 4),
            0b0010 => (4, 1),
            0b0100 => (1, 3),
            0b0110 => (3, 1),
            0b0111 => (1, 1),
            0b1000 => (1, 2),
            0b1010 => (2, 1),
            _ => return Err(unallocated(word, "SIMD load/store multiple")),
        };

        let full = word.get_bit(30);
        let size = word.get_bits(10..=11);
        if size == 0b11 && !full && selem != 1 {
            return Err(unallocated(word, "SIMD load/store multiple"));
        }

        let load = word.get_bit(22);
        let ebytes = 1_usize << size;
        let esize = 8 << size;
        let elements = (if full { 16 } else { 8 }) / ebytes;
        let rt = rd(word);
        let base = self.state.reg(true, rn(word), R31::Sp);

        let mut address = base;
        for r in 0..rpt {
            for e in 0..elements {
                let mut t = (rt + r) % 32;
                for _ in 0..selem {
                    self.transfer_element(load, address, esize, t, e);
                    address = address.wrapping_add(ebytes as u64);
                    t = next_register(t);
                }
            }
        }

        if load && !full {
            let mut t = rt;
            for _ in 0..rpt * selem {
                let value = self.state.vectors.get(t).sized(false);
                self.state.vectors.set(t, value);
                t = next_register(t);
            }
        }
        self.check_memory()?;

        Ok((rpt * selem) as usize * elements * ebytes)
    }

    /// Returns the number of bytes moved.
    fn single_structure(&mut self, word: u32) -> Result<usize, ErrorKind> {
        let full = word.get_bit(30);
        let load = word.get_bit(22);
        let opcode = word.get_bits(13..=15);
        let s = u32::from(word.get_bit(12));
        let size = word.get_bits(10..=11);
        let selem = (((opcode & 1) << 1) | u32::from(word.get_bit(21))) + 1;
        let q = u32::from(full);

        let (scale, index, replicating) = match opcode >> 1 {
            0b11 if !load || s == 1 => {
                return Err(unallocated(word, "SIMD load/store single replicate"));
            }
            0b11 => (size, 0, true),
            0b00 => (0, (q << 3) | (s << 2) | size, false),
            0b01 if size & 1 == 1 => {
                return Err(unallocated(word, "SIMD load/store single"));
            }
            0b01 => (1, (q << 2) | (s << 1) | (size >> 1), false),
            _ if size & 0b10 != 0 || (size == 1 && s == 1) => {
                return Err(unallocated(word, "SIMD load/store single"));
            }
            _ if size == 0 => (2, (q << 1) | s, false),
            _ => (3, q, false),
        };

        let ebytes = 1_usize << scale;
        let esize = 8 << scale;
        let mut address = self.state.reg(true, rn(word), R31::Sp);
        let mut t = rd(word);

        for _ in 0..selem {
            if replicating {
                let element = self.load_integer(address, ebytes);
                let value = replicate(element, esize);
                self.state.vectors.set_q(
                    t,
                    if full {
                        (u128::from(value) << 64) | u128::from(value)
                    } else {
                        u128::from(value)
                    },
                );
            } else {
                self.transfer_element(load, address, esize, t, index as usize);
            }
            address = address.wrapping_add(ebytes as u64);
            t = next_register(t);
        }
        self.check_memory()?;

        Ok(selem as usize * ebytes)
    }

    fn transfer_element(&mut self, load: bool, address: u64, esize: u32, t: u32, index: usize) {
        let ebytes = (esize / 8) as usize;
        let mut vector = self.state.vectors.get(t);
        if load {
            let value = self.load_integer(address, ebytes);
            vector.set_element(index, esize, value);
            self.state.vectors.set(t, vector);
        } else {
            self.store_integer(address, ebytes, vector.element(index, esize));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cpu::a64::test_support::{DATA, cpu, exec};
    use crate::cpu::status::ErrorKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn one_register() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        cpu.state.vectors.set_q(0, 0x0F0E_0D0C_0B0A_0908_0706_0504_0302_0100);
        cpu.state.vectors.set_q(1, u128::MAX);

        // ST1 {V0.16B}, [X2]
        exec(&mut cpu, 0x4C00_7040).unwrap();
        assert_eq!(cpu.memory.read::<u8>(DATA + 5), 5);

        // LD1 {V1.8B}, [X2]
        exec(&mut cpu, 0x0C40_7041).unwrap();
        assert_eq!(cpu.state.vectors.q(1), 0x0706_0504_0302_0100);
    }

    #[test]
    fn interleaved_pairs() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        for i in 0..8_u32 {
            cpu.memory.write(DATA + u64::from(i) * 4, i);
        }

        // LD2 {V2.4S, V3.4S}, [X2]
        exec(&mut cpu, 0x4C40_8842).unwrap();
        let lanes = |cpu: &crate::cpu::interpreter::Interpreter, reg| {
            (0..4)
                .map(|i| cpu.state.vectors.lane::<u32>(reg, i))
                .collect::<Vec<_>>()
        };
        assert_eq!(lanes(&cpu, 2), [0, 2, 4, 6]);
        assert_eq!(lanes(&cpu, 3), [1, 3, 5, 7]);
    }

    #[test]
    fn post_index_by_transfer_size() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        for reg in 0..4 {
            cpu.state.vectors.set_q(reg, u128::from(reg) * 0x0101_0101_0101_0101);
        }

        // ST4 {V0.8B-V3.8B}, [X2], #32
        exec(&mut cpu, 0x0C9F_0040).unwrap();
        assert_eq!(cpu.state.x(2), DATA + 32);
        assert_eq!(cpu.memory.read::<u32>(DATA), 0x0302_0100);
        assert_eq!(cpu.memory.read::<u32>(DATA + 28), 0x0302_0100);
    }

    #[test]
    fn single_lanes() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        cpu.memory.write(DATA, 0xAABB_CCDD_u32);
        cpu.state.vectors.set_q(0, 7);

        // LD1 {V0.D}[1], [X2] keeps lane 0
        exec(&mut cpu, 0x4D40_8440).unwrap();
        assert_eq!(cpu.state.vectors.lane::<u64>(0, 0), 7);
        assert_eq!(cpu.state.vectors.lane::<u64>(0, 1), 0xAABB_CCDD);

        // ST1 {V0.B}[15], [X2]
        cpu.state.vectors.set_lane::<u8>(0, 15, 0x5A);
        exec(&mut cpu, 0x4D00_1C40).unwrap();
        assert_eq!(cpu.memory.read::<u8>(DATA), 0x5A);

        // LD1R {V0.4S}, [X2]
        cpu.memory.write(DATA, 0x1234_5678_u32);
        exec(&mut cpu, 0x4D40_C840).unwrap();
        assert_eq!(
            cpu.state.vectors.q(0),
            0x1234_5678_1234_5678_1234_5678_1234_5678
        );
    }

    #[test]
    fn invalid_arrangements() {
        let mut cpu = cpu();
        cpu.state.set_x(2, DATA);
        // LD2 {V0.1D, V1.1D}, [X2]
        assert_eq!(
            exec(&mut cpu, 0x0C40_8C40),
            Err(ErrorKind::UnallocatedInstruction)
        );
        // LD1 with a post-index register but no post-index bit
        assert_eq!(
            exec(&mut cpu, 0x4C43_7041),
            Err(ErrorKind::UnallocatedInstruction)
        );
    }
}

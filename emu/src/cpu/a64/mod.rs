//! A64 instruction executors.
//!
//! Every file adds an `impl Interpreter` block for one instruction family.
//! The dispatch tables in [`decode`](super::decode) point straight at these
//! methods; anything below the table level is decoded here with `match`.
//!
//! Common operand fields:
//!
//! ```text
//!  31 30 29 28        21 20   16 15   10 9     5 4     0
//! ┌──┬──┬──┬────────────┬───────┬───────┬───────┬───────┐
//! │sf│op│ S│   opcode   │  Rm   │  ...  │  Rn   │  Rd   │
//! └──┴──┴──┴────────────┴───────┴───────┴───────┴───────┘
//!                                  Ra / Rt2 live in [14:10]
//! ```

mod branch;
mod data_immediate;
mod data_register;
mod float;
mod load_store;
mod load_store_vector;
mod pseudo;
mod simd;
mod simd_scalar;
mod system;

use crate::bitwise::Bits;

pub(crate) fn rd(word: u32) -> u32 {
    word.get_bits(0..=4)
}

pub(crate) fn rn(word: u32) -> u32 {
    word.get_bits(5..=9)
}

pub(crate) fn ra(word: u32) -> u32 {
    word.get_bits(10..=14)
}

pub(crate) fn rm(word: u32) -> u32 {
    word.get_bits(16..=20)
}

/// The 64-bit operand size flag.
pub(crate) fn sf(word: u32) -> bool {
    word.get_bit(31)
}

pub(crate) const fn datasize(sf: bool) -> u32 {
    if sf { 64 } else { 32 }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::SimConfig;
    use crate::cpu::decode;
    use crate::cpu::interpreter::Interpreter;
    use crate::cpu::status::ExecResult;
    use crate::memory::MemoryBlock;

    pub const CODE: u64 = 0x1000;
    pub const DATA: u64 = 0x1_0000;
    pub const DATA_LEN: usize = 0x1_0000;

    /// An interpreter with PC at [`CODE`] and a writable data block at
    /// [`DATA`].
    pub fn cpu() -> Interpreter {
        let mut cpu = Interpreter::new(SimConfig::default());
        cpu.memory
            .add_block(MemoryBlock::new(DATA, DATA_LEN, true, &[]))
            .unwrap();
        cpu.state.pc = CODE;
        cpu
    }

    /// Executes a single word the way `step` does, without fetching it.
    pub fn exec(cpu: &mut Interpreter, word: u32) -> ExecResult {
        cpu.state.next_pc = cpu.state.pc.wrapping_add(4);
        let result = decode::execute(cpu, word);
        if result.is_ok() {
            cpu.state.commit_pc();
        }
        result
    }
}

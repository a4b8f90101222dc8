//! # Guest memory
//!
//! Guest memory is a sparse set of [`MemoryBlock`]s. Blocks do not have to be
//! contiguous or sorted; the last block that served an access is cached so
//! sequential code and data accesses skip the linear scan.
//!
//! ```text
//!   0x0040_0000 ┌──────────────┐  .text   (read only)
//!               └──────────────┘
//!   0x0041_0000 ┌──────────────┐  .data   (writable)
//!               └──────────────┘
//!                     ...
//!    heap start ┌──────────────┐
//!               │ heap  ↑      │  stack + heap (writable, made by `init`)
//!               │       ↓ SP   │
//!     stack top └──────────────┘
//! ```
//!
//! Every access must be fully contained in a single block. A failed access
//! never panics: it records a sticky [`MemoryFault`] and loads yield zero, so
//! the interpreter can check once at the end of the instruction.

mod block;
mod scalar;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use block::MemoryBlock;
pub use scalar::Scalar;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    Read,
    Write,
}

impl std::fmt::Display for Access {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => f.write_str("read"),
            Self::Write => f.write_str("write"),
        }
    }
}

/// A failed guest memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{access} of {size} bytes at 0x{address:016X} is outside guest memory")]
pub struct MemoryFault {
    pub address: u64,
    pub size: usize,
    pub access: Access,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("block 0x{base:016X}..0x{end:016X} overlaps an existing block")]
pub struct BlockOverlap {
    pub base: u64,
    pub end: u64,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Memory {
    blocks: Vec<MemoryBlock>,

    #[serde(skip)]
    active: Option<usize>,

    fault: Option<MemoryFault>,
}

impl Memory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new block. Blocks may not share addresses.
    ///
    /// # Errors
    ///
    /// Returns [`BlockOverlap`] when `block` overlaps a registered block.
    pub fn add_block(&mut self, block: MemoryBlock) -> Result<(), BlockOverlap> {
        if self.blocks.iter().any(|b| b.overlaps(&block)) {
            return Err(BlockOverlap {
                base: block.base(),
                end: block.end(),
            });
        }

        tracing::debug!(?block, "memory block registered");
        self.blocks.push(block);

        Ok(())
    }

    pub fn blocks(&self) -> impl Iterator<Item = &MemoryBlock> {
        self.blocks.iter()
    }

    /// Index of the block containing `[address, address + size)`, making it
    /// the active block.
    fn resolve(&mut self, address: u64, size: usize) -> Option<(usize, usize)> {
        if let Some(index) = self.active {
            if let Some(offset) = self.blocks[index].offset_of(address, size) {
                return Some((index, offset));
            }
        }

        let (index, offset) = self
            .blocks
            .iter()
            .enumerate()
            .find_map(|(i, b)| b.offset_of(address, size).map(|o| (i, o)))?;
        self.active = Some(index);

        Some((index, offset))
    }

    fn record(&mut self, address: u64, size: usize, access: Access) {
        let fault = MemoryFault {
            address,
            size,
            access,
        };
        tracing::debug!(%fault, "memory fault");

        // First fault wins until somebody takes it.
        self.fault.get_or_insert(fault);
    }

    /// Loads a value. On failure a fault is recorded and zero is returned.
    pub fn read<T: Scalar>(&mut self, address: u64) -> T {
        match self.resolve(address, T::SIZE) {
            Some((index, offset)) => T::from_le_slice(self.blocks[index].bytes(offset, T::SIZE)),
            None => {
                self.record(address, T::SIZE, Access::Read);
                T::default()
            }
        }
    }

    /// Stores a value. Stores to read-only blocks fail like unmapped ones.
    pub fn write<T: Scalar>(&mut self, address: u64, value: T) {
        match self.resolve(address, T::SIZE) {
            Some((index, offset)) if self.blocks[index].writable() => {
                value.write_le_slice(self.blocks[index].bytes_mut(offset, T::SIZE));
            }
            _ => self.record(address, T::SIZE, Access::Write),
        }
    }

    /// Copies `buf.len()` bytes starting at `address` into `buf`.
    ///
    /// # Errors
    ///
    /// Fails without touching `buf` when the range is not inside one block.
    pub fn load_block(&mut self, address: u64, buf: &mut [u8]) -> Result<(), MemoryFault> {
        let (index, offset) = self.resolve(address, buf.len()).ok_or(MemoryFault {
            address,
            size: buf.len(),
            access: Access::Read,
        })?;
        buf.copy_from_slice(self.blocks[index].bytes(offset, buf.len()));

        Ok(())
    }

    /// Copies `bytes` to guest memory starting at `address`. Like a debugger
    /// patching code, this ignores the writable flag of the block.
    ///
    /// # Errors
    ///
    /// Fails without writing anything when the range is not inside one block.
    pub fn store_block(&mut self, address: u64, bytes: &[u8]) -> Result<(), MemoryFault> {
        let (index, offset) = self.resolve(address, bytes.len()).ok_or(MemoryFault {
            address,
            size: bytes.len(),
            access: Access::Write,
        })?;
        self.blocks[index]
            .bytes_mut(offset, bytes.len())
            .copy_from_slice(bytes);

        Ok(())
    }

    /// The bytes from `address` to the end of its block.
    #[must_use]
    pub fn raw_slice(&self, address: u64) -> Option<&[u8]> {
        self.blocks.iter().find_map(|b| {
            let offset = b.offset_of(address, 1)?;
            Some(b.bytes(offset, b.len() - offset))
        })
    }

    #[must_use]
    pub const fn fault(&self) -> Option<&MemoryFault> {
        self.fault.as_ref()
    }

    /// Clears and returns the pending fault.
    pub fn take_fault(&mut self) -> Option<MemoryFault> {
        self.fault.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_adjacent_blocks() -> Memory {
        let mut memory = Memory::new();
        memory
            .add_block(MemoryBlock::new(0x1000, 0x100, true, &[]))
            .unwrap();
        memory
            .add_block(MemoryBlock::new(0x1100, 0x100, true, &[]))
            .unwrap();
        memory
    }

    #[test]
    fn read_back_every_width() {
        let mut memory = two_adjacent_blocks();

        memory.write(0x1010_u64, 0x1122_3344_5566_7788_u64);
        assert_eq!(memory.read::<u64>(0x1010), 0x1122_3344_5566_7788);
        assert_eq!(memory.read::<u32>(0x1010), 0x5566_7788);
        assert_eq!(memory.read::<u16>(0x1016), 0x1122);
        assert_eq!(memory.read::<u8>(0x1017), 0x11);
        assert_eq!(memory.read::<i8>(0x1017), 0x11);

        memory.write(0x1120_u64, -2.5_f64);
        assert_eq!(memory.read::<f64>(0x1120), -2.5);

        memory.write(0x1130_u64, u128::MAX - 1);
        assert_eq!(memory.read::<u128>(0x1130), u128::MAX - 1);
        assert!(memory.fault().is_none());
    }

    #[test]
    fn unmapped_access_faults_and_reads_zero() {
        let mut memory = two_adjacent_blocks();
        for _ in 0..1000 {
            let address = rand::random_range(0x2000..u64::MAX - 8);
            assert_eq!(memory.read::<u64>(address), 0);
            assert_eq!(
                memory.take_fault(),
                Some(MemoryFault {
                    address,
                    size: 8,
                    access: Access::Read
                })
            );

            memory.write(address, 1_u32);
            assert_eq!(memory.take_fault().map(|f| f.access), Some(Access::Write));
        }
    }

    #[test]
    fn straddling_adjacent_blocks_fails() {
        let mut memory = two_adjacent_blocks();
        memory.write(0x10FC_u64, 0xAABB_CCDD_u32);
        memory.write(0x1100_u64, 0x1122_3344_u32);
        assert!(memory.fault().is_none());

        assert_eq!(memory.read::<u64>(0x10FC), 0);
        assert!(memory.take_fault().is_some());

        memory.write(0x10FE_u64, 0_u32);
        assert!(memory.take_fault().is_some());
        assert_eq!(memory.read::<u32>(0x10FC), 0xAABB_CCDD);
        assert_eq!(memory.read::<u32>(0x1100), 0x1122_3344);
    }

    #[test]
    fn read_only_blocks_reject_stores() {
        let mut memory = Memory::new();
        memory
            .add_block(MemoryBlock::new(0x4000, 0x10, false, &[0xAA; 4]))
            .unwrap();

        memory.write(0x4000_u64, 0_u8);
        assert_eq!(memory.take_fault().map(|f| f.access), Some(Access::Write));
        assert_eq!(memory.read::<u32>(0x4000), 0xAAAA_AAAA);

        memory.store_block(0x4000, &[1, 2]).unwrap();
        assert_eq!(memory.read::<u16>(0x4000), 0x0201);
    }

    #[test]
    fn first_fault_is_sticky() {
        let mut memory = Memory::new();
        let _ = memory.read::<u8>(0x10);
        let _ = memory.read::<u8>(0x20);
        assert_eq!(memory.fault().map(|f| f.address), Some(0x10));
        assert!(memory.take_fault().is_some());
        assert!(memory.fault().is_none());
    }

    #[test]
    fn overlapping_blocks_are_rejected() {
        let mut memory = two_adjacent_blocks();
        let err = memory
            .add_block(MemoryBlock::new(0x10F0, 0x20, true, &[]))
            .unwrap_err();
        assert_eq!(err.base, 0x10F0);
    }

    #[test]
    fn bulk_access_and_raw_slice() {
        let mut memory = two_adjacent_blocks();
        memory.store_block(0x10F8, &[1, 2, 3, 4]).unwrap();

        let mut buf = [0; 4];
        memory.load_block(0x10F8, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);

        let mut across = [0; 16];
        assert!(memory.load_block(0x10F8, &mut across).is_err());
        assert_eq!(across, [0; 16]);

        assert_eq!(memory.raw_slice(0x10F8).map(<[u8]>::len), Some(8));
        assert_eq!(memory.raw_slice(0x10F8).map(|s| s[0]), Some(1));
        assert!(memory.raw_slice(0x3000).is_none());
    }
}

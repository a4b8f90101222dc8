use serde::{Deserialize, Serialize};

/// A contiguous range of guest memory backed by host storage.
///
/// Blocks are created when an image is loaded (one per segment, plus the
/// stack/heap block made by `init`) and live as long as the memory system.
#[derive(Clone, Serialize, Deserialize)]
pub struct MemoryBlock {
    base: u64,
    writable: bool,
    data: Vec<u8>,
}

impl MemoryBlock {
    /// Creates a block of `len` bytes at `base`, pre-filled with `contents`.
    /// Bytes past the end of `contents` are zero.
    #[must_use]
    pub fn new(base: u64, len: usize, writable: bool, contents: &[u8]) -> Self {
        let mut data = vec![0; len];
        let copied = contents.len().min(len);
        data[..copied].copy_from_slice(&contents[..copied]);

        Self {
            base,
            writable,
            data,
        }
    }

    #[must_use]
    pub const fn base(&self) -> u64 {
        self.base
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub const fn writable(&self) -> bool {
        self.writable
    }

    /// One past the last address of the block, saturating at the top of
    /// the address space.
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.base.saturating_add(self.data.len() as u64)
    }

    /// Offset of `address` inside the block when the whole
    /// `[address, address + size)` range is covered.
    #[must_use]
    pub fn offset_of(&self, address: u64, size: usize) -> Option<usize> {
        let offset = address.checked_sub(self.base)?;
        let offset = usize::try_from(offset).ok()?;
        let last = offset.checked_add(size)?;
        (last <= self.data.len()).then_some(offset)
    }

    /// Whether the two blocks share at least one address.
    #[must_use]
    pub const fn overlaps(&self, other: &Self) -> bool {
        self.base < other.end() && other.base < self.end()
    }

    pub(super) fn bytes(&self, offset: usize, size: usize) -> &[u8] {
        &self.data[offset..offset + size]
    }

    pub(super) fn bytes_mut(&mut self, offset: usize, size: usize) -> &mut [u8] {
        &mut self.data[offset..offset + size]
    }
}

impl std::fmt::Debug for MemoryBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("base", &format_args!("0x{:016X}", self.base))
            .field("len", &format_args!("0x{:X}", self.data.len()))
            .field("writable", &self.writable)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn contents_are_zero_padded() {
        let block = MemoryBlock::new(0x1000, 8, false, &[1, 2, 3]);
        assert_eq!(block.bytes(0, 8), &[1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(block.end(), 0x1008);
        assert!(!block.writable());
    }

    #[test]
    fn offset_requires_full_containment() {
        let block = MemoryBlock::new(0x1000, 0x10, true, &[]);
        assert_eq!(block.offset_of(0x1000, 8), Some(0));
        assert_eq!(block.offset_of(0x1008, 8), Some(8));
        assert_eq!(block.offset_of(0x100C, 8), None);
        assert_eq!(block.offset_of(0x0FFF, 1), None);
        assert_eq!(block.offset_of(u64::MAX, 1), None);
    }

    #[test]
    fn overlap_detection() {
        let a = MemoryBlock::new(0x1000, 0x100, true, &[]);
        let b = MemoryBlock::new(0x1100, 0x100, true, &[]);
        let c = MemoryBlock::new(0x10FF, 0x2, true, &[]);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(b.overlaps(&c));
    }
}

use alloc::boxed::Box;
use alloc::vec;
use core::ops::Range;

use crate::header::{BlockHeader, HEADER_SIZE};

/// The fixed backing store every block is carved from.
///
/// Offsets into the arena play the role of pointers. The arena never grows,
/// and it does no bookkeeping of its own: staying in bounds is the job of the
/// free list, so every accessor here is checked and returns `None` instead of
/// reading past the end.
pub struct Arena {
    bytes: Box<[u8]>,
}

impl Arena {
    /// Create a zeroed arena of `capacity` bytes
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    /// Read the header stored at `offset`
    pub fn read_header(&self, offset: usize) -> Option<BlockHeader> {
        let raw = self.bytes.get(offset..offset.checked_add(HEADER_SIZE)?)?;
        Some(BlockHeader::from_le_bytes(raw.try_into().ok()?))
    }

    /// Write `header` at `offset`
    pub fn write_header(&mut self, offset: usize, header: BlockHeader) -> Option<()> {
        let raw = self
            .bytes
            .get_mut(offset..offset.checked_add(HEADER_SIZE)?)?;
        raw.copy_from_slice(&header.to_le_bytes());
        Some(())
    }

    pub fn bytes(&self, range: Range<usize>) -> Option<&[u8]> {
        self.bytes.get(range)
    }

    pub fn bytes_mut(&mut self, range: Range<usize>) -> Option<&mut [u8]> {
        self.bytes.get_mut(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test that a header written to the arena reads back the same
    #[test]
    fn header_in_place() {
        let mut arena = Arena::new(32);
        let header = BlockHeader::new(20, true);
        assert!(arena.write_header(12, header).is_some());
        assert_eq!(arena.read_header(12), Some(header));
        // the bytes around it are untouched
        assert_eq!(arena.bytes(0..12), Some(&[0u8; 12][..]));
        assert_eq!(arena.bytes(20..32), Some(&[0u8; 12][..]));
    }

    /// Test that a header that would cross the end of the arena is refused
    #[test]
    fn header_out_of_bounds() {
        let mut arena = Arena::new(16);
        assert!(arena.write_header(9, BlockHeader::new(8, true)).is_none());
        assert!(arena.read_header(9).is_none());
        assert!(arena.read_header(usize::MAX).is_none());
        assert!(arena.write_header(8, BlockHeader::new(8, true)).is_some());
    }

    /// Test that payload views are bounds checked
    #[test]
    fn payload_views() {
        let mut arena = Arena::new(16);
        assert_eq!(arena.capacity(), 16);
        arena.bytes_mut(4..8).unwrap().copy_from_slice(&[1, 2, 3, 4]);
        assert_eq!(arena.bytes(4..8), Some(&[1u8, 2, 3, 4][..]));
        assert!(arena.bytes(8..17).is_none());
    }
}

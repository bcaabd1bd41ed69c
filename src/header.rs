use bitflags::bitflags;

/// The size of the block header, in bytes
pub const HEADER_SIZE: usize = 8;

/// Low bits of the header word reserved for flags, the size lives above them
const SIZE_SHIFT: u32 = 3;

/// Largest total block size a header can record
pub const MAX_BLOCK_SIZE: u64 = u64::MAX >> SIZE_SHIFT;

bitflags! {
    /// This represents the header written in front of every block we hand out.
    /// The size is the total size of the block (header included) and is stored
    /// shifted above the 3 least significant bits, which hold the flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[repr(transparent)]
    pub struct BlockHeader: u64 {
        /// The block is handed out to a caller
        const ALLOCATED = 0b1;
    }
}

impl BlockHeader {
    /// Create a new block header
    pub fn new(total_size: usize, allocated: bool) -> Self {
        debug_assert!((total_size as u64) <= MAX_BLOCK_SIZE);
        // the shifted size never touches the flag bits
        let mut header = Self::from_bits_retain((total_size as u64) << SIZE_SHIFT);
        header.set(Self::ALLOCATED, allocated);
        header
    }

    /// Returns the total size of the block, header included
    pub fn size(&self) -> usize {
        (self.bits() >> SIZE_SHIFT) as usize
    }

    pub fn allocated(&self) -> bool {
        self.contains(Self::ALLOCATED)
    }

    /// The same header with the allocated bit cleared
    pub fn released(mut self) -> Self {
        self.remove(Self::ALLOCATED);
        self
    }

    pub fn to_le_bytes(self) -> [u8; HEADER_SIZE] {
        self.bits().to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; HEADER_SIZE]) -> Self {
        Self::from_bits_retain(u64::from_le_bytes(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem::size_of;

    /// Test that creating header returns the correct bitflags
    #[test]
    fn test_header() {
        let header = BlockHeader::from_bits_retain(12 << SIZE_SHIFT | 1);
        assert!(header.allocated());
        assert_eq!(header.size(), 12);
        assert_eq!(BlockHeader::new(12, true), header);
    }

    /// Test that sizes which are not a multiple of 8 survive encoding
    #[test]
    fn odd_sizes() {
        for size in [1, 9, 13, 127, 128] {
            let header = BlockHeader::new(size, false);
            assert_eq!(header.size(), size);
            assert!(!header.allocated());
        }
    }

    /// Test that releasing only clears the flag
    #[test]
    fn released_keeps_size() {
        let header = BlockHeader::new(24, true).released();
        assert!(!header.allocated());
        assert_eq!(header.size(), 24);
    }

    /// Test that the header is laid out little endian in the arena
    #[test]
    fn byte_layout() {
        let bytes = BlockHeader::new(16, true).to_le_bytes();
        assert_eq!(bytes, [0x81, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(BlockHeader::from_le_bytes(bytes).size(), 16);
    }

    /// Test that a header size is correct
    #[test]
    fn header_size() {
        assert_eq!(HEADER_SIZE, size_of::<BlockHeader>())
    }
}

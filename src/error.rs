use thiserror::Error;

/// Everything that can go wrong talking to a [`BestFitAllocator`](crate::BestFitAllocator)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocatorError {
    /// Zero byte requests are refused rather than handed a dummy block
    #[error("zero sized allocations are not supported")]
    ZeroSize,
    /// No single free region is big enough for the request
    #[error("out of memory: requested {requested} bytes, largest free region is {largest_free} bytes")]
    OutOfMemory {
        /// Payload size asked for, header not included
        requested: usize,
        /// Largest free region at the time, header room included
        largest_free: usize,
    },
    /// The arena cannot hold even a header and a single byte
    #[error("arena capacity {capacity} is unusable")]
    InvalidCapacity {
        /// Capacity asked for
        capacity: usize,
    },
    /// The handle was not issued by this allocator
    #[error("invalid allocation handle")]
    InvalidHandle,
    /// The handle was already released
    #[error("allocation already released")]
    AlreadyReleased,
    /// The header in front of a block does not match what was handed out
    #[error("corrupt block header at offset {offset}")]
    CorruptHeader {
        /// Offset of the header in the arena
        offset: usize,
    },
    /// A payload range falls outside the arena
    #[error("payload out of arena bounds")]
    OutOfBounds,
}

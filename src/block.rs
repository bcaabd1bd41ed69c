use core::fmt;

use log::{debug, trace};
use sptr::Strict;

use crate::arena::Arena;
use crate::error::AllocatorError;
use crate::free_list::{FreeList, FreeRegion};
use crate::handle::{Allocation, HandleTable, Record};
use crate::header::{BlockHeader, HEADER_SIZE, MAX_BLOCK_SIZE};

/// Arena size used by [`BestFitAllocator::new`]
pub const DEFAULT_CAPACITY: usize = 128;

/// A best fit allocator over a single fixed size arena.
///
/// Every block is prefixed with an 8 byte header holding its total size.
/// Free space is tracked as a flat list of regions which is searched for the
/// smallest region that fits. Freed blocks are appended to that list as is:
/// neighbours are never coalesced and a request must fit in a single region.
///
/// Callers get an [`Allocation`] handle back instead of a raw address, so
/// releasing something twice, or something this allocator never handed out,
/// is reported as an error instead of corrupting the free list.
///
/// The allocator is meant for single threaded use, every mutating call takes
/// `&mut self`.
pub struct BestFitAllocator {
    arena: Arena,
    free_list: FreeList,
    handles: HandleTable,
}

impl BestFitAllocator {
    /// Create an allocator over a [`DEFAULT_CAPACITY`] byte arena
    pub fn new() -> Self {
        Self::build(DEFAULT_CAPACITY)
    }

    /// Create an allocator over an arena of `capacity` bytes.
    ///
    /// The arena must at least fit a header and one byte of payload.
    pub fn with_capacity(capacity: usize) -> Result<Self, AllocatorError> {
        if capacity <= HEADER_SIZE || capacity as u64 > MAX_BLOCK_SIZE {
            return Err(AllocatorError::InvalidCapacity { capacity });
        }
        Ok(Self::build(capacity))
    }

    fn build(capacity: usize) -> Self {
        Self {
            arena: Arena::new(capacity),
            free_list: FreeList::new(capacity),
            handles: HandleTable::new(),
        }
    }

    /// Allocate `size` bytes, `None` if the request is empty or nothing fits
    pub fn allocate(&mut self, size: usize) -> Option<Allocation> {
        self.try_allocate(size).ok()
    }

    /// Allocate `size` bytes, reporting why it failed
    pub fn try_allocate(&mut self, size: usize) -> Result<Allocation, AllocatorError> {
        if size < 1 {
            debug!("refusing zero sized allocation");
            return Err(AllocatorError::ZeroSize);
        }

        let total_size = size
            .checked_add(HEADER_SIZE)
            .ok_or_else(|| self.out_of_memory(size))?;

        // the only way to run out of memory: no single region fits
        let Some(index) = self.free_list.find_best_fit(total_size) else {
            debug!(
                "no free region fits {} bytes, largest is {}",
                total_size,
                self.free_list.largest()
            );
            return Err(self.out_of_memory(size));
        };
        let base = self
            .free_list
            .get(index)
            .ok_or_else(|| self.out_of_memory(size))?
            .offset;

        self.arena
            .write_header(base, BlockHeader::new(total_size, true))
            .ok_or(AllocatorError::CorruptHeader { offset: base })?;
        self.free_list.shrink(index, total_size);
        let allocation = self.handles.insert(Record { base, total_size }, size);

        debug!(
            "allocated {} bytes at offset {} (block {:#x}, {} bytes)",
            size,
            allocation.offset(),
            base,
            total_size
        );
        trace!("{}", self.free_pool());
        Ok(allocation)
    }

    fn out_of_memory(&self, requested: usize) -> AllocatorError {
        AllocatorError::OutOfMemory {
            requested,
            largest_free: self.free_list.largest(),
        }
    }

    /// Give a block back to the free list.
    ///
    /// The whole block, header included, is appended as a new free region and
    /// the list is then compacted. A rejected release changes nothing.
    pub fn release(&mut self, allocation: Allocation) -> Result<(), AllocatorError> {
        let record = match self.handles.get(&allocation) {
            Ok(record) => record,
            Err(err) => {
                debug!("rejecting release of {:?}: {}", allocation, err);
                return Err(err);
            }
        };
        let base = allocation
            .offset()
            .checked_sub(HEADER_SIZE)
            .filter(|&base| base == record.base)
            .ok_or(AllocatorError::InvalidHandle)?;

        let header = self
            .arena
            .read_header(base)
            .filter(|header| header.allocated() && header.size() == record.total_size)
            .ok_or(AllocatorError::CorruptHeader { offset: base })?;
        self.arena
            .write_header(base, header.released())
            .ok_or(AllocatorError::CorruptHeader { offset: base })?;
        self.handles.remove(&allocation)?;

        self.free_list.append(base, header.size());
        let purged = self.free_list.compact();

        debug!(
            "released offset {} (block {:#x}, {} bytes), purged {} empty regions",
            allocation.offset(),
            base,
            header.size(),
            purged
        );
        trace!("{}", self.free_pool());
        Ok(())
    }

    /// The payload bytes of a live block
    pub fn payload(&self, allocation: &Allocation) -> Result<&[u8], AllocatorError> {
        self.handles.get(allocation)?;
        let start = allocation.offset();
        self.arena
            .bytes(start..start + allocation.size())
            .ok_or(AllocatorError::OutOfBounds)
    }

    /// The payload bytes of a live block, writable
    pub fn payload_mut(&mut self, allocation: &Allocation) -> Result<&mut [u8], AllocatorError> {
        self.handles.get(allocation)?;
        let start = allocation.offset();
        self.arena
            .bytes_mut(start..start + allocation.size())
            .ok_or(AllocatorError::OutOfBounds)
    }

    /// A read only view of the free list
    pub fn free_pool(&self) -> FreePool<'_> {
        FreePool {
            regions: self.free_list.regions(),
            base: Strict::addr(self.arena.as_ptr()),
        }
    }

    /// Size of the arena in bytes
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Bytes not covered by any live block, headers included
    pub fn free_bytes(&self) -> usize {
        self.free_list.free_bytes()
    }

    /// Number of blocks handed out and not yet released
    pub fn live_allocations(&self) -> usize {
        self.handles.len()
    }
}

impl Default for BestFitAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BestFitAllocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BestFitAllocator")
            .field("capacity", &self.capacity())
            .field("live_allocations", &self.live_allocations())
            .field("free_pool", &self.free_pool())
            .finish()
    }
}

/// Snapshot of the free regions of an allocator.
///
/// `Display` prints a `FREE POOL:` table with the real address and size of
/// every region, `Debug` lists arena offsets instead.
#[derive(Clone, Copy)]
pub struct FreePool<'a> {
    regions: &'a [FreeRegion],
    base: usize,
}

impl<'a> FreePool<'a> {
    /// The free regions, in free list order
    pub fn regions(&self) -> &'a [FreeRegion] {
        self.regions
    }

    /// Number of entries in the free list
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// True if not a single region is tracked
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Sum of all region sizes
    pub fn free_bytes(&self) -> usize {
        self.regions.iter().map(|region| region.size).sum()
    }
}

impl fmt::Display for FreePool<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FREE POOL:")?;
        for region in self.regions {
            writeln!(f, "\t{:#x} ({})", self.base + region.offset, region.size)?;
        }
        Ok(())
    }
}

impl fmt::Debug for FreePool<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // we want a better debug for this type
        #[derive(Debug)]
        struct Region {
            offset: Hex,
            size: usize,
        }

        struct Hex(usize);

        impl fmt::Debug for Hex {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{:#X}", self.0)
            }
        }

        let mut list = f.debug_list();
        for region in self.regions {
            list.entry(&Region {
                offset: Hex(region.offset),
                size: region.size,
            });
        }
        list.finish()
    }
}

//! Generation checked handles for live blocks.
//!
//! Instead of trusting whatever pointer a caller hands back, every block is
//! tracked in a slot table. A handle names a slot and the generation it was
//! issued under; releasing bumps the generation, so a second release or a
//! release of a handle whose slot has since been reused is caught.

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::header::HEADER_SIZE;
use crate::AllocatorError;

/// Generation counter for detecting stale handles
pub type Generation = u32;

// each table gets its own id so handles cannot cross allocators
static NEXT_OWNER: AtomicU32 = AtomicU32::new(0);

/// A live block handed out by [`BestFitAllocator::allocate`](crate::BestFitAllocator::allocate).
///
/// Handles are plain tokens: copying one does not copy the block, and only
/// the first release of any copy succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Allocation {
    owner: u32,
    slot: usize,
    generation: Generation,
    offset: usize,
    size: usize,
}

impl Allocation {
    /// Offset in the arena of the first payload byte, the header sits right before it
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of payload bytes requested
    pub fn size(&self) -> usize {
        self.size
    }
}

/// What the allocator needs to give a block back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record {
    pub base: usize,
    pub total_size: usize,
}

#[derive(Debug)]
struct Slot {
    generation: Generation,
    record: Option<Record>,
}

#[derive(Debug)]
pub struct HandleTable {
    owner: u32,
    slots: Vec<Slot>,
    vacant: Vec<usize>,
    live: usize,
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            owner: NEXT_OWNER.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            vacant: Vec::new(),
            live: 0,
        }
    }

    /// Track a new block and issue its handle
    pub fn insert(&mut self, record: Record, size: usize) -> Allocation {
        let slot = match self.vacant.pop() {
            Some(slot) => {
                self.slots[slot].record = Some(record);
                slot
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    record: Some(record),
                });
                self.slots.len() - 1
            }
        };
        self.live += 1;

        Allocation {
            owner: self.owner,
            slot,
            generation: self.slots[slot].generation,
            offset: record.base + HEADER_SIZE,
            size,
        }
    }

    /// Look up the record behind a handle without touching it
    pub fn get(&self, allocation: &Allocation) -> Result<Record, AllocatorError> {
        if allocation.owner != self.owner {
            return Err(AllocatorError::InvalidHandle);
        }
        let slot = self
            .slots
            .get(allocation.slot)
            .ok_or(AllocatorError::InvalidHandle)?;
        if slot.generation != allocation.generation {
            return Err(AllocatorError::AlreadyReleased);
        }
        slot.record.ok_or(AllocatorError::AlreadyReleased)
    }

    /// Retire a handle, its slot is free for reuse under the next generation
    pub fn remove(&mut self, allocation: &Allocation) -> Result<Record, AllocatorError> {
        let record = self.get(allocation)?;
        let slot = &mut self.slots[allocation.slot];
        slot.record = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(allocation.slot);
        self.live -= 1;
        Ok(record)
    }

    /// Number of live handles
    pub fn len(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(base: usize, total_size: usize) -> Record {
        Record { base, total_size }
    }

    /// Test that a handle resolves to the record it was issued for
    #[test]
    fn insert_get() {
        let mut table = HandleTable::new();
        let handle = table.insert(record(12, 16), 8);
        assert_eq!(handle.offset(), 12 + HEADER_SIZE);
        assert_eq!(handle.size(), 8);
        assert_eq!(table.get(&handle), Ok(record(12, 16)));
        assert_eq!(table.len(), 1);
    }

    /// Test that removing twice is caught
    #[test]
    fn double_remove() {
        let mut table = HandleTable::new();
        let handle = table.insert(record(0, 12), 4);
        assert_eq!(table.remove(&handle), Ok(record(0, 12)));
        assert_eq!(table.remove(&handle), Err(AllocatorError::AlreadyReleased));
        assert_eq!(table.len(), 0);
    }

    /// Test that a reused slot does not revive an old handle
    #[test]
    fn slot_reuse() {
        let mut table = HandleTable::new();
        let old = table.insert(record(0, 12), 4);
        table.remove(&old).unwrap();

        let new = table.insert(record(0, 12), 4);
        assert_eq!(new.slot, old.slot);
        assert_ne!(new.generation, old.generation);
        assert_eq!(table.get(&old), Err(AllocatorError::AlreadyReleased));
        assert_eq!(table.get(&new), Ok(record(0, 12)));
    }

    /// Test that handles from another table are rejected
    #[test]
    fn foreign_handle() {
        let mut ours = HandleTable::new();
        let mut theirs = HandleTable::new();
        ours.insert(record(0, 12), 4);
        let handle = theirs.insert(record(0, 12), 4);
        assert_eq!(ours.get(&handle), Err(AllocatorError::InvalidHandle));
        assert_eq!(ours.len(), 1);
    }
}

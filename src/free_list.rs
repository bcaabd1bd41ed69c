use alloc::vec;
use alloc::vec::Vec;

/// A contiguous run of unused bytes in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreeRegion {
    /// Offset of the first free byte
    pub offset: usize,
    /// Number of free bytes, zero once the region has been used up
    pub size: usize,
}

/// Position of a region in the free list, only valid until the list changes shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionIndex(usize);

/// Ordered table of the free regions of an arena.
///
/// Regions never overlap, but neighbours are never merged either. Freed
/// blocks are appended at the end and used up regions stay behind with a
/// size of zero until the next [`FreeList::compact`].
#[derive(Debug, Clone)]
pub struct FreeList {
    regions: Vec<FreeRegion>,
    // one entry per byte when fully fragmented
    limit: usize,
}

impl FreeList {
    /// A free list with a single region spanning the whole arena
    pub fn new(capacity: usize) -> Self {
        Self {
            regions: vec![FreeRegion {
                offset: 0,
                size: capacity,
            }],
            limit: capacity,
        }
    }

    /// Find the smallest region that can hold `size` bytes.
    ///
    /// This is a linear scan. A candidate only replaces the current best when
    /// it is strictly smaller, so ties go to the region seen first.
    pub fn find_best_fit(&self, size: usize) -> Option<RegionIndex> {
        let mut best: Option<(usize, usize)> = None;
        for (index, region) in self.regions.iter().enumerate() {
            if region.size < size {
                continue;
            }
            match best {
                Some((_, best_size)) if best_size <= region.size => {}
                _ => best = Some((index, region.size)),
            }
        }
        best.map(|(index, _)| RegionIndex(index))
    }

    pub fn get(&self, index: RegionIndex) -> Option<&FreeRegion> {
        self.regions.get(index.0)
    }

    /// Carve `amount` bytes off the front of a region.
    ///
    /// An emptied region is left in place for [`FreeList::compact`].
    pub fn shrink(&mut self, index: RegionIndex, amount: usize) {
        if let Some(region) = self.regions.get_mut(index.0) {
            debug_assert!(amount <= region.size);
            let amount = amount.min(region.size);
            region.offset += amount;
            region.size -= amount;
        }
    }

    /// Add a freed region at the end of the table
    pub fn append(&mut self, offset: usize, size: usize) {
        self.regions.push(FreeRegion { offset, size });
        debug_assert!(self.regions.len() <= self.limit.max(1));
    }

    /// Drop every zero sized region, keeping the others in order.
    /// Returns how many were removed
    pub fn compact(&mut self) -> usize {
        let before = self.regions.len();
        self.regions.retain(|region| region.size != 0);
        before - self.regions.len()
    }

    pub fn regions(&self) -> &[FreeRegion] {
        &self.regions
    }

    /// Total number of free bytes across all regions
    pub fn free_bytes(&self) -> usize {
        self.regions.iter().map(|region| region.size).sum()
    }

    /// Size of the biggest single region
    pub fn largest(&self) -> usize {
        self.regions
            .iter()
            .map(|region| region.size)
            .max()
            .unwrap_or(0)
    }
}

//! A best fit free list allocator over a fixed size arena

#![no_std]
#![deny(
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces,
    unused_qualifications
)]
#![allow(unstable_name_collisions)]

extern crate alloc;

mod arena;
/// The main allocator
mod block;
mod error;
mod free_list;
mod handle;
mod header;

pub use block::{BestFitAllocator, FreePool, DEFAULT_CAPACITY};
pub use error::AllocatorError;
pub use free_list::FreeRegion;
pub use handle::Allocation;
pub use header::HEADER_SIZE;

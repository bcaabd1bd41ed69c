use std::process;

use best_fit_alloc::{Allocation, BestFitAllocator, DEFAULT_CAPACITY};

/// Allocates `size` bytes or bails out, there is nothing sensible to do
/// without the memory in this walkthrough.
fn allocate_or_exit(heap: &mut BestFitAllocator, size: usize) -> Allocation {
    match heap.try_allocate(size) {
        Ok(allocation) => {
            println!("----ALLOCATION----");
            print!("{}", heap.free_pool());
            allocation
        }
        Err(err) => {
            eprintln!("Fatal error: allocate: {}", err);
            process::exit(1);
        }
    }
}

fn release_or_exit(heap: &mut BestFitAllocator, allocation: Allocation) {
    if let Err(err) = heap.release(allocation) {
        eprintln!("Fatal error: release: {}", err);
        process::exit(1);
    }
    println!("----FREE----");
    print!("{}", heap.free_pool());
}

fn main() {
    env_logger::init();

    let mut heap = BestFitAllocator::new();
    print!("{}", heap.free_pool());

    let a = allocate_or_exit(&mut heap, 4);
    println!("a->{}", a.offset());
    let b = allocate_or_exit(&mut heap, 8);
    println!("b->{}", b.offset());
    let c = allocate_or_exit(&mut heap, 16);
    println!("c->{}", c.offset());

    // Give b back and ask for the same size again: best fit picks the exact
    // 16 byte hole over the larger remainder, so d lands where b was.
    release_or_exit(&mut heap, b);
    let d = allocate_or_exit(&mut heap, 8);
    println!("d->{}", d.offset());
    assert_eq!(d.offset(), b.offset());

    release_or_exit(&mut heap, a);
    release_or_exit(&mut heap, c);
    release_or_exit(&mut heap, d);

    // b is gone for good, handing it back again is caught
    match heap.release(b) {
        Ok(()) => println!("released b twice?!"),
        Err(err) => println!("second release of b: {}", err),
    }

    // Every byte is free again, but the regions were never merged.
    match heap.try_allocate(DEFAULT_CAPACITY) {
        Ok(e) => println!("e->{}", e.offset()),
        Err(err) => println!("e: {}", err),
    }
}

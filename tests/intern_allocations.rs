// Allocation accounting for StringPool::intern.
//
// A counting global allocator wraps the system allocator; counts are kept
// per thread so the harness's own threads do not disturb the measurement.
// This binary holds a single test for the same reason.
use cellar_lexicon::StringPool;
use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

struct CountingAlloc;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        System.realloc(ptr, layout, new_size)
    }
}

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

fn allocations() -> usize {
    ALLOCATIONS.with(Cell::get)
}

// Test: interning known content.
// Assumes: every distinct string was interned once beforehand.
// Verifies: later interning of equal content, from fresh buffers, performs
// zero allocations and returns the first handles. Content with an embedded
// zero byte resolves to its prefix's handle without allocating either.
#[test]
fn repeated_interning_allocates_nothing() {
    let words: Vec<Vec<u8>> = (0..500).map(|i| format!("identifier_{i}").into_bytes()).collect();
    let copies = words.clone();

    let mut pool = StringPool::new();
    let handles: Vec<*const u8> = words.iter().map(|w| pool.intern(w).as_ptr()).collect();
    let prefix = pool.intern(b"ab").as_ptr();
    let zeroed: Vec<Vec<u8>> = vec![b"ab\0cd".to_vec(), b"ab\0xy".to_vec(), b"ab\0".to_vec()];
    let heap = pool.heap_usage();

    let before = allocations();
    for (copy, &handle) in copies.iter().zip(&handles) {
        assert_eq!(pool.intern(copy).as_ptr(), handle);
    }
    for z in &zeroed {
        assert_eq!(pool.intern(z).as_ptr(), prefix);
    }
    let after = allocations();

    assert_eq!(after - before, 0);
    assert_eq!(pool.heap_usage(), heap);
    assert_eq!(pool.len(), words.len() + 1);
}

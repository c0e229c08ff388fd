// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

use super::*;

#[test]
fn next_is_strictly_increasing() {
    let alloc = SeqAllocator::new(Store::open_in_memory().expect("store"));
    let a = alloc.next().expect("next");
    let b = alloc.next().expect("next");
    let c = alloc.next().expect("next");
    assert!(a < b);
    assert!(b < c);
}

#[test]
fn next_never_returns_zero() {
    let alloc = SeqAllocator::new(Store::open_in_memory().expect("store"));
    assert!(alloc.next().expect("next") > 0);
}

#[test]
fn allocator_is_global_across_callers() {
    // Two independent handles over the same store share one counter —
    // seq is global across the bus, not scoped to whatever thread the
    // caller happens to be posting to.
    let store = Store::open_in_memory().expect("store");
    let a = SeqAllocator::new(store.clone());
    let b = SeqAllocator::new(store);
    assert_eq!(a.next().expect("next"), 1);
    assert_eq!(b.next().expect("next"), 2);
    assert_eq!(a.next().expect("next"), 3);
}

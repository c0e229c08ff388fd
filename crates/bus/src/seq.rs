// SPDX-License-Identifier: BUSL-1.1
// Copyright 2025 Alfred Jean LLC

//! The bus-wide monotonic sequence counter.
//!
//! One row, one column. [`SeqAllocator::next`] increments it and commits
//! before returning — if the caller then fails to insert
//! the message that seq was meant for, the seq is burned (a gap), never
//! reused. Allocation and the message insert are deliberately two separate
//! transactions so that trade-off holds even under a mid-insert failure.

use crate::error::Error;
use crate::store::Store;

pub struct SeqAllocator {
    store: Store,
}

impl SeqAllocator {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Atomically increments the counter and returns the new value. The
    /// returned value is unique and strictly greater than every value this
    /// allocator has ever returned.
    pub fn next(&self) -> Result<i64, Error> {
        self.store.with_tx(|tx| {
            tx.query_row(
                "UPDATE seq_counter SET value = value + 1 WHERE id = 0 RETURNING value",
                [],
                |row| row.get(0),
            )
        })
    }
}

#[cfg(test)]
#[path = "seq_tests.rs"]
mod tests;

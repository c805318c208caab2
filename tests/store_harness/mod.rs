//! Shared test harness for state store backend testing
//!
//! Provides the `state_store_tests!` conformance suite and helpers for
//! building invoice payloads and draining scans.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod store_harness;
//! use store_harness::*;
//! ```

#![allow(dead_code)]

#[macro_use]
mod state_store_tests;

use futures::TryStreamExt;
use invoice_ledger::core::keyspace::KeyRange;
use invoice_ledger::core::store::{StateEntry, StateStore};
use invoice_ledger::invoice::Invoice;

/// Encoded sample invoice stored under `key`
pub fn invoice_bytes(key: &str) -> Vec<u8> {
    serde_json::to_vec(&Invoice::sample(key)).expect("encode sample invoice")
}

/// Drain a scan into a vector
pub async fn scan_all<S: StateStore>(store: &S, range: &KeyRange) -> Vec<StateEntry> {
    store
        .scan(range)
        .await
        .expect("scan should open")
        .try_collect()
        .await
        .expect("scan should complete")
}

/// Keys of a list of entries, in order
pub fn keys(entries: &[StateEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.key.as_str()).collect()
}

/// Assert that a list contains exactly `n` items.
pub fn assert_count<T>(list: &[T], expected: usize) {
    assert_eq!(
        list.len(),
        expected,
        "Expected {} items, got {}",
        expected,
        list.len()
    );
}

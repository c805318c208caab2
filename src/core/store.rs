//! State store adapter traits
//!
//! A [`StateStore`] is the only component that touches persistence. It maps
//! string keys to opaque byte payloads and stamps every write with a
//! monotonically increasing per-key [`Version`], which is what makes
//! optimistic read-modify-write possible through
//! [`put_if_version`](StateStore::put_if_version).

use crate::core::error::StoreError;
use crate::core::keyspace::KeyRange;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Per-key write counter. The first write of a key produces version 1.
pub type Version = u64;

/// Longest key, in bytes, that every backend can store
///
/// LMDB's default build caps keys at 511 bytes; keys must also be non-empty.
pub const MAX_KEY_LEN: usize = 511;

/// Lazy sequence of entries produced by [`StateStore::scan`]
pub type ScanStream = BoxStream<'static, Result<StateEntry, StoreError>>;

/// A stored value together with its key and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateEntry {
    pub key: String,
    pub value: Vec<u8>,
    pub version: Version,
}

/// Key/value state with versioned writes and ordered range scans
///
/// Implementations must be cheap to clone or share behind an `Arc`; the
/// record layer never caches anything read from the store across calls.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Short backend name, used in logs and errors
    fn backend_name(&self) -> &'static str;

    /// Fetch the entry stored at `key`
    ///
    /// A missing key is `Ok(None)`, never an error. That includes keys no
    /// backend can hold (empty or longer than [`MAX_KEY_LEN`]).
    async fn get(&self, key: &str) -> Result<Option<StateEntry>, StoreError>;

    /// Unconditional upsert. Last writer wins.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<Version, StoreError>;

    /// Compare-and-swap write
    ///
    /// `expected = None` requires the key to be absent; `Some(v)` requires the
    /// stored version to be exactly `v`. On mismatch nothing is written and
    /// [`StoreError::VersionConflict`] is returned.
    async fn put_if_version(
        &self,
        key: &str,
        expected: Option<Version>,
        value: Vec<u8>,
    ) -> Result<Version, StoreError>;

    /// Scan the half-open `range` in lexicographic key order
    ///
    /// Every call re-executes the scan against the current state.
    async fn scan(&self, range: &KeyRange) -> Result<ScanStream, StoreError>;
}

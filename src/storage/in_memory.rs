//! In-memory implementation of StateStore for testing and development

use crate::core::error::StoreError;
use crate::core::keyspace::KeyRange;
use crate::core::store::{ScanStream, StateEntry, StateStore, Version};
use async_trait::async_trait;
use futures::stream;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

const BACKEND: &str = "in_memory";

fn lock_error(kind: &str, err: impl std::fmt::Display) -> StoreError {
    StoreError::backend(BACKEND, format!("Failed to acquire {} lock: {}", kind, err))
}

#[derive(Debug, Clone)]
struct Slot {
    version: Version,
    value: Vec<u8>,
}

/// In-memory state store
///
/// Keeps entries in a `BTreeMap` so scans come back in key order. Uses
/// RwLock for thread-safe access; a compare-and-swap put checks and writes
/// under a single write lock.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    entries: Arc<RwLock<BTreeMap<String, Slot>>>,
}

impl InMemoryStateStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> Result<usize, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| lock_error("read", e))?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, key: &str) -> Result<Option<StateEntry>, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| lock_error("read", e))?;

        Ok(entries.get(key).map(|slot| StateEntry {
            key: key.to_string(),
            value: slot.value.clone(),
            version: slot.version,
        }))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<Version, StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| lock_error("write", e))?;

        let version = entries.get(key).map_or(0, |slot| slot.version) + 1;
        entries.insert(key.to_string(), Slot { version, value });

        Ok(version)
    }

    async fn put_if_version(
        &self,
        key: &str,
        expected: Option<Version>,
        value: Vec<u8>,
    ) -> Result<Version, StoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| lock_error("write", e))?;

        let actual = entries.get(key).map(|slot| slot.version);
        if actual != expected {
            return Err(StoreError::VersionConflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }

        let version = actual.unwrap_or(0) + 1;
        entries.insert(key.to_string(), Slot { version, value });

        Ok(version)
    }

    async fn scan(&self, range: &KeyRange) -> Result<ScanStream, StoreError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| lock_error("read", e))?;

        let upper = match range.end.as_deref() {
            Some(end) if end <= range.start.as_str() => return Ok(Box::pin(stream::empty())),
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };

        // Snapshot the range so the lock is released before the stream is polled
        let snapshot: Vec<Result<StateEntry, StoreError>> = entries
            .range::<str, _>((Bound::Included(range.start.as_str()), upper))
            .map(|(key, slot)| {
                Ok(StateEntry {
                    key: key.clone(),
                    value: slot.value.clone(),
                    version: slot.version,
                })
            })
            .collect();

        Ok(Box::pin(stream::iter(snapshot)))
    }
}

//! LMDB state store using heed (memory-mapped B-tree).
//!
//! LMDB is an embedded key-value store; no external server required.
//! All operations are synchronous (memory-mapped I/O) and are wrapped in
//! `tokio::task::spawn_blocking` for async compatibility.
//!
//! # Layout
//!
//! A single named database, `state`, maps the key string to a framed value:
//!
//! ```text
//! +----------------------+-----------------+
//! | version (u64, BE)    | payload bytes   |
//! +----------------------+-----------------+
//! ```
//!
//! LMDB keeps keys in lexicographic byte order, which for UTF-8 strings is
//! code point order, so range scans come back sorted. A compare-and-swap put
//! reads the current version and writes inside one write transaction, and
//! LMDB allows only one write transaction at a time, so the check and the
//! write are atomic.
//!
//! # Feature flag
//!
//! Enable with `--features lmdb`. Requires the `heed` crate.

use crate::core::error::StoreError;
use crate::core::keyspace::KeyRange;
use crate::core::store::{MAX_KEY_LEN, ScanStream, StateEntry, StateStore, Version};
use async_trait::async_trait;
use futures::stream;
use heed::types::{Bytes, Str};
use heed::{Database, Env, EnvOpenOptions};
use std::ops::Bound;
use std::path::Path;
use std::sync::Arc;

const BACKEND: &str = "lmdb";
const VERSION_LEN: usize = std::mem::size_of::<Version>();

fn lmdb_err(err: impl std::fmt::Display) -> StoreError {
    StoreError::backend(BACKEND, err)
}

/// Prefix the payload with its version
fn frame(version: Version, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(VERSION_LEN + payload.len());
    framed.extend_from_slice(&version.to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}

/// Split a framed value into version and payload
fn unframe(key: &str, framed: &[u8]) -> Result<(Version, Vec<u8>), StoreError> {
    if framed.len() < VERSION_LEN {
        return Err(StoreError::Corrupted {
            key: key.to_string(),
            message: format!(
                "entry is {} bytes, shorter than its version header",
                framed.len()
            ),
        });
    }
    let (header, payload) = framed.split_at(VERSION_LEN);
    let mut version = [0u8; VERSION_LEN];
    version.copy_from_slice(header);
    Ok((Version::from_be_bytes(version), payload.to_vec()))
}

/// Whether LMDB can hold `key` at all
fn storable(key: &str) -> bool {
    !key.is_empty() && key.len() <= MAX_KEY_LEN
}

/// Longest prefix of `key` that fits the key size limit
fn truncate_key(key: &str) -> &str {
    let mut end = key.len().min(MAX_KEY_LEN);
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    &key[..end]
}

/// Version of a framed value read from the database, if present
fn stored_version(key: &str, framed: Option<&[u8]>) -> Result<Option<Version>, StoreError> {
    framed
        .map(|framed| unframe(key, framed).map(|(version, _)| version))
        .transpose()
}

/// Options for opening an LMDB environment
#[derive(Debug, Clone)]
pub struct LmdbOptions {
    /// Virtual address space reserved for the map, in megabytes
    pub map_size_mb: usize,
    pub max_readers: u32,
}

impl Default for LmdbOptions {
    fn default() -> Self {
        Self {
            map_size_mb: 256,
            max_readers: 126,
        }
    }
}

/// LMDB-backed implementation of `StateStore`.
///
/// The `Env` is wrapped in an `Arc` for cheap cloning across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use invoice_ledger::storage::LmdbStateStore;
///
/// let store = LmdbStateStore::open("/tmp/ledger")?;
/// let version = store.put("INVOICE0", bytes).await?;
/// ```
#[derive(Clone)]
pub struct LmdbStateStore {
    env: Arc<Env>,
    db: Database<Str, Bytes>,
}

impl LmdbStateStore {
    /// Open (or create) an LMDB environment at `path` with default options
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::open_with(path, &LmdbOptions::default())
    }

    /// Open (or create) an LMDB environment at `path` and initialise the
    /// `state` named database.
    ///
    /// LMDB does not allocate the full map size up front; it is a virtual
    /// address space reservation.
    pub fn open_with(path: impl AsRef<Path>, options: &LmdbOptions) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path.as_ref()).map_err(lmdb_err)?;

        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(options.map_size_mb * 1024 * 1024)
                .max_dbs(4)
                .max_readers(options.max_readers)
                .open(path.as_ref())
                .map_err(lmdb_err)?
        };

        let mut wtxn = env.write_txn().map_err(lmdb_err)?;
        let db: Database<Str, Bytes> = env
            .create_database(&mut wtxn, Some("state"))
            .map_err(lmdb_err)?;
        wtxn.commit().map_err(lmdb_err)?;

        tracing::debug!(path = %path.as_ref().display(), "lmdb state store opened");

        Ok(Self {
            env: Arc::new(env),
            db,
        })
    }
}

#[async_trait]
impl StateStore for LmdbStateStore {
    fn backend_name(&self) -> &'static str {
        BACKEND
    }

    async fn get(&self, key: &str) -> Result<Option<StateEntry>, StoreError> {
        if !storable(key) {
            return Ok(None);
        }

        let env = self.env.clone();
        let db = self.db;
        let key = key.to_owned();

        tokio::task::spawn_blocking(move || {
            let rtxn = env.read_txn().map_err(lmdb_err)?;
            match db.get(&rtxn, &key).map_err(lmdb_err)? {
                Some(framed) => {
                    let (version, value) = unframe(&key, framed)?;
                    Ok(Some(StateEntry {
                        key,
                        value,
                        version,
                    }))
                }
                None => Ok(None),
            }
        })
        .await
        .map_err(lmdb_err)?
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<Version, StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let key = key.to_owned();

        tokio::task::spawn_blocking(move || {
            let mut wtxn = env.write_txn().map_err(lmdb_err)?;
            let current = stored_version(&key, db.get(&wtxn, &key).map_err(lmdb_err)?)?;
            let version = current.unwrap_or(0) + 1;
            db.put(&mut wtxn, &key, &frame(version, &value))
                .map_err(lmdb_err)?;
            wtxn.commit().map_err(lmdb_err)?;
            Ok(version)
        })
        .await
        .map_err(lmdb_err)?
    }

    async fn put_if_version(
        &self,
        key: &str,
        expected: Option<Version>,
        value: Vec<u8>,
    ) -> Result<Version, StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let key = key.to_owned();

        tokio::task::spawn_blocking(move || {
            let mut wtxn = env.write_txn().map_err(lmdb_err)?;
            let actual = stored_version(&key, db.get(&wtxn, &key).map_err(lmdb_err)?)?;
            if actual != expected {
                // dropping the transaction aborts it
                return Err(StoreError::VersionConflict {
                    key,
                    expected,
                    actual,
                });
            }
            let version = actual.unwrap_or(0) + 1;
            db.put(&mut wtxn, &key, &frame(version, &value))
                .map_err(lmdb_err)?;
            wtxn.commit().map_err(lmdb_err)?;
            Ok(version)
        })
        .await
        .map_err(lmdb_err)?
    }

    async fn scan(&self, range: &KeyRange) -> Result<ScanStream, StoreError> {
        let env = self.env.clone();
        let db = self.db;
        let range = range.clone();

        let snapshot = tokio::task::spawn_blocking(move || {
            if range.end.as_deref().is_some_and(|end| end <= range.start.as_str()) {
                return Ok(Vec::new());
            }

            // LMDB rejects empty and over-long bound keys; widen such bounds
            // and filter against the exact range instead
            let lower = match range.start.as_str() {
                "" => Bound::Unbounded,
                start => Bound::Included(truncate_key(start)),
            };
            let upper = match range.end.as_deref() {
                Some(end) if storable(end) => Bound::Excluded(end),
                _ => Bound::Unbounded,
            };
            let bounds: (Bound<&str>, Bound<&str>) = (lower, upper);

            let rtxn = env.read_txn().map_err(lmdb_err)?;
            let mut results = Vec::new();
            for item in db.range(&rtxn, &bounds).map_err(lmdb_err)? {
                let (key, framed) = item.map_err(lmdb_err)?;
                if key < range.start.as_str() {
                    continue;
                }
                if !range.contains(key) {
                    break;
                }
                let (version, value) = unframe(key, framed)?;
                results.push(Ok(StateEntry {
                    key: key.to_string(),
                    value,
                    version,
                }));
            }
            Ok::<_, StoreError>(results)
        })
        .await
        .map_err(lmdb_err)??;

        Ok(Box::pin(stream::iter(snapshot)))
    }
}

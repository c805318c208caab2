//! Versioned record store
//!
//! [`RecordStore`] is the document-type-agnostic layer between a
//! [`StateStore`] and the services that own a document family. It composes
//! a [`DocumentCodec`] with the store and adds:
//!
//! - insert-if-absent creation, so natural keys stay unique
//! - typed range scans
//! - optimistic read-modify-write: [`modify`](RecordStore::modify) remembers
//!   the version it read and writes back with a compare-and-swap. A writer
//!   that raced in between makes the second write fail with a version
//!   conflict instead of being silently overwritten.

use crate::core::codec::{DocumentCodec, JsonCodec};
use crate::core::document::Document;
use crate::core::error::{LedgerError, LedgerResult, StoreError};
use crate::core::field::FieldValue;
use crate::core::keyspace::{KeyRange, validate_key};
use crate::core::store::{StateEntry, StateStore, Version};
use futures::TryStreamExt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A decoded document together with its storage key and version
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<D> {
    pub key: String,
    pub version: Version,
    pub document: D,
}

/// Result of a read-modify-write
#[derive(Debug, Clone, PartialEq)]
pub enum Modification<D> {
    /// The document changed and was written at a new version
    Applied(Versioned<D>),
    /// Nothing changed; the stored entry was left untouched
    Unchanged(Versioned<D>),
}

impl<D> Modification<D> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Modification::Applied(_))
    }

    /// The document state after the call, whether or not it was written
    pub fn current(&self) -> &Versioned<D> {
        match self {
            Modification::Applied(v) | Modification::Unchanged(v) => v,
        }
    }
}

/// Typed, versioned access to one document family in a state store
pub struct RecordStore<D: Document, S: StateStore, C: DocumentCodec = JsonCodec> {
    store: Arc<S>,
    codec: C,
    _marker: PhantomData<fn() -> D>,
}

impl<D: Document, S: StateStore> RecordStore<D, S, JsonCodec> {
    /// Create a record store using the JSON codec
    pub fn new(store: Arc<S>) -> Self {
        Self::with_codec(store, JsonCodec)
    }
}

impl<D: Document, S: StateStore, C: DocumentCodec + Clone> Clone for RecordStore<D, S, C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            codec: self.codec.clone(),
            _marker: PhantomData,
        }
    }
}

impl<D: Document, S: StateStore, C: DocumentCodec> RecordStore<D, S, C> {
    pub fn with_codec(store: Arc<S>, codec: C) -> Self {
        Self {
            store,
            codec,
            _marker: PhantomData,
        }
    }

    /// The underlying state store
    pub fn state(&self) -> &Arc<S> {
        &self.store
    }

    fn decode_entry(&self, entry: StateEntry) -> LedgerResult<Versioned<D>> {
        let document = self
            .codec
            .decode::<D>(&entry.value)
            .map_err(|e| e.at_key(&entry.key))?;
        Ok(Versioned {
            key: entry.key,
            version: entry.version,
            document,
        })
    }

    fn not_found(key: &str) -> LedgerError {
        LedgerError::RecordNotFound {
            document_type: D::document_type().to_string(),
            key: key.to_string(),
        }
    }

    fn already_exists(key: &str) -> LedgerError {
        LedgerError::RecordAlreadyExists {
            document_type: D::document_type().to_string(),
            key: key.to_string(),
        }
    }

    /// Insert-if-absent, translating a lost race into `RecordAlreadyExists`
    async fn put_new(&self, key: &str, bytes: Vec<u8>) -> LedgerResult<Version> {
        validate_key(key)?;
        match self.store.put_if_version(key, None, bytes).await {
            Ok(version) => Ok(version),
            Err(StoreError::VersionConflict { .. }) => Err(Self::already_exists(key)),
            Err(e) => Err(e.into()),
        }
    }

    /// Raw entry at `key`, if any
    pub async fn get_raw(&self, key: &str) -> LedgerResult<Option<StateEntry>> {
        Ok(self.store.get(key).await?)
    }

    /// Decoded document at `key`, if any
    pub async fn get(&self, key: &str) -> LedgerResult<Option<Versioned<D>>> {
        match self.store.get(key).await? {
            Some(entry) => Ok(Some(self.decode_entry(entry)?)),
            None => Ok(None),
        }
    }

    /// Decoded document at `key`; a missing key is `RecordNotFound`
    pub async fn load(&self, key: &str) -> LedgerResult<Versioned<D>> {
        self.get(key).await?.ok_or_else(|| Self::not_found(key))
    }

    /// Store a new document under its natural key
    ///
    /// Fails with `RecordAlreadyExists` if the key is taken.
    pub async fn insert(&self, document: &D) -> LedgerResult<Version> {
        let key = document.key();
        let bytes = self.codec.encode(document)?;
        let version = self.put_new(key, bytes).await?;
        tracing::debug!(
            backend = self.store.backend_name(),
            document_type = D::document_type(),
            key = %key,
            version,
            "record inserted"
        );
        Ok(version)
    }

    /// Store a document under its natural key, replacing whatever was there
    pub async fn upsert(&self, document: &D) -> LedgerResult<Version> {
        let key = document.key();
        validate_key(key)?;
        let bytes = self.codec.encode(document)?;
        let version = self.store.put(key, bytes).await?;
        tracing::debug!(
            backend = self.store.backend_name(),
            document_type = D::document_type(),
            key = %key,
            version,
            "record upserted"
        );
        Ok(version)
    }

    /// Store caller-encoded bytes at `key` after checking they decode
    ///
    /// The bytes are written exactly as supplied. The decoded document must
    /// carry `key` as its natural key, and the key must be free.
    pub async fn insert_raw(&self, key: &str, bytes: Vec<u8>) -> LedgerResult<(D, Version)> {
        let document = self
            .codec
            .decode::<D>(&bytes)
            .map_err(|e| e.at_key(key))?;
        if document.key() != key {
            return Err(LedgerError::InvalidArgument {
                argument: "key".to_string(),
                message: format!(
                    "payload is for {} '{}', not '{}'",
                    D::document_type(),
                    document.key(),
                    key
                ),
            });
        }
        let version = self.put_new(key, bytes).await?;
        Ok((document, version))
    }

    /// Raw entries inside `range`, in key order
    pub async fn scan_raw(&self, range: &KeyRange) -> LedgerResult<Vec<StateEntry>> {
        let entries = self.store.scan(range).await?.try_collect::<Vec<_>>().await?;
        Ok(entries)
    }

    /// Decoded documents inside `range`, in key order
    ///
    /// A single undecodable entry fails the whole scan.
    pub async fn scan(&self, range: &KeyRange) -> LedgerResult<Vec<Versioned<D>>> {
        self.scan_raw(range)
            .await?
            .into_iter()
            .map(|entry| self.decode_entry(entry))
            .collect()
    }

    /// Optimistic read-modify-write
    ///
    /// Loads the document at `key`, hands a copy to `mutate`, and writes it
    /// back with a compare-and-swap on the version that was read. `mutate`
    /// returns whether it changed anything; when it returns `false` nothing is
    /// written and the stored bytes and version stay as they were.
    pub async fn modify<F>(&self, key: &str, mutate: F) -> LedgerResult<Modification<D>>
    where
        F: FnOnce(&mut D) -> LedgerResult<bool> + Send,
    {
        let current = self.load(key).await?;
        let mut document = current.document.clone();

        if !mutate(&mut document)? {
            return Ok(Modification::Unchanged(current));
        }

        if document.key() != key {
            return Err(LedgerError::InvalidField {
                field: "key".to_string(),
                message: format!("natural key of '{}' cannot change", key),
            });
        }

        let bytes = self.codec.encode(&document)?;
        let version = self
            .store
            .put_if_version(key, Some(current.version), bytes)
            .await?;

        tracing::debug!(
            backend = self.store.backend_name(),
            document_type = D::document_type(),
            key = %key,
            from = current.version,
            to = version,
            "record modified"
        );

        Ok(Modification::Applied(Versioned {
            key: key.to_string(),
            version,
            document,
        }))
    }

    /// Field-level update by wire name
    ///
    /// Fields whose value is already equal are skipped; if no field differs
    /// the call is a no-op.
    pub async fn update_fields(
        &self,
        key: &str,
        patch: Vec<(String, FieldValue)>,
    ) -> LedgerResult<Modification<D>> {
        self.modify(key, move |document| apply_fields(document, patch))
            .await
    }
}

/// Apply a field patch to a document in memory
///
/// Returns whether any field actually changed. Fields already holding the
/// requested value are left alone.
pub fn apply_fields<D: Document>(
    document: &mut D,
    patch: Vec<(String, FieldValue)>,
) -> LedgerResult<bool> {
    let mut changed = false;
    for (field, value) in patch {
        if document.field_value(&field).as_ref() == Some(&value) {
            continue;
        }
        document.set_field(&field, value)?;
        changed = true;
    }
    Ok(changed)
}

//! Core module containing the storage contracts and the generic record layer

pub mod codec;
pub mod document;
pub mod error;
pub mod events;
pub mod field;
pub mod keyspace;
pub mod records;
pub mod store;

pub use codec::{DocumentCodec, JsonCodec};
pub use document::Document;
pub use error::{ErrorResponse, LedgerError, LedgerResult, StoreError};
pub use events::{EventBus, EventEnvelope, RecordEvent};
pub use field::FieldValue;
pub use keyspace::{KeyRange, KeySpace};
pub use records::{Modification, RecordStore, Versioned, apply_fields};
pub use store::{ScanStream, StateEntry, StateStore, Version};

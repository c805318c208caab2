//! Document trait for records persisted in a state store

use crate::core::error::LedgerResult;
use crate::core::field::FieldValue;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// A fixed-schema record stored under its own natural key
///
/// Field names used by [`field_value`](Document::field_value) and
/// [`set_field`](Document::set_field) are the serialized (wire) names, so a
/// field-level update addresses the same name a client sees in the payload.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Type name used in logs, events and errors (e.g., "invoice")
    fn document_type() -> &'static str;

    /// The natural key the document is stored under
    fn key(&self) -> &str;

    /// Read a single field by wire name
    fn field_value(&self, field: &str) -> Option<FieldValue>;

    /// Overwrite a single field by wire name
    ///
    /// Fails with `InvalidField` for unknown or immutable fields, or when the
    /// value has the wrong type.
    fn set_field(&mut self, field: &str, value: FieldValue) -> LedgerResult<()>;
}

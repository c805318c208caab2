//! Document codec
//!
//! Converts documents to and from the byte payloads kept in the state store.
//! Decoding is all-or-nothing: missing, unknown or mistyped fields reject the
//! whole payload with `MalformedRecord`.

use crate::core::document::Document;
use crate::core::error::{LedgerError, LedgerResult};

/// Serializer for documents stored as opaque bytes
pub trait DocumentCodec: Send + Sync {
    /// Encode a document. Output is deterministic for equal documents.
    fn encode<D: Document>(&self, document: &D) -> LedgerResult<Vec<u8>>;

    /// Decode a payload, rejecting anything that does not match the schema
    fn decode<D: Document>(&self, bytes: &[u8]) -> LedgerResult<D>;
}

/// JSON codec backed by `serde_json`
///
/// Field order follows the document's struct declaration, so two equal
/// documents always encode to identical bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl DocumentCodec for JsonCodec {
    fn encode<D: Document>(&self, document: &D) -> LedgerResult<Vec<u8>> {
        serde_json::to_vec(document)
            .map_err(|e| LedgerError::malformed(D::document_type(), format!("encode: {}", e)))
    }

    fn decode<D: Document>(&self, bytes: &[u8]) -> LedgerResult<D> {
        if bytes.is_empty() {
            return Err(LedgerError::malformed(D::document_type(), "empty payload"));
        }
        serde_json::from_slice(bytes)
            .map_err(|e| LedgerError::malformed(D::document_type(), format!("decode: {}", e)))
    }
}

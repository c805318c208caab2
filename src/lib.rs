//! # Invoice Ledger
//!
//! Invoice lifecycle records over a pluggable, versioned key-value state store.
//!
//! ## Features
//!
//! - **Versioned State Store**: every key carries a write counter; puts can be
//!   compare-and-swap on that version
//! - **Generic Record Layer**: typed documents, insert-if-absent creation,
//!   range scans and optimistic field-level updates
//! - **Invoice Lifecycle**: raise, receive goods, pay the supplier, repay the bank
//! - **Name-Based Dispatch**: positional string arguments, arity checked up front,
//!   canonical and legacy operation names
//! - **Record Events**: broadcast of created/updated notifications after each write
//! - **Backends**: in-memory (default) and LMDB (`lmdb` feature)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use invoice_ledger::prelude::*;
//! use std::sync::Arc;
//!
//! let store = Arc::new(InMemoryStateStore::new());
//! let dispatcher = Dispatcher::new(InvoiceService::new(store));
//!
//! dispatcher.dispatch("seedDefaults", &[] as &[&str]).await?;
//! dispatcher.dispatch("markGoodsReceived", &["INVOICE0", "Yes"]).await?;
//! dispatcher
//!     .dispatch("recordSupplierPayment", &["INVOICE0", "Yes", "900000"])
//!     .await?;
//!
//! let all = dispatcher.dispatch("queryRange", &[] as &[&str]).await?;
//! ```

pub mod config;
pub mod core;
pub mod dispatch;
pub mod invoice;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core Traits ===
    pub use crate::core::{
        codec::{DocumentCodec, JsonCodec},
        document::Document,
        store::{StateEntry, StateStore, Version},
    };

    // === Record Layer ===
    pub use crate::core::{
        field::FieldValue,
        keyspace::{KeyRange, KeySpace},
        records::{Modification, RecordStore, Versioned},
    };

    // === Errors ===
    pub use crate::core::error::{ErrorResponse, LedgerError, LedgerResult, StoreError};

    // === Events ===
    pub use crate::core::events::{EventBus, EventEnvelope, RecordEvent};

    // === Invoices ===
    pub use crate::invoice::{Invoice, InvoiceService};

    // === Dispatch ===
    pub use crate::dispatch::{Arity, Dispatcher, Operation, OperationRegistry, Response};

    // === Configuration ===
    pub use crate::config::{LedgerConfig, StorageBackend};

    // === Storage ===
    pub use crate::storage::InMemoryStateStore;

    #[cfg(feature = "lmdb")]
    pub use crate::storage::{LmdbOptions, LmdbStateStore};
}

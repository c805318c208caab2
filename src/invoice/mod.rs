//! Invoice records: the document model and the lifecycle service

pub mod model;
pub mod service;

pub use model::{Invoice, fields, parse_amount};
pub use service::InvoiceService;

/// Key prefix shared by all invoice records
pub const DEFAULT_PREFIX: &str = "INVOICE";

/// Key the sample invoice is seeded at
pub const DEFAULT_SEED_KEY: &str = "INVOICE0";

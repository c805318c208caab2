//! Invocable operations and their argument contracts

use crate::core::error::{LedgerError, LedgerResult};
use std::fmt;

/// Number of positional arguments an operation accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Any,
}

impl Arity {
    /// Fail with `LedgerError::Arity` unless `actual` satisfies this arity
    pub fn check(self, operation: &str, actual: usize) -> LedgerResult<()> {
        match self {
            Arity::Exact(expected) if expected != actual => Err(LedgerError::Arity {
                operation: operation.to_string(),
                expected: self,
                actual,
            }),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::Any => write!(f, "any number"),
        }
    }
}

/// Operations exposed through the dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SeedDefaults,
    Create,
    CreateFromPayload,
    QueryRange,
    MarkGoodsReceived,
    RecordSupplierPayment,
    RecordOemRepayment,
    LookupIdentity,
    GetInvoice,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::SeedDefaults,
        Operation::Create,
        Operation::CreateFromPayload,
        Operation::QueryRange,
        Operation::MarkGoodsReceived,
        Operation::RecordSupplierPayment,
        Operation::RecordOemRepayment,
        Operation::LookupIdentity,
        Operation::GetInvoice,
    ];

    pub fn canonical_name(self) -> &'static str {
        match self {
            Operation::SeedDefaults => "seedDefaults",
            Operation::Create => "create",
            Operation::CreateFromPayload => "createFromPayload",
            Operation::QueryRange => "queryRange",
            Operation::MarkGoodsReceived => "markGoodsReceived",
            Operation::RecordSupplierPayment => "recordSupplierPayment",
            Operation::RecordOemRepayment => "recordOemRepayment",
            Operation::LookupIdentity => "lookupIdentity",
            Operation::GetInvoice => "getInvoice",
        }
    }

    /// Function name used by deployed ledger clients
    pub fn legacy_name(self) -> &'static str {
        match self {
            Operation::SeedDefaults => "initLedger",
            Operation::Create => "raiseInvoice",
            Operation::CreateFromPayload => "createInvoiceWithJsonInput",
            Operation::QueryRange => "queryAllInvoices",
            Operation::MarkGoodsReceived => "goodsReceive",
            Operation::RecordSupplierPayment => "bankPaymentToSupplier",
            Operation::RecordOemRepayment => "oemRepaysToBank",
            Operation::LookupIdentity => "getUsers",
            Operation::GetInvoice => "queryInvoice",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Operation::SeedDefaults | Operation::QueryRange => Arity::Exact(0),
            Operation::Create => Arity::Exact(10),
            Operation::CreateFromPayload | Operation::MarkGoodsReceived => Arity::Exact(2),
            Operation::RecordSupplierPayment | Operation::RecordOemRepayment => Arity::Exact(3),
            Operation::LookupIdentity => Arity::Any,
            Operation::GetInvoice => Arity::Exact(1),
        }
    }

    /// Whether the operation writes to the store
    pub fn is_write(self) -> bool {
        !matches!(
            self,
            Operation::QueryRange | Operation::LookupIdentity | Operation::GetInvoice
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

//! Invoice document model

use crate::core::document::Document;
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::field::FieldValue;
use crate::dispatch::Arity;
use serde::{Deserialize, Serialize};

/// Wire names of the invoice fields
pub mod fields {
    pub const INVOICE_NUMBER: &str = "invoiceNumber";
    pub const BILLED_TO: &str = "billedTo";
    pub const INVOICE_DATE: &str = "invoiceDate";
    pub const INVOICE_AMOUNT: &str = "invoiceAmount";
    pub const ITEM_DESCRIPTION: &str = "itemDescription";
    pub const GOODS_RECEIVED: &str = "gr";
    pub const IS_PAID: &str = "isPaid";
    pub const PAID_AMOUNT: &str = "paidAmount";
    pub const REPAID: &str = "repaid";
    pub const REPAYMENT_AMOUNT: &str = "repaymentAmount";

    /// All fields, in positional argument order
    pub const ALL: [&str; 10] = [
        INVOICE_NUMBER,
        BILLED_TO,
        INVOICE_DATE,
        INVOICE_AMOUNT,
        ITEM_DESCRIPTION,
        GOODS_RECEIVED,
        IS_PAID,
        PAID_AMOUNT,
        REPAID,
        REPAYMENT_AMOUNT,
    ];
}

/// An invoice moving through raised → goods-received → paid → repaid
///
/// `is_paid` and `repaid` are free-form flags: clients store either "Yes"/"No"
/// or the id of the paying party.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Invoice {
    pub invoice_number: String,
    pub billed_to: String,
    pub invoice_date: String,
    pub invoice_amount: f64,
    pub item_description: String,
    #[serde(rename = "gr", alias = "goodsReceived")]
    pub goods_received: String,
    pub is_paid: String,
    pub paid_amount: f64,
    pub repaid: String,
    pub repayment_amount: f64,
}

impl Invoice {
    /// Number of positional arguments `from_args` expects
    pub const ARG_COUNT: usize = fields::ALL.len();

    /// A freshly raised invoice: nothing received, paid or repaid yet
    pub fn raised(
        invoice_number: impl Into<String>,
        billed_to: impl Into<String>,
        invoice_date: impl Into<String>,
        invoice_amount: f64,
        item_description: impl Into<String>,
    ) -> Self {
        Self {
            invoice_number: invoice_number.into(),
            billed_to: billed_to.into(),
            invoice_date: invoice_date.into(),
            invoice_amount,
            item_description: item_description.into(),
            goods_received: "No".to_string(),
            is_paid: "No".to_string(),
            paid_amount: 0.0,
            repaid: "No".to_string(),
            repayment_amount: 0.0,
        }
    }

    /// The canonical sample invoice written by ledger seeding
    pub fn sample(invoice_number: impl Into<String>) -> Self {
        Self::raised(invoice_number, "Asus Co.", "02/07/2019", 1_000_000.0, "Laptops")
    }

    /// Build an invoice from ten positional string arguments
    ///
    /// Order: invoiceNumber, billedTo, invoiceDate, invoiceAmount,
    /// itemDescription, gr, isPaid, paidAmount, repaid, repaymentAmount.
    /// Amounts are decimal strings.
    pub fn from_args<A: AsRef<str>>(args: &[A]) -> LedgerResult<Self> {
        if args.len() != Self::ARG_COUNT {
            return Err(LedgerError::Arity {
                operation: "create".to_string(),
                expected: Arity::Exact(Self::ARG_COUNT),
                actual: args.len(),
            });
        }
        let arg = |i: usize| args[i].as_ref().to_string();

        Ok(Self {
            invoice_number: arg(0),
            billed_to: arg(1),
            invoice_date: arg(2),
            invoice_amount: parse_amount(fields::INVOICE_AMOUNT, args[3].as_ref())?,
            item_description: arg(4),
            goods_received: arg(5),
            is_paid: arg(6),
            paid_amount: parse_amount(fields::PAID_AMOUNT, args[7].as_ref())?,
            repaid: arg(8),
            repayment_amount: parse_amount(fields::REPAYMENT_AMOUNT, args[9].as_ref())?,
        })
    }
}

/// Parse a decimal amount argument
///
/// Rejects empty, non-numeric and non-finite input.
pub fn parse_amount(argument: &str, raw: &str) -> LedgerResult<f64> {
    let invalid = |message: String| LedgerError::InvalidArgument {
        argument: argument.to_string(),
        message,
    };
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid(format!("'{}' is not a decimal amount", raw)))?;
    if !value.is_finite() {
        return Err(invalid(format!("'{}' is not a finite amount", raw)));
    }
    Ok(value)
}

fn expect_string(field: &str, value: FieldValue) -> LedgerResult<String> {
    match value {
        FieldValue::String(s) => Ok(s),
        other => Err(LedgerError::InvalidField {
            field: field.to_string(),
            message: format!("expected string, got {}", other.type_name()),
        }),
    }
}

fn expect_amount(field: &str, value: FieldValue) -> LedgerResult<f64> {
    match value {
        FieldValue::Float(f) if f.is_finite() => Ok(f),
        FieldValue::Float(f) => Err(LedgerError::InvalidField {
            field: field.to_string(),
            message: format!("{} is not a finite amount", f),
        }),
        other => Err(LedgerError::InvalidField {
            field: field.to_string(),
            message: format!("expected decimal, got {}", other.type_name()),
        }),
    }
}

impl Document for Invoice {
    fn document_type() -> &'static str {
        "invoice"
    }

    fn key(&self) -> &str {
        &self.invoice_number
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        let value = match field {
            fields::INVOICE_NUMBER => FieldValue::from(self.invoice_number.as_str()),
            fields::BILLED_TO => FieldValue::from(self.billed_to.as_str()),
            fields::INVOICE_DATE => FieldValue::from(self.invoice_date.as_str()),
            fields::INVOICE_AMOUNT => FieldValue::Float(self.invoice_amount),
            fields::ITEM_DESCRIPTION => FieldValue::from(self.item_description.as_str()),
            fields::GOODS_RECEIVED => FieldValue::from(self.goods_received.as_str()),
            fields::IS_PAID => FieldValue::from(self.is_paid.as_str()),
            fields::PAID_AMOUNT => FieldValue::Float(self.paid_amount),
            fields::REPAID => FieldValue::from(self.repaid.as_str()),
            fields::REPAYMENT_AMOUNT => FieldValue::Float(self.repayment_amount),
            _ => return None,
        };
        Some(value)
    }

    fn set_field(&mut self, field: &str, value: FieldValue) -> LedgerResult<()> {
        match field {
            fields::INVOICE_NUMBER => {
                return Err(LedgerError::InvalidField {
                    field: field.to_string(),
                    message: "invoice number is immutable".to_string(),
                });
            }
            fields::BILLED_TO => self.billed_to = expect_string(field, value)?,
            fields::INVOICE_DATE => self.invoice_date = expect_string(field, value)?,
            fields::INVOICE_AMOUNT => self.invoice_amount = expect_amount(field, value)?,
            fields::ITEM_DESCRIPTION => self.item_description = expect_string(field, value)?,
            fields::GOODS_RECEIVED => self.goods_received = expect_string(field, value)?,
            fields::IS_PAID => self.is_paid = expect_string(field, value)?,
            fields::PAID_AMOUNT => self.paid_amount = expect_amount(field, value)?,
            fields::REPAID => self.repaid = expect_string(field, value)?,
            fields::REPAYMENT_AMOUNT => self.repayment_amount = expect_amount(field, value)?,
            _ => {
                return Err(LedgerError::InvalidField {
                    field: field.to_string(),
                    message: "unknown invoice field".to_string(),
                });
            }
        }
        Ok(())
    }
}

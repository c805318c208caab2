//! Invoice record service
//!
//! The named invoice operations, composed from a [`RecordStore`]. Mutations
//! are optimistic read-modify-writes: a concurrent writer makes the later
//! call fail with a version conflict rather than silently losing an update.
//! Guarded transitions (payment, repayment) that do not pass their guard
//! write nothing and report [`Modification::Unchanged`].

use crate::config::LedgerConfig;
use crate::core::error::{LedgerError, LedgerResult};
use crate::core::events::{EventBus, RecordEvent};
use crate::core::field::FieldValue;
use crate::core::keyspace::KeySpace;
use crate::core::records::{Modification, RecordStore, Versioned, apply_fields};
use crate::core::store::{StateStore, Version};
use crate::core::Document;
use crate::invoice::model::{Invoice, fields};
use crate::invoice::{DEFAULT_PREFIX, DEFAULT_SEED_KEY};
use std::sync::Arc;

/// Invoice lifecycle operations over a state store
pub struct InvoiceService<S: StateStore> {
    records: RecordStore<Invoice, S>,
    key_space: KeySpace,
    seed_key: String,
    events: Option<EventBus>,
}

impl<S: StateStore> Clone for InvoiceService<S> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
            key_space: self.key_space.clone(),
            seed_key: self.seed_key.clone(),
            events: self.events.clone(),
        }
    }
}

impl<S: StateStore> InvoiceService<S> {
    /// Create a service using the default `INVOICE` key space
    pub fn new(store: Arc<S>) -> Self {
        Self {
            records: RecordStore::new(store),
            key_space: KeySpace::new(DEFAULT_PREFIX),
            seed_key: DEFAULT_SEED_KEY.to_string(),
            events: None,
        }
    }

    /// Create a service with the key space and event settings from `config`
    ///
    /// Fails with `Config` if the settings do not pass
    /// [`LedgerConfig::validate`].
    pub fn from_config(store: Arc<S>, config: &LedgerConfig) -> LedgerResult<Self> {
        config.validate()?;
        Ok(Self::new(store)
            .with_key_space(
                KeySpace::new(config.key_space.prefix.clone()),
                config.key_space.seed_key.clone(),
            )
            .with_event_bus(EventBus::new(config.events.capacity)))
    }

    /// Use a different key space and seed key
    pub fn with_key_space(mut self, key_space: KeySpace, seed_key: impl Into<String>) -> Self {
        self.key_space = key_space;
        self.seed_key = seed_key.into();
        self
    }

    /// Publish record events on `bus` after each write
    pub fn with_event_bus(mut self, bus: EventBus) -> Self {
        self.events = Some(bus);
        self
    }

    pub fn records(&self) -> &RecordStore<Invoice, S> {
        &self.records
    }

    pub fn key_space(&self) -> &KeySpace {
        &self.key_space
    }

    pub fn seed_key(&self) -> &str {
        &self.seed_key
    }

    pub fn event_bus(&self) -> Option<&EventBus> {
        self.events.as_ref()
    }

    fn publish_write(&self, key: &str, version: Version, fields: Vec<String>) {
        let Some(bus) = &self.events else {
            return;
        };
        let document_type = Invoice::document_type().to_string();
        let key = key.to_string();
        let event = if version == 1 {
            RecordEvent::Created {
                document_type,
                key,
                version,
            }
        } else {
            RecordEvent::Updated {
                document_type,
                key,
                version,
                fields,
            }
        };
        bus.publish(event);
    }

    fn publish_modification(&self, modification: &Modification<Invoice>, fields: &[&str]) {
        if let Modification::Applied(current) = modification {
            self.publish_write(
                &current.key,
                current.version,
                fields.iter().map(|f| f.to_string()).collect(),
            );
        }
    }

    /// Write the canonical sample invoice at the seed key
    ///
    /// Overwrites whatever is stored there.
    pub async fn seed_defaults(&self) -> LedgerResult<Version> {
        let invoice = Invoice::sample(self.seed_key.clone());
        let version = self.records.upsert(&invoice).await?;
        tracing::info!(key = %self.seed_key, version, "ledger seeded with sample invoice");
        self.publish_write(
            &self.seed_key,
            version,
            fields::ALL.iter().map(|f| f.to_string()).collect(),
        );
        Ok(version)
    }

    /// Store a new invoice under its invoice number
    ///
    /// Fails with `RecordAlreadyExists` if the number is taken.
    pub async fn create(&self, invoice: Invoice) -> LedgerResult<Version> {
        if !self.key_space.contains(invoice.key()) {
            tracing::debug!(
                key = %invoice.key(),
                prefix = %self.key_space.prefix(),
                "invoice stored outside the range-query key space"
            );
        }
        let version = self.records.insert(&invoice).await?;
        tracing::info!(key = %invoice.key(), billed_to = %invoice.billed_to, "invoice raised");
        self.publish_write(invoice.key(), version, Vec::new());
        Ok(version)
    }

    /// Build an invoice from ten positional arguments and store it
    pub async fn create_from_args<A>(&self, args: &[A]) -> LedgerResult<Version>
    where
        A: AsRef<str> + Sync,
    {
        let invoice = Invoice::from_args(args)?;
        self.create(invoice).await
    }

    /// Store a pre-encoded invoice payload at `key`
    ///
    /// The payload is decoded to validate it, then stored byte-for-byte.
    pub async fn create_from_payload(&self, key: &str, payload: Vec<u8>) -> LedgerResult<Version> {
        let (invoice, version) = self.records.insert_raw(key, payload).await?;
        tracing::info!(key = %key, billed_to = %invoice.billed_to, "invoice created from payload");
        self.publish_write(key, version, Vec::new());
        Ok(version)
    }

    /// All invoices in the key space as one JSON array of the stored payloads
    pub async fn query_range(&self) -> LedgerResult<Vec<u8>> {
        let entries = self.records.scan_raw(&self.key_space.range()).await?;

        let size = entries.iter().map(|e| e.value.len() + 1).sum::<usize>() + 2;
        let mut buffer = Vec::with_capacity(size);
        buffer.push(b'[');
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                buffer.push(b',');
            }
            buffer.extend_from_slice(&entry.value);
        }
        buffer.push(b']');

        tracing::debug!(count = entries.len(), "queried invoice range");
        Ok(buffer)
    }

    /// All invoices in the key space, decoded
    pub async fn list(&self) -> LedgerResult<Vec<Versioned<Invoice>>> {
        self.records.scan(&self.key_space.range()).await
    }

    /// The invoice stored at `key`
    pub async fn get(&self, key: &str) -> LedgerResult<Versioned<Invoice>> {
        self.records.load(key).await
    }

    /// The stored payload at `key`, exactly as written
    pub async fn get_payload(&self, key: &str) -> LedgerResult<Vec<u8>> {
        self.records
            .get_raw(key)
            .await?
            .map(|entry| entry.value)
            .ok_or_else(|| LedgerError::RecordNotFound {
                document_type: Invoice::document_type().to_string(),
                key: key.to_string(),
            })
    }

    /// Set the goods-received flag
    ///
    /// Idempotent: setting the value already stored writes nothing.
    pub async fn mark_goods_received(
        &self,
        key: &str,
        flag: &str,
    ) -> LedgerResult<Modification<Invoice>> {
        let modification = self
            .records
            .update_fields(
                key,
                vec![(fields::GOODS_RECEIVED.to_string(), FieldValue::from(flag))],
            )
            .await?;
        self.publish_modification(&modification, &[fields::GOODS_RECEIVED]);
        Ok(modification)
    }

    /// Record the bank's payment to the supplier
    ///
    /// Applied only when `amount` is below the invoice amount; otherwise the
    /// stored invoice is left untouched.
    pub async fn record_supplier_payment(
        &self,
        key: &str,
        flag: &str,
        amount: f64,
    ) -> LedgerResult<Modification<Invoice>> {
        let patch = vec![
            (fields::IS_PAID.to_string(), FieldValue::from(flag)),
            (fields::PAID_AMOUNT.to_string(), FieldValue::Float(amount)),
        ];
        let modification = self
            .records
            .modify(key, |invoice| {
                if amount >= invoice.invoice_amount {
                    tracing::warn!(
                        key = %key,
                        amount,
                        invoice_amount = invoice.invoice_amount,
                        "supplier payment not below invoice amount, ignored"
                    );
                    return Ok(false);
                }
                apply_fields(invoice, patch)
            })
            .await?;
        self.publish_modification(&modification, &[fields::IS_PAID, fields::PAID_AMOUNT]);
        Ok(modification)
    }

    /// Record the OEM's repayment to the bank
    ///
    /// Applied only when `amount` exceeds the paid amount; otherwise the
    /// stored invoice is left untouched.
    pub async fn record_oem_repayment(
        &self,
        key: &str,
        flag: &str,
        amount: f64,
    ) -> LedgerResult<Modification<Invoice>> {
        let patch = vec![
            (fields::REPAID.to_string(), FieldValue::from(flag)),
            (fields::REPAYMENT_AMOUNT.to_string(), FieldValue::Float(amount)),
        ];
        let modification = self
            .records
            .modify(key, |invoice| {
                if amount <= invoice.paid_amount {
                    tracing::warn!(
                        key = %key,
                        amount,
                        paid_amount = invoice.paid_amount,
                        "repayment not above paid amount, ignored"
                    );
                    return Ok(false);
                }
                apply_fields(invoice, patch)
            })
            .await?;
        self.publish_modification(&modification, &[fields::REPAID, fields::REPAYMENT_AMOUNT]);
        Ok(modification)
    }

    /// Caller identity lookup
    ///
    /// Identity attributes belong to the hosting ledger's membership service,
    /// so this always succeeds with no payload.
    pub fn lookup_identity<A: AsRef<str>>(&self, args: &[A]) -> LedgerResult<Option<Vec<u8>>> {
        tracing::debug!(args = args.len(), "identity lookup is not backed by a membership service");
        Ok(None)
    }
}

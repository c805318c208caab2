//! End-to-end invoice lifecycle tests through the dispatcher
//!
//! These tests verify that:
//! - Payment and repayment guards only apply strictly monotonic updates
//! - Rejected and idempotent calls leave stored bytes untouched
//! - Range queries return exactly the invoice key space
//! - Events follow every write and only writes

use invoice_ledger::prelude::*;
use std::sync::Arc;

const NO_ARGS: &[&str] = &[];

struct Ledger {
    store: Arc<InMemoryStateStore>,
    dispatcher: Dispatcher<InMemoryStateStore>,
}

impl Ledger {
    fn new() -> Self {
        let store = Arc::new(InMemoryStateStore::new());
        let dispatcher = Dispatcher::new(InvoiceService::new(Arc::clone(&store)));
        Self { store, dispatcher }
    }

    async fn call(&self, name: &str, args: &[&str]) -> Response {
        self.dispatcher
            .dispatch(name, args)
            .await
            .unwrap_or_else(|e| panic!("{} failed: {}", name, e))
    }

    async fn raise(&self, number: &str, amount: &str) {
        self.call(
            "create",
            &[number, "Asus Co.", "02/07/2019", amount, "Laptops", "No", "No", "0", "No", "0"],
        )
        .await;
    }

    async fn raw(&self, key: &str) -> StateEntry {
        self.store.get(key).await.unwrap().expect("entry should exist")
    }

    async fn invoice(&self, key: &str) -> Invoice {
        serde_json::from_slice(&self.raw(key).await.value).unwrap()
    }
}

// =============================================================================
// Payment Guards
// =============================================================================

mod payment_guard_tests {
    use super::*;

    #[tokio::test]
    async fn test_supplier_payment_below_invoice_amount() {
        let ledger = Ledger::new();
        ledger.raise("INV1", "1000").await;

        ledger
            .call("recordSupplierPayment", &["INV1", "Yes", "500"])
            .await;
        let invoice = ledger.invoice("INV1").await;
        assert_eq!(invoice.paid_amount, 500.0);
        assert_eq!(invoice.is_paid, "Yes");
    }

    #[tokio::test]
    async fn test_supplier_payment_not_below_amount_is_ignored() {
        let ledger = Ledger::new();
        ledger.raise("INV1", "1000").await;
        ledger
            .call("recordSupplierPayment", &["INV1", "Yes", "500"])
            .await;
        let before = ledger.raw("INV1").await;

        ledger
            .call("recordSupplierPayment", &["INV1", "Yes", "2000"])
            .await;
        ledger
            .call("recordSupplierPayment", &["INV1", "Bank", "1000"])
            .await;

        let after = ledger.raw("INV1").await;
        assert_eq!(before, after);
        assert_eq!(ledger.invoice("INV1").await.paid_amount, 500.0);
    }

    #[tokio::test]
    async fn test_repayment_must_exceed_paid_amount() {
        let ledger = Ledger::new();
        ledger.raise("INV1", "1000").await;
        ledger
            .call("recordSupplierPayment", &["INV1", "Yes", "500"])
            .await;
        let before = ledger.raw("INV1").await;

        ledger.call("recordOemRepayment", &["INV1", "Yes", "300"]).await;
        ledger.call("recordOemRepayment", &["INV1", "Yes", "500"]).await;
        assert_eq!(ledger.raw("INV1").await, before);

        ledger.call("recordOemRepayment", &["INV1", "Yes", "600"]).await;
        let invoice = ledger.invoice("INV1").await;
        assert_eq!(invoice.repayment_amount, 600.0);
        assert_eq!(invoice.repaid, "Yes");
        assert_eq!(invoice.paid_amount, 500.0);
    }

    #[tokio::test]
    async fn test_guard_outcome_visible_to_service_callers() {
        let service = InvoiceService::new(Arc::new(InMemoryStateStore::new()));
        service
            .create(Invoice::raised("INV1", "Acme", "01/01/2024", 1000.0, "Screens"))
            .await
            .unwrap();

        let rejected = service
            .record_supplier_payment("INV1", "Yes", 2000.0)
            .await
            .unwrap();
        assert!(!rejected.is_applied());
        assert_eq!(rejected.current().version, 1);

        let applied = service
            .record_supplier_payment("INV1", "Yes", 999.5)
            .await
            .unwrap();
        assert!(applied.is_applied());
        assert_eq!(applied.current().version, 2);
        assert_eq!(applied.current().document.paid_amount, 999.5);
    }
}

// =============================================================================
// Idempotence
// =============================================================================

mod idempotence_tests {
    use super::*;

    #[tokio::test]
    async fn test_goods_received_twice_equals_once() {
        let ledger = Ledger::new();
        ledger.raise("INVOICE1", "1000").await;

        ledger.call("markGoodsReceived", &["INVOICE1", "Yes"]).await;
        let once = ledger.raw("INVOICE1").await;

        ledger.call("markGoodsReceived", &["INVOICE1", "Yes"]).await;
        let twice = ledger.raw("INVOICE1").await;

        assert_eq!(once, twice);
        assert_eq!(twice.version, 2);
        assert_eq!(ledger.invoice("INVOICE1").await.goods_received, "Yes");
    }

    #[tokio::test]
    async fn test_goods_received_can_be_reverted() {
        let ledger = Ledger::new();
        ledger.raise("INVOICE1", "1000").await;
        ledger.call("markGoodsReceived", &["INVOICE1", "Yes"]).await;
        ledger.call("markGoodsReceived", &["INVOICE1", "No"]).await;
        let entry = ledger.raw("INVOICE1").await;
        assert_eq!(entry.version, 3);
        assert_eq!(ledger.invoice("INVOICE1").await.goods_received, "No");
    }
}

// =============================================================================
// Range Queries
// =============================================================================

mod range_query_tests {
    use super::*;

    #[tokio::test]
    async fn test_query_range_returns_exactly_the_key_space() {
        let ledger = Ledger::new();
        for key in ["INVOICE3", "INVOICE1", "INVOICE1000", "INVOICE2"] {
            ledger.raise(key, "10").await;
        }
        ledger.raise("INV1", "10").await;
        ledger
            .store
            .put("PAYMENT1", b"not an invoice".to_vec())
            .await
            .unwrap();

        let all = ledger.call("queryRange", NO_ARGS).await.payload.unwrap();
        let invoices: Vec<Invoice> = serde_json::from_slice(&all).unwrap();
        let numbers: Vec<&str> = invoices.iter().map(|i| i.invoice_number.as_str()).collect();
        assert_eq!(numbers, vec!["INVOICE1", "INVOICE1000", "INVOICE2", "INVOICE3"]);
    }

    #[tokio::test]
    async fn test_query_range_is_stored_bytes_verbatim() {
        let ledger = Ledger::new();
        let payload = r#"{"invoiceNumber":"INVOICE7","billedTo":"Acme","invoiceDate":"01/01/2024","invoiceAmount":12.5,"itemDescription":"Cables","gr":"No","isPaid":"No","paidAmount":0,"repaid":"No","repaymentAmount":0}"#;
        ledger
            .call("createFromPayload", &["INVOICE7", payload])
            .await;
        ledger.call("seedDefaults", NO_ARGS).await;

        let all = ledger.call("queryRange", NO_ARGS).await.payload.unwrap();
        let seeded = serde_json::to_string(&Invoice::sample("INVOICE0")).unwrap();
        assert_eq!(
            String::from_utf8(all).unwrap(),
            format!("[{},{}]", seeded, payload)
        );
    }

    #[tokio::test]
    async fn test_custom_key_space() {
        let store = Arc::new(InMemoryStateStore::new());
        let service = InvoiceService::new(Arc::clone(&store))
            .with_key_space(KeySpace::new("INV-"), "INV-0");
        let dispatcher = Dispatcher::new(service);

        dispatcher.dispatch("seedDefaults", NO_ARGS).await.unwrap();
        dispatcher
            .dispatch(
                "create",
                &["INVOICE9", "Acme", "d", "1", "x", "No", "No", "0", "No", "0"],
            )
            .await
            .unwrap();

        let all = dispatcher.dispatch("queryRange", NO_ARGS).await.unwrap();
        let invoices: Vec<Invoice> = serde_json::from_slice(&all.payload.unwrap()).unwrap();
        assert_eq!(invoices, vec![Invoice::sample("INV-0")]);
    }
}

// =============================================================================
// Events
// =============================================================================

mod event_tests {
    use super::*;

    #[tokio::test]
    async fn test_events_follow_writes_only() {
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let service =
            InvoiceService::new(Arc::new(InMemoryStateStore::new())).with_event_bus(bus);
        let dispatcher = Dispatcher::new(service);

        dispatcher
            .dispatch(
                "create",
                &["INVOICE1", "Acme", "d", "1000", "x", "No", "No", "0", "No", "0"],
            )
            .await
            .unwrap();
        dispatcher
            .dispatch("recordSupplierPayment", &["INVOICE1", "Yes", "5000"])
            .await
            .unwrap();
        dispatcher
            .dispatch("recordSupplierPayment", &["INVOICE1", "Yes", "500"])
            .await
            .unwrap();
        dispatcher.dispatch("queryRange", NO_ARGS).await.unwrap();

        let created = rx.recv().await.unwrap();
        assert_eq!(created.event.action(), "created");
        assert_eq!(created.event.key(), "INVOICE1");

        let updated = rx.recv().await.unwrap();
        assert_eq!(updated.event.action(), "updated");
        assert_eq!(updated.event.version(), 2);
        let json = serde_json::to_value(&updated.event).unwrap();
        assert_eq!(json["fields"], serde_json::json!(["isPaid", "paidAmount"]));

        assert!(rx.try_recv().is_err());
    }
}

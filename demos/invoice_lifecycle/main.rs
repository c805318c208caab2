//! Walks one invoice through its lifecycle via the dispatcher
//!
//! ```sh
//! RUST_LOG=debug cargo run --example invoice_lifecycle
//! ```

use anyhow::Result;
use invoice_ledger::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const NO_ARGS: &[&str] = &[];

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = LedgerConfig::default_config();
    let store = Arc::new(InMemoryStateStore::new());
    let service = InvoiceService::from_config(store, &config)?;

    let mut events = service
        .event_bus()
        .map(|bus| bus.subscribe())
        .ok_or_else(|| anyhow::anyhow!("event bus not configured"))?;
    tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            tracing::info!(
                action = envelope.event.action(),
                key = envelope.event.key(),
                version = envelope.event.version(),
                "record event"
            );
        }
    });

    let dispatcher = Dispatcher::new(service);

    dispatcher.dispatch("seedDefaults", NO_ARGS).await?;
    dispatcher
        .dispatch(
            "create",
            &[
                "INVOICE1",
                "Lenovo Ltd.",
                "03/09/2019",
                "250000",
                "Monitors",
                "No",
                "No",
                "0",
                "No",
                "0",
            ],
        )
        .await?;

    dispatcher
        .dispatch("markGoodsReceived", &["INVOICE1", "Yes"])
        .await?;
    dispatcher
        .dispatch("recordSupplierPayment", &["INVOICE1", "Yes", "240000"])
        .await?;
    // not below the invoice amount: ignored
    dispatcher
        .dispatch("recordSupplierPayment", &["INVOICE1", "Yes", "300000"])
        .await?;
    dispatcher
        .dispatch("recordOemRepayment", &["INVOICE1", "Yes", "245000"])
        .await?;

    match dispatcher.dispatch("markGoodsReceived", &["INVOICE42", "Yes"]).await {
        Ok(_) => tracing::warn!("unexpected success for a missing invoice"),
        Err(e) => {
            let response = e.to_response();
            tracing::info!(code = %response.code, message = %response.message, "rejected");
        }
    }

    let all = dispatcher.dispatch("queryRange", NO_ARGS).await?;
    let invoices: serde_json::Value = serde_json::from_slice(&all.payload.unwrap_or_default())?;
    println!("{}", serde_json::to_string_pretty(&invoices)?);

    Ok(())
}

//! Name-based invocation of invoice operations

use crate::core::error::{LedgerError, LedgerResult};
use crate::core::store::StateStore;
use crate::dispatch::operation::Operation;
use crate::dispatch::registry::OperationRegistry;
use crate::invoice::model::{fields, parse_amount};
use crate::invoice::service::InvoiceService;

/// Successful outcome of a dispatched operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub fn empty() -> Self {
        Self { payload: None }
    }

    pub fn with_payload(payload: Vec<u8>) -> Self {
        Self {
            payload: Some(payload),
        }
    }
}

/// Routes an operation name and positional string arguments to the service
///
/// # Example
///
/// ```rust,ignore
/// let dispatcher = Dispatcher::new(InvoiceService::new(store));
/// dispatcher.dispatch("seedDefaults", &[] as &[&str]).await?;
/// dispatcher.dispatch("markGoodsReceived", &["INVOICE0", "Yes"]).await?;
/// let all = dispatcher.dispatch("queryRange", &[] as &[&str]).await?;
/// ```
pub struct Dispatcher<S: StateStore> {
    service: InvoiceService<S>,
    registry: OperationRegistry,
}

impl<S: StateStore> Dispatcher<S> {
    /// Dispatcher answering to canonical and legacy operation names
    pub fn new(service: InvoiceService<S>) -> Self {
        Self {
            service,
            registry: OperationRegistry::standard(),
        }
    }

    /// Dispatcher over a custom name registry
    ///
    /// Fails if any operation is missing its canonical name.
    pub fn with_registry(
        service: InvoiceService<S>,
        registry: OperationRegistry,
    ) -> LedgerResult<Self> {
        registry.validate()?;
        Ok(Self { service, registry })
    }

    pub fn service(&self) -> &InvoiceService<S> {
        &self.service
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    /// Invoke the operation registered under `name`
    pub async fn dispatch<A>(&self, name: &str, args: &[A]) -> LedgerResult<Response>
    where
        A: AsRef<str> + Sync,
    {
        let operation = self
            .registry
            .resolve(name)
            .ok_or_else(|| LedgerError::UnknownOperation {
                name: name.to_string(),
            })?;
        operation.arity().check(operation.canonical_name(), args.len())?;

        tracing::debug!(
            operation = %operation,
            invoked_as = name,
            args = args.len(),
            write = operation.is_write(),
            "dispatching"
        );

        let result = self.invoke(operation, args).await;
        match &result {
            Err(e) if operation.is_write() => {
                tracing::warn!(operation = %operation, code = e.error_code(), error = %e, "write rejected")
            }
            Err(e) => {
                tracing::debug!(operation = %operation, code = e.error_code(), error = %e, "read failed")
            }
            Ok(_) => {}
        }
        result
    }

    async fn invoke<A>(&self, operation: Operation, args: &[A]) -> LedgerResult<Response>
    where
        A: AsRef<str> + Sync,
    {
        let arg = |i: usize| args[i].as_ref();

        match operation {
            Operation::SeedDefaults => {
                self.service.seed_defaults().await?;
                Ok(Response::empty())
            }
            Operation::Create => {
                self.service.create_from_args(args).await?;
                Ok(Response::empty())
            }
            Operation::CreateFromPayload => {
                let payload = arg(1).as_bytes().to_vec();
                self.service.create_from_payload(arg(0), payload).await?;
                Ok(Response::empty())
            }
            Operation::QueryRange => Ok(Response::with_payload(self.service.query_range().await?)),
            Operation::MarkGoodsReceived => {
                self.service.mark_goods_received(arg(0), arg(1)).await?;
                Ok(Response::empty())
            }
            Operation::RecordSupplierPayment => {
                let amount = parse_amount(fields::PAID_AMOUNT, arg(2))?;
                self.service
                    .record_supplier_payment(arg(0), arg(1), amount)
                    .await?;
                Ok(Response::empty())
            }
            Operation::RecordOemRepayment => {
                let amount = parse_amount(fields::REPAYMENT_AMOUNT, arg(2))?;
                self.service
                    .record_oem_repayment(arg(0), arg(1), amount)
                    .await?;
                Ok(Response::empty())
            }
            Operation::LookupIdentity => Ok(Response {
                payload: self.service.lookup_identity(args)?,
            }),
            Operation::GetInvoice => Ok(Response::with_payload(
                self.service.get_payload(arg(0)).await?,
            )),
        }
    }
}

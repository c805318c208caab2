//! Dispatch layer: operation names and positional arguments in, service calls out

pub mod dispatcher;
pub mod operation;
pub mod registry;

pub use dispatcher::{Dispatcher, Response};
pub use operation::{Arity, Operation};
pub use registry::OperationRegistry;

//! Operation name registry

use crate::core::error::{LedgerError, LedgerResult};
use crate::dispatch::operation::Operation;
use std::collections::HashMap;

/// Maps invocation names to operations
///
/// Lookup is by exact, case-sensitive name.
#[derive(Debug, Clone, Default)]
pub struct OperationRegistry {
    names: HashMap<String, Operation>,
}

impl OperationRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    /// Registry with every operation under its canonical and legacy name
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for op in Operation::ALL {
            registry.register(op.canonical_name(), op);
            registry.register(op.legacy_name(), op);
        }
        registry
    }

    /// Register `operation` under `name`, replacing any previous mapping
    pub fn register(&mut self, name: impl Into<String>, operation: Operation) {
        self.names.insert(name.into(), operation);
    }

    pub fn resolve(&self, name: &str) -> Option<Operation> {
        self.names.get(name).copied()
    }

    /// Get all registered names
    pub fn names(&self) -> Vec<&str> {
        self.names.keys().map(|s| s.as_str()).collect()
    }

    /// Check that every operation is reachable under its canonical name
    pub fn validate(&self) -> LedgerResult<()> {
        let missing: Vec<&str> = Operation::ALL
            .iter()
            .filter(|op| self.resolve(op.canonical_name()) != Some(**op))
            .map(|op| op.canonical_name())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(LedgerError::Config {
                message: format!("operations not registered: {}", missing.join(", ")),
            })
        }
    }
}

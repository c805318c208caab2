//! Record change events
//!
//! After every successful write the record service publishes a
//! [`RecordEvent`] on an [`EventBus`]. The bus uses `tokio::sync::broadcast`,
//! so mutations never wait on listeners.
//!
//! ```text
//! InvoiceService ──▶ EventBus::publish() ──▶ broadcast channel ──▶ subscribers
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let bus = EventBus::new(1024);
//! let mut rx = bus.subscribe();
//!
//! let service = InvoiceService::new(store).with_event_bus(bus.clone());
//! service.seed_defaults().await?;
//!
//! if let Ok(envelope) = rx.recv().await {
//!     println!("{} {}", envelope.event.action(), envelope.event.key());
//! }
//! ```

use crate::core::store::Version;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// A committed change to a stored record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordEvent {
    /// A record was written at a key that held nothing before
    Created {
        document_type: String,
        key: String,
        version: Version,
    },
    /// An existing record was rewritten
    Updated {
        document_type: String,
        key: String,
        version: Version,
        /// Wire names of the fields the write touched
        fields: Vec<String>,
    },
}

impl RecordEvent {
    /// The key of the record this event relates to
    pub fn key(&self) -> &str {
        match self {
            RecordEvent::Created { key, .. } | RecordEvent::Updated { key, .. } => key,
        }
    }

    pub fn document_type(&self) -> &str {
        match self {
            RecordEvent::Created { document_type, .. }
            | RecordEvent::Updated { document_type, .. } => document_type,
        }
    }

    /// Version the record was written at
    pub fn version(&self) -> Version {
        match self {
            RecordEvent::Created { version, .. } | RecordEvent::Updated { version, .. } => {
                *version
            }
        }
    }

    /// Get the action name (created, updated)
    pub fn action(&self) -> &str {
        match self {
            RecordEvent::Created { .. } => "created",
            RecordEvent::Updated { .. } => "updated",
        }
    }
}

/// Envelope wrapping a record event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique event ID
    pub id: Uuid,
    /// When the event was published
    pub timestamp: DateTime<Utc>,
    pub event: RecordEvent,
}

impl EventEnvelope {
    pub fn new(event: RecordEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// Broadcast-based event bus
///
/// Cheap to clone; all clones share one channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    ///
    /// The capacity determines how many events can be buffered before slow
    /// receivers start losing events (lagged). A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all subscribers
    ///
    /// Never blocks and never fails. Returns the number of receivers that
    /// will see the event; with no subscribers the event is dropped.
    pub fn publish(&self, event: RecordEvent) -> usize {
        let envelope = EventEnvelope::new(event);
        self.sender.send(envelope).unwrap_or(0)
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Get the current number of active subscribers
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

//! Connection registry: where outbound events leave the runtime.

use dashmap::DashMap;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::debug;

use crate::protocol::OutboundEvent;

/// Delivery seam between the runtime and whatever transport holds the
/// connections. Sends never block and never fail the caller.
pub trait EventSink: Send + Sync {
    fn send_to(&self, connection_id: &str, event: &OutboundEvent);
}

/// One unbounded channel per live connection.
#[derive(Default)]
pub struct ConnectionHub {
    connections: DashMap<String, UnboundedSender<OutboundEvent>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register a connection and hand back the receiving half its writer
    /// drains. Re-registering an id replaces the previous channel.
    pub fn register(&self, connection_id: &str) -> UnboundedReceiver<OutboundEvent> {
        let (tx, rx) = unbounded_channel();
        self.connections.insert(connection_id.to_string(), tx);
        debug!(connection_id, total = self.connections.len(), "Connection registered");
        rx
    }

    pub fn unregister(&self, connection_id: &str) {
        if self.connections.remove(connection_id).is_some() {
            debug!(connection_id, total = self.connections.len(), "Connection unregistered");
        }
    }

    pub fn is_registered(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl EventSink for ConnectionHub {
    fn send_to(&self, connection_id: &str, event: &OutboundEvent) {
        let Some(tx) = self.connections.get(connection_id) else {
            debug!(connection_id, event = event.name(), "No such connection; event dropped");
            return;
        };
        if tx.send(event.clone()).is_err() {
            debug!(connection_id, event = event.name(), "Connection closed; event dropped");
        }
    }
}

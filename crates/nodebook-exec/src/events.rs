//! Execution started / finished notifications for observers

use nodebook_core::{CellKey, NodeName};
use tokio::sync::mpsc;

/// Notification emitted by a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionEvent {
    /// A request was dispatched
    Started {
        /// Node identity
        node: NodeName,
        /// Document key of the cell
        cell: CellKey,
    },
    /// The dispatched request finished
    Finished {
        /// Node identity
        node: NodeName,
        /// Document key of the cell
        cell: CellKey,
    },
}

impl ExecutionEvent {
    /// Identity the event refers to
    #[must_use]
    pub fn node(&self) -> &NodeName {
        match self {
            Self::Started { node, .. } | Self::Finished { node, .. } => node,
        }
    }

    /// Whether this is a finished notification
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}

/// Fan-out of execution events to subscribers
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: Vec<mpsc::UnboundedSender<ExecutionEvent>>,
}

impl EventHub {
    /// Hub with no subscribers
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New subscriber; dropping the receiver unsubscribes
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ExecutionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber, pruning closed ones
    pub fn emit(&mut self, event: &ExecutionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Number of live subscribers as of the last emit
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

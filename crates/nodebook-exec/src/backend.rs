//! Kernel (execution backend) collaborator

use nodebook_core::{KernelId, MsgId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Handler for one payload slot
pub type PayloadCallback = Box<dyn Fn(&serde_json::Value) + Send + Sync>;

/// Options sent with every execute request (Jupyter field names)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOptions {
    /// Suppress output display
    pub silent: bool,
    /// Record in input history
    pub store_history: bool,
    /// Abort queued requests after an error
    pub stop_on_error: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            silent: false,
            store_history: true,
            stop_on_error: true,
        }
    }
}

/// Callback set handed to the kernel with a request
///
/// Payloads are routed by their `source` field to the slot of that name.
#[derive(Default)]
pub struct Callbacks {
    payload: BTreeMap<String, PayloadCallback>,
}

impl Callbacks {
    /// Empty callback set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payload handler under `slot`
    pub fn set_payload(&mut self, slot: impl Into<String>, callback: PayloadCallback) {
        self.payload.insert(slot.into(), callback);
    }

    /// Whether a slot is populated
    #[must_use]
    pub fn has_payload(&self, slot: &str) -> bool {
        self.payload.contains_key(slot)
    }

    /// Hand a payload to the slot named by its `source`; false if unhandled
    pub fn dispatch_payload(&self, payload: &serde_json::Value) -> bool {
        let Some(source) = payload.get("source").and_then(serde_json::Value::as_str) else {
            return false;
        };
        match self.payload.get(source) {
            Some(callback) => {
                callback(payload);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("payload", &self.payload.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Connection to an execution backend
///
/// `execute` returns synchronously with the operation id; results arrive
/// later through the callbacks and the session's finished entry point.
pub trait Kernel: Send + Sync {
    /// Identity of this connection
    fn id(&self) -> KernelId;

    /// Submit code for execution
    fn execute(&self, code: &str, callbacks: Callbacks, options: ExecuteOptions) -> MsgId;

    /// Drop every callback registered for a message
    fn clear_callbacks_for_msg(&self, msg_id: &MsgId);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn routes_payload_by_source() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut callbacks = Callbacks::new();
        callbacks.set_payload(
            "set_prompt",
            Box::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert!(callbacks.has_payload("set_prompt"));
        assert!(callbacks.dispatch_payload(&json!({"source": "set_prompt"})));
        assert!(!callbacks.dispatch_payload(&json!({"source": "page"})));
        assert!(!callbacks.dispatch_payload(&json!({"prompt": "N_1"})));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn options_use_jupyter_names() {
        let value = serde_json::to_value(ExecuteOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({"silent": false, "store_history": true, "stop_on_error": true})
        );
    }
}

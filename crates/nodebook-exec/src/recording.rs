//! In-process kernel that records requests instead of running them
//!
//! Backs dry runs of a notebook (`nodebook plan`) and tests: every request
//! is kept with its options, callback sets are held per message, and
//! payloads can be pushed back through them the way a real backend would.

use crate::backend::{Callbacks, ExecuteOptions, Kernel};
use nodebook_core::{KernelId, MsgId};
use parking_lot::Mutex;
use std::collections::HashMap;

/// One request as the kernel received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchedRequest {
    /// Assigned message id
    pub msg_id: MsgId,
    /// Dispatched text
    pub code: String,
    /// Request options
    pub options: ExecuteOptions,
}

/// Kernel that records everything it is asked to do
#[derive(Debug)]
pub struct RecordingKernel {
    id: KernelId,
    requests: Mutex<Vec<DispatchedRequest>>,
    callbacks: Mutex<HashMap<MsgId, Callbacks>>,
}

impl RecordingKernel {
    /// Fresh kernel with a new id
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: KernelId::new(),
            requests: Mutex::new(Vec::new()),
            callbacks: Mutex::new(HashMap::new()),
        }
    }

    /// All requests so far, in order
    #[must_use]
    pub fn requests(&self) -> Vec<DispatchedRequest> {
        self.requests.lock().clone()
    }

    /// Most recent request
    #[must_use]
    pub fn last_request(&self) -> Option<DispatchedRequest> {
        self.requests.lock().last().cloned()
    }

    /// Whether callbacks are still registered for a message
    #[must_use]
    pub fn has_callbacks(&self, msg_id: &MsgId) -> bool {
        self.callbacks.lock().contains_key(msg_id)
    }

    /// Deliver a payload for `msg_id`; false when nothing handled it
    pub fn deliver_payload(&self, msg_id: &MsgId, payload: &serde_json::Value) -> bool {
        let callbacks = self.callbacks.lock();
        callbacks
            .get(msg_id)
            .is_some_and(|set| set.dispatch_payload(payload))
    }
}

impl Default for RecordingKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl Kernel for RecordingKernel {
    fn id(&self) -> KernelId {
        self.id
    }

    fn execute(&self, code: &str, callbacks: Callbacks, options: ExecuteOptions) -> MsgId {
        let msg_id = MsgId::generate();
        tracing::debug!("Recorded request {} ({} bytes)", msg_id, code.len());
        self.callbacks.lock().insert(msg_id.clone(), callbacks);
        self.requests.lock().push(DispatchedRequest {
            msg_id: msg_id.clone(),
            code: code.to_string(),
            options,
        });
        msg_id
    }

    fn clear_callbacks_for_msg(&self, msg_id: &MsgId) {
        self.callbacks.lock().remove(msg_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn records_and_clears() {
        let kernel = RecordingKernel::new();
        let seen = Arc::new(AtomicBool::new(false));
        let flag = seen.clone();
        let mut callbacks = Callbacks::new();
        callbacks.set_payload("set_prompt", Box::new(move |_| flag.store(true, Ordering::SeqCst)));

        let msg = kernel.execute("x = 1", callbacks, ExecuteOptions::default());
        assert_eq!(kernel.requests().len(), 1);
        assert_eq!(kernel.last_request().unwrap().code, "x = 1");
        assert!(kernel.has_callbacks(&msg));

        kernel.clear_callbacks_for_msg(&msg);
        assert!(!kernel.deliver_payload(&msg, &json!({"source": "set_prompt"})));
        assert!(!seen.load(Ordering::SeqCst));
    }

    #[test]
    fn message_ids_are_unique() {
        let kernel = RecordingKernel::new();
        let a = kernel.execute("a", Callbacks::new(), ExecuteOptions::default());
        let b = kernel.execute("b", Callbacks::new(), ExecuteOptions::default());
        assert_ne!(a, b);
    }
}

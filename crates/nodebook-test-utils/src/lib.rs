//! Testing utilities for Nodebook workspace
//!
//! Shared fixtures: notebook builders, a view that records every call,
//! and a ready-to-run session over a recording kernel.

#![allow(missing_docs)]

use nodebook_core::{Cell, CellKey, InputPrompt, NodeName, Notebook, NodebookConfig};
use nodebook_exec::{CellView, RecordingKernel, Session, ViewError};
use parking_lot::Mutex;
use std::sync::Arc;

/// A call the session made on the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewCall {
    ClearOutput(CellKey),
    Prompt(CellKey, InputPrompt),
    Running(CellKey, bool),
}

/// View that records calls and can be told to reject prompt updates
#[derive(Debug, Default)]
pub struct RecordingView {
    calls: Mutex<Vec<ViewCall>>,
    reject_prompts: Mutex<bool>,
}

impl RecordingView {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<ViewCall> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn reject_prompts(&self, reject: bool) {
        *self.reject_prompts.lock() = reject;
    }

    /// Prompts shown for one cell, in order
    pub fn prompts_for(&self, cell: &CellKey) -> Vec<InputPrompt> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                ViewCall::Prompt(key, prompt) if key == cell => Some(prompt.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_prompt(&self, cell: &CellKey) -> Option<InputPrompt> {
        self.prompts_for(cell).pop()
    }
}

impl CellView for RecordingView {
    fn clear_output(&self, cell: &CellKey) {
        self.calls.lock().push(ViewCall::ClearOutput(cell.clone()));
    }

    fn set_input_prompt(&self, cell: &CellKey, prompt: InputPrompt) -> Result<(), ViewError> {
        if *self.reject_prompts.lock() {
            return Err(ViewError::Render("prompt rejected".to_string()));
        }
        self.calls.lock().push(ViewCall::Prompt(cell.clone(), prompt));
        Ok(())
    }

    fn set_running(&self, cell: &CellKey, running: bool) {
        self.calls.lock().push(ViewCall::Running(cell.clone(), running));
    }
}

/// Notebook of code cells, returning keys in order
pub fn code_notebook(sources: &[&str]) -> (Notebook, Vec<CellKey>) {
    let mut notebook = Notebook::new();
    let keys = sources
        .iter()
        .map(|source| notebook.push(Cell::code(*source)))
        .collect();
    (notebook, keys)
}

/// Session under test with its collaborators
pub struct Harness {
    pub session: Session,
    pub kernel: Arc<RecordingKernel>,
    pub view: Arc<RecordingView>,
    pub keys: Vec<CellKey>,
}

impl Harness {
    /// Lineage session over code cells with a kernel attached
    pub fn new(sources: &[&str]) -> Self {
        let (notebook, keys) = code_notebook(sources);
        Self::from_notebook(notebook, keys)
    }

    pub fn from_notebook(notebook: Notebook, keys: Vec<CellKey>) -> Self {
        let view = RecordingView::new();
        let mut session = Session::new(notebook, view.clone(), NodebookConfig::new());
        let kernel = Arc::new(RecordingKernel::new());
        session.attach_kernel(kernel.clone());
        Self {
            session,
            kernel,
            view,
            keys,
        }
    }

    /// Identity of the i-th tracked cell
    pub fn node(&self, i: usize) -> NodeName {
        self.session
            .identity(&self.keys[i])
            .cloned()
            .expect("cell has an identity")
    }

    /// Code sent by the most recent dispatch
    pub fn last_code(&self) -> String {
        self.kernel.last_request().expect("a request was dispatched").code
    }

    /// `set_prompt` payload addressed to a node
    pub fn prompt_payload(node: &NodeName, prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "source": "set_prompt",
            "cell_id": node.as_str(),
            "prompt": prompt,
        })
    }
}

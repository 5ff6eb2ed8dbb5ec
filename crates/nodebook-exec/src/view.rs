//! Cell view (UI) collaborator and the prompt-payload callback

use crate::backend::PayloadCallback;
use crate::error::{DeliveryError, ViewError};
use nodebook_core::{CellKey, InputPrompt, NodeDirectory, PromptError, PromptPayload};
use std::sync::Arc;

/// Rendering surface for cells
pub trait CellView: Send + Sync {
    /// Clear displayed output
    fn clear_output(&self, cell: &CellKey);

    /// Show a prompt value (or the running sentinel / blank)
    fn set_input_prompt(&self, cell: &CellKey, prompt: InputPrompt) -> Result<(), ViewError>;

    /// Apply or remove the "running" visual state
    fn set_running(&self, cell: &CellKey, running: bool);
}

/// Headless view that logs every update
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingView;

impl CellView for TracingView {
    fn clear_output(&self, cell: &CellKey) {
        tracing::trace!("clear output {}", cell);
    }

    fn set_input_prompt(&self, cell: &CellKey, prompt: InputPrompt) -> Result<(), ViewError> {
        tracing::debug!("prompt {} -> [{}]", cell, prompt);
        Ok(())
    }

    fn set_running(&self, cell: &CellKey, running: bool) {
        tracing::trace!("running {} = {}", cell, running);
    }
}

/// Route one backend prompt payload to the cell carrying its identity
///
/// # Errors
/// Malformed payloads, unknown identities and view failures.
pub fn deliver_prompt(
    view: &dyn CellView,
    directory: &NodeDirectory,
    payload: &serde_json::Value,
) -> Result<(), DeliveryError> {
    let payload = PromptPayload::from_value(payload)?;
    let cell = directory
        .lookup(&payload.cell_id)
        .ok_or_else(|| PromptError::UnknownNode(payload.cell_id.clone()))?;
    view.set_input_prompt(&cell, payload.input_prompt())?;
    Ok(())
}

/// Callback for the prompt slot; failures are logged, never propagated
#[must_use]
pub fn prompt_callback(view: Arc<dyn CellView>, directory: NodeDirectory) -> PayloadCallback {
    Box::new(move |payload| {
        if let Err(e) = deliver_prompt(view.as_ref(), &directory, payload) {
            tracing::warn!("Failed to apply prompt payload: {}", e);
        }
    })
}

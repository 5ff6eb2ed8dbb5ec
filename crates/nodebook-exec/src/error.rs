//! Error types for the execution layer
//!
//! Nothing here is returned from `Session::execute`; these are logged at
//! the point of failure and absorbed.

use nodebook_core::{CellKey, PromptError};

/// Failures reported by a [`crate::CellView`]
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// The view has no element for this cell
    #[error("cell not rendered: {0}")]
    NotRendered(CellKey),

    /// Rendering failed
    #[error("render failed: {0}")]
    Render(String),
}

/// Failures while applying a delivered result to the view
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// Payload could not be interpreted or routed
    #[error("prompt payload: {0}")]
    Prompt(#[from] PromptError),

    /// View rejected the update
    #[error("view: {0}")]
    View(#[from] ViewError),
}

impl DeliveryError {
    /// Whether the failure came from the backend payload rather than the view
    #[inline]
    #[must_use]
    pub fn is_payload_error(&self) -> bool {
        matches!(self, Self::Prompt(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodebook_core::NodeName;

    #[test]
    fn delivery_error_sources() {
        let err = DeliveryError::from(PromptError::UnknownNode(NodeName::new("n")));
        assert!(err.is_payload_error());
        assert_eq!(err.to_string(), "prompt payload: no cell with identity n");

        let err = DeliveryError::from(ViewError::NotRendered(CellKey::new("k")));
        assert!(!err.is_payload_error());
    }
}

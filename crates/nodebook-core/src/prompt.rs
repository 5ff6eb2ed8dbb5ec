//! Input prompts and backend prompt payloads

use crate::types::NodeName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Payload `source` value used by the backend for prompt updates
pub const SET_PROMPT_SOURCE: &str = "set_prompt";

/// Sentinel shown while a cell is running
pub const RUNNING_SENTINEL: &str = "*";

/// Label the backend uses for an invalidated node
pub const INVALIDATED_LABEL: &str = "X";

/// What the input-prompt indicator shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPrompt {
    /// Nothing (blank prompt)
    Unset,
    /// Execution in flight
    Running,
    /// Backend-delivered label
    Label(String),
}

impl InputPrompt {
    /// Label for a delivered prompt value
    #[must_use]
    pub fn label(value: impl Into<String>) -> Self {
        Self::Label(value.into())
    }

    /// Whether the backend marked the node as invalidated
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        matches!(self, Self::Label(l) if l == INVALIDATED_LABEL)
    }

    /// 1-based position in the backend chain for `N_<k>` labels
    #[must_use]
    pub fn chain_position(&self) -> Option<usize> {
        match self {
            Self::Label(l) => l.strip_prefix("N_")?.parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for InputPrompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str(" "),
            Self::Running => f.write_str(RUNNING_SENTINEL),
            Self::Label(label) => f.write_str(label),
        }
    }
}

/// Prompt update written by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptPayload {
    /// Always `set_prompt`
    pub source: String,
    /// Identity of the node whose prompt changes
    pub cell_id: NodeName,
    /// New prompt label
    pub prompt: String,
}

/// Prompt payload failures
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Payload did not deserialize
    #[error("malformed prompt payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Payload belongs to another slot
    #[error("unexpected payload source: {0}")]
    WrongSource(String),

    /// No cell carries the addressed identity
    #[error("no cell with identity {0}")]
    UnknownNode(NodeName),
}

impl PromptPayload {
    /// Payload for a node
    #[must_use]
    pub fn new(node: NodeName, prompt: impl Into<String>) -> Self {
        Self {
            source: SET_PROMPT_SOURCE.to_string(),
            cell_id: node,
            prompt: prompt.into(),
        }
    }

    /// Decode from a backend JSON payload
    ///
    /// # Errors
    /// `Malformed` when fields are missing, `WrongSource` for other slots.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, PromptError> {
        let payload: Self = serde_json::from_value(value.clone())?;
        if payload.source != SET_PROMPT_SOURCE {
            return Err(PromptError::WrongSource(payload.source));
        }
        Ok(payload)
    }

    /// Prompt to display
    #[must_use]
    pub fn input_prompt(&self) -> InputPrompt {
        InputPrompt::label(self.prompt.clone())
    }
}

//! Interceptor configuration

use crate::error::NodebookError;
use crate::prompt::SET_PROMPT_SOURCE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Execution options and callback slot naming
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodebookConfig {
    /// Default `stop_on_error` for runs that do not pass one
    pub stop_on_error: bool,
    /// Ask the backend to record history
    pub store_history: bool,
    /// Suppress output display
    pub silent: bool,
    /// Payload slot the prompt callback is registered under
    pub prompt_slot: String,
}

impl NodebookConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With default stop-on-error behaviour
    #[inline]
    #[must_use]
    pub fn with_stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    /// With history recording
    #[inline]
    #[must_use]
    pub fn with_store_history(mut self, store: bool) -> Self {
        self.store_history = store;
        self
    }

    /// With output display suppressed
    #[inline]
    #[must_use]
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// With a different prompt slot
    #[inline]
    #[must_use]
    pub fn with_prompt_slot(mut self, slot: impl Into<String>) -> Self {
        self.prompt_slot = slot.into();
        self
    }

    /// Parse TOML; missing keys keep their defaults
    ///
    /// # Errors
    /// `NodebookError::Config` on invalid TOML or wrong types.
    pub fn from_toml_str(text: &str) -> Result<Self, NodebookError> {
        Ok(toml::from_str(text)?)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// `NodebookError::Io` if unreadable, `NodebookError::Config` if invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, NodebookError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loading config from {}", path.as_ref().display());
        Self::from_toml_str(&text)
    }
}

impl Default for NodebookConfig {
    fn default() -> Self {
        Self {
            stop_on_error: true,
            store_history: true,
            silent: false,
            prompt_slot: SET_PROMPT_SOURCE.to_string(),
        }
    }
}
